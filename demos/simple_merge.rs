use bytebpe::{BPEModel, BpeConfig};

fn main() -> bytebpe::Result<()> {
    // Three merges over "aaabdaaabac":
    //   (a, a) -> 256, (a, b) -> 257, (256, 257) -> 258
    let config = BpeConfig::new(259).with_log_every(1);
    let mut model = BPEModel::with_config(config)?;

    let text = "aaabdaaabac";
    println!("Initial: {:?}", text.as_bytes());

    let ids = model.train(text)?;

    println!("\nMerges:");
    if let Some(merges) = model.merges() {
        for ((a, b), token) in merges.iter() {
            let bytes = model.token_bytes(token).unwrap_or_default();
            println!("  ({a}, {b}) -> {token} {:?}", String::from_utf8_lossy(bytes));
        }
    }

    println!("\nFinal tokens: {ids:?}");
    println!("Encoded \"aaab\": {:?}", model.encode("aaab")?);
    println!("Decoded: {:?}", model.decode(&ids)?);

    Ok(())
}
