//! Progress bar construction shared by training and batch operations.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle, style::TemplateError};

/// Creates a styled progress bar with elapsed time, a fixed-width message
/// label, and position/total counters.
///
/// When `show` is false the bar is created with a hidden draw target, so
/// callers can tick it unconditionally.
///
/// # Errors
///
/// Returns a [`TemplateError`] if the progress bar style template is invalid.
pub(crate) fn progress_bar(
    size: u64,
    msg: impl Into<String>,
    show: bool,
) -> Result<ProgressBar, TemplateError> {
    let pb = ProgressBar::new(size);

    if !show {
        // force to not render
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return Ok(pb);
    }

    let style =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos}/{len}")?;

    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(std::time::Duration::from_secs(1));

    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_counts() {
        let pb = progress_bar(3, "hidden", false).expect("template should compile");
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        assert!(pb.is_hidden());
    }
}
