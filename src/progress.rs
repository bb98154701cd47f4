use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar in the style used by every long-running stage.
pub fn bar(len: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta}) {msg}")?
            .progress_chars("=> "),
    );
    Ok(pb)
}
