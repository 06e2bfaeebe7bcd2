use indicatif::{ProgressBar, ProgressStyle};

pub fn bar(header: String) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_prefix(header);
    pb.set_style(
        ProgressStyle::with_template("{prefix}...\n[{wide_bar:.cyan/blue}] {pos}/{len}")
            .expect("incorrect progress bar format string")
            .progress_chars("#>-"),
    );
    pb
}
