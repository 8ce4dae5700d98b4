//! IMG.LY Background Edit CLI Tool
//!
//! Command-line interface for capturing a segmented image and refining its
//! mask with the imgly-bgedit library.

#[cfg(feature = "cli")]
use imgly_bgedit::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
