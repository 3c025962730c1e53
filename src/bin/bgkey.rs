//! bgkey CLI Tool
//!
//! Replaces border-connected light backgrounds with a chroma key color.

#[cfg(feature = "cli")]
use bgkey::cli;

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
