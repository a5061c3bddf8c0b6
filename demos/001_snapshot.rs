//! Snapshot demonstration.
//!
//! Demonstrates:
//! - Connect to a running browser
//! - Open a page and wait for it to load
//! - Take a full and an interactive-only snapshot
//!
//! Usage:
//!   CDP_PILOT_ENDPOINT=ws://127.0.0.1:9222/devtools/browser/<id> \
//!     cargo run --example 001_snapshot -- https://example.com
//!   cargo run --example 001_snapshot -- --interactive --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use cdp_pilot::{Result, SnapshotOptions};
use common::Args;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "https://example.com";
const READY_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: Snapshot ===\n");

    let driver = common::driver()?;
    let browser = driver.connect().await?;
    println!("[Setup] Connected to {}", driver.endpoint());

    let url = args.positional.as_deref().unwrap_or(DEFAULT_URL);
    let page = browser.new_page(url).await?;
    page.wait_for_ready(READY_TIMEOUT).await?;
    println!("[1] Opened {} ({})\n", page.url().await?, page.title().await?);

    let options = if args.interactive {
        SnapshotOptions::new().with_interactive_only()
    } else {
        SnapshotOptions::new().with_compact()
    };

    let snapshot = page.snapshot(&options).await?;
    println!("[2] Snapshot ({} refs):\n", snapshot.refs.len());
    println!("{}\n", snapshot.tree);
    println!("    Saved to {}", page.snapshot_store().path().display());

    page.close().await?;
    browser.close();
    Ok(())
}
