//! Ref-based interaction demonstration.
//!
//! Demonstrates:
//! - Select the first open tab as the current page
//! - Resolve `@eN` refs from the stored snapshot
//! - Click, fill and read text through refs or CSS
//!
//! Run `001_snapshot` first, then:
//!   cargo run --example 002_interact -- @e1
//!   cargo run --example 002_interact -- "input[name=q]"

mod common;

// ============================================================================
// Imports
// ============================================================================

use cdp_pilot::{Error, Result};
use common::Args;

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
    println!("=== 002: Interact ===\n");

    let selector = args
        .positional
        .ok_or_else(|| Error::config("usage: 002_interact <selector | @ref>"))?;

    let browser = common::driver()?.connect().await?;
    let registry = browser.registry();
    let page = registry.select_tab(0).await?;
    println!("[Setup] Current page: {}", page.url().await?);

    match page.text(&selector).await {
        Ok(text) => println!("[1] Text of {selector}: {text:?}"),
        Err(e) if e.is_resolution_error() => {
            println!("[1] {e}; take a snapshot first");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    println!("[2] Visible: {}", page.is_visible(&selector).await?);

    match page.fill(&selector, "hello").await {
        Ok(()) => println!("[3] Filled {selector}"),
        Err(Error::ScriptError { .. }) => {
            page.click(&selector).await?;
            println!("[3] Clicked {selector}");
        }
        Err(e) => return Err(e),
    }

    registry.shutdown().await?;
    browser.close();
    Ok(())
}
