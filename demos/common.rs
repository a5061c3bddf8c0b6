//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Driver setup from the environment

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use cdp_pilot::{Driver, DriverBuilder, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub interactive: bool,
    /// First non-flag argument.
    pub positional: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            interactive: args.iter().any(|a| a == "--interactive"),
            positional: args.iter().find(|a| !a.starts_with("--")).cloned(),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "cdp_pilot=debug"
    } else {
        "cdp_pilot=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Builds a driver from `CDP_PILOT_ENDPOINT` / `CDP_PILOT_SNAPSHOT_PATH`.
///
/// Start the browser with `--remote-debugging-port=9222` and copy the
/// `webSocketDebuggerUrl` from `http://127.0.0.1:9222/json/version`.
pub fn driver() -> Result<Driver> {
    DriverBuilder::from_env().build()
}
