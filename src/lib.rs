//! cdp-pilot - Chrome DevTools Protocol control plane.
//!
//! This library drives an already-running Chromium-family browser over its
//! DevTools WebSocket endpoint, and turns pages into compact accessibility
//! snapshots whose elements can be addressed by short refs (`@e1`).
//!
//! # Architecture
//!
//! - **Connection**: one WebSocket per browser, owned by a single event-loop
//!   task. Commands are correlated by id; any number may be in flight.
//! - **Sessions**: each attached target gets a flat-mode session; every
//!   command on a [`Session`] carries its `sessionId`.
//! - **Snapshots**: a page script emits an indented role tree, the
//!   [`SnapshotProcessor`] annotates it with refs, the [`SnapshotStore`]
//!   keeps it on disk so later invocations can resolve `@eN`.
//! - **Selectors**: CSS passes straight through; refs become role queries
//!   re-run against the live DOM.
//!
//! # Quick Start
//!
//! ```no_run
//! use cdp_pilot::{Driver, Result, SnapshotOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let driver = Driver::builder()
//!         .endpoint("ws://127.0.0.1:9222/devtools/browser/4f6c")
//!         .build()?;
//!
//!     let browser = driver.connect().await?;
//!     let page = browser.new_page("https://example.com").await?;
//!
//!     let snapshot = page.snapshot(&SnapshotOptions::new().with_interactive_only()).await?;
//!     println!("{}", snapshot.tree);
//!
//!     page.click("@e1").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | [`Browser`], [`Page`], target and page registries |
//! | [`driver`] | Driver factory and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | CDP wire envelopes and typed commands |
//! | [`scripts`] | Page-side JavaScript templates |
//! | [`selector`] | Selector and ref resolution |
//! | [`session`] | Target-scoped command sessions |
//! | [`snapshot`] | Snapshot processing and persistence |
//! | [`transport`] | WebSocket connection layer |

// ============================================================================
// Modules
// ============================================================================

/// Browser entities: Browser, Page, registries.
pub mod browser;

/// Driver factory and configuration.
///
/// Use [`Driver::builder()`] to create a configured driver instance.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// CDP wire message types.
pub mod protocol;

/// JavaScript evaluated inside pages.
pub mod scripts;

/// Selector resolution.
pub mod selector;

/// Target-scoped sessions.
pub mod session;

/// Accessibility snapshots.
pub mod snapshot;

/// WebSocket transport layer.
///
/// Handles the connection, command correlation and event fan-out.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{Browser, Page, PageRegistry, TargetInfo, TargetRegistry};

// Driver types
pub use driver::{ConnectionOptions, Driver, DriverBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, RefId, SessionId, TargetId};

// Protocol types
pub use protocol::{Command, Event, ParsedEvent};

// Selector types
pub use selector::{ResolvedElement, SelectorResolver};

// Session types
pub use session::{CommandSender, Session, SessionEvents, SessionState};

// Snapshot types
pub use snapshot::{
    ElementRef, SnapshotDocument, SnapshotOptions, SnapshotProcessor, SnapshotStore,
};

// Transport types
pub use transport::{Connection, Endpoint};
