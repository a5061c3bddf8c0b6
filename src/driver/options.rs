//! Connection tuning options.
//!
//! Timeouts and limits applied by a [`Connection`](crate::transport::Connection).
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use cdp_pilot::ConnectionOptions;
//!
//! let options = ConnectionOptions::new()
//!     .with_command_timeout(Duration::from_secs(5))
//!     .with_max_pending_requests(64);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time to wait for a command response.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time to wait for the TCP connect and WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cap on in-flight requests.
pub const DEFAULT_MAX_PENDING_REQUESTS: usize = 256;

/// Default number of consecutive undecodable frames before teardown.
pub const DEFAULT_MAX_MALFORMED_MESSAGES: usize = 16;

/// Default event broadcast buffer.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Timeouts and limits for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Per-command response timeout.
    pub command_timeout: Duration,

    /// Connect and handshake timeout.
    pub connect_timeout: Duration,

    /// Requests allowed in flight before new ones are rejected.
    pub max_pending_requests: usize,

    /// Consecutive malformed frames tolerated before the connection closes.
    pub max_malformed_messages: usize,

    /// Capacity of the event broadcast channel. Slow subscribers lag.
    pub event_buffer: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectionOptions {
    /// Creates options with default values.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
            max_malformed_messages: DEFAULT_MAX_MALFORMED_MESSAGES,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionOptions {
    /// Sets the per-command timeout.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the in-flight request cap.
    #[inline]
    #[must_use]
    pub fn with_max_pending_requests(mut self, max: usize) -> Self {
        self.max_pending_requests = max;
        self
    }

    /// Sets the malformed frame threshold.
    #[inline]
    #[must_use]
    pub fn with_max_malformed_messages(mut self, max: usize) -> Self {
        self.max_malformed_messages = max;
        self
    }

    /// Sets the event buffer capacity.
    #[inline]
    #[must_use]
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ConnectionOptions {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero timeouts or zero limits.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout.is_zero() {
            return Err(Error::config("command_timeout must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be greater than zero"));
        }
        if self.max_pending_requests == 0 {
            return Err(Error::config("max_pending_requests must be at least 1"));
        }
        if self.max_malformed_messages == 0 {
            return Err(Error::config("max_malformed_messages must be at least 1"));
        }
        if self.event_buffer == 0 {
            return Err(Error::config("event_buffer must be at least 1"));
        }
        Ok(())
    }

    /// Replaces every zero timeout or limit with its default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::new();
        Self {
            command_timeout: nonzero_duration(self.command_timeout, defaults.command_timeout),
            connect_timeout: nonzero_duration(self.connect_timeout, defaults.connect_timeout),
            max_pending_requests: nonzero(self.max_pending_requests, defaults.max_pending_requests),
            max_malformed_messages: nonzero(
                self.max_malformed_messages,
                defaults.max_malformed_messages,
            ),
            event_buffer: nonzero(self.event_buffer, defaults.event_buffer),
        }
    }
}

fn nonzero(value: usize, default: usize) -> usize {
    if value == 0 { default } else { value }
}

fn nonzero_duration(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConnectionOptions::default();
        assert_eq!(options.command_timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert_eq!(options.max_pending_requests, 256);
        assert_eq!(options.max_malformed_messages, 16);
        assert_eq!(options.event_buffer, 1024);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = ConnectionOptions::new()
            .with_command_timeout(Duration::from_millis(250))
            .with_connect_timeout(Duration::from_secs(1))
            .with_max_pending_requests(4)
            .with_max_malformed_messages(2)
            .with_event_buffer(8);

        assert_eq!(options.command_timeout, Duration::from_millis(250));
        assert_eq!(options.connect_timeout, Duration::from_secs(1));
        assert_eq!(options.max_pending_requests, 4);
        assert_eq!(options.max_malformed_messages, 2);
        assert_eq!(options.event_buffer, 8);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let zero_timeout = ConnectionOptions::new().with_command_timeout(Duration::ZERO);
        assert!(matches!(zero_timeout.validate(), Err(Error::Config { .. })));

        let zero_pending = ConnectionOptions::new().with_max_pending_requests(0);
        assert!(matches!(zero_pending.validate(), Err(Error::Config { .. })));

        let zero_buffer = ConnectionOptions::new().with_event_buffer(0);
        assert!(zero_buffer.validate().is_err());
    }

    #[test]
    fn test_sanitized_replaces_only_zero_values() {
        let options = ConnectionOptions::new()
            .with_command_timeout(Duration::ZERO)
            .with_max_malformed_messages(0)
            .with_max_pending_requests(3)
            .sanitized();

        assert_eq!(options.command_timeout, DEFAULT_COMMAND_TIMEOUT);
        assert_eq!(options.max_malformed_messages, DEFAULT_MAX_MALFORMED_MESSAGES);
        assert_eq!(options.max_pending_requests, 3);
        assert!(options.validate().is_ok());
    }
}
