//! Error types for the AJA bid adapter.
//!
//! Errors are carried inside [`error_stack::Report`] so callers get the full
//! context chain when something goes wrong. Most adapter failures are
//! absorbed locally (logged and skipped); the variants below are what remains
//! visible to the host.

use core::error::Error;

use derive_more::Display;

/// Errors raised by the adapter.
#[derive(Debug, Display)]
pub enum AdapterError {
    /// Configuration could not be loaded or failed validation.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// Exchange response body did not match the expected schema.
    #[display("Invalid exchange response: {message}")]
    InvalidResponse { message: String },

    /// Tracking pixel markup could not be built.
    #[display("Tracking pixel error: {message}")]
    TrackingPixel { message: String },

    /// Outstream renderer could not be installed or rendered.
    #[display("Renderer error: {message}")]
    Renderer { message: String },

    /// Outbound request could not be assembled.
    #[display("Request error: {message}")]
    Request { message: String },
}

impl Error for AdapterError {}
