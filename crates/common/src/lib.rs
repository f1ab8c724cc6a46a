//! AJA exchange bid adapter.
//!
//! This crate plugs the AJA real-time-bidding exchange into a header-bidding
//! host. The host owns the auction and the HTTP transport; the adapter
//! validates ad slot configuration, builds exchange requests, turns exchange
//! responses into normalized bids and reports user-sync pixels.
//!
//! # Modules
//!
//! - [`bidder`]: Host contract, bid types and the adapter registry
//! - [`constants`]: Bidder code, SDK type and default values
//! - [`error`]: Error types and error handling utilities
//! - [`http_util`]: Query-string and tracking-pixel helpers
//! - [`integrations`]: Exchange adapters (currently AJA)
//! - [`logging`]: Logger initialisation
//! - [`renderer`]: Outstream video renderer and player abstraction
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and fixtures

pub mod bidder;
pub mod constants;
pub mod error;
pub mod http_util;
pub mod integrations;
pub mod logging;
pub mod renderer;
pub mod settings;
