//! Host-side bidding contract shared by all exchange integrations.
//!
//! The host orchestrator owns the auction; this module only defines what an
//! adapter must provide ([`BidAdapter`]), the data that flows through it, and
//! the registry adapters are installed into.
//!
//! Note: Individual adapters are located in the `integrations` module
//! (e.g., `crate::integrations::aja`).

use crate::settings::Settings;

pub mod adapter;
pub mod registry;
pub mod types;

pub use adapter::BidAdapter;
pub use registry::{BidderRegistry, HostServices};
pub use types::{
    BidParams, BidRequest, MediaType, NormalizedBid, ServerRequest, ServerResponse, SyncOptions,
    SyncType, UserSync,
};

/// Build a registry with every adapter enabled in `settings`.
///
/// Each integration's builder checks the settings for its own section and
/// returns the adapters it wants registered.
#[must_use]
pub fn build_registry(settings: &Settings, services: &HostServices) -> BidderRegistry {
    log::info!("Building bidder registry");

    let mut registry = BidderRegistry::new();

    for builder in crate::integrations::builders() {
        for adapter in builder(settings, services) {
            registry.register(adapter);
        }
    }

    log::info!("Bidder registry built with {} adapters", registry.len());

    registry
}
