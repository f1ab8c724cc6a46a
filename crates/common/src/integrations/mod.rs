//! Exchange integrations and their registration hooks.

use std::sync::Arc;

use crate::bidder::{BidAdapter, HostServices};
use crate::settings::Settings;

pub mod aja;

type BidderBuilder = fn(&Settings, &HostServices) -> Vec<Arc<dyn BidAdapter>>;

/// Returns the list of all available adapter builder functions.
///
/// Each builder checks the settings for its own integration section and
/// returns any enabled adapters.
pub(crate) fn builders() -> &'static [BidderBuilder] {
    &[aja::register_bidders]
}
