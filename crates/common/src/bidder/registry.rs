use std::sync::Arc;

use crate::renderer::VastPlayer;

use super::adapter::BidAdapter;

/// Capabilities the host lends to adapters at registration time.
#[derive(Clone)]
pub struct HostServices {
    /// Outstream video player SDK exposed by the page
    pub vast_player: Arc<dyn VastPlayer>,
}

impl HostServices {
    #[must_use]
    pub fn new(vast_player: Arc<dyn VastPlayer>) -> Self {
        Self { vast_player }
    }
}

/// Registered bid adapters, keyed by bidder code.
#[derive(Clone, Default)]
pub struct BidderRegistry {
    adapters: Vec<Arc<dyn BidAdapter>>,
}

impl BidderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. A later registration replaces one with the same code.
    pub fn register(&mut self, adapter: Arc<dyn BidAdapter>) {
        let code = adapter.code();
        if let Some(existing) = self.adapters.iter_mut().find(|a| a.code() == code) {
            log::warn!("Bidder '{}' registered twice, replacing", code);
            *existing = adapter;
            return;
        }
        log::info!("Registered bidder '{}'", code);
        self.adapters.push(adapter);
    }

    /// Look up an adapter by bidder code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<Arc<dyn BidAdapter>> {
        self.adapters.iter().find(|a| a.code() == code).cloned()
    }

    /// Codes of all registered adapters, in registration order.
    #[must_use]
    pub fn codes(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.code()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
