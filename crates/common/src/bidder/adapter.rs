//! Trait definition for bid adapters.

use error_stack::Report;

use crate::error::AdapterError;

use super::types::{
    BidRequest, MediaType, NormalizedBid, ServerRequest, ServerResponse, SyncOptions, UserSync,
};

/// Trait implemented by every exchange integration.
///
/// The host calls the operations in a fixed sequence per auction round:
/// [`is_bid_request_valid`](Self::is_bid_request_valid) for each ad slot,
/// [`build_requests`](Self::build_requests) once with the valid slots,
/// [`interpret_response`](Self::interpret_response) once per transport
/// response, and finally [`get_user_syncs`](Self::get_user_syncs).
pub trait BidAdapter: Send + Sync {
    /// Unique bidder code (e.g., "aja").
    fn code(&self) -> &'static str;

    /// Media types this adapter can bid on.
    fn supported_media_types(&self) -> &'static [MediaType];

    /// Check whether a bid request carries enough configuration to bid.
    fn is_bid_request_valid(&self, bid: &BidRequest) -> bool;

    /// Translate valid bid requests into outbound HTTP requests.
    fn build_requests(&self, valid_bid_requests: &[BidRequest]) -> Vec<ServerRequest>;

    /// Parse one exchange response into normalized bids.
    ///
    /// No fill is an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidResponse`] when the body does not match
    /// the exchange's schema.
    fn interpret_response(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Result<Vec<NormalizedBid>, Report<AdapterError>>;

    /// Report user-sync pixels to fire after the auction.
    fn get_user_syncs(
        &self,
        _options: &SyncOptions,
        _responses: &[ServerResponse],
    ) -> Vec<UserSync> {
        Vec::new()
    }

    /// Check if this adapter supports a specific media type.
    fn supports_media_type(&self, media_type: &MediaType) -> bool {
        self.supported_media_types().contains(media_type)
    }
}
