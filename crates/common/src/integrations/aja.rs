//! AJA exchange integration.
//!
//! One GET request per ad slot; the exchange answers with a single ad that is
//! either a banner (markup plus impression pixels) or an outstream video
//! (VAST tag plus a player script). Video bids carry a [`Renderer`] that drives
//! the injected [`VastPlayer`].

use std::fmt;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use http::Method;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;
use validator::Validate;

use crate::bidder::types::deserialize_id;
use crate::bidder::{
    BidAdapter, BidRequest, HostServices, MediaType, NormalizedBid, ServerRequest, ServerResponse,
    SyncOptions, UserSync,
};
use crate::constants::{
    ADAPTER_VERSION, AJA_BIDDER_CODE, AJA_DEFAULT_ENDPOINT, AJA_SDK_TYPE, DEFAULT_BID_TTL_SECONDS,
    DEFAULT_CURRENCY,
};
use crate::error::AdapterError;
use crate::http_util::{create_track_pixel_html, try_append_query_string};
use crate::logging::is_debug_enabled;
use crate::renderer::{Renderer, RendererConfig, VastPlayer, VastPlayerOptions};
use crate::settings::{IntegrationConfig, Settings};

const AJA_SUPPORTED_MEDIA_TYPES: &[MediaType] = &[MediaType::Video, MediaType::Banner];

/// Exchange `ad_type` codes.
const AD_TYPE_BANNER: u64 = 1;
const AD_TYPE_NATIVE: u64 = 2;
const AD_TYPE_VIDEO: u64 = 3;

// ============================================================================
// AJA API Types
// ============================================================================

/// Top-level exchange response.
///
/// `ad` stays raw until fill is confirmed so a no-fill body never fails on
/// ad fields it does not need.
#[derive(Debug, Clone, Deserialize)]
struct AjaResponse {
    #[serde(default, deserialize_with = "deserialize_truthy")]
    is_ad_return: bool,

    #[serde(default)]
    ad: Option<Json>,
}

/// Only the sync list, for [`AjaBidAdapter::get_user_syncs`].
#[derive(Debug, Clone, Default, Deserialize)]
struct AjaSyncs {
    #[serde(default)]
    syncs: Option<Vec<String>>,
}

/// Ad object exactly as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
struct RawAjaAd {
    #[serde(deserialize_with = "deserialize_id")]
    prebid_id: String,

    #[serde(deserialize_with = "deserialize_price")]
    price: f64,

    #[serde(default, deserialize_with = "deserialize_id")]
    creative_id: String,

    #[serde(default, deserialize_with = "deserialize_id")]
    deal_id: String,

    #[serde(default)]
    currency: Option<String>,

    ad_type: u64,

    #[serde(default)]
    banner: Option<AjaBanner>,

    #[serde(default)]
    video: Option<AjaVideo>,
}

/// Banner creative.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AjaBanner {
    w: u32,
    h: u32,
    tag: String,

    /// Impression pixel URLs. Kept loose so one bad entry does not reject the ad.
    #[serde(default)]
    imps: Vec<Json>,
}

/// Outstream video creative.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AjaVideo {
    vtag: String,
    w: u32,
    h: u32,

    /// Player script URL
    #[serde(default)]
    purl: String,

    #[serde(default, deserialize_with = "deserialize_truthy")]
    progress: bool,

    #[serde(rename = "loop", default, deserialize_with = "deserialize_truthy")]
    loop_playback: bool,

    #[serde(default, deserialize_with = "deserialize_truthy")]
    inread: bool,
}

/// Creative variants keyed by `ad_type`.
#[derive(Debug, Clone)]
enum AjaCreative {
    Banner(AjaBanner),
    /// Declared by the exchange but never bid on.
    Native,
    Video(AjaVideo),
    Unknown(u64),
}

/// Decoded ad with its creative resolved.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawAjaAd")]
struct AjaAd {
    prebid_id: String,
    price: f64,
    creative_id: String,
    deal_id: String,
    currency: Option<String>,
    creative: AjaCreative,
}

impl TryFrom<RawAjaAd> for AjaAd {
    type Error = AdapterError;

    fn try_from(raw: RawAjaAd) -> Result<Self, Self::Error> {
        let missing = |field: &str| AdapterError::InvalidResponse {
            message: format!("ad_type {} without {field} object", raw.ad_type),
        };

        let creative = match raw.ad_type {
            AD_TYPE_BANNER => AjaCreative::Banner(raw.banner.ok_or_else(|| missing("banner"))?),
            AD_TYPE_NATIVE => AjaCreative::Native,
            AD_TYPE_VIDEO => AjaCreative::Video(raw.video.ok_or_else(|| missing("video"))?),
            other => AjaCreative::Unknown(other),
        };

        Ok(Self {
            prebid_id: raw.prebid_id,
            price: raw.price,
            creative_id: raw.creative_id,
            deal_id: raw.deal_id,
            currency: raw.currency,
            creative,
        })
    }
}

/// Accepts booleans, numbers, strings and null with loose truthiness.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct TruthyVisitor;

    impl<'de> Visitor<'de> for TruthyVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean, number, string or null")
        }

        fn visit_bool<E>(self, value: bool) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(value != 0)
        }

        fn visit_u64<E>(self, value: u64) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(value != 0)
        }

        fn visit_f64<E>(self, value: f64) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(value != 0.0 && !value.is_nan())
        }

        fn visit_str<E>(self, value: &str) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(!value.is_empty())
        }

        fn visit_unit<E>(self) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(false)
        }

        fn visit_none<E>(self) -> Result<bool, E>
        where
            E: de::Error,
        {
            Ok(false)
        }
    }

    deserializer.deserialize_any(TruthyVisitor)
}

/// Accepts a price sent as a JSON number or as a numeric string.
fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct PriceVisitor;

    impl<'de> Visitor<'de> for PriceVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string")
        }

        fn visit_f64<E>(self, value: f64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(value as f64)
        }

        fn visit_u64<E>(self, value: u64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(value as f64)
        }

        fn visit_str<E>(self, value: &str) -> Result<f64, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|price| price.is_finite())
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(PriceVisitor)
}

// ============================================================================
// AJA Adapter
// ============================================================================

/// Configuration for the AJA integration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AjaConfig {
    /// Whether the AJA integration is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Exchange bid endpoint
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Version reported to the exchange as `prebid_ver`
    #[serde(default = "default_prebid_version")]
    #[validate(length(min = 1))]
    pub prebid_version: String,

    /// Currency used when the exchange omits one
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,

    /// Bid validity in seconds
    #[serde(default = "default_ttl_seconds")]
    #[validate(range(min = 1, max = 3600))]
    pub ttl_seconds: u32,
}

fn default_enabled() -> bool {
    false
}

fn default_endpoint() -> String {
    AJA_DEFAULT_ENDPOINT.to_string()
}

fn default_prebid_version() -> String {
    ADAPTER_VERSION.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_ttl_seconds() -> u32 {
    DEFAULT_BID_TTL_SECONDS
}

impl Default for AjaConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            prebid_version: default_prebid_version(),
            currency: default_currency(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl IntegrationConfig for AjaConfig {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// AJA bid adapter.
pub struct AjaBidAdapter {
    config: AjaConfig,
    vast_player: Arc<dyn VastPlayer>,
}

impl AjaBidAdapter {
    /// Create a new AJA adapter rendering video through `vast_player`.
    #[must_use]
    pub fn new(config: AjaConfig, vast_player: Arc<dyn VastPlayer>) -> Self {
        Self {
            config,
            vast_player,
        }
    }

    /// Query string for one bid request.
    fn to_query_string(&self, bid: &BidRequest) -> String {
        let asi = bid.params.asi_value().unwrap_or_default();

        let query = try_append_query_string(String::new(), "asi", &asi);
        let query = try_append_query_string(query, "skt", &AJA_SDK_TYPE.to_string());
        let query = try_append_query_string(query, "prebid_id", &bid.bid_id);
        try_append_query_string(query, "prebid_ver", &self.config.prebid_version)
    }

    /// Build the normalized bid for a filled response.
    fn to_normalized_bid(
        &self,
        ad: AjaAd,
        body: &Json,
        request: &ServerRequest,
    ) -> NormalizedBid {
        let mut bid = NormalizedBid::new(AJA_BIDDER_CODE, ad.prebid_id.clone(), ad.price);
        bid.creative_id = ad.creative_id;
        bid.deal_id = ad.deal_id;
        bid.currency = ad
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.config.currency.clone());
        bid.ttl = self.config.ttl_seconds;
        if !request.ad_unit_code.is_empty() {
            bid.ad_unit_code = Some(request.ad_unit_code.clone());
        }

        match ad.creative {
            AjaCreative::Video(video) => {
                bid.media_type = Some(MediaType::Video);
                bid.width = Some(video.w);
                bid.height = Some(video.h);
                bid.renderer = self.new_renderer(&ad.prebid_id, &video);
                bid.vast_xml = Some(video.vtag);
                bid.ad_response = Some(body.clone());
            }
            AjaCreative::Banner(banner) => {
                bid.media_type = Some(MediaType::Banner);
                bid.width = Some(banner.w);
                bid.height = Some(banner.h);
                let mut markup = banner.tag.clone();
                match tracking_pixel(&banner) {
                    Ok(pixel) => markup.push_str(&pixel),
                    Err(e) => log::error!("AJA: error appending tracking pixel: {:?}", e),
                }
                bid.ad = Some(markup);
            }
            AjaCreative::Native => {
                log::warn!(
                    "AJA: native ad for bid {} is not supported, returning bid without creative",
                    bid.request_id
                );
            }
            AjaCreative::Unknown(ad_type) => {
                log::warn!(
                    "AJA: unknown ad_type {} for bid {}, returning bid without creative",
                    ad_type,
                    bid.request_id
                );
            }
        }

        bid
    }

    /// Install the outstream renderer for a video bid.
    ///
    /// Failures are logged; the bid is still returned without a renderer.
    fn new_renderer(&self, prebid_id: &str, video: &AjaVideo) -> Option<Arc<Renderer>> {
        let renderer = match Renderer::install(RendererConfig {
            id: prebid_id.to_string(),
            url: video.purl.clone(),
            loaded: false,
        }) {
            Ok(renderer) => renderer,
            Err(e) => {
                log::warn!("AJA: failed to install outstream renderer: {:?}", e);
                return None;
            }
        };

        let player = Arc::clone(&self.vast_player);
        if let Err(e) = renderer.set_render(move |renderer, bid| {
            outstream_render(&player, renderer, bid);
        }) {
            log::warn!("AJA: failed to set render on outstream renderer: {:?}", e);
        }

        Some(Arc::new(renderer))
    }
}

/// Tracking pixel markup for the first impression URL of a banner.
fn tracking_pixel(banner: &AjaBanner) -> Result<String, Report<AdapterError>> {
    let url = banner
        .imps
        .first()
        .ok_or_else(|| {
            Report::new(AdapterError::TrackingPixel {
                message: "banner has no impression urls".to_string(),
            })
        })?
        .as_str()
        .ok_or_else(|| {
            Report::new(AdapterError::TrackingPixel {
                message: "impression url is not a string".to_string(),
            })
        })?;

    create_track_pixel_html(url)
}

/// Render callback for AJA video bids.
///
/// Reads the video creative from the bid's stored response and queues the
/// player `init` call until the player script is loaded.
fn outstream_render(player: &Arc<dyn VastPlayer>, renderer: &Renderer, bid: &NormalizedBid) {
    let video = bid
        .ad_response
        .as_ref()
        .and_then(|body| body.get("ad"))
        .and_then(|ad| ad.get("video"))
        .ok_or_else(|| {
            Report::new(AdapterError::Renderer {
                message: "bid has no video response".to_string(),
            })
        })
        .and_then(|video| {
            AjaVideo::deserialize(video).change_context(AdapterError::Renderer {
                message: "stored video response is malformed".to_string(),
            })
        });

    let video = match video {
        Ok(video) => video,
        Err(e) => {
            log::warn!("AJA: cannot render bid {}: {:?}", bid.request_id, e);
            return;
        }
    };

    let options = VastPlayerOptions {
        vast_tag: video.vtag,
        ad_unit_code: bid.ad_unit_code.clone().unwrap_or_default(),
        progress: video.progress,
        loop_playback: video.loop_playback,
        inread: video.inread,
    };

    log::debug!(
        "AJA: queueing player init for bid {} into '{}'",
        bid.request_id,
        options.ad_unit_code
    );

    let player = Arc::clone(player);
    renderer.push(move || player.init(options));
}

impl BidAdapter for AjaBidAdapter {
    fn code(&self) -> &'static str {
        AJA_BIDDER_CODE
    }

    fn supported_media_types(&self) -> &'static [MediaType] {
        AJA_SUPPORTED_MEDIA_TYPES
    }

    fn is_bid_request_valid(&self, bid: &BidRequest) -> bool {
        bid.params.asi_value().is_some()
    }

    fn build_requests(&self, valid_bid_requests: &[BidRequest]) -> Vec<ServerRequest> {
        log::debug!(
            "AJA: building requests for {} bids",
            valid_bid_requests.len()
        );

        valid_bid_requests
            .iter()
            .map(|bid| ServerRequest {
                method: Method::GET,
                url: self.config.endpoint.clone(),
                data: self.to_query_string(bid),
                bid_id: bid.bid_id.clone(),
                ad_unit_code: bid.ad_unit_code.clone(),
            })
            .collect()
    }

    fn interpret_response(
        &self,
        response: &ServerResponse,
        request: &ServerRequest,
    ) -> Result<Vec<NormalizedBid>, Report<AdapterError>> {
        let envelope: AjaResponse = serde_json::from_value(response.body.clone()).change_context(
            AdapterError::InvalidResponse {
                message: "Failed to parse AJA response body".to_string(),
            },
        )?;

        if is_debug_enabled() {
            log::debug!(
                "AJA: response for bid {}: {}",
                request.bid_id,
                serde_json::to_string(&response.body).unwrap_or_default()
            );
        }

        if !envelope.is_ad_return {
            log::debug!("AJA: no fill for bid {}", request.bid_id);
            return Ok(Vec::new());
        }

        let raw_ad = envelope.ad.ok_or_else(|| {
            Report::new(AdapterError::InvalidResponse {
                message: "is_ad_return set without ad".to_string(),
            })
        })?;

        let ad: AjaAd =
            serde_json::from_value(raw_ad).change_context(AdapterError::InvalidResponse {
                message: format!("Failed to parse AJA ad for bid {}", request.bid_id),
            })?;

        let bid = self.to_normalized_bid(ad, &response.body, request);

        log::debug!(
            "AJA: bid {} cpm {} {} ({:?})",
            bid.request_id,
            bid.cpm,
            bid.currency,
            bid.media_type
        );

        Ok(vec![bid])
    }

    fn get_user_syncs(
        &self,
        options: &SyncOptions,
        responses: &[ServerResponse],
    ) -> Vec<UserSync> {
        if !options.pixel_enabled {
            return Vec::new();
        }

        // Only the first response is consulted.
        let Some(first) = responses.first() else {
            return Vec::new();
        };

        match AjaSyncs::deserialize(&first.body) {
            Ok(AjaSyncs { syncs: Some(syncs) }) => {
                syncs.into_iter().map(UserSync::image).collect()
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                log::warn!("AJA: ignoring malformed sync list: {}", e);
                Vec::new()
            }
        }
    }
}

// ============================================================================
// Adapter Auto-Registration
// ============================================================================

/// Auto-register the AJA adapter based on settings configuration.
///
/// Returns the adapter if enabled in settings.
#[must_use]
pub fn register_bidders(
    settings: &Settings,
    services: &HostServices,
) -> Vec<Arc<dyn BidAdapter>> {
    let mut adapters: Vec<Arc<dyn BidAdapter>> = Vec::new();

    match settings.integration_config::<AjaConfig>(AJA_BIDDER_CODE) {
        Ok(Some(config)) => {
            log::info!(
                "Registering AJA adapter (endpoint: {}, prebid_ver: {})",
                config.endpoint,
                config.prebid_version
            );
            adapters.push(Arc::new(AjaBidAdapter::new(
                config,
                Arc::clone(&services.vast_player),
            )));
        }
        Ok(None) => {
            log::debug!("AJA integration is missing or disabled");
        }
        Err(e) => {
            log::error!("Failed to load AJA configuration: {:?}", e);
        }
    }

    adapters
}

// ============================================================================
// Tests
// ============================================================================
