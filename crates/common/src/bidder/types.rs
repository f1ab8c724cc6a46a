//! Core types exchanged between the host auction and bid adapters.

use std::fmt;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use http::Method;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

use crate::constants::{DEFAULT_BID_TTL_SECONDS, DEFAULT_CURRENCY};
use crate::error::AdapterError;
use crate::http_util::join_query;
use crate::renderer::Renderer;

/// Media type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Banner,
    Video,
    Native,
}

/// Bidder-specific parameters attached to an ad unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidParams {
    /// Ad slot identifier, kept as the page config sent it
    #[serde(default)]
    pub asi: Option<Json>,
}

impl BidParams {
    /// The ad slot identifier as a query value, or `None` when it is falsy.
    #[must_use]
    pub fn asi_value(&self) -> Option<String> {
        match self.asi.as_ref().filter(|asi| is_truthy(asi))? {
            Json::String(asi) => Some(asi.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Loose truthiness of a JSON value: null, `false`, `0` and `""` are falsy.
#[must_use]
pub fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(value) => *value,
        Json::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Json::String(value) => !value.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}

/// One bid request created by the host per ad slot per auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub bid_id: String,
    #[serde(default)]
    pub bidder: Option<String>,
    #[serde(default)]
    pub params: BidParams,
    #[serde(default)]
    pub ad_unit_code: String,
}

/// Outbound HTTP request produced by an adapter.
///
/// `data` holds the query string; the host transport appends it to `url`.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    pub method: Method,
    pub url: String,
    pub data: String,
    /// Bid request this call was built for
    pub bid_id: String,
    /// Target element for the ad slot
    pub ad_unit_code: String,
}

impl ServerRequest {
    /// Full request URL with the query string applied.
    #[must_use]
    pub fn full_url(&self) -> String {
        join_query(&self.url, &self.data)
    }

    /// Convert into an [`http::Request`] the host transport can send.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Request`] if the URL is not a valid URI.
    pub fn to_http_request(&self) -> Result<http::Request<()>, Report<AdapterError>> {
        http::Request::builder()
            .method(self.method.clone())
            .uri(self.full_url())
            .body(())
            .change_context(AdapterError::Request {
                message: format!("Failed to build request for bid {}", self.bid_id),
            })
    }
}

/// Response returned by the host transport for one [`ServerRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerResponse {
    pub body: Json,
}

/// Bid in the host's normalized shape, ready for auction ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBid {
    pub bidder_code: String,
    pub request_id: String,
    /// Bid price in CPM
    pub cpm: f64,
    pub creative_id: String,
    pub deal_id: String,
    pub currency: String,
    pub net_revenue: bool,
    /// Seconds the bid stays valid
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Banner markup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vast_xml: Option<String>,
    #[serde(skip)]
    pub renderer: Option<Arc<Renderer>>,
    /// Raw exchange response, kept for the outstream renderer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_response: Option<Json>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_unit_code: Option<String>,
}

impl NormalizedBid {
    /// Create a bid with default currency, TTL and net revenue.
    pub fn new(bidder_code: impl Into<String>, request_id: impl Into<String>, cpm: f64) -> Self {
        Self {
            bidder_code: bidder_code.into(),
            request_id: request_id.into(),
            cpm,
            creative_id: String::new(),
            deal_id: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            net_revenue: true,
            ttl: DEFAULT_BID_TTL_SECONDS,
            media_type: None,
            width: None,
            height: None,
            ad: None,
            vast_xml: None,
            renderer: None,
            ad_response: None,
            ad_unit_code: None,
        }
    }
}

/// Which sync mechanisms the host allows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    #[serde(default)]
    pub pixel_enabled: bool,
    #[serde(default)]
    pub iframe_enabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    Image,
    Iframe,
}

/// User-sync descriptor fired by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSync {
    #[serde(rename = "type")]
    pub sync_type: SyncType,
    pub url: String,
}

impl UserSync {
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            sync_type: SyncType::Image,
            url: url.into(),
        }
    }
}

struct LenientIdVisitor;

impl<'de> Visitor<'de> for LenientIdVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, integer or null identifier")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(String::new())
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(String::new())
    }
}

/// Deserialize an identifier that may arrive as a string, an integer or null.
///
/// Null maps to an empty string.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientIdVisitor)
}
