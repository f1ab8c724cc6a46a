/// Bidder code the AJA adapter registers under.
pub const AJA_BIDDER_CODE: &str = "aja";

/// Default exchange endpoint for bid requests.
pub const AJA_DEFAULT_ENDPOINT: &str = "https://ad.as.amanad.adtdp.com/v1/prebid";

/// SDK type reported to the exchange in the `skt` parameter.
pub const AJA_SDK_TYPE: u32 = 5;

/// Currency assumed when the exchange omits one.
pub const DEFAULT_CURRENCY: &str = "JPY";

/// Bid validity in seconds.
pub const DEFAULT_BID_TTL_SECONDS: u32 = 300;

/// Library version sent as `prebid_ver` unless overridden in settings.
pub const ADAPTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for environment variable overrides (`AJA_ADAPTER__AJA__ENDPOINT`).
pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "AJA_ADAPTER";

/// Separator between nested setting keys in environment variables.
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";
