//! Drives the AJA adapter through the same sequence a host auction uses:
//! validate, build, send (simulated), interpret, sync.

use std::sync::{Arc, Mutex};

use aja_adapter_common::bidder::{
    build_registry, BidRequest, HostServices, MediaType, ServerResponse, SyncOptions, SyncType,
};
use aja_adapter_common::renderer::{VastPlayer, VastPlayerOptions};
use aja_adapter_common::settings::Settings;
use serde_json::json;

#[derive(Default)]
struct RecordingPlayer {
    calls: Mutex<Vec<VastPlayerOptions>>,
}

impl VastPlayer for RecordingPlayer {
    fn init(&self, options: VastPlayerOptions) {
        self.calls
            .lock()
            .expect("player lock poisoned")
            .push(options);
    }
}

fn settings() -> Settings {
    Settings::from_toml(
        r#"
        [integrations.aja]
        enabled = true
        endpoint = "https://exchange.example/v1/prebid"
        prebid_version = "1.0.0"
        "#,
    )
    .expect("settings should load")
}

fn bid_requests() -> Vec<BidRequest> {
    serde_json::from_value(json!([
        { "bidId": "banner-bid", "bidder": "aja", "adUnitCode": "div-banner", "params": { "asi": "asi-banner" } },
        { "bidId": "video-bid", "bidder": "aja", "adUnitCode": "div-video", "params": { "asi": 4242 } },
        { "bidId": "no-asi", "bidder": "aja", "adUnitCode": "div-none", "params": {} },
        { "bidId": "zero-asi", "bidder": "aja", "adUnitCode": "div-zero", "params": { "asi": 0 } }
    ]))
    .expect("bid requests should deserialize")
}

/// Stand-in for the exchange, keyed on the `prebid_id` query parameter.
fn exchange_response(url: &str) -> ServerResponse {
    let body = if url.contains("prebid_id=banner-bid") {
        json!({
            "is_ad_return": true,
            "ad": {
                "ad_type": 1,
                "prebid_id": "banner-bid",
                "price": 150,
                "creative_id": "cr-banner",
                "deal_id": "",
                "banner": {
                    "w": 300,
                    "h": 250,
                    "tag": "<div>banner</div>",
                    "imps": ["https://imp.example/px?b=1"]
                }
            },
            "syncs": ["https://sync.example/1", "https://sync.example/2"]
        })
    } else {
        json!({
            "is_ad_return": true,
            "ad": {
                "ad_type": 3,
                "prebid_id": "video-bid",
                "price": 300.5,
                "creative_id": "cr-video",
                "deal_id": "deal-9",
                "currency": "USD",
                "video": {
                    "vtag": "<VAST/>",
                    "w": 640,
                    "h": 480,
                    "purl": "//player.example/aja_vast_player.js",
                    "progress": false,
                    "loop": true,
                    "inread": false
                }
            },
            "syncs": ["https://sync.example/ignored"]
        })
    };
    ServerResponse { body }
}

#[test]
fn test_full_auction_round() {
    let player = Arc::new(RecordingPlayer::default());
    let registry = build_registry(&settings(), &HostServices::new(player.clone()));
    let aja = registry.get("aja").expect("aja should be registered");

    let valid: Vec<BidRequest> = bid_requests()
        .into_iter()
        .filter(|bid| aja.is_bid_request_valid(bid))
        .collect();
    assert_eq!(valid.len(), 2);

    let requests = aja.build_requests(&valid);
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].full_url(),
        "https://exchange.example/v1/prebid?asi=4242&skt=5&prebid_id=video-bid&prebid_ver=1.0.0"
    );

    let mut responses = Vec::new();
    let mut bids = Vec::new();
    for request in &requests {
        let http_request = request.to_http_request().expect("request should be valid");
        let response = exchange_response(&http_request.uri().to_string());
        bids.extend(
            aja.interpret_response(&response, request)
                .expect("response should parse"),
        );
        responses.push(response);
    }

    assert_eq!(bids.len(), 2);

    let banner = &bids[0];
    assert_eq!(banner.media_type, Some(MediaType::Banner));
    assert_eq!(banner.currency, "JPY");
    assert_eq!(banner.cpm, 150.0);
    let markup = banner.ad.as_deref().expect("banner markup");
    assert!(markup.starts_with("<div>banner</div>"));
    assert!(markup.contains("https://imp.example/px?b=1"));

    let video = &bids[1];
    assert_eq!(video.media_type, Some(MediaType::Video));
    assert_eq!(video.currency, "USD");
    assert_eq!(video.vast_xml.as_deref(), Some("<VAST/>"));
    let renderer = video.renderer.as_ref().expect("video renderer");
    assert_eq!(renderer.url(), "//player.example/aja_vast_player.js");

    // Host paints the slot, then the player script finishes loading.
    renderer.render(video).expect("render should be bound");
    renderer.mark_loaded();
    let calls = player.calls.lock().expect("player lock poisoned").clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ad_unit_code, "div-video");
    assert!(calls[0].loop_playback);

    let syncs = aja.get_user_syncs(
        &SyncOptions {
            pixel_enabled: true,
            iframe_enabled: false,
        },
        &responses,
    );
    let urls: Vec<&str> = syncs.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls, vec!["https://sync.example/1", "https://sync.example/2"]);
    assert!(syncs.iter().all(|s| s.sync_type == SyncType::Image));
}
