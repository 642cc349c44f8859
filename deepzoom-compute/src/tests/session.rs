//! End-to-end render sessions.

use crate::backend::{BackendKind, GpuCaps};
use crate::cancel::CancelToken;
use crate::error::SessionError;
use crate::runner::render;
use deepzoom_core::{CollectingSink, NullSink, SessionConfig};

fn small_config() -> SessionConfig {
    let mut config = SessionConfig::new("0", "0", "0.05", 32, 32);
    config.iteration_cap = 200;
    config.worker_count = 2;
    config.board_size = 16;
    config
}

#[test]
fn renders_a_small_frame() {
    let config = small_config();
    let out = render(&config, None, &NullSink, &CancelToken::new()).unwrap();
    assert_eq!(out.backend, BackendKind::Cpu);
    assert_eq!(out.pixels.len(), 32 * 32);

    // The frame spans roughly [-0.8, 0.8]²: the center is inside the set,
    // the corners are well outside it.
    let center = &out.pixels[16 * 32 + 16];
    assert!(!center.escaped);
    let escaped = out.pixels.iter().filter(|p| p.escaped).count();
    let bounded = out.pixels.len() - escaped;
    assert!(escaped > 0);
    assert!(bounded > 0);
    for p in &out.pixels {
        assert!(p.iterations >= 1);
        assert!(p.iterations <= config.iteration_cap);
    }
}

#[test]
fn rendering_is_deterministic_across_runs() {
    let config = small_config();
    let a = render(&config, None, &NullSink, &CancelToken::new()).unwrap();
    let b = render(&config, None, &NullSink, &CancelToken::new()).unwrap();
    assert_eq!(a.pixels, b.pixels);
}

#[test]
fn progress_events_cover_every_pixel() {
    let config = small_config();
    let sink = CollectingSink::new();
    render(&config, None, &sink, &CancelToken::new()).unwrap();

    let events = sink.events();
    assert!(!events.is_empty());
    let resolved: u32 = events.iter().map(|e| e.pixels_resolved).sum();
    assert_eq!(resolved, 32 * 32);
    for event in &events {
        assert!(event.board < 4);
        assert!(event.worker < 2);
    }
}

#[test]
fn gpu_capable_session_reports_gpu_backend() {
    let config = small_config();
    let caps = GpuCaps::default();
    let out = render(&config, Some(&caps), &NullSink, &CancelToken::new()).unwrap();
    assert_eq!(out.backend, BackendKind::Gpu);
}

#[test]
fn oversized_frame_falls_back_to_cpu() {
    let config = small_config();
    let caps = GpuCaps {
        byte_budget: 1024,
        ..GpuCaps::default()
    };
    let out = render(&config, Some(&caps), &NullSink, &CancelToken::new()).unwrap();
    assert_eq!(out.backend, BackendKind::Cpu);
}

#[test]
fn results_serialize_for_downstream_consumers() {
    let config = small_config();
    let out = render(&config, None, &NullSink, &CancelToken::new()).unwrap();
    let json = serde_json::to_string(&out.pixels).unwrap();
    let back: Vec<crate::pixel::PixelResult> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, out.pixels);
}

#[test]
fn cancelled_token_stops_the_session() {
    let token = CancelToken::new();
    token.cancel();
    let err = render(&small_config(), None, &NullSink, &token).unwrap_err();
    assert!(matches!(err, SessionError::Cancelled));
}

#[test]
fn pixel_size_below_f64_range_is_rejected_not_flattened() {
    // Deltas are f64: a pixel size that underflows them would zero every
    // delta_c and return a constant frame. That must be a config error,
    // never a silent success.
    let mut config = small_config();
    config.pixel_size = "1e-400".to_string();
    let err = render(&config, None, &NullSink, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = small_config();
    config.width = 0;
    let err = render(&config, None, &NullSink, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, SessionError::InvalidConfig(_)));
}
