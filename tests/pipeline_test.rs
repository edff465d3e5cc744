//! End-to-end gesture tests: overlay selection, shrink ladder and delivery
//! to a mock backend. No display is needed; the "screen" is synthetic.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine};
use common::MockBackend;
use desktop_eye_lib::encode::{Attempt, EncodeError, Shrinker};
use desktop_eye_lib::error::EyeError;
use desktop_eye_lib::overlay::{CancelReason, Outcome, OverlayState, SelectionOverlay};
use desktop_eye_lib::pipeline;
use desktop_eye_lib::transport::{InjectClient, Mode};
use image::{DynamicImage, Rgba, RgbaImage};
use std::time::Duration;

fn desktop(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    }))
}

fn drag(overlay: &SelectionOverlay, from: (f64, f64), to: (f64, f64)) -> Outcome {
    overlay.pointer_down(from.0, from.1).unwrap();
    overlay.pointer_move(to.0, to.1).unwrap();
    overlay.pointer_up(to.0, to.1).unwrap()
}

#[tokio::test]
async fn drag_on_full_hd_capture_reaches_backend_as_png() {
    let overlay = SelectionOverlay::default();
    let ticket = overlay.reserve().expect("gate should be free");
    let info = overlay.arm(ticket, desktop(1920, 1080));
    assert_eq!((info.width, info.height), (1920, 1080));

    let image = match drag(&overlay, (100.0, 100.0), (500.0, 400.0)) {
        Outcome::Committed { rect, image } => {
            assert_eq!((rect.width(), rect.height()), (400, 300));
            image
        }
        Outcome::Cancelled(reason) => panic!("expected commit, got {:?}", reason),
    };
    assert_eq!(overlay.state(), OverlayState::Idle);

    let backend = MockBackend::ok();
    let client = InjectClient::with_url(backend.url.clone(), Duration::from_secs(10)).unwrap();
    let delivery = pipeline::deliver(&client, Shrinker::default(), image, "  what is this?  ", Mode::Active)
        .await
        .unwrap();
    assert_eq!(delivery.attempt, Attempt::Png);
    assert_eq!(delivery.mode, Mode::Active);

    let seen = backend.captured().expect("backend saw no request");
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/api/eye/inject");
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    assert_eq!(seen.body["mode"], "active");
    assert_eq!(seen.body["message"], "what is this?");

    let b64 = seen.body["image"].as_str().unwrap();
    assert!(!b64.is_empty());
    let decoded = image::load_from_memory(&STANDARD.decode(b64).unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (400, 300));
}

#[test]
fn tiny_drag_cancels_without_a_crop() {
    let overlay = SelectionOverlay::default();
    let ticket = overlay.reserve().unwrap();
    overlay.arm(ticket, desktop(200, 200));

    match drag(&overlay, (50.0, 50.0), (55.0, 52.0)) {
        Outcome::Cancelled(CancelReason::TooSmall(rect)) => {
            assert_eq!((rect.width(), rect.height()), (5, 2));
        }
        Outcome::Cancelled(reason) => panic!("unexpected cancel reason {:?}", reason),
        Outcome::Committed { .. } => panic!("4x2-ish drag must not commit"),
    }

    // Session is over, so a new trigger is accepted.
    assert!(overlay.reserve().is_some());
}

#[test]
fn second_trigger_while_selecting_is_ignored() {
    let overlay = SelectionOverlay::default();
    let ticket = overlay.reserve().unwrap();
    assert_eq!(overlay.state(), OverlayState::Reserved);
    assert!(overlay.reserve().is_none());

    overlay.arm(ticket, desktop(64, 64));
    assert!(overlay.reserve().is_none());

    assert!(overlay.cancel().is_some());
    assert!(overlay.cancel().is_none());
    assert_eq!(overlay.state(), OverlayState::Idle);
}

#[tokio::test]
async fn passive_mode_is_forwarded() {
    let backend = MockBackend::ok();
    let client = InjectClient::with_url(backend.url.clone(), Duration::from_secs(10)).unwrap();

    let delivery = pipeline::deliver(&client, Shrinker::default(), desktop(120, 80), "", Mode::Passive)
        .await
        .unwrap();
    assert_eq!(delivery.status_line(), "✦ Shared as silent context");

    let seen = backend.captured().unwrap();
    assert_eq!(seen.body["mode"], "passive");
    assert_eq!(seen.body["message"], "");
}

#[tokio::test]
async fn oversized_capture_is_never_sent() {
    let client = InjectClient::with_url(common::closed_url(), Duration::from_secs(1)).unwrap();

    let err = pipeline::deliver(&client, Shrinker::with_budget(64), desktop(300, 300), "", Mode::Active)
        .await
        .unwrap_err();

    match &err {
        EyeError::Encode(EncodeError::PayloadTooLarge {
            attempts,
            last_attempt,
            budget,
            ..
        }) => {
            assert_eq!(*attempts, 3);
            assert_eq!(*last_attempt, Attempt::HalfJpeg);
            assert_eq!(*budget, 64);
        }
        other => panic!("expected PayloadTooLarge, got {:?}", other),
    }
    assert!(!err.is_retryable());
    assert!(err.user_message().contains("select a smaller region"));
}
