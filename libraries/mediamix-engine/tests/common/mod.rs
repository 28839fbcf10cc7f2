//! Shared helpers for engine integration tests

use mediamix_engine::headless::{HeadlessContext, HeadlessDocument};
use mediamix_engine::{EngineConfig, MixerEndpoint, Notification};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

static INIT: Once = Once::new();

pub type TestEngine = MixerEndpoint<HeadlessDocument, HeadlessContext>;

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Engine over `document` with a notifier recording every notification
pub fn engine_with(
    document: &HeadlessDocument,
    config: EngineConfig,
) -> (TestEngine, Rc<RefCell<Vec<Notification>>>) {
    init_tracing();

    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);

    let mut engine = MixerEndpoint::new(
        document.clone(),
        || Ok(HeadlessContext::new()),
        config,
    );
    engine.set_notifier(move |notification| sink.borrow_mut().push(*notification));

    (engine, received)
}

pub fn engine(document: &HeadlessDocument) -> (TestEngine, Rc<RefCell<Vec<Notification>>>) {
    engine_with(document, EngineConfig::default())
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Route gains are single precision
pub fn assert_gain(actual: Option<f32>, expected: f64) {
    let actual = actual.expect("element is not routed");
    assert!(
        (f64::from(actual) - expected).abs() < 1e-6,
        "expected gain {expected}, got {actual}"
    );
}
