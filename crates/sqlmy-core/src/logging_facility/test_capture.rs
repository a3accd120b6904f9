//! In-memory event capture for tests
//!
//! Two ways in: `init_test_capture` installs one global capture layer for
//! the whole test binary, and `capture` records only the events raised inside
//! a closure on the current thread. Tests sharing the global capture should
//! filter by a unique op name.

use super::visitor::FieldVisitor;
use crate::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE};
use crate::singleton::Singleton;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    /// Every field, including `component`, `op` and `event`
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_boundary(&self) -> bool {
        matches!(
            self.event.as_deref(),
            Some(EVENT_START | EVENT_END | EVENT_END_ERROR)
        )
    }

    /// Stable error code of an `end_error` boundary
    pub fn error_code(&self) -> Option<&str> {
        self.field(FIELD_ERR_CODE)
    }
}

/// Layer appending every event to a shared buffer
pub struct TestCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let capture = TestCapture {
            events: events.clone(),
        };
        (Self { events }, capture)
    }
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let visitor = FieldVisitor::collect(event);
        let captured = CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            component: visitor.get("component").map(str::to_string),
            op: visitor.get("op").map(str::to_string),
            event: visitor.get("event").map(str::to_string),
            fields: visitor.into_fields(),
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Read side of a capture layer
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.op.as_deref() == Some(op))
            .collect()
    }

    /// Boundary event names logged for `op`, in order
    pub fn boundaries(&self, op: &str) -> Vec<String> {
        self.events_for_op(op)
            .into_iter()
            .filter(CapturedEvent::is_boundary)
            .filter_map(|e| e.event)
            .collect()
    }

    /// # Panics
    ///
    /// If no event with this op and event name was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        let found = events
            .iter()
            .any(|e| e.op.as_deref() == Some(op) && e.event.as_deref() == Some(event));
        assert!(
            found,
            "no {} event for op {} among {} captured events",
            event,
            op,
            events.len()
        );
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

static GLOBAL_CAPTURE: Singleton<TestCapture> = Singleton::new();

/// Install a capture layer as the global subscriber, once per process
///
/// ```
/// use sqlmy_core::logging_facility::test_capture::init_test_capture;
/// use sqlmy_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("my_operation");
/// capture.assert_event_exists("my_operation", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    let capture = GLOBAL_CAPTURE.get_or_init(|| {
        let (layer, capture) = TestCaptureLayer::new();
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            eprintln!("sqlmy: a global subscriber is already set; capture will stay empty");
        }
        capture
    });
    TestCapture::clone(&capture)
}

/// Run `f` with a capture layer as the thread's default subscriber
///
/// Returns the value of `f` and the events it raised.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, TestCapture) {
    let (layer, capture) = TestCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, capture)
}
