//! Analytics side channel
//!
//! Terminal transitions report what happened through an `AnalyticsSink`.
//! Recording is fire-and-forget: the trait has no error path, and sinks must
//! never panic or block on behalf of the caller.

use parking_lot::Mutex;
use tracing::info;

pub const CATEGORY_INTERACTION: &str = "Terminal Interaction";
pub const CATEGORY_ERROR: &str = "Terminal Error";

/// One analytics event (`gtag`-style action/category/label/value)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub category: String,
    pub label: Option<String>,
    pub value: Option<i64>,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            label: None,
            value: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }
}

/// Destination for analytics events
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&self, _event: AnalyticsEvent) {}
}

/// Emits events as structured `tracing` records under the `analytics` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, event: AnalyticsEvent) {
        info!(
            target: "analytics",
            event = %event.name,
            category = %event.category,
            label = event.label.as_deref().unwrap_or(""),
            value = event.value.unwrap_or(0),
            "analytics event"
        );
    }
}

/// Keeps events in memory, mostly for inspection in tests
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }

    /// Event names in recording order
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.name.clone()).collect()
    }
}

impl AnalyticsSink for MemorySink {
    fn record(&self, event: AnalyticsEvent) {
        self.events.lock().push(event);
    }
}
