//! Progress notifications emitted while a comparison runs.
//!
//! Events are advisory: an observer can print or collect them, but nothing
//! it does changes the [`ComparisonResult`](crate::ComparisonResult).

use crate::model::{ComparisonSummary, Side, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconEvent {
    StrategySelected { strategy: Strategy, key_column: String },
    RowsReceived { source: usize, target: usize },
    /// A key occurred more than once on one side and one row was dropped.
    DuplicateKey { side: Side, key: String },
    /// Several content-identical rows collapsed into one fingerprint.
    DuplicateFingerprint { side: Side, fingerprint: String },
    Completed { summary: ComparisonSummary },
}

pub trait ReconObserver {
    fn on_event(&mut self, event: &ReconEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ReconObserver for NoopObserver {
    fn on_event(&mut self, _event: &ReconEvent) {}
}

/// Records events in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingObserver {
    pub events: Vec<ReconEvent>,
}

impl ReconObserver for CollectingObserver {
    fn on_event(&mut self, event: &ReconEvent) {
        self.events.push(event.clone());
    }
}
