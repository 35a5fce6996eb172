use std::collections::HashMap;

use serde::Serialize;

use appointly_core::{Label, RunId};

/// Result of dispatching one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The backend accepted the request and the label was marked.
    Done,
    /// The label was already marked; no request was sent.
    Skipped,
    /// Every attempt failed (or the marker could not be read).
    Failed,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Done => "done",
            DispatchOutcome::Skipped => "skipped",
            DispatchOutcome::Failed => "failed",
        }
    }
}

impl core::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome per label for one dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub run_id: RunId,
    pub outcomes: HashMap<Label, DispatchOutcome>,
}

impl DispatchReport {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            outcomes: HashMap::new(),
        }
    }

    /// Record an outcome; a repeated label keeps the latest value.
    pub fn record(&mut self, label: Label, outcome: DispatchOutcome) {
        self.outcomes.insert(label, outcome);
    }

    pub fn get(&self, label: &Label) -> Option<DispatchOutcome> {
        self.outcomes.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, DispatchOutcome)> {
        self.outcomes.iter().map(|(l, o)| (l, *o))
    }

    fn count(&self, outcome: DispatchOutcome) -> usize {
        self.outcomes.values().filter(|o| **o == outcome).count()
    }

    pub fn done(&self) -> usize {
        self.count(DispatchOutcome::Done)
    }

    pub fn skipped(&self) -> usize {
        self.count(DispatchOutcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(DispatchOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_serialize_as_lowercase_words() {
        assert_eq!(serde_json::to_value(DispatchOutcome::Skipped).unwrap(), "skipped");
        assert_eq!(DispatchOutcome::Done.to_string(), "done");
    }

    #[test]
    fn report_counts_by_outcome() {
        let mut report = DispatchReport::new(RunId::new());
        report.record(Label::new("daily"), DispatchOutcome::Done);
        report.record(Label::new("weekly"), DispatchOutcome::Failed);
        report.record(Label::new("weekly"), DispatchOutcome::Skipped);

        assert_eq!(report.len(), 2);
        assert_eq!(report.done(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.get(&Label::new("weekly")), Some(DispatchOutcome::Skipped));
    }
}
