//! RunResult - Dispatcher output
//!
//! Per-target outcomes of one triggering event, in registry order.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::{Outcome, TargetName};

/// Complete outcome collection for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Base name of the triggering artifact (used in output keys)
    pub artifact_name: String,

    /// `(short_name, outcome)` pairs in registry order
    outcomes: Vec<(TargetName, Outcome)>,
}

impl RunResult {
    /// Create an empty result for the given artifact
    pub fn new(artifact_name: impl Into<String>) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            outcomes: Vec::new(),
        }
    }

    /// Record a target's outcome, replacing any previous one for that name
    pub fn record(&mut self, name: TargetName, outcome: Outcome) {
        match self.outcomes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = outcome,
            None => self.outcomes.push((name, outcome)),
        }
    }

    pub fn get(&self, short_name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| *n == short_name)
            .map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetName, &Outcome)> {
        self.outcomes.iter().map(|(n, o)| (n, o))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }
}

/// Serializes as the `results` map: short_name -> outcome document,
/// keeping registry order.
impl Serialize for RunResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.outcomes.len()))?;
        for (name, outcome) in &self.outcomes {
            map.serialize_entry(name, outcome)?;
        }
        map.end()
    }
}
