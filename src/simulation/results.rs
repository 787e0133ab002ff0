// src/simulation/results.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Occurrence counts of measurement outcomes for one `(circuit, shots)` run.
///
/// Keys are bit strings with the highest measured qubit first. Outcomes that
/// were never observed are absent. Read-only once produced by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrequencyTable {
    shots: u64,
    counts: BTreeMap<String, u64>,
}

impl FrequencyTable {
    /// Creates an empty table for a run of `shots` samples.
    pub fn new(shots: u64) -> Self {
        Self { shots, counts: BTreeMap::new() }
    }

    /// Sets the count for an outcome, replacing any previous value.
    /// Zero counts are dropped.
    pub fn insert(&mut self, outcome: impl Into<String>, count: u64) {
        let outcome = outcome.into();
        if count == 0 {
            self.counts.remove(&outcome);
        } else {
            self.counts.insert(outcome, count);
        }
    }

    pub(crate) fn increment(&mut self, outcome: &str) {
        *self.counts.entry(outcome.to_string()).or_insert(0) += 1;
    }

    /// Number of samples the run was asked for.
    pub fn shots(&self) -> u64 {
        self.shots
    }

    /// Count for an outcome, 0 if absent.
    pub fn count(&self, outcome: &str) -> u64 {
        self.counts.get(outcome).copied().unwrap_or(0)
    }

    /// Sum of all recorded counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of distinct observed outcomes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frequency Table ({} shots):", self.shots)?;
        if self.counts.is_empty() {
            writeln!(f, "  No outcomes recorded.")?;
        }
        for (outcome, count) in &self.counts {
            writeln!(f, "  {}: {}", outcome, count)?;
        }
        Ok(())
    }
}

/// Exact outcome probabilities of a circuit, i.e. the infinite-shot limit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OutcomeDistribution {
    probabilities: BTreeMap<String, f64>,
}

impl OutcomeDistribution {
    pub(crate) fn from_map(probabilities: BTreeMap<String, f64>) -> Self {
        Self { probabilities }
    }

    /// Probability of an outcome, 0 if absent.
    pub fn probability(&self, outcome: &str) -> f64 {
        self.probabilities.get(outcome).copied().unwrap_or(0.0)
    }

    /// Sum over all outcomes; 1 for a normalized state.
    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probabilities.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}
