use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics collected during extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorMetrics {
    /// Total compilation units attempted
    pub units_attempted: usize,

    /// Units traversed to completion
    pub units_succeeded: usize,

    /// Units that failed or were aborted
    pub units_failed: usize,

    /// Total time spent parsing and traversing
    #[serde(with = "duration_serde")]
    pub total_time: Duration,

    /// Total entities created
    pub total_entities: usize,

    /// Total associations created
    pub total_associations: usize,

    /// Invocations handed to the deferred resolution engine
    pub deferred_invocations: usize,

    /// Deferred invocations resolved to a unique candidate
    pub resolved_invocations: usize,

    /// Deferred invocations left with several candidates
    pub ambiguous_invocations: usize,
}

// Helper module for serializing Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl Default for ExtractorMetrics {
    fn default() -> Self {
        Self {
            units_attempted: 0,
            units_succeeded: 0,
            units_failed: 0,
            total_time: Duration::ZERO,
            total_entities: 0,
            total_associations: 0,
            deferred_invocations: 0,
            resolved_invocations: 0,
            ambiguous_invocations: 0,
        }
    }
}

impl ExtractorMetrics {
    /// Success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.units_attempted == 0 {
            0.0
        } else {
            self.units_succeeded as f64 / self.units_attempted as f64
        }
    }

    /// Share of deferred invocations resolved to a unique candidate
    pub fn resolution_rate(&self) -> f64 {
        if self.deferred_invocations == 0 {
            0.0
        } else {
            self.resolved_invocations as f64 / self.deferred_invocations as f64
        }
    }

    /// Average time per unit
    pub fn avg_unit_time(&self) -> Duration {
        if self.units_succeeded == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.units_succeeded as u32
        }
    }

    /// Merge another metrics object into this one
    pub fn merge(&mut self, other: &ExtractorMetrics) {
        self.units_attempted += other.units_attempted;
        self.units_succeeded += other.units_succeeded;
        self.units_failed += other.units_failed;
        self.total_time += other.total_time;
        self.total_entities += other.total_entities;
        self.total_associations += other.total_associations;
        self.deferred_invocations += other.deferred_invocations;
        self.resolved_invocations += other.resolved_invocations;
        self.ambiguous_invocations += other.ambiguous_invocations;
    }
}
