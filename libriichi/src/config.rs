use crate::meld::SequenceCallRule;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Tunables of the [`Detector`](crate::state::Detector).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Which seats may complete a sequence off a discard.
    pub sequence_call_rule: SequenceCallRule,

    /// How many emitted actions the dedup ledger remembers within one game.
    pub ledger_capacity: usize,

    /// Skip all detection when a snapshot's zones equal the previous ones.
    pub skip_identical: bool,

    /// Stamp events with the dora each indicator designates instead of the
    /// indicators themselves.
    pub resolve_dora_indicators: bool,

    /// For how many snapshots a meld group no call explains is held back,
    /// waiting for the discard it was called off. 1 accepts it at once.
    pub pending_meld_ticks: u8,
}

impl DetectorConfig {
    #[must_use]
    pub const fn new(sequence_call_rule: SequenceCallRule) -> Self {
        Self {
            sequence_call_rule,
            ledger_capacity: 256,
            skip_identical: true,
            resolve_dora_indicators: false,
            pending_meld_ticks: 3,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("failed to parse detector config")?;
        ensure!(config.ledger_capacity > 0, "ledger_capacity must be positive");
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&json)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new(SequenceCallRule::FixedSeats)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DetectorConfig::from_json(r#"{"sequence_call_rule": "after_discarder"}"#)
            .unwrap();
        assert_eq!(config.sequence_call_rule, SequenceCallRule::AfterDiscarder);
        assert_eq!(config.ledger_capacity, 256);
        assert!(config.skip_identical);
        assert!(!config.resolve_dora_indicators);
        assert_eq!(config.pending_meld_ticks, 3);
    }

    #[test]
    fn rejects_bad_values() {
        DetectorConfig::from_json(r#"{"ledger_capacity": 0}"#).unwrap_err();
        DetectorConfig::from_json(r#"{"sequence_call_rule": "anyone"}"#).unwrap_err();
    }
}
