//! Serializable replay configuration.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tickforge_core::domain::Product;
use tickforge_core::session::RuleSet;

/// Unique identifier for a replay run (content-addressable hash).
pub type RunId = String;

/// How history is streamed into the strategy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayMode {
    /// Every stored tick, with a heartbeat per distinct wall-clock second.
    Precise,
    /// Stored 1-minute bars only. Orders of magnitude faster, signal
    /// resolution limited to bar closes.
    FastBars,
}

/// Everything needed to reproduce a replay run: the contract, the time
/// range, the streaming mode, and the full strategy rule set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    pub product: Product,

    /// Main range start (inclusive). Events before this drive indicator
    /// warm-up only; no signals fire.
    pub start: NaiveDateTime,

    /// Main range end (exclusive).
    pub end: NaiveDateTime,

    pub mode: ReplayMode,

    /// Minimum price move, in points, before a tick is re-evaluated
    /// against the trigger set. Precise mode only.
    pub tick_min_diff: Decimal,

    /// How many calendar days before `start` to look for warm-up data.
    pub preload_days: u32,

    /// Bounded queue capacity between the reader thread and the engine.
    pub queue_ceiling: usize,

    /// Rows the reader thread pulls from the store per batch.
    pub batch_size: usize,

    pub rules: RuleSet,

    /// Exchange holiday calendar (CSV `date,HOLIDAY|OPEN` rows); weekday
    /// fallback when absent.
    pub calendar_path: Option<PathBuf>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date");
        Self {
            product: Product::Tx,
            start: day.and_hms_opt(8, 45, 0).expect("valid time"),
            end: day.and_hms_opt(13, 45, 0).expect("valid time"),
            mode: ReplayMode::Precise,
            tick_min_diff: Decimal::ONE,
            preload_days: 7,
            queue_ceiling: 50_000,
            batch_size: 10_000,
            rules: RuleSet::default(),
            calendar_path: None,
        }
    }
}

impl ReplayConfig {
    /// Computes a deterministic hash ID for this configuration. Two runs
    /// with identical configs get the same RunId, so reports can be
    /// compared or deduplicated by name.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ReplayConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}
