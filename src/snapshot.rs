use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::stats::RunningStats;

/// Machine-readable form of one analysis run: per-month series keyed by
/// `"YYYY-MM"` plus the overall totals. `BTreeMap` keys and fixed
/// rounding keep re-renders of the same aggregate byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub monthly: MonthlySeries,
    pub overall: OverallTotals,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthlySeries {
    pub count: BTreeMap<String, u32>,
    pub distance_km: BTreeMap<String, f64>,
    pub time_hours: BTreeMap<String, f64>,
    pub elevation_m: BTreeMap<String, f64>,
    /// Only months with distance appear here.
    pub pace_min_per_km: BTreeMap<String, f64>,
    /// Only months where at least one run recorded heart rate.
    pub avg_hr_bpm: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverallTotals {
    pub total_runs: u32,
    pub total_distance_km: f64,
    pub total_time_hours: f64,
    pub total_elevation_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_pace_min_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_distance_per_run: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_hr_bpm: Option<f64>,
}

impl Snapshot {
    pub fn from_stats(stats: &RunningStats) -> Self {
        let mut monthly = MonthlySeries::default();

        for (key, agg) in &stats.monthly {
            let label = key.label();
            monthly.count.insert(label.clone(), agg.count);
            monthly
                .distance_km
                .insert(label.clone(), round(agg.distance_km, 2));
            monthly
                .time_hours
                .insert(label.clone(), round(agg.time_hours, 2));
            monthly
                .elevation_m
                .insert(label.clone(), round(agg.elevation_m, 1));
            if let Some(pace) = agg.avg_pace_min_per_km() {
                monthly.pace_min_per_km.insert(label.clone(), round(pace, 2));
            }
            if let Some(hr) = agg.avg_hr_bpm() {
                monthly.avg_hr_bpm.insert(label, round(hr, 1));
            }
        }

        let overall = OverallTotals {
            total_runs: stats.overall.count,
            total_distance_km: round(stats.overall.distance_km, 2),
            total_time_hours: round(stats.overall.time_hours, 2),
            total_elevation_m: round(stats.overall.elevation_m, 1),
            avg_pace_min_per_km: stats.overall.avg_pace_min_per_km().map(|p| round(p, 2)),
            avg_distance_per_run: stats.overall.avg_distance_per_run_km().map(|d| round(d, 2)),
            avg_hr_bpm: stats.overall.avg_hr_bpm().map(|hr| round(hr, 1)),
        };

        Snapshot { monthly, overall }
    }

    pub fn render(&self) -> String {
        let mut out = serde_json::to_string_pretty(self).expect("snapshot serializes");
        out.push('\n');
        out
    }

    /// Serialize fully, then write in one shot. The file is overwritten
    /// wholesale each run; there is no merge or append mode.
    pub fn write(&self, path: &Path) -> Result<()> {
        let rendered = self.render();
        fs::write(path, rendered)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| {
            format!(
                "Snapshot {} not found; run `hlaupa analyze` first",
                path.display()
            )
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Snapshot {} is not valid JSON", path.display()))?;
        Ok(snapshot)
    }
}

fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
