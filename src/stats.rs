use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;

use crate::data::Activity;

/// Runs at or below this distance never qualify for the fastest-pace
/// pick; a short sprint's pace is not comparable to a real run's.
const FASTEST_MIN_DISTANCE_M: f64 = 1000.0;

// ── MonthKey ────────────────────────────────────────────

/// Calendar (year, month) grouping key, ordered chronologically.
/// Months are resolved in UTC, the zone the source timestamps carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(ts: &DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// Zero-padded `"YYYY-MM"` label used in snapshots and charts.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

// ── MonthlyAggregate ────────────────────────────────────

/// Totals accumulated for one calendar month. Ratios are derived on
/// demand and only when their denominator is positive.
#[derive(Debug, Clone, Default)]
pub struct MonthlyAggregate {
    pub count: u32,
    pub distance_km: f64,
    pub time_hours: f64,
    pub elevation_m: f64,
    hr_sum: f64,
    hr_count: u32,
}

impl MonthlyAggregate {
    fn add(&mut self, run: &Activity) {
        self.count += 1;
        self.distance_km += run.distance / 1000.0;
        self.time_hours += run.moving_time as f64 / 3600.0;
        self.elevation_m += run.total_elevation_gain;
        if let Some(hr) = run.average_heartrate {
            self.hr_sum += hr;
            self.hr_count += 1;
        }
    }

    /// Minutes per kilometer; `None` for months with no distance.
    pub fn avg_pace_min_per_km(&self) -> Option<f64> {
        if self.distance_km > 0.0 {
            Some(self.time_hours * 60.0 / self.distance_km)
        } else {
            None
        }
    }

    /// Mean heart rate over the runs that recorded one.
    pub fn avg_hr_bpm(&self) -> Option<f64> {
        if self.hr_count > 0 {
            Some(self.hr_sum / self.hr_count as f64)
        } else {
            None
        }
    }

    pub fn hr_count(&self) -> u32 {
        self.hr_count
    }
}

// ── OverallSummary ──────────────────────────────────────

/// Totals over the whole history, accumulated per record in the same
/// fold as the monthly map. The two views must agree exactly.
#[derive(Debug, Clone, Default)]
pub struct OverallSummary {
    pub count: u32,
    pub distance_km: f64,
    pub time_hours: f64,
    pub elevation_m: f64,
    hr_sum: f64,
    hr_count: u32,
}

impl OverallSummary {
    fn add(&mut self, run: &Activity) {
        self.count += 1;
        self.distance_km += run.distance / 1000.0;
        self.time_hours += run.moving_time as f64 / 3600.0;
        self.elevation_m += run.total_elevation_gain;
        if let Some(hr) = run.average_heartrate {
            self.hr_sum += hr;
            self.hr_count += 1;
        }
    }

    pub fn avg_pace_min_per_km(&self) -> Option<f64> {
        if self.distance_km > 0.0 {
            Some(self.time_hours * 60.0 / self.distance_km)
        } else {
            None
        }
    }

    pub fn avg_distance_per_run_km(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.distance_km / self.count as f64)
        } else {
            None
        }
    }

    pub fn avg_hr_bpm(&self) -> Option<f64> {
        if self.hr_count > 0 {
            Some(self.hr_sum / self.hr_count as f64)
        } else {
            None
        }
    }
}

// ── Highlights ──────────────────────────────────────────

/// The identifying details of one selected run (longest, fastest).
#[derive(Debug, Clone)]
pub struct RunHighlight {
    pub name: String,
    pub start_date: DateTime<Utc>,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub moving_time: i64,
}

impl RunHighlight {
    fn of(run: &Activity) -> Self {
        Self {
            name: run.name.clone(),
            start_date: run.start_date,
            distance: run.distance,
            moving_time: run.moving_time,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    pub fn pace_min_per_km(&self) -> Option<f64> {
        if self.distance > 0.0 {
            Some((self.moving_time as f64 / 60.0) / self.distance_km())
        } else {
            None
        }
    }
}

// ── RunningStats ────────────────────────────────────────

/// Everything the reporter needs: per-month aggregates in chronological
/// order, the overall summary, and the two best-performance picks.
#[derive(Debug, Clone)]
pub struct RunningStats {
    pub monthly: BTreeMap<MonthKey, MonthlyAggregate>,
    pub overall: OverallSummary,
    pub longest_run: RunHighlight,
    /// Absent when no run is longer than one kilometer.
    pub fastest_pace: Option<RunHighlight>,
}

impl RunningStats {
    /// Years present in the data, descending.
    pub fn years_desc(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.monthly.keys().map(|k| k.year).collect();
        years.dedup();
        years.reverse();
        years
    }
}

/// Fold the activity history into running statistics. Non-run
/// activities are ignored; `None` means there is nothing to report and
/// no ratio was ever computed.
pub fn analyze(activities: &[Activity]) -> Option<RunningStats> {
    let runs: Vec<&Activity> = activities.iter().filter(|a| a.is_run()).collect();
    let first = *runs.first()?;

    let mut monthly: BTreeMap<MonthKey, MonthlyAggregate> = BTreeMap::new();
    let mut overall = OverallSummary::default();
    let mut longest = first;
    let mut fastest: Option<(&Activity, f64)> = None;

    for run in runs.iter().copied() {
        monthly
            .entry(MonthKey::of(&run.start_date))
            .or_default()
            .add(run);
        overall.add(run);

        // Strictly-greater keeps the first of equal-distance runs.
        if run.distance > longest.distance {
            longest = run;
        }

        if run.distance > FASTEST_MIN_DISTANCE_M {
            if let Some(pace) = run.pace_min_per_km() {
                match fastest {
                    Some((_, best)) if pace >= best => {}
                    _ => fastest = Some((run, pace)),
                }
            }
        }
    }

    Some(RunningStats {
        monthly,
        overall,
        longest_run: RunHighlight::of(longest),
        fastest_pace: fastest.map(|(run, _)| RunHighlight::of(run)),
    })
}
