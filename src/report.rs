use ansi_term::{Colour, Style};

use crate::stats::{MonthKey, MonthlyAggregate, RunningStats};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const CELL_WIDTH: usize = 8;
const TOTAL_WIDTH: usize = 10;

/// One table per metric: rows are years (newest first), columns Jan–Dec
/// plus a Total column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Runs,
    DistanceKm,
    TimeHours,
    ElevationM,
    PaceMinPerKm,
    AvgHrBpm,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Runs,
        Metric::DistanceKm,
        Metric::TimeHours,
        Metric::ElevationM,
        Metric::PaceMinPerKm,
        Metric::AvgHrBpm,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Metric::Runs => "Runs",
            Metric::DistanceKm => "Distance (km)",
            Metric::TimeHours => "Time (hours)",
            Metric::ElevationM => "Elevation gain (m)",
            Metric::PaceMinPerKm => "Avg pace (min/km)",
            Metric::AvgHrBpm => "Avg heart rate (bpm)",
        }
    }

    fn month_value(self, agg: &MonthlyAggregate) -> Option<f64> {
        match self {
            Metric::Runs => Some(agg.count as f64),
            Metric::DistanceKm => Some(agg.distance_km),
            Metric::TimeHours => Some(agg.time_hours),
            Metric::ElevationM => Some(agg.elevation_m),
            Metric::PaceMinPerKm => agg.avg_pace_min_per_km(),
            Metric::AvgHrBpm => agg.avg_hr_bpm(),
        }
    }

    fn integer(self) -> bool {
        matches!(self, Metric::Runs)
    }
}

/// Render one metric's year-by-month table. Returns the no-data notice
/// instead of a table when no month contributed a value (possible for
/// pace and heart rate only).
pub fn render_metric_table(stats: &RunningStats, metric: Metric) -> String {
    let has_data = stats
        .monthly
        .values()
        .any(|agg| metric.month_value(agg).is_some());
    if !has_data {
        return format!("  no {} data\n", metric.title().to_lowercase());
    }

    let mut out = String::new();

    out.push_str(&format!("{:<6}", "Year"));
    for name in MONTH_NAMES {
        out.push_str(&format!("{:>width$}", name, width = CELL_WIDTH));
    }
    out.push_str(&format!("{:>width$}\n", "Total", width = TOTAL_WIDTH));

    for year in stats.years_desc() {
        out.push_str(&format!("{:<6}", year));
        for month in 1..=12u32 {
            let cell = stats
                .monthly
                .get(&MonthKey { year, month })
                .and_then(|agg| metric.month_value(agg))
                .filter(|v| *v != 0.0);
            out.push_str(&render_cell(cell, metric, CELL_WIDTH));
        }
        out.push_str(&render_cell(
            year_total(stats, year, metric),
            metric,
            TOTAL_WIDTH,
        ));
        out.push('\n');
    }

    out
}

/// Year column totals: plain sums for additive metrics, the year-level
/// derived ratio for pace and heart rate.
fn year_total(stats: &RunningStats, year: i32, metric: Metric) -> Option<f64> {
    let months = stats
        .monthly
        .range(MonthKey { year, month: 1 }..=MonthKey { year, month: 12 });

    let mut count = 0u32;
    let mut distance_km = 0.0;
    let mut time_hours = 0.0;
    let mut elevation_m = 0.0;
    let mut hr_sum = 0.0;
    let mut hr_count = 0u32;

    for (_, agg) in months {
        count += agg.count;
        distance_km += agg.distance_km;
        time_hours += agg.time_hours;
        elevation_m += agg.elevation_m;
        if let Some(hr) = agg.avg_hr_bpm() {
            hr_sum += hr * agg.hr_count() as f64;
            hr_count += agg.hr_count();
        }
    }

    let total = match metric {
        Metric::Runs => count as f64,
        Metric::DistanceKm => distance_km,
        Metric::TimeHours => time_hours,
        Metric::ElevationM => elevation_m,
        Metric::PaceMinPerKm => {
            if distance_km > 0.0 {
                time_hours * 60.0 / distance_km
            } else {
                return None;
            }
        }
        Metric::AvgHrBpm => {
            if hr_count > 0 {
                hr_sum / hr_count as f64
            } else {
                return None;
            }
        }
    };

    Some(total).filter(|v| *v != 0.0)
}

fn render_cell(value: Option<f64>, metric: Metric, width: usize) -> String {
    match value {
        Some(v) if metric.integer() => format!("{:>width$}", v as u32, width = width),
        Some(v) => format!("{:>width$.1}", v, width = width),
        None => format!("{:>width$}", "", width = width),
    }
}

/// Overall summary block, in the shape the analysis has always printed.
pub fn render_overall(stats: &RunningStats) -> String {
    let mut out = String::new();
    let overall = &stats.overall;

    out.push_str(&format!("Total Runs: {}\n", overall.count));
    out.push_str(&format!("Total Distance: {:.2} km\n", overall.distance_km));
    out.push_str(&format!("Total Time: {:.2} hours\n", overall.time_hours));
    out.push_str(&format!(
        "Total Elevation Gain: {:.2} m\n",
        overall.elevation_m
    ));
    if let Some(pace) = overall.avg_pace_min_per_km() {
        out.push_str(&format!("Average Pace: {:.2} min/km\n", pace));
    }
    if let Some(avg) = overall.avg_distance_per_run_km() {
        out.push_str(&format!("Average Distance per Run: {:.2} km\n", avg));
    }

    out
}

/// Longest run and fastest pace, with the identifying name and date.
pub fn render_best_performances(stats: &RunningStats) -> String {
    let mut out = String::new();

    let longest = &stats.longest_run;
    out.push_str(&format!("Longest Run: {:.2} km\n", longest.distance_km()));
    out.push_str(&format!(
        "  Date: {}\n",
        longest.start_date.format("%Y-%m-%d")
    ));
    out.push_str(&format!("  Name: {}\n", longest.name));

    match &stats.fastest_pace {
        Some(fastest) => {
            // Pace is always defined here; qualification requires > 1 km.
            let pace = fastest.pace_min_per_km().unwrap_or_default();
            out.push_str(&format!("\nFastest Pace: {:.2} min/km\n", pace));
            out.push_str(&format!(
                "  Date: {}\n",
                fastest.start_date.format("%Y-%m-%d")
            ));
            out.push_str(&format!("  Name: {}\n", fastest.name));
            out.push_str(&format!("  Distance: {:.2} km\n", fastest.distance_km()));
        }
        None => out.push_str("\nFastest Pace: no runs over 1 km\n"),
    }

    out
}

/// Print the full console report.
pub fn print_report(stats: &RunningStats) {
    let heading = Style::new().bold().fg(Colour::Fixed(208));
    let rule = "=".repeat(50);

    println!("\n{}", rule);
    println!("{}", heading.paint("RUNNING STATISTICS"));
    println!("{}", rule);
    print!("{}", render_overall(stats));

    println!("\n{}", rule);
    println!("{}", heading.paint("MONTHLY BREAKDOWN"));
    println!("{}", rule);
    for metric in Metric::ALL {
        println!("\n{}", Style::new().bold().paint(metric.title()));
        print!("{}", render_metric_table(stats, metric));
    }

    println!("\n{}", rule);
    println!("{}", heading.paint("BEST PERFORMANCES"));
    println!("{}", rule);
    print!("{}", render_best_performances(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Activity;
    use crate::stats::analyze;

    fn run(id: u64, date: &str, distance: f64, moving_time: i64) -> Activity {
        Activity {
            id,
            name: format!("Run {}", id),
            activity_type: "Run".to_string(),
            start_date: date.parse().unwrap(),
            distance,
            moving_time,
            total_elevation_gain: 0.0,
            average_heartrate: None,
        }
    }

    fn sample_stats() -> crate::stats::RunningStats {
        analyze(&[
            run(1, "2024-01-10T08:00:00Z", 5000.0, 1500),
            run(2, "2024-01-20T08:00:00Z", 10000.0, 3000),
            run(3, "2023-06-05T08:00:00Z", 8000.0, 2400),
        ])
        .unwrap()
    }

    #[test]
    fn count_table_has_years_descending_and_totals() {
        let table = render_metric_table(&sample_stats(), Metric::Runs);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("Year"));
        assert!(lines[0].contains("Jan"));
        assert!(lines[0].contains("Dec"));
        assert!(lines[0].trim_end().ends_with("Total"));
        assert!(lines[1].starts_with("2024"));
        assert!(lines[2].starts_with("2023"));
        // 2024 has two January runs and a yearly total of 2.
        assert!(lines[1].trim_end().ends_with('2'));
    }

    #[test]
    fn blank_cells_for_empty_months() {
        let table = render_metric_table(&sample_stats(), Metric::DistanceKm);
        let row_2024 = table.lines().nth(1).unwrap();
        // Jan is the first month column; Feb (the second) is blank.
        let jan = &row_2024[6..6 + CELL_WIDTH];
        let feb = &row_2024[6 + CELL_WIDTH..6 + 2 * CELL_WIDTH];
        assert_eq!(jan.trim(), "15.0");
        assert_eq!(feb.trim(), "");
    }

    #[test]
    fn pace_year_total_is_derived_not_summed() {
        let table = render_metric_table(&sample_stats(), Metric::PaceMinPerKm);
        let row_2024 = table.lines().nth(1).unwrap();
        // 2024: 75 minutes over 15 km, so the yearly pace is 5.0.
        assert!(row_2024.trim_end().ends_with("5.0"));
    }

    #[test]
    fn heart_rate_table_reports_no_data() {
        let table = render_metric_table(&sample_stats(), Metric::AvgHrBpm);
        assert!(table.contains("no avg heart rate (bpm) data"));
    }

    #[test]
    fn overall_block_matches_example() {
        let out = render_overall(&sample_stats());
        assert!(out.contains("Total Runs: 3"));
        assert!(out.contains("Total Distance: 23.00 km"));
        assert!(out.contains("Average Pace: 5.00 min/km"));
    }

    #[test]
    fn best_performances_name_longest_and_fastest() {
        let out = render_best_performances(&sample_stats());
        assert!(out.contains("Longest Run: 10.00 km"));
        assert!(out.contains("Run 2"));
        assert!(out.contains("Fastest Pace: 5.00 min/km"));
    }

    #[test]
    fn fastest_pace_notice_when_only_short_runs() {
        let stats = analyze(&[run(1, "2024-01-01T08:00:00Z", 900.0, 200)]).unwrap();
        let out = render_best_performances(&stats);
        assert!(out.contains("no runs over 1 km"));
    }
}
