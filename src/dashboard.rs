use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::snapshot::Snapshot;

/// Monthly series in the layout the page script consumes: one x-axis of
/// `"YYYY-MM"` labels plus aligned y-series, `null` where a month has no
/// value so the line charts leave gaps instead of dipping to zero.
#[derive(Debug, Serialize)]
struct ChartData {
    months: Vec<String>,
    distance_km: Vec<f64>,
    count: Vec<u32>,
    pace_min_per_km: Vec<Option<f64>>,
    avg_hr_bpm: Vec<Option<f64>>,
}

/// Label/parent/value arrays for one Plotly treemap. Built here rather
/// than in page script so the hierarchy can be checked: every year
/// node's value is the exact sum of its month children.
#[derive(Debug, Serialize)]
pub struct TreemapData {
    labels: Vec<String>,
    parents: Vec<String>,
    values: Vec<f64>,
}

const ROOT_LABEL: &str = "All";

/// Build a year → month hierarchy from a `"YYYY-MM"`-keyed series.
/// Years appear newest first, months within a year in calendar order.
pub fn treemap_series(series: &BTreeMap<String, f64>) -> TreemapData {
    let mut by_year: BTreeMap<String, Vec<(&String, f64)>> = BTreeMap::new();
    for (month, value) in series {
        let year = month.split('-').next().unwrap_or(month).to_string();
        by_year.entry(year).or_default().push((month, *value));
    }

    let mut labels = vec![ROOT_LABEL.to_string()];
    let mut parents = vec![String::new()];
    let mut values = vec![0.0];

    for (year, months) in by_year.iter().rev() {
        labels.push(year.clone());
        parents.push(ROOT_LABEL.to_string());
        values.push(months.iter().map(|(_, v)| v).sum());

        for (month, value) in months {
            labels.push((*month).clone());
            parents.push(year.clone());
            values.push(*value);
        }
    }

    TreemapData {
        labels,
        parents,
        values,
    }
}

impl TreemapData {
    /// Parent value = Σ child values, for every non-root node.
    #[cfg(test)]
    fn parent_equals_children_sum(&self) -> bool {
        for (i, label) in self.labels.iter().enumerate() {
            if self.parents[i] != ROOT_LABEL {
                continue;
            }
            let children_sum: f64 = self
                .parents
                .iter()
                .zip(&self.values)
                .filter(|(parent, _)| *parent == label)
                .map(|(_, v)| v)
                .sum();
            if (children_sum - self.values[i]).abs() > 1e-9 {
                return false;
            }
        }
        true
    }
}

/// Render the dashboard page for a snapshot. Self-contained apart from
/// the Plotly CDN reference; all series are embedded as JSON.
pub fn render(snapshot: &Snapshot, generated_at: DateTime<Utc>) -> String {
    let monthly = &snapshot.monthly;
    let months: Vec<String> = monthly.count.keys().cloned().collect();

    let chart_data = ChartData {
        distance_km: months
            .iter()
            .map(|m| monthly.distance_km.get(m).copied().unwrap_or(0.0))
            .collect(),
        count: months
            .iter()
            .map(|m| monthly.count.get(m).copied().unwrap_or(0))
            .collect(),
        pace_min_per_km: months
            .iter()
            .map(|m| monthly.pace_min_per_km.get(m).copied())
            .collect(),
        avg_hr_bpm: months
            .iter()
            .map(|m| monthly.avg_hr_bpm.get(m).copied())
            .collect(),
        months,
    };

    let treemap_distance = treemap_series(&monthly.distance_km);
    let treemap_count = treemap_series(
        &monthly
            .count
            .iter()
            .map(|(k, v)| (k.clone(), *v as f64))
            .collect(),
    );

    let hr_script = if monthly.avg_hr_bpm.is_empty() {
        HR_PLACEHOLDER.to_string()
    } else {
        HR_CHART.to_string()
    };

    let overall = &snapshot.overall;
    let pace = overall
        .avg_pace_min_per_km
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "-".to_string());
    let per_run = overall
        .avg_distance_per_run
        .map(|d| format!("{:.1}", d))
        .unwrap_or_else(|| "-".to_string());

    PAGE_TEMPLATE
        .replace("__TOTAL_RUNS__", &overall.total_runs.to_string())
        .replace(
            "__TOTAL_DISTANCE__",
            &format!("{:.1}", overall.total_distance_km),
        )
        .replace(
            "__TOTAL_TIME__",
            &format!("{:.1}", overall.total_time_hours),
        )
        .replace(
            "__TOTAL_ELEVATION__",
            &format!("{:.0}", overall.total_elevation_m),
        )
        .replace("__AVG_PACE__", &pace)
        .replace("__AVG_PER_RUN__", &per_run)
        .replace(
            "__GENERATED_AT__",
            &generated_at.format("%Y-%m-%d %H:%M").to_string(),
        )
        .replace("__CHART_DATA__", &to_json(&chart_data))
        .replace("__TREEMAP_DISTANCE__", &to_json(&treemap_distance))
        .replace("__TREEMAP_COUNT__", &to_json(&treemap_count))
        .replace("__HR_SCRIPT__", &hr_script)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("chart data serializes")
}

/// Read the snapshot and write the page. The page string is fully built
/// before a single write, so a failure never leaves a partial file.
pub fn generate(snapshot_path: &Path, output_path: &Path) -> Result<()> {
    let snapshot = Snapshot::load(snapshot_path)?;
    let page = render(&snapshot, Utc::now());

    fs::write(output_path, page)
        .with_context(|| format!("Failed to write dashboard to {}", output_path.display()))?;
    Ok(())
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Running Dashboard</title>
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <style>
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
        h1 { color: #FC4C02; text-align: center; }
        .summary { background-color: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .summary-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 15px; }
        .summary-item { padding: 15px; background-color: #f9f9f9; border-radius: 5px; border-left: 4px solid #FC4C02; }
        .summary-item h3 { margin: 0 0 5px 0; font-size: 14px; color: #666; }
        .summary-item p { margin: 0; font-size: 24px; font-weight: bold; color: #333; }
        .chart { background-color: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .updated { text-align: center; color: #666; font-size: 12px; margin-top: 20px; }
        .no-data { text-align: center; color: #999; }
    </style>
</head>
<body>
    <h1>Running Dashboard</h1>

    <div class="summary">
        <h2>Overall</h2>
        <div class="summary-grid">
            <div class="summary-item"><h3>Total runs</h3><p>__TOTAL_RUNS__</p></div>
            <div class="summary-item"><h3>Total distance</h3><p>__TOTAL_DISTANCE__ km</p></div>
            <div class="summary-item"><h3>Total time</h3><p>__TOTAL_TIME__ h</p></div>
            <div class="summary-item"><h3>Avg distance per run</h3><p>__AVG_PER_RUN__ km</p></div>
            <div class="summary-item"><h3>Avg pace</h3><p>__AVG_PACE__ min/km</p></div>
            <div class="summary-item"><h3>Total elevation</h3><p>__TOTAL_ELEVATION__ m</p></div>
        </div>
    </div>

    <div class="chart" id="distance-chart"></div>
    <div class="chart" id="count-chart"></div>
    <div class="chart" id="pace-chart"></div>
    <div class="chart" id="hr-chart"></div>
    <div class="chart" id="treemap-distance"></div>
    <div class="chart" id="treemap-count"></div>

    <div class="updated">Updated: __GENERATED_AT__</div>

    <script>
        const data = __CHART_DATA__;
        const treemapDistance = __TREEMAP_DISTANCE__;
        const treemapCount = __TREEMAP_COUNT__;

        Plotly.newPlot('distance-chart', [{
            x: data.months,
            y: data.distance_km,
            type: 'scatter',
            mode: 'lines+markers',
            name: 'Monthly distance',
            line: {color: '#FC4C02', width: 3},
            marker: {size: 6}
        }], {
            title: 'Monthly running distance (km)',
            xaxis: {title: 'Month'},
            yaxis: {title: 'Kilometers'},
            hovermode: 'closest'
        }, {responsive: true});

        Plotly.newPlot('count-chart', [{
            x: data.months,
            y: data.count,
            type: 'bar',
            name: 'Run count',
            marker: {color: '#FC4C02'}
        }], {
            title: 'Runs per month',
            xaxis: {title: 'Month'},
            yaxis: {title: 'Runs'},
            hovermode: 'closest'
        }, {responsive: true});

        Plotly.newPlot('pace-chart', [{
            x: data.months,
            y: data.pace_min_per_km,
            type: 'scatter',
            mode: 'lines+markers',
            name: 'Avg pace',
            line: {color: '#1E88E5', width: 2},
            marker: {size: 5}
        }], {
            title: 'Average pace (min/km, faster is higher)',
            xaxis: {title: 'Month'},
            yaxis: {title: 'Minutes per kilometer', autorange: 'reversed'},
            hovermode: 'closest'
        }, {responsive: true});

        __HR_SCRIPT__

        Plotly.newPlot('treemap-distance', [{
            type: 'treemap',
            labels: treemapDistance.labels,
            parents: treemapDistance.parents,
            values: treemapDistance.values,
            textinfo: 'label+value+percent parent',
            marker: {colors: ['#FC4C02', '#FFA726']},
            hovertemplate: '<b>%{label}</b><br>%{value:.1f} km<br>%{percentParent}<extra></extra>'
        }], {
            title: 'Distance by year and month (km)',
            margin: {t: 50, l: 0, r: 0, b: 0}
        }, {responsive: true});

        Plotly.newPlot('treemap-count', [{
            type: 'treemap',
            labels: treemapCount.labels,
            parents: treemapCount.parents,
            values: treemapCount.values,
            textinfo: 'label+value+percent parent',
            marker: {colors: ['#1E88E5', '#42A5F5', '#90CAF9']},
            hovertemplate: '<b>%{label}</b><br>%{value} runs<br>%{percentParent}<extra></extra>'
        }], {
            title: 'Runs by year and month',
            margin: {t: 50, l: 0, r: 0, b: 0}
        }, {responsive: true});
    </script>
</body>
</html>
"#;

const HR_CHART: &str = r#"Plotly.newPlot('hr-chart', [{
            x: data.months,
            y: data.avg_hr_bpm,
            type: 'scatter',
            mode: 'lines+markers',
            name: 'Avg heart rate',
            line: {color: '#D32F2F', width: 2},
            marker: {size: 5}
        }], {
            title: 'Average heart rate (bpm)',
            xaxis: {title: 'Month'},
            yaxis: {title: 'Heart rate (bpm)'},
            hovermode: 'closest'
        }, {responsive: true});"#;

const HR_PLACEHOLDER: &str = r#"document.getElementById('hr-chart').innerHTML =
            '<p class="no-data">Heart-rate data not available</p>';"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Activity;
    use crate::snapshot::Snapshot;
    use crate::stats::analyze;

    fn run(id: u64, date: &str, distance: f64, moving_time: i64, hr: Option<f64>) -> Activity {
        Activity {
            id,
            name: format!("Run {}", id),
            activity_type: "Run".to_string(),
            start_date: date.parse().unwrap(),
            distance,
            moving_time,
            total_elevation_gain: 10.0,
            average_heartrate: hr,
        }
    }

    fn sample_snapshot(with_hr: bool) -> Snapshot {
        let hr = if with_hr { Some(150.0) } else { None };
        let stats = analyze(&[
            run(1, "2023-11-05T08:00:00Z", 8000.0, 2400, hr),
            run(2, "2023-12-12T08:00:00Z", 12000.0, 3900, None),
            run(3, "2024-01-10T08:00:00Z", 5000.0, 1500, hr),
            run(4, "2024-01-28T08:00:00Z", 21100.0, 6300, None),
        ])
        .unwrap();
        Snapshot::from_stats(&stats)
    }

    #[test]
    fn treemap_years_sum_their_months() {
        let snapshot = sample_snapshot(true);
        let distance = treemap_series(&snapshot.monthly.distance_km);
        assert!(distance.parent_equals_children_sum());

        let counts = snapshot
            .monthly
            .count
            .iter()
            .map(|(k, v)| (k.clone(), *v as f64))
            .collect();
        let count = treemap_series(&counts);
        assert!(count.parent_equals_children_sum());
    }

    #[test]
    fn treemap_orders_years_newest_first() {
        let snapshot = sample_snapshot(false);
        let tree = treemap_series(&snapshot.monthly.distance_km);
        assert_eq!(tree.labels[0], "All");
        assert_eq!(tree.labels[1], "2024");
        assert_eq!(tree.parents[1], "All");
        // 2024 has one month child before 2023 appears.
        assert_eq!(tree.labels[2], "2024-01");
        assert_eq!(tree.labels[3], "2023");
    }

    #[test]
    fn page_embeds_series_and_charts() {
        let snapshot = sample_snapshot(true);
        let page = render(&snapshot, "2024-02-01T12:00:00Z".parse().unwrap());

        assert!(page.contains("cdn.plot.ly"));
        assert!(page.contains("2023-11"));
        assert!(page.contains("autorange: 'reversed'"));
        assert!(page.contains("Average heart rate (bpm)"));
        assert!(page.contains("Updated: 2024-02-01 12:00"));
        assert!(!page.contains("__CHART_DATA__"));
    }

    #[test]
    fn page_uses_placeholder_without_heart_rate() {
        let snapshot = sample_snapshot(false);
        let page = render(&snapshot, Utc::now());
        assert!(page.contains("Heart-rate data not available"));
        assert!(!page.contains("'hr-chart', [{"));
    }

    #[test]
    fn generate_fails_cleanly_on_missing_snapshot() {
        let out = std::env::temp_dir().join("hlaupa-dashboard-test.html");
        let err = generate(Path::new("/nonexistent/running_data.json"), &out).unwrap_err();
        assert!(err.to_string().contains("hlaupa analyze"));
    }
}
