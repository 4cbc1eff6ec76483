use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Athlete activity ────────────────────────────────────

/// One logged activity from the athlete listing endpoint, normalized at
/// the API boundary. Optional payload fields are typed as such here so
/// the rest of the toolkit never probes raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub start_date: DateTime<Utc>,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub moving_time: i64,
    /// Meters; Strava omits this for treadmill and manual entries.
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
}

impl Activity {
    pub fn is_run(&self) -> bool {
        self.activity_type == "Run"
    }

    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    /// Minutes per kilometer; `None` for zero-distance records.
    pub fn pace_min_per_km(&self) -> Option<f64> {
        if self.distance > 0.0 {
            Some((self.moving_time as f64 / 60.0) / self.distance_km())
        } else {
            None
        }
    }
}

// ── Club feed ───────────────────────────────────────────

/// One entry from a club activity feed. The club endpoint returns a
/// sparser shape than the athlete listing and frequently omits the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubActivity {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub athlete: Option<ClubAthlete>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClubAthlete {
    #[serde(default)]
    pub firstname: Option<String>,
}

impl ClubActivity {
    pub fn athlete_name(&self) -> &str {
        self.athlete
            .as_ref()
            .and_then(|a| a.firstname.as_deref())
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_parses_strava_payload() {
        let json = r#"{
            "id": 987654321,
            "name": "Morning Run",
            "type": "Run",
            "start_date": "2024-01-10T07:30:00Z",
            "distance": 5000.0,
            "moving_time": 1500,
            "total_elevation_gain": 42.5,
            "average_heartrate": 152.3,
            "kudos_count": 3
        }"#;

        let a: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(a.id, 987654321);
        assert!(a.is_run());
        assert_eq!(a.distance_km(), 5.0);
        assert_eq!(a.pace_min_per_km(), Some(5.0));
        assert_eq!(a.average_heartrate, Some(152.3));
    }

    #[test]
    fn activity_defaults_optional_fields() {
        let json = r#"{
            "id": 1,
            "name": "Treadmill",
            "type": "Run",
            "start_date": "2024-02-01T18:00:00Z",
            "distance": 3000.0,
            "moving_time": 600
        }"#;

        let a: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(a.total_elevation_gain, 0.0);
        assert_eq!(a.average_heartrate, None);
    }

    #[test]
    fn zero_distance_has_no_pace() {
        let json = r#"{
            "id": 2,
            "name": "Watch glitch",
            "type": "Run",
            "start_date": "2024-02-02T18:00:00Z",
            "distance": 0.0,
            "moving_time": 900
        }"#;

        let a: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(a.pace_min_per_km(), None);
    }

    #[test]
    fn club_activity_tolerates_missing_fields() {
        let a: ClubActivity = serde_json::from_str(r#"{"name": "Lunch Run"}"#).unwrap();
        assert_eq!(a.id, None);
        assert_eq!(a.athlete_name(), "Unknown");
    }
}
