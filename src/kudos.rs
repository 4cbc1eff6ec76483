use anyhow::Result;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::api::{KudosOutcome, StravaApi};
use crate::data::ClubActivity;

/// Tally of one kudos scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KudosReport {
    pub scanned: usize,
    pub given: u32,
    pub already: u32,
    pub failed: u32,
}

/// Scan the given clubs and acknowledge each activity once. A club that
/// fails to list is logged and skipped; the scan itself never aborts.
pub async fn run(api: &StravaApi, token: &str, clubs: &[String]) -> Result<KudosReport> {
    let mut all: Vec<ClubActivity> = Vec::new();

    for club_id in clubs {
        match api.club_activities(token, club_id, 1).await {
            Ok(activities) => {
                info!(club = %club_id, count = activities.len(), "fetched club feed");
                all.extend(activities);
            }
            Err(e) => warn!(club = %club_id, error = %e, "skipping club"),
        }
    }

    let unique = dedupe(all);
    let mut report = KudosReport {
        scanned: unique.len(),
        ..KudosReport::default()
    };

    for activity in &unique {
        // dedupe() only keeps entries with an id.
        let Some(id) = activity.id else { continue };

        match api.give_kudos(token, id).await? {
            KudosOutcome::Given => {
                report.given += 1;
                info!(activity = id, athlete = activity.athlete_name(), "kudos given");
            }
            KudosOutcome::AlreadyGiven => {
                report.already += 1;
            }
            KudosOutcome::Failed(status) => {
                report.failed += 1;
                warn!(activity = id, status, "kudos failed");
            }
        }
    }

    Ok(report)
}

/// Single-pass de-duplication by activity id. Club feeds overlap when
/// an athlete belongs to several monitored clubs. Entries without an id
/// cannot be acknowledged and are dropped here.
fn dedupe(activities: Vec<ClubActivity>) -> Vec<ClubActivity> {
    let mut seen: HashSet<u64> = HashSet::new();
    activities
        .into_iter()
        .filter(|a| match a.id {
            Some(id) => seen.insert(id),
            None => false,
        })
        .collect()
}

impl KudosReport {
    pub fn summary(&self) -> String {
        format!(
            "Kudos given: {}\nAlready given: {}\nFailed: {}\nTotal processed: {}",
            self.given, self.already, self.failed, self.scanned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club_activity(id: Option<u64>) -> ClubActivity {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Evening Run",
            "athlete": {"firstname": "Jon"}
        }))
        .unwrap()
    }

    #[test]
    fn dedupe_keeps_first_of_each_id() {
        let unique = dedupe(vec![
            club_activity(Some(1)),
            club_activity(Some(2)),
            club_activity(Some(1)),
        ]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, Some(1));
        assert_eq!(unique[1].id, Some(2));
    }

    #[test]
    fn dedupe_drops_entries_without_id() {
        let unique = dedupe(vec![club_activity(None), club_activity(Some(7))]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].id, Some(7));
    }

    #[test]
    fn summary_reports_all_counters() {
        let report = KudosReport {
            scanned: 5,
            given: 3,
            already: 1,
            failed: 1,
        };
        let s = report.summary();
        assert!(s.contains("Kudos given: 3"));
        assert!(s.contains("Already given: 1"));
        assert!(s.contains("Total processed: 5"));
    }
}
