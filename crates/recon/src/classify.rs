use tracing::debug;

use crate::config::Thresholds;
use crate::model::{Member, Reason, RunRecord, Verdict, Violation};

/// Decide whether one period's statistics qualify.
///
/// Distance is checked first and wins when both bounds fail. A record with no
/// distance is a distance failure; pace is never computed for it.
pub fn classify(record: &RunRecord, thresholds: &Thresholds) -> Verdict {
    if record.distance_km <= 0.0 || record.distance_km < thresholds.min_distance_km {
        return Verdict::NonQualifying(Reason::Distance {
            km: record.distance_km.max(0.0),
        });
    }

    match record.avg_pace_seconds() {
        Some(pace) if pace > thresholds.max_pace_seconds => {
            Verdict::NonQualifying(Reason::Pace { seconds_per_km: pace })
        }
        Some(_) => Verdict::Qualifying,
        // Unreachable: distance > 0 was checked above.
        None => Verdict::NonQualifying(Reason::Distance { km: 0.0 }),
    }
}

/// Run records split by verdict, each side in input order.
#[derive(Debug, Default)]
pub struct Classified {
    pub qualifying: Vec<Member>,
    pub non_qualifying: Vec<Violation>,
}

pub fn classify_all(records: &[RunRecord], thresholds: &Thresholds) -> Classified {
    let mut out = Classified::default();
    for record in records {
        match classify(record, thresholds) {
            Verdict::Qualifying => out.qualifying.push(record.member.clone()),
            Verdict::NonQualifying(reason) => {
                debug!(member = %record.member, %reason, "non-qualifying");
                out.non_qualifying.push(Violation {
                    member: record.member.clone(),
                    reason,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::MemberId;

    fn thresholds() -> Thresholds {
        Thresholds {
            min_distance_km: 10.0,
            max_pace_seconds: 600.0,
        }
    }

    fn record(id: i64, km: f64, secs: u64) -> RunRecord {
        RunRecord {
            member: Member::new(MemberId(id), format!("m{id}"), "F", "g"),
            distance_km: km,
            elapsed: Duration::from_secs(secs),
            run_count: 2,
        }
    }

    #[test]
    fn meets_both_bounds() {
        // 12 km in 66 minutes = 330 s/km
        assert_eq!(classify(&record(1, 12.0, 3960), &thresholds()), Verdict::Qualifying);
    }

    #[test]
    fn exactly_on_bounds_qualifies() {
        assert_eq!(classify(&record(1, 10.0, 6000), &thresholds()), Verdict::Qualifying);
    }

    #[test]
    fn short_distance() {
        let v = classify(&record(1, 8.5, 2550), &thresholds());
        assert_eq!(v, Verdict::NonQualifying(Reason::Distance { km: 8.5 }));
    }

    #[test]
    fn distance_wins_when_both_fail() {
        // 5 km in 75 minutes = 900 s/km, too short and too slow
        let v = classify(&record(1, 5.0, 4500), &thresholds());
        assert_eq!(v, Verdict::NonQualifying(Reason::Distance { km: 5.0 }));
    }

    #[test]
    fn slow_pace() {
        // 10 km in 110 minutes = 660 s/km
        let v = classify(&record(1, 10.0, 6600), &thresholds());
        assert_eq!(v, Verdict::NonQualifying(Reason::Pace { seconds_per_km: 660.0 }));
    }

    #[test]
    fn zero_distance_is_distance_failure() {
        let t = Thresholds {
            min_distance_km: 0.0,
            max_pace_seconds: 600.0,
        };
        let v = classify(&record(1, 0.0, 0), &t);
        assert_eq!(v, Verdict::NonQualifying(Reason::Distance { km: 0.0 }));
    }

    #[test]
    fn split_keeps_input_order() {
        let records = vec![
            record(1, 12.0, 3600),
            record(2, 3.0, 900),
            record(3, 20.0, 6000),
            record(4, 11.0, 7700),
        ];
        let out = classify_all(&records, &thresholds());
        let q: Vec<i64> = out.qualifying.iter().map(|m| m.id.0).collect();
        let n: Vec<i64> = out.non_qualifying.iter().map(|v| v.member.id.0).collect();
        assert_eq!(q, vec![1, 3]);
        assert_eq!(n, vec![2, 4]);
        assert!(matches!(out.non_qualifying[1].reason, Reason::Pace { .. }));
    }
}
