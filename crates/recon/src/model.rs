use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Numeric external member id, stable across periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MemberId(pub i64);

impl MemberId {
    /// Parse an id cell. Integral float text (`"1024.0"`) is accepted since
    /// spreadsheets routinely store ids as numbers.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(id) = value.parse::<i64>() {
            return Some(Self(id));
        }
        let f: f64 = value.parse().ok()?;
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
            Some(Self(f as i64))
        } else {
            None
        }
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A club member. Equality and hashing use the id only; display fields may
/// change between periods.
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub gender: String,
    pub group: String,
}

impl Member {
    pub fn new(
        id: MemberId,
        name: impl Into<String>,
        gender: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            gender: gender.into(),
            group: group.into(),
        }
    }

    /// The four leading columns of every state file line.
    pub fn to_columns(&self) -> String {
        format!("{}\t{}\t{}\t{}", self.id, self.name, self.gender, self.group)
    }

    /// Inverse of [`Member::to_columns`]; `fields` must hold at least four entries.
    pub fn from_columns(fields: &[&str], file: &str, line: usize) -> Result<Self, ReconError> {
        if fields.len() < 4 {
            return Err(ReconError::input(
                file,
                line,
                format!("expected at least 4 tab-separated fields, found {}", fields.len()),
            ));
        }
        let id = MemberId::parse(fields[0]).ok_or_else(|| {
            ReconError::input(file, line, format!("member id '{}' is not numeric", fields[0]))
        })?;
        Ok(Self::new(id, fields[1], fields[2], fields[3]))
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.id, self.group)
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PeriodRange {
    /// Timestamp format of both halves of the period cell.
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";
    /// Separator between start and end in the period cell.
    pub const SEPARATOR: &'static str = "--";

    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, String> {
        if end < start {
            return Err(format!("period ends ({end}) before it starts ({start})"));
        }
        Ok(Self { start, end })
    }

    /// Parse `"2024-03-04 00:00:00--2024-03-10 23:59:59"`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let (start, end) = value
            .trim()
            .split_once(Self::SEPARATOR)
            .ok_or_else(|| format!("period '{value}' has no '{}' separator", Self::SEPARATOR))?;
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s.trim(), Self::TIMESTAMP_FORMAT)
                .map_err(|e| format!("cannot parse timestamp '{}': {e}", s.trim()))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Short history key, `YYYYMMDD-YYYYMMDD`. Sorts in date order.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.start.format(Self::TIMESTAMP_FORMAT),
            Self::SEPARATOR,
            self.end.format(Self::TIMESTAMP_FORMAT)
        )
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One member's run statistics for the current period.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub member: Member,
    pub distance_km: f64,
    pub elapsed: Duration,
    pub run_count: u32,
}

impl RunRecord {
    /// Average seconds per kilometer. `None` when no distance was covered.
    pub fn avg_pace_seconds(&self) -> Option<f64> {
        if self.distance_km > 0.0 {
            Some(self.elapsed.as_secs_f64() / self.distance_km)
        } else {
            None
        }
    }
}

/// Everything read from the current period's spreadsheets.
#[derive(Debug, Clone)]
pub struct PeriodInput {
    pub period: PeriodRange,
    pub group: String,
    pub run_records: Vec<RunRecord>,
    /// Members listed on the "did not run" rosters.
    pub no_run: Vec<Member>,
    /// Members on leave this period.
    pub leave_ids: Vec<MemberId>,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    Distance { km: f64 },
    Pace { seconds_per_km: f64 },
    NoRun,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance { km } => write!(f, "distance {km:.2} km"),
            Self::Pace { seconds_per_km } => write!(f, "pace {}", format_pace(*seconds_per_km)),
            Self::NoRun => write!(f, "no run"),
        }
    }
}

/// `605.4` → `10'05"`.
pub fn format_pace(seconds_per_km: f64) -> String {
    let total = seconds_per_km.round() as u64;
    format!("{}'{:02}\"", total / 60, total % 60)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Qualifying,
    NonQualifying(Reason),
}

/// A non-qualifying member awaiting exemption checks.
#[derive(Debug, Clone)]
pub struct Violation {
    pub member: Member,
    pub reason: Reason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionKind {
    Leave,
    NewMember,
}

impl fmt::Display for ExemptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leave => write!(f, "leave"),
            Self::NewMember => write!(f, "new_member"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exempted {
    pub violation: Violation,
    pub kind: ExemptionKind,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct PassSummary {
    pub run_records: usize,
    pub no_run: usize,
    pub qualifying: usize,
    pub non_qualifying: usize,
    pub exempted_leave: usize,
    pub exempted_new: usize,
    pub violations_recorded: usize,
    pub new_members: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationLine {
    pub id: MemberId,
    pub name: String,
    pub group: String,
    pub reason: Reason,
    pub reason_text: String,
    /// Labels held for this member after the merge, oldest first.
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExemptionLine {
    pub id: MemberId,
    pub name: String,
    pub group: String,
    pub kind: ExemptionKind,
    pub reason_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassMeta {
    pub period: String,
    pub period_label: String,
    pub group: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub meta: PassMeta,
    pub summary: PassSummary,
    pub violations: Vec<ViolationLine>,
    pub exemptions: Vec<ExemptionLine>,
    /// Members whose violation history is full after this pass.
    pub at_limit: Vec<ViolationLine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn member_identity_ignores_display_fields() {
        let a = Member::new(MemberId(7), "Ann", "F", "North");
        let b = Member::new(MemberId(7), "Ann B.", "F", "South");
        assert_eq!(a, b);
        let set: HashSet<Member> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn member_id_accepts_integral_float_text() {
        assert_eq!(MemberId::parse(" 1024 "), Some(MemberId(1024)));
        assert_eq!(MemberId::parse("1024.0"), Some(MemberId(1024)));
        assert_eq!(MemberId::parse("10.5"), None);
        assert_eq!(MemberId::parse("abc"), None);
        assert_eq!(MemberId::parse(""), None);
    }

    #[test]
    fn member_columns_roundtrip() {
        let m = Member::new(MemberId(42), "Bo", "M", "East");
        let line = m.to_columns();
        let fields: Vec<&str> = line.split('\t').collect();
        let parsed = Member::from_columns(&fields, "t", 1).unwrap();
        assert_eq!(parsed.id, MemberId(42));
        assert_eq!(parsed.group, "East");
    }

    #[test]
    fn member_columns_reject_short_line() {
        let err = Member::from_columns(&["1", "x"], "data_members", 3).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn period_parse_and_label() {
        let p = PeriodRange::parse("2024-03-04 00:00:00--2024-03-10 23:59:59").unwrap();
        assert_eq!(p.label(), "20240304-20240310");
        assert_eq!(p.to_string(), "2024-03-04 00:00:00--2024-03-10 23:59:59");
    }

    #[test]
    fn period_rejects_reversed_and_garbage() {
        assert!(PeriodRange::parse("2024-03-10 00:00:00--2024-03-04 00:00:00").is_err());
        assert!(PeriodRange::parse("last week").is_err());
        assert!(PeriodRange::parse("2024-03-04--2024-03-10").is_err());
    }

    #[test]
    fn pace_is_undefined_without_distance() {
        let r = RunRecord {
            member: Member::new(MemberId(1), "a", "", ""),
            distance_km: 0.0,
            elapsed: Duration::from_secs(600),
            run_count: 1,
        };
        assert_eq!(r.avg_pace_seconds(), None);
    }

    #[test]
    fn reason_text() {
        assert_eq!(Reason::Distance { km: 3.2 }.to_string(), "distance 3.20 km");
        assert_eq!(Reason::Pace { seconds_per_km: 665.0 }.to_string(), "pace 11'05\"");
        assert_eq!(Reason::NoRun.to_string(), "no run");
    }
}
