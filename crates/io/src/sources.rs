// Weekly input workbooks: run statistics, no-run rosters, leave lists

use std::path::PathBuf;
use std::time::Duration;

use runclub_recon::config::{parse_column, LeaveLayout, ReconConfig, RosterLayout, RunRecordLayout};
use runclub_recon::model::{Member, MemberId, PeriodInput, PeriodRange, RunRecord};
use runclub_recon::ReconError;
use tracing::{debug, info, warn};

use crate::xlsx::SheetGrid;

// Run-record columns: name, id, group, gender, distance, total time, run count
const RECORD_COLUMNS: usize = 7;
// No-run roster columns: id, name, gender
const ROSTER_COLUMNS: usize = 3;

/// Parsed run-statistics sheet.
#[derive(Debug, Clone)]
pub struct RunRecordSheet {
    pub group: String,
    pub period: PeriodRange,
    pub records: Vec<RunRecord>,
}

/// Parsed no-run roster. Every member is tagged with the roster's group.
#[derive(Debug, Clone)]
pub struct NoRunRoster {
    pub group: String,
    pub members: Vec<Member>,
}

// ---------------------------------------------------------------------------
// Cell value parsing
// ---------------------------------------------------------------------------

/// Parse an elapsed-time cell.
///
/// Accepts `h:mm:ss`, `d.hh:mm:ss`, `mm:ss` (seconds may be fractional), or a
/// bare number read as a fraction of a day, which is how spreadsheets store
/// time-formatted cells.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if !value.contains(':') {
        let days: f64 = value.parse().ok()?;
        if !days.is_finite() || days < 0.0 {
            return None;
        }
        return Duration::try_from_secs_f64((days * 86_400.0).round()).ok();
    }

    let parts: Vec<&str> = value.split(':').collect();
    let (days, hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, 0, whole(m)?, seconds(s)?),
        [h, m, s] => {
            let (d, h) = match h.split_once('.') {
                Some((d, h)) => (whole(d)?, whole(h)?),
                None => (0, whole(h)?),
            };
            (d, h, whole(m)?, seconds(s)?)
        }
        _ => return None,
    };

    // Out-of-range values are unparseable rather than saturated
    let whole_secs = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?;
    Duration::try_from_secs_f64(whole_secs as f64 + seconds).ok()
}

fn whole(s: &str) -> Option<u64> {
    s.trim().parse().ok()
}

fn seconds(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

/// Parse a distance in kilometres. Thousands separators are ignored.
pub fn parse_distance(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    let km: f64 = cleaned.parse().ok()?;
    (km.is_finite() && km >= 0.0).then_some(km)
}

/// Parse a run count. Integral float text is accepted.
pub fn parse_count(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Ok(n) = value.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = value.parse().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64).then_some(f as u32)
}

// ---------------------------------------------------------------------------
// Sheet readers
// ---------------------------------------------------------------------------

fn header_cell<'a>(grid: &'a SheetGrid, reference: &str) -> Result<&'a str, ReconError> {
    let value = grid.cell(reference).ok_or_else(|| {
        ReconError::ConfigValidation(format!("invalid cell reference '{reference}'"))
    })?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ReconError::input(
            grid.name(),
            row_number(reference),
            format!("header cell {reference} is empty"),
        ));
    }
    Ok(value)
}

/// 1-based row of a valid cell reference, for error messages.
fn row_number(reference: &str) -> usize {
    runclub_recon::config::parse_cell_ref(reference).map_or(0, |(r, _)| r + 1)
}

fn required_id(grid: &SheetGrid, raw: &str, line: usize) -> Result<MemberId, ReconError> {
    MemberId::parse(raw).ok_or_else(|| {
        ReconError::input(grid.name(), line, format!("member id '{raw}' is not numeric"))
    })
}

/// Data rows from `data_row` (1-based) to the end of the sheet, skipping
/// rows that are entirely blank. Yields the 0-based row index.
fn data_rows(grid: &SheetGrid, data_row: usize) -> impl Iterator<Item = usize> + '_ {
    (data_row.saturating_sub(1)..grid.height()).filter(move |row| !grid.is_blank_row(*row))
}

pub fn read_run_records(
    grid: &SheetGrid,
    layout: &RunRecordLayout,
) -> Result<RunRecordSheet, ReconError> {
    let group = header_cell(grid, &layout.group_cell)?.to_string();
    let period_text = header_cell(grid, &layout.period_cell)?;
    let period = PeriodRange::parse(period_text).map_err(|e| {
        ReconError::input(grid.name(), row_number(&layout.period_cell), e)
    })?;

    let mut records = Vec::new();
    for row in data_rows(grid, layout.data_row) {
        let line = row + 1;
        let cells = grid.row_values(row, RECORD_COLUMNS);
        let bad = |column: &str, raw: &str| {
            ReconError::input(grid.name(), line, format!("{column} '{raw}' is not valid"))
        };

        let id = required_id(grid, cells[1], line)?;
        let distance_km = parse_distance(cells[4]).ok_or_else(|| bad("distance", cells[4]))?;
        let elapsed = parse_duration(cells[5]).ok_or_else(|| bad("total time", cells[5]))?;
        let run_count = if cells[6].trim().is_empty() {
            0
        } else {
            parse_count(cells[6]).ok_or_else(|| bad("run count", cells[6]))?
        };

        let member_group = match cells[2].trim() {
            "" => group.as_str(),
            g => g,
        };
        records.push(RunRecord {
            member: Member::new(id, cells[0].trim(), cells[3].trim(), member_group),
            distance_km,
            elapsed,
            run_count,
        });
    }

    debug!(file = grid.name(), records = records.len(), "run records parsed");
    Ok(RunRecordSheet {
        group,
        period,
        records,
    })
}

pub fn read_no_run_roster(
    grid: &SheetGrid,
    layout: &RosterLayout,
) -> Result<NoRunRoster, ReconError> {
    let group = header_cell(grid, &layout.group_cell)?.to_string();

    let mut members = Vec::new();
    for row in data_rows(grid, layout.data_row) {
        let line = row + 1;
        let cells = grid.row_values(row, ROSTER_COLUMNS);
        let id = required_id(grid, cells[0], line)?;
        members.push(Member::new(id, cells[1].trim(), cells[2].trim(), group.as_str()));
    }

    Ok(NoRunRoster { group, members })
}

pub fn read_leave_ids(grid: &SheetGrid, layout: &LeaveLayout) -> Result<Vec<MemberId>, ReconError> {
    let col = parse_column(&layout.id_column).ok_or_else(|| {
        ReconError::ConfigValidation(format!("invalid leave id column '{}'", layout.id_column))
    })?;

    let mut ids = Vec::new();
    for row in layout.data_row.saturating_sub(1)..grid.height() {
        let raw = grid.value(row, col);
        if raw.trim().is_empty() {
            continue;
        }
        ids.push(required_id(grid, raw, row + 1)?);
    }
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Whole-period loading
// ---------------------------------------------------------------------------

/// Input files for one reconciliation pass.
#[derive(Debug, Clone)]
pub struct PeriodSources {
    pub run_records: PathBuf,
    pub no_run: Vec<PathBuf>,
    pub leave: Option<PathBuf>,
}

/// Read every input workbook into a [`PeriodInput`].
pub fn load_period_input(
    config: &ReconConfig,
    sources: &PeriodSources,
) -> Result<PeriodInput, ReconError> {
    let layout = &config.layout;

    info!(file = %sources.run_records.display(), "loading run statistics");
    let sheet = read_run_records(&SheetGrid::open(&sources.run_records)?, &layout.run_records)?;
    info!(
        group = %sheet.group,
        period = %sheet.period,
        records = sheet.records.len(),
        "run statistics loaded"
    );

    let mut no_run = Vec::new();
    for path in &sources.no_run {
        let roster = read_no_run_roster(&SheetGrid::open(path)?, &layout.no_run)?;
        info!(group = %roster.group, members = roster.members.len(), "no-run roster loaded");
        if roster.group != sheet.group {
            warn!(
                roster_group = %roster.group,
                group = %sheet.group,
                "no-run roster belongs to a different group"
            );
        }
        no_run.extend(roster.members);
    }

    let leave_ids = match &sources.leave {
        Some(path) => {
            let ids = read_leave_ids(&SheetGrid::open(path)?, &layout.leave)?;
            info!(members = ids.len(), "leave list loaded");
            ids
        }
        None => Vec::new(),
    };

    Ok(PeriodInput {
        period: sheet.period,
        group: sheet.group,
        run_records: sheet.records,
        no_run,
        leave_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> SheetGrid {
        SheetGrid::from_rows(
            "week.xlsx",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn record_sheet(data: &[&[&str]]) -> SheetGrid {
        let mut rows: Vec<&[&str]> = vec![
            &["Group", "Harbour"],
            &[],
            &["Period", "2024-03-18 00:00:00--2024-03-24 23:59:59"],
        ];
        rows.extend(std::iter::repeat(&[][..]).take(7));
        rows.extend_from_slice(data);
        grid(&rows)
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("1:05:30"), Some(Duration::from_secs(3930)));
        assert_eq!(parse_duration("1.02:00:00"), Some(Duration::from_secs(93_600)));
        assert_eq!(parse_duration("55:10"), Some(Duration::from_secs(3310)));
        assert_eq!(parse_duration("0:00:30.5"), Some(Duration::from_millis(30_500)));
        assert_eq!(parse_duration("0.0625"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("fast"), None);
        assert_eq!(parse_duration("1:2:3:4"), None);
        assert_eq!(parse_duration("-0.5"), None);
        assert_eq!(parse_duration("1e300"), None);
        assert_eq!(parse_duration("9999999999999999999:00:00"), None);
        assert_eq!(parse_duration("0:00:1e300"), None);
    }

    #[test]
    fn distances_and_counts() {
        assert_eq!(parse_distance("12.5"), Some(12.5));
        assert_eq!(parse_distance("1,012.0"), Some(1012.0));
        assert_eq!(parse_distance("-1"), None);
        assert_eq!(parse_distance("far"), None);
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("4.0"), Some(4));
        assert_eq!(parse_count("4.5"), None);
    }

    #[test]
    fn reads_run_record_sheet() {
        let g = record_sheet(&[
            &["Ann", "1001", "Harbour", "F", "12.4", "1:10:00", "3"],
            &[],
            &["Bo", "1002.0", "", "M", "4", "25:00", "1"],
        ]);
        let sheet = read_run_records(&g, &RunRecordLayout::default()).unwrap();
        assert_eq!(sheet.group, "Harbour");
        assert_eq!(sheet.period.label(), "20240318-20240324");
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[0].member.name, "Ann");
        assert_eq!(sheet.records[0].elapsed, Duration::from_secs(4200));
        assert_eq!(sheet.records[1].member.id, MemberId(1002));
        // Blank group cell falls back to the sheet group
        assert_eq!(sheet.records[1].member.group, "Harbour");
    }

    #[test]
    fn bad_record_row_reports_its_line() {
        let g = record_sheet(&[&["Ann", "1001", "Harbour", "F", "lots", "1:10:00", "3"]]);
        let err = read_run_records(&g, &RunRecordLayout::default()).unwrap_err();
        assert!(matches!(err, ReconError::InputFormat { line: 11, .. }), "{err}");
    }

    #[test]
    fn malformed_period_header_is_rejected() {
        let g = grid(&[&["", "Harbour"], &[], &["", "last week"]]);
        assert!(matches!(
            read_run_records(&g, &RunRecordLayout::default()).unwrap_err(),
            ReconError::InputFormat { line: 3, .. }
        ));
    }

    #[test]
    fn missing_group_header_is_rejected() {
        let g = grid(&[&[], &[], &["", "2024-03-18 00:00:00--2024-03-24 23:59:59"]]);
        assert!(matches!(
            read_run_records(&g, &RunRecordLayout::default()).unwrap_err(),
            ReconError::InputFormat { line: 1, .. }
        ));
    }

    #[test]
    fn reads_roster_with_group_from_header() {
        let mut rows: Vec<&[&str]> = vec![&[], &[], &[], &["Group", "Harbour"], &[], &[]];
        rows.push(&["2001", "Cy", "M"]);
        rows.push(&["2002", "Di", "F"]);
        let roster = read_no_run_roster(&grid(&rows), &RosterLayout::default()).unwrap();
        assert_eq!(roster.group, "Harbour");
        assert_eq!(roster.members.len(), 2);
        assert!(roster.members.iter().all(|m| m.group == "Harbour"));
    }

    #[test]
    fn roster_rejects_non_numeric_id() {
        let rows: Vec<&[&str]> = vec![&[], &[], &[], &["", "Harbour"], &[], &[], &["abc", "Cy", "M"]];
        assert!(matches!(
            read_no_run_roster(&grid(&rows), &RosterLayout::default()).unwrap_err(),
            ReconError::InputFormat { line: 7, .. }
        ));
    }

    #[test]
    fn reads_leave_ids_from_configured_column() {
        let rows: Vec<&[&str]> = vec![
            &["Leave list"],
            &[],
            &["Name", "Group", "Id"],
            &["Ann", "Harbour", "1001"],
            &["", "", ""],
            &["Bo", "Harbour", "1002.0"],
        ];
        let ids = read_leave_ids(&grid(&rows), &LeaveLayout::default()).unwrap();
        assert_eq!(ids, vec![MemberId(1001), MemberId(1002)]);
    }
}
