//! Load a whole period from real workbooks on disk.

use std::path::Path;

use runclub_io::{load_period_input, PeriodSources};
use runclub_recon::config::ReconConfig;
use runclub_recon::model::MemberId;
use runclub_recon::ReconError;
use rust_xlsxwriter::Workbook;

fn write_records(path: &Path, rows: &[(&str, f64, &str, f64, &str)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Group").unwrap();
    sheet.write_string(0, 1, "Harbour").unwrap();
    sheet.write_string(2, 0, "Period").unwrap();
    sheet
        .write_string(2, 1, "2024-03-18 00:00:00--2024-03-24 23:59:59")
        .unwrap();
    for (i, (name, id, gender, km, time)) in rows.iter().enumerate() {
        let r = 10 + i as u32;
        sheet.write_string(r, 0, *name).unwrap();
        sheet.write_number(r, 1, *id).unwrap();
        sheet.write_string(r, 2, "Harbour").unwrap();
        sheet.write_string(r, 3, *gender).unwrap();
        sheet.write_number(r, 4, *km).unwrap();
        sheet.write_string(r, 5, *time).unwrap();
        sheet.write_number(r, 6, 2.0).unwrap();
    }
    workbook.save(path).unwrap();
}

fn write_roster(path: &Path, rows: &[(f64, &str, &str)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(3, 1, "Harbour").unwrap();
    for (i, (id, name, gender)) in rows.iter().enumerate() {
        let r = 6 + i as u32;
        sheet.write_number(r, 0, *id).unwrap();
        sheet.write_string(r, 1, *name).unwrap();
        sheet.write_string(r, 2, *gender).unwrap();
    }
    workbook.save(path).unwrap();
}

fn write_leave(path: &Path, ids: &[f64]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(2, 2, "Id").unwrap();
    for (i, id) in ids.iter().enumerate() {
        sheet.write_number(3 + i as u32, 2, *id).unwrap();
    }
    workbook.save(path).unwrap();
}

#[test]
fn loads_all_three_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("stats.xlsx");
    let roster = dir.path().join("no_run.xlsx");
    let leave = dir.path().join("leave.xlsx");

    write_records(
        &records,
        &[
            ("Ann", 1001.0, "F", 12.0, "1:05:00"),
            ("Bo", 1002.0, "M", 3.5, "30:00"),
        ],
    );
    write_roster(&roster, &[(2001.0, "Cy", "M")]);
    write_leave(&leave, &[2001.0]);

    let input = load_period_input(
        &ReconConfig::default(),
        &PeriodSources {
            run_records: records,
            no_run: vec![roster],
            leave: Some(leave),
        },
    )
    .unwrap();

    assert_eq!(input.group, "Harbour");
    assert_eq!(input.period.label(), "20240318-20240324");
    assert_eq!(input.run_records.len(), 2);
    assert_eq!(input.run_records[0].member.id, MemberId(1001));
    assert_eq!(input.run_records[1].distance_km, 3.5);
    assert_eq!(input.no_run.len(), 1);
    assert_eq!(input.no_run[0].group, "Harbour");
    assert_eq!(input.leave_ids, vec![MemberId(2001)]);
}

#[test]
fn multiple_rosters_are_concatenated() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("stats.xlsx");
    let a = dir.path().join("a.xlsx");
    let b = dir.path().join("b.xlsx");
    write_records(&records, &[]);
    write_roster(&a, &[(1.0, "A", "F")]);
    write_roster(&b, &[(2.0, "B", "M"), (3.0, "C", "F")]);

    let input = load_period_input(
        &ReconConfig::default(),
        &PeriodSources {
            run_records: records,
            no_run: vec![a, b],
            leave: None,
        },
    )
    .unwrap();
    let ids: Vec<i64> = input.no_run.iter().map(|m| m.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(input.leave_ids.is_empty());
}

#[test]
fn missing_roster_file_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("stats.xlsx");
    write_records(&records, &[]);

    let err = load_period_input(
        &ReconConfig::default(),
        &PeriodSources {
            run_records: records,
            no_run: vec![dir.path().join("gone.xlsx")],
            leave: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, ReconError::MissingFile(ref f) if f.ends_with("gone.xlsx")));
}
