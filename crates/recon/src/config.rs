use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Batch configuration. Every section has defaults, so an empty document is
/// a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub state: StateFiles,
    #[serde(default)]
    pub layout: LayoutConfig,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Qualifying bounds for one period's run statistics.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_min_distance_km")]
    pub min_distance_km: f64,
    /// Slowest qualifying average pace, seconds per kilometer.
    #[serde(default = "default_max_pace_seconds")]
    pub max_pace_seconds: f64,
}

fn default_min_distance_km() -> f64 {
    10.0
}

fn default_max_pace_seconds() -> f64 {
    600.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_distance_km: default_min_distance_km(),
            max_pace_seconds: default_max_pace_seconds(),
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HistoryConfig {
    /// Most-recent labels kept per member.
    #[serde(default = "default_retention")]
    pub retention: usize,
    #[serde(default)]
    pub carry: CarryPolicy,
}

fn default_retention() -> usize {
    3
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
            carry: CarryPolicy::default(),
        }
    }
}

/// What happens to a member's persisted labels in a period where the member
/// has no entry of that kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryPolicy {
    /// Keep the labels; they only age out by count.
    #[default]
    Rolling,
    /// Drop the labels unless the member is exempted this period, so a file
    /// only ever holds unbroken streaks.
    Streak,
}

impl std::fmt::Display for CarryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rolling => write!(f, "rolling"),
            Self::Streak => write!(f, "streak"),
        }
    }
}

// ---------------------------------------------------------------------------
// State files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StateFiles {
    #[serde(default = "default_members_file")]
    pub members: String,
    #[serde(default = "default_violations_file")]
    pub violations: String,
    #[serde(default = "default_non_break_file")]
    pub non_break: String,
}

fn default_members_file() -> String {
    "data_members".into()
}

fn default_violations_file() -> String {
    "data_no_run".into()
}

fn default_non_break_file() -> String {
    "data_no_break_run".into()
}

impl Default for StateFiles {
    fn default() -> Self {
        Self {
            members: default_members_file(),
            violations: default_violations_file(),
            non_break: default_non_break_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// Where things live in the club app's exported spreadsheets. Rows are
/// 1-based, as displayed by spreadsheet programs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub run_records: RunRecordLayout,
    #[serde(default)]
    pub no_run: RosterLayout,
    #[serde(default)]
    pub leave: LeaveLayout,
}

/// Columns: name, id, group, gender, distance (km), total time, run count.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRecordLayout {
    #[serde(default = "default_run_group_cell")]
    pub group_cell: String,
    #[serde(default = "default_period_cell")]
    pub period_cell: String,
    #[serde(default = "default_run_data_row")]
    pub data_row: usize,
}

fn default_run_group_cell() -> String {
    "B1".into()
}

fn default_period_cell() -> String {
    "B3".into()
}

fn default_run_data_row() -> usize {
    11
}

impl Default for RunRecordLayout {
    fn default() -> Self {
        Self {
            group_cell: default_run_group_cell(),
            period_cell: default_period_cell(),
            data_row: default_run_data_row(),
        }
    }
}

/// Columns: id, name, gender.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterLayout {
    #[serde(default = "default_roster_group_cell")]
    pub group_cell: String,
    #[serde(default = "default_roster_data_row")]
    pub data_row: usize,
}

fn default_roster_group_cell() -> String {
    "B4".into()
}

fn default_roster_data_row() -> usize {
    7
}

impl Default for RosterLayout {
    fn default() -> Self {
        Self {
            group_cell: default_roster_group_cell(),
            data_row: default_roster_data_row(),
        }
    }
}

/// Columns: sign-up time, name, id, leave reason.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveLayout {
    #[serde(default = "default_leave_data_row")]
    pub data_row: usize,
    #[serde(default = "default_leave_id_column")]
    pub id_column: String,
}

fn default_leave_data_row() -> usize {
    4
}

fn default_leave_id_column() -> String {
    "C".into()
}

impl Default for LeaveLayout {
    fn default() -> Self {
        Self {
            data_row: default_leave_data_row(),
            id_column: default_leave_id_column(),
        }
    }
}

/// Parse a cell reference like "A1" or "AA100" into 0-based (row, col).
pub fn parse_cell_ref(s: &str) -> Option<(usize, usize)> {
    let s = s.trim().to_uppercase();
    let split = s.find(|c: char| !c.is_ascii_alphabetic())?;
    let (col_str, row_str) = s.split_at(split);
    let col = parse_column(col_str)?;
    if !row_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let row: usize = row_str.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}

/// Convert column letters to a 0-based index (A=0, Z=25, AA=26, ...).
pub fn parse_column(s: &str) -> Option<usize> {
    let s = s.trim().to_uppercase();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut col: usize = 0;
    for c in s.chars() {
        col = col
            .checked_mul(26)?
            .checked_add(c as usize - 'A' as usize + 1)?;
    }
    Some(col - 1)
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let t = &self.thresholds;
        if !t.min_distance_km.is_finite() || t.min_distance_km < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "thresholds.min_distance_km must be a non-negative number, got {}",
                t.min_distance_km
            )));
        }
        if !t.max_pace_seconds.is_finite() || t.max_pace_seconds <= 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "thresholds.max_pace_seconds must be positive, got {}",
                t.max_pace_seconds
            )));
        }

        if self.history.retention == 0 {
            return Err(ReconError::ConfigValidation(
                "history.retention must be at least 1".into(),
            ));
        }

        let files = [
            ("state.members", &self.state.members),
            ("state.violations", &self.state.violations),
            ("state.non_break", &self.state.non_break),
        ];
        for (key, name) in files {
            if name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{key} must not be empty")));
            }
        }
        for (i, (key_a, a)) in files.iter().enumerate() {
            for (key_b, b) in &files[i + 1..] {
                if a == b {
                    return Err(ReconError::ConfigValidation(format!(
                        "{key_a} and {key_b} both point at '{a}'"
                    )));
                }
            }
        }

        let l = &self.layout;
        let cells = [
            ("layout.run_records.group_cell", &l.run_records.group_cell),
            ("layout.run_records.period_cell", &l.run_records.period_cell),
            ("layout.no_run.group_cell", &l.no_run.group_cell),
        ];
        for (key, cell) in cells {
            if parse_cell_ref(cell).is_none() {
                return Err(ReconError::ConfigValidation(format!(
                    "{key}: '{cell}' is not a cell reference"
                )));
            }
        }
        if parse_column(&l.leave.id_column).is_none() {
            return Err(ReconError::ConfigValidation(format!(
                "layout.leave.id_column: '{}' is not a column",
                l.leave.id_column
            )));
        }
        let rows = [
            ("layout.run_records.data_row", l.run_records.data_row),
            ("layout.no_run.data_row", l.no_run.data_row),
            ("layout.leave.data_row", l.leave.data_row),
        ];
        for (key, row) in rows {
            if row == 0 {
                return Err(ReconError::ConfigValidation(format!("{key} is 1-based, got 0")));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
