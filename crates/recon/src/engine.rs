use std::collections::HashSet;

use tracing::{info, warn};

use crate::classify::classify_all;
use crate::config::{CarryPolicy, ReconConfig};
use crate::exemption::{self, ExemptionOutcome};
use crate::history::HistoryStore;
use crate::model::{
    ExemptionKind, ExemptionLine, MemberId, PassMeta, PassReport, PassSummary, PeriodInput,
    Reason, RunRecord, Violation, ViolationLine,
};
use crate::registry::Registry;

/// Everything persisted between runs.
#[derive(Debug, Clone)]
pub struct ReconState {
    pub registry: Registry,
    pub violations: HistoryStore,
    pub non_break: HistoryStore,
}

impl ReconState {
    /// Fresh state for a first run.
    pub fn empty(config: &ReconConfig) -> Self {
        Self {
            registry: Registry::new(),
            violations: HistoryStore::new(&config.state.violations, config.history.retention),
            non_break: HistoryStore::new(&config.state.non_break, config.history.retention),
        }
    }
}

/// Output of one period's pass: the state to persist and what happened.
#[derive(Debug)]
pub struct PassResult {
    pub state: ReconState,
    pub report: PassReport,
}

/// Reconcile one period against the prior state.
///
/// Order is fixed: register every observed member, classify, filter
/// exemptions, merge both histories. The prior state is consumed, so
/// nothing reaches disk unless the whole pass ran.
pub fn run(config: &ReconConfig, mut input: PeriodInput, state: ReconState) -> PassResult {
    let ReconState {
        mut registry,
        mut violations,
        mut non_break,
    } = state;
    input.run_records = first_record_per_member(input.run_records);
    let label = input.period.label();
    info!(
        "period {} ({label}), {} run records, {} no-run entries",
        input.period,
        input.run_records.len(),
        input.no_run.len()
    );

    // 1. Register first: the new-member filter depends on it
    for record in &input.run_records {
        registry.observe(&record.member, &label);
    }
    for member in &input.no_run {
        registry.observe(member, &label);
    }

    // 2. Classify
    info!("separating qualifying and non-qualifying run records");
    let classified = classify_all(&input.run_records, &config.thresholds);
    let qualifying = classified.qualifying;
    let pending = pending_violations(classified.non_qualifying, &input);
    let non_qualifying = pending.len();

    // 3. Exemptions, violations only
    let leave_ids: HashSet<MemberId> = input.leave_ids.iter().copied().collect();
    let outcome = exemption::apply(pending, &leave_ids, &registry);

    // 4. Merge
    for violation in &outcome.kept {
        violations.add_current_violation(&violation.member, &label);
    }
    violations.merge();
    for member in &qualifying {
        non_break.add_current_violation(member, &label);
    }
    non_break.merge();

    if config.history.carry == CarryPolicy::Streak {
        let keep = |id: MemberId| leave_ids.contains(&id) || registry.is_new_this_period(id);
        for store in [&mut violations, &mut non_break] {
            let released = store.release_untouched(keep);
            if !released.is_empty() {
                info!("{}: {} streak(s) ended", store.name(), released.len());
            }
        }
    }

    let report = build_report(
        config,
        &input,
        &label,
        &registry,
        &violations,
        &outcome,
        qualifying.len(),
        non_qualifying,
    );
    info!(
        "{} qualifying, {} violations recorded, {} exempted, {} at the limit",
        report.summary.qualifying,
        report.summary.violations_recorded,
        outcome.exempted.len(),
        report.at_limit.len()
    );

    PassResult {
        state: ReconState {
            registry,
            violations,
            non_break,
        },
        report,
    }
}

/// One run record per member; later rows for the same id are dropped.
fn first_record_per_member(records: Vec<RunRecord>) -> Vec<RunRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let first = seen.insert(record.member.id);
            if !first {
                warn!(member = %record.member, "duplicate run record; keeping the first");
            }
            first
        })
        .collect()
}

/// Non-qualifying run records followed by roster members. A roster member
/// who also has a run record is judged by the record.
fn pending_violations(non_qualifying: Vec<Violation>, input: &PeriodInput) -> Vec<Violation> {
    let with_records: HashSet<MemberId> =
        input.run_records.iter().map(|r| r.member.id).collect();
    let mut seen: HashSet<MemberId> = non_qualifying.iter().map(|v| v.member.id).collect();
    let mut pending = non_qualifying;

    for member in &input.no_run {
        if with_records.contains(&member.id) {
            warn!(member = %member, "listed as not running but has a run record; using the record");
            continue;
        }
        if seen.insert(member.id) {
            pending.push(Violation {
                member: member.clone(),
                reason: Reason::NoRun,
            });
        }
    }
    pending
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    config: &ReconConfig,
    input: &PeriodInput,
    label: &str,
    registry: &Registry,
    violations: &HistoryStore,
    outcome: &ExemptionOutcome,
    qualifying: usize,
    non_qualifying: usize,
) -> PassReport {
    let lines: Vec<ViolationLine> = outcome
        .kept
        .iter()
        .map(|v| ViolationLine {
            id: v.member.id,
            name: v.member.name.clone(),
            group: v.member.group.clone(),
            reason: v.reason,
            reason_text: v.reason.to_string(),
            history: violations
                .labels(v.member.id)
                .map(|l| l.iter().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();

    let at_limit = lines
        .iter()
        .filter(|l| l.history.len() >= config.history.retention)
        .cloned()
        .collect();

    let exemptions = outcome
        .exempted
        .iter()
        .map(|e| ExemptionLine {
            id: e.violation.member.id,
            name: e.violation.member.name.clone(),
            group: e.violation.member.group.clone(),
            kind: e.kind,
            reason_text: e.violation.reason.to_string(),
        })
        .collect();

    PassReport {
        meta: PassMeta {
            period: input.period.to_string(),
            period_label: label.to_string(),
            group: input.group.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: PassSummary {
            run_records: input.run_records.len(),
            no_run: input.no_run.len(),
            qualifying,
            non_qualifying,
            exempted_leave: outcome.count(ExemptionKind::Leave),
            exempted_new: outcome.count(ExemptionKind::NewMember),
            violations_recorded: lines.len(),
            new_members: registry.new_members().count(),
        },
        violations: lines,
        exemptions,
        at_limit,
    }
}
