//! Suppression of current-period violations.
//!
//! Leave counts as having run, and new members get one period of grace.
//! Both filters are plain set subtractions over a fresh Vec; the input is
//! never modified.

use std::collections::HashSet;

use tracing::info;

use crate::model::{Exempted, ExemptionKind, MemberId, Violation};
use crate::registry::Registry;

#[derive(Debug, Default)]
pub struct ExemptionOutcome {
    pub kept: Vec<Violation>,
    pub exempted: Vec<Exempted>,
}

impl ExemptionOutcome {
    pub fn count(&self, kind: ExemptionKind) -> usize {
        self.exempted.iter().filter(|e| e.kind == kind).count()
    }
}

/// Split `pending` by whether `is_exempt` holds.
fn partition(
    pending: Vec<Violation>,
    kind: ExemptionKind,
    is_exempt: impl Fn(MemberId) -> bool,
) -> (Vec<Violation>, Vec<Exempted>) {
    let mut kept = Vec::with_capacity(pending.len());
    let mut exempted = Vec::new();
    for violation in pending {
        if is_exempt(violation.member.id) {
            info!("    {}", violation.member);
            exempted.push(Exempted { violation, kind });
        } else {
            kept.push(violation);
        }
    }
    (kept, exempted)
}

pub fn filter_leave(
    pending: Vec<Violation>,
    leave_ids: &HashSet<MemberId>,
) -> (Vec<Violation>, Vec<Exempted>) {
    info!("marking leave among non-qualifying members");
    if leave_ids.is_empty() {
        return (pending, Vec::new());
    }
    partition(pending, ExemptionKind::Leave, |id| leave_ids.contains(&id))
}

pub fn filter_new_members(
    pending: Vec<Violation>,
    registry: &Registry,
) -> (Vec<Violation>, Vec<Exempted>) {
    info!("marking new members among non-qualifying members");
    partition(pending, ExemptionKind::NewMember, |id| {
        registry.is_new_this_period(id)
    })
}

/// Leave filter, then new-member filter. A member matching both is
/// exempted once, as leave.
pub fn apply(
    pending: Vec<Violation>,
    leave_ids: &HashSet<MemberId>,
    registry: &Registry,
) -> ExemptionOutcome {
    let (after_leave, mut exempted) = filter_leave(pending, leave_ids);
    let (kept, new_members) = filter_new_members(after_leave, registry);
    exempted.extend(new_members);
    ExemptionOutcome { kept, exempted }
}
