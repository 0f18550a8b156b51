use super::{RsvpResponse, UpdateTarget};
use crate::error::{ReconcilePhase, RsvpResult};
use crate::roster::normalize_cell;
use crate::store::{CellUpdate, SheetStore};
use log::debug;
use serde::Serialize;

/// Result reported back to the guest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub updated: usize,
    pub not_found: Vec<String>,
}

/// Staged writes plus the outcome they produce.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub updates: Vec<CellUpdate>,
    pub outcome: ReconcileOutcome,
}

/// Match each response to the first sheet row with the same trimmed,
/// case-folded name and stage its writes. Unmatched names are collected,
/// never appended.
pub fn plan_updates(target: &UpdateTarget, names: &[String], responses: &[RsvpResponse]) -> ReconcilePlan {
    let names: Vec<String> = names.iter().map(|n| normalize_cell(n)).collect();
    let mut plan = ReconcilePlan::default();

    for response in responses {
        let wanted = normalize_cell(&response.name);
        // A blank name never identifies a row, and blank cells are never targets
        let matched = if wanted.is_empty() {
            None
        } else {
            names.iter().position(|n| *n == wanted)
        };
        let Some(idx) = matched else {
            plan.outcome.not_found.push(response.name.clone());
            continue;
        };

        let row = target.first_data_row() + idx;
        plan.updates
            .push(CellUpdate::new(&target.tab, &target.attending_col, row, response.attending.to_string()));
        plan.updates.push(CellUpdate::new(
            &target.tab,
            &target.dietary_col,
            row,
            response.dietary_restrictions.clone(),
        ));
        if let Some(staying_col) = &target.staying_col {
            plan.updates
                .push(CellUpdate::new(&target.tab, staying_col, row, response.staying.clone()));
        }
        plan.outcome.updated += 1;
    }

    plan
}

/// Read the name column once, match, and write every staged cell in a single
/// batch. No write call is made when nothing matched.
pub async fn reconcile(
    store: &dyn SheetStore,
    target: &UpdateTarget,
    responses: &[RsvpResponse],
) -> RsvpResult<ReconcileOutcome> {
    debug!("Reconcile phase: {}", ReconcilePhase::Fetching);
    let names = store
        .read_column(&target.name_range())
        .await
        .map_err(|e| e.in_phase(ReconcilePhase::Fetching))?;

    debug!("Reconcile phase: {} ({} rows)", ReconcilePhase::Matching, names.len());
    let plan = plan_updates(target, &names, responses);

    if plan.updates.is_empty() {
        debug!("No rows matched, skipping write");
        return Ok(plan.outcome);
    }

    debug!("Reconcile phase: {} ({} cells)", ReconcilePhase::Writing, plan.updates.len());
    store
        .batch_update(&plan.updates)
        .await
        .map_err(|e| e.in_phase(ReconcilePhase::Writing))?;

    Ok(plan.outcome)
}
