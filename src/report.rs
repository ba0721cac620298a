//! Statistiques par employé et audit des souhaits, calculés à partir de la
//! liste finale d'affectations.

use crate::model::{Plan, PlanningInput, RequestKind, ShiftAssignment, ShiftCode, Worker, WorkerId};
use crate::requests::RequestIndex;
use crate::scheduler::{QuotaRelaxation, SchedError, SolveStatus};
use crate::targets::TargetTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker: WorkerId,
    pub name: String,
    pub day: u32,
    pub night: u32,
    pub extra: u32,
    pub total: u32,
    pub target_shifts: u32,
    pub target_hours: f64,
    /// `total - target_shifts`
    pub difference: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishOutcome {
    Fulfilled,
    SoftViolated,
    /// Absence approuvée non respectée.
    HardViolated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishAudit {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub kind: RequestKind,
    pub approved: bool,
    pub assigned: Option<ShiftCode>,
    pub outcome: WishOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: SolveStatus,
    pub elapsed_ms: u64,
    pub primary_shifts: usize,
    pub extra_shifts: usize,
    pub workers: Vec<WorkerSummary>,
    #[serde(default)]
    pub relaxations: Vec<QuotaRelaxation>,
    #[serde(default)]
    pub wishes: Vec<WishAudit>,
    pub hard_violations: usize,
}

impl RunReport {
    pub fn summary_for(&self, worker: &WorkerId) -> Option<&WorkerSummary> {
        self.workers.iter().find(|s| &s.worker == worker)
    }
}

/// Issue d'un souhait au vu du service effectivement affecté.
pub fn wish_outcome(kind: RequestKind, approved: bool, assigned: Option<ShiftCode>) -> WishOutcome {
    use WishOutcome::*;
    match (kind, assigned) {
        (k, None) if k.is_absence() => Fulfilled,
        (k, Some(_)) if k.is_absence() => {
            if approved {
                HardViolated
            } else {
                SoftViolated
            }
        }
        (RequestKind::DayPreferred, Some(ShiftCode::Day)) => Fulfilled,
        (RequestKind::NightPreferred, Some(ShiftCode::Night)) => Fulfilled,
        (RequestKind::ExtraWork, Some(_)) => Fulfilled,
        _ => SoftViolated,
    }
}

pub fn build_report(
    workers: &[Worker],
    targets: &TargetTable,
    index: &RequestIndex,
    assignments: &[ShiftAssignment],
    status: SolveStatus,
    elapsed_ms: u64,
    relaxations: Vec<QuotaRelaxation>,
) -> RunReport {
    let mut counts: HashMap<&WorkerId, [u32; 3]> = HashMap::new();
    let mut on_day: HashMap<(&WorkerId, NaiveDate), ShiftCode> = HashMap::new();
    for a in assignments {
        let slot = match a.shift {
            ShiftCode::Day => 0,
            ShiftCode::Night => 1,
            ShiftCode::Extra => 2,
        };
        counts.entry(&a.worker).or_default()[slot] += 1;
        on_day.insert((&a.worker, a.date), a.shift);
    }

    let summaries = workers
        .iter()
        .map(|w| {
            let [day, night, extra] = counts.get(&w.id).copied().unwrap_or_default();
            let total = day + night + extra;
            let target = targets.get(&w.id);
            let target_shifts = target.map_or(0, |t| t.shifts);
            WorkerSummary {
                worker: w.id.clone(),
                name: w.name.clone(),
                day,
                night,
                extra,
                total,
                target_shifts,
                target_hours: target.map_or(0.0, |t| t.hours),
                difference: i64::from(total) - i64::from(target_shifts),
            }
        })
        .collect();

    let wishes: Vec<WishAudit> = index
        .all()
        .into_iter()
        .map(|r| {
            let assigned = on_day.get(&(&r.worker, r.date)).copied();
            WishAudit {
                worker: r.worker.clone(),
                date: r.date,
                kind: r.kind,
                approved: r.approved,
                assigned,
                outcome: wish_outcome(r.kind, r.approved, assigned),
            }
        })
        .collect();
    let hard_violations = wishes
        .iter()
        .filter(|w| w.outcome == WishOutcome::HardViolated)
        .count();
    let extra_shifts = assignments
        .iter()
        .filter(|a| a.shift == ShiftCode::Extra)
        .count();

    RunReport {
        status,
        elapsed_ms,
        primary_shifts: assignments.len() - extra_shifts,
        extra_shifts,
        workers: summaries,
        relaxations,
        wishes,
        hard_violations,
    }
}

/// Recalcule le rapport d'un plan enregistré à partir des entrées
/// actuelles (souhaits ajoutés ou modifiés depuis compris).
pub fn audit_plan(input: &PlanningInput, plan: &Plan) -> Result<RunReport, SchedError> {
    let workers = crate::preferences::normalize_all(&input.workers);
    let targets = TargetTable::compute(
        &workers,
        &input.targets,
        &input.shift_types,
        plan.period.start,
        input.options.fallback_target_hours,
    )?;
    let known: HashSet<&WorkerId> = workers.iter().map(|w| &w.id).collect();
    let index = RequestIndex::build(&input.requests, &plan.period, &known);
    Ok(build_report(
        &workers,
        &targets,
        &index,
        &plan.assignments,
        plan.report.status,
        plan.report.elapsed_ms,
        plan.report.relaxations.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MonthlyTarget, PlanningPeriod, Request, ShiftType};

    #[test]
    fn absence_outcomes() {
        use RequestKind::*;
        assert_eq!(wish_outcome(Vacation, true, None), WishOutcome::Fulfilled);
        assert_eq!(wish_outcome(Vacation, true, Some(ShiftCode::Day)), WishOutcome::HardViolated);
        assert_eq!(wish_outcome(NoWork, false, Some(ShiftCode::Extra)), WishOutcome::SoftViolated);
    }

    #[test]
    fn shift_wish_outcomes() {
        use RequestKind::*;
        assert_eq!(wish_outcome(DayPreferred, false, Some(ShiftCode::Day)), WishOutcome::Fulfilled);
        assert_eq!(wish_outcome(DayPreferred, false, Some(ShiftCode::Night)), WishOutcome::SoftViolated);
        assert_eq!(wish_outcome(NightPreferred, true, None), WishOutcome::SoftViolated);
        assert_eq!(wish_outcome(ExtraWork, false, Some(ShiftCode::Extra)), WishOutcome::Fulfilled);
        assert_eq!(wish_outcome(ExtraWork, false, None), WishOutcome::SoftViolated);
    }

    #[test]
    fn counts_and_violations() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        let period = PlanningPeriod::new(d(1), d(7)).unwrap();
        let a = Worker::new("a", "Alice");
        let types = vec![
            ShiftType::new(ShiftCode::Day, 12.0, None),
            ShiftType::new(ShiftCode::Night, 12.0, None),
        ];
        let records = vec![MonthlyTarget {
            worker: a.id.clone(),
            year: 2026,
            month: 4,
            target_hours: 48.0,
            weekly_hours: None,
        }];
        let targets = TargetTable::compute(std::slice::from_ref(&a), &records, &types, d(1), 144.0).unwrap();
        let known: HashSet<&WorkerId> = [&a.id].into_iter().collect();
        let requests = vec![
            Request::new(&a.id, d(2), RequestKind::Vacation, true),
            Request::new(&a.id, d(3), RequestKind::NightPreferred, false),
        ];
        let index = RequestIndex::build(&requests, &period, &known);
        let assignments = vec![
            ShiftAssignment { worker: a.id.clone(), date: d(1), shift: ShiftCode::Day },
            ShiftAssignment { worker: a.id.clone(), date: d(2), shift: ShiftCode::Day },
            ShiftAssignment { worker: a.id.clone(), date: d(3), shift: ShiftCode::Night },
            ShiftAssignment { worker: a.id.clone(), date: d(8), shift: ShiftCode::Extra },
        ];
        let report = build_report(
            std::slice::from_ref(&a),
            &targets,
            &index,
            &assignments,
            SolveStatus::Optimal,
            5,
            Vec::new(),
        );
        let s = report.summary_for(&a.id).unwrap();
        assert_eq!((s.day, s.night, s.extra, s.total), (2, 1, 1, 4));
        assert_eq!(s.target_shifts, 4);
        assert_eq!(s.difference, 0);
        assert_eq!(report.primary_shifts, 3);
        assert_eq!(report.extra_shifts, 1);
        assert_eq!(report.hard_violations, 1);
        assert_eq!(report.wishes[1].outcome, WishOutcome::Fulfilled);
    }
}
