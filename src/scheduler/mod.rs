mod constraints;
mod extra;
mod objective;
mod solve;
mod types;
mod util;

pub use types::{DayState, EngineOptions, QuotaRelaxation, SchedError, SolveStatus, Weights};

use crate::model::{
    MonthlyTarget, Plan, PlanId, PlanningInput, PlanningPeriod, Request, ShiftAssignment, ShiftCode,
    ShiftType, Worker, WorkerId,
};
use crate::requests::RequestIndex;
use crate::targets::TargetTable;
use crate::{preferences, report};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

/// Données figées d'une exécution, partagées par toutes les étapes.
#[derive(Debug, Clone)]
pub(crate) struct PlanContext {
    pub period: PlanningPeriod,
    pub dates: Vec<NaiveDate>,
    pub workers: Vec<Worker>,
    pub index: RequestIndex,
    pub targets: TargetTable,
    pub previous_night: HashSet<WorkerId>,
    pub extra: Option<ShiftType>,
    pub options: EngineOptions,
}

impl PlanContext {
    pub(crate) fn build(
        period: PlanningPeriod,
        workers: Vec<Worker>,
        requests: &[Request],
        targets: &[MonthlyTarget],
        shift_types: &[ShiftType],
        previous_night: Vec<WorkerId>,
        options: EngineOptions,
    ) -> Result<Self, SchedError> {
        if period.end < period.start {
            return Err(SchedError::InvalidPeriod(format!(
                "{} is before {}",
                period.end, period.start
            )));
        }
        let limit = options.time_limit_secs;
        if !(limit.is_finite() && limit > 0.0) {
            return Err(SchedError::InvalidOption(format!(
                "time_limit_secs must be a positive number of seconds, got {limit}"
            )));
        }
        let mut seen = HashSet::new();
        for worker in &workers {
            if !seen.insert(&worker.id) {
                return Err(SchedError::DuplicateWorker(worker.id.to_string()));
            }
        }
        let extra = shift_types.iter().find(|t| t.code == ShiftCode::Extra).cloned();
        if let Some(st) = &extra {
            if !(st.hours.is_finite() && st.hours > 0.0) {
                return Err(SchedError::InvalidShiftType { code: st.code, hours: st.hours });
            }
        }
        let targets = TargetTable::compute(
            &workers,
            targets,
            shift_types,
            period.start,
            options.fallback_target_hours,
        )?;
        let index = RequestIndex::build(requests, &period, &seen);
        Ok(Self {
            period,
            dates: period.dates(),
            index,
            targets,
            previous_night: previous_night.into_iter().collect(),
            extra,
            options,
            workers,
        })
    }

    /// Normalise les fiches brutes puis construit le contexte.
    pub(crate) fn from_input(input: &PlanningInput, options: EngineOptions) -> Result<Self, SchedError> {
        Self::build(
            input.period,
            preferences::normalize_all(&input.workers),
            &input.requests,
            &input.targets,
            &input.shift_types,
            input.previous_night.clone(),
            options,
        )
    }
}

/// Moteur de planification : une exécution = un plan complet ou une erreur.
#[derive(Debug, Default, Clone)]
pub struct Scheduler {
    time_limit_secs: Option<f64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remplace le budget du solveur lu dans les options d'entrée.
    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    pub fn generate(&self, input: &PlanningInput) -> Result<Plan, SchedError> {
        let started = Instant::now();
        let mut options = input.options.clone();
        if let Some(secs) = self.time_limit_secs {
            options.time_limit_secs = secs;
        }
        let ctx = PlanContext::from_input(input, options)?;
        info!(
            start = %ctx.period.start,
            end = %ctx.period.end,
            workers = ctx.workers.len(),
            requests = ctx.index.len(),
            "planning run started"
        );

        let mut model = constraints::build(&ctx);
        let relaxations = std::mem::take(&mut model.relaxations);
        let objective = objective::compose(&ctx, &mut model);
        let grid = solve::solve(&ctx, model, objective)?;

        let mut assignments = materialize(&ctx, &grid.states);
        let primary = assignments.len();
        if let Some(extra) = &ctx.extra {
            assignments.extend(extra::allocate(&ctx, extra, &grid.states));
            let order: std::collections::HashMap<&WorkerId, usize> =
                ctx.workers.iter().enumerate().map(|(i, w)| (&w.id, i)).collect();
            assignments.sort_by_key(|a| (order.get(&a.worker).copied(), a.date));
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let report = report::build_report(
            &ctx.workers,
            &ctx.targets,
            &ctx.index,
            &assignments,
            grid.status,
            elapsed_ms,
            relaxations,
        );
        info!(
            status = %grid.status,
            primary,
            extra = assignments.len() - primary,
            elapsed_ms,
            "planning run finished"
        );
        Ok(Plan {
            id: PlanId::random(),
            period: ctx.period,
            assignments,
            report,
        })
    }
}

/// Grille → affectations Jour/Nuit, employé puis date.
fn materialize(ctx: &PlanContext, states: &[Vec<DayState>]) -> Vec<ShiftAssignment> {
    ctx.workers
        .iter()
        .zip(states)
        .flat_map(|(worker, row)| {
            ctx.dates.iter().zip(row).filter_map(move |(date, state)| {
                state.shift().map(|shift| ShiftAssignment {
                    worker: worker.id.clone(),
                    date: *date,
                    shift,
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> PlanningPeriod {
        PlanningPeriod::new(
            NaiveDate::from_ymd_opt(2026, 4, 6).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 8).unwrap(),
        )
        .unwrap()
    }

    fn types() -> Vec<ShiftType> {
        vec![
            ShiftType::new(ShiftCode::Day, 8.0, None),
            ShiftType::new(ShiftCode::Night, 12.0, None),
        ]
    }

    #[test]
    fn duplicate_workers_are_rejected() {
        let workers = vec![Worker::new("a", "A"), Worker::new("a", "A bis")];
        let err = PlanContext::build(period(), workers, &[], &[], &types(), Vec::new(), EngineOptions::default())
            .unwrap_err();
        assert!(matches!(err, SchedError::DuplicateWorker(id) if id == "a"));
    }

    #[test]
    fn inverted_period_is_rejected() {
        let mut p = period();
        std::mem::swap(&mut p.start, &mut p.end);
        let err = PlanContext::build(p, vec![], &[], &[], &types(), Vec::new(), EngineOptions::default())
            .unwrap_err();
        assert!(matches!(err, SchedError::InvalidPeriod(_)));
    }

    #[test]
    fn non_positive_time_limit_is_rejected() {
        for limit in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let options = EngineOptions {
                time_limit_secs: limit,
                ..EngineOptions::default()
            };
            let err = PlanContext::build(period(), vec![], &[], &[], &types(), Vec::new(), options).unwrap_err();
            assert!(matches!(err, SchedError::InvalidOption(_)), "{limit}: {err}");
            assert!(!err.is_infeasible());
        }
    }

    #[test]
    fn materializes_worker_then_date() {
        let workers = vec![Worker::new("a", "A"), Worker::new("b", "B")];
        let ctx = PlanContext::build(period(), workers, &[], &[], &types(), Vec::new(), EngineOptions::default())
            .unwrap();
        let states = vec![
            vec![DayState::Night, DayState::Free, DayState::Day],
            vec![DayState::Day, DayState::Day, DayState::Free],
        ];
        let out = materialize(&ctx, &states);
        let flat: Vec<(&str, u32, ShiftCode)> = out
            .iter()
            .map(|a| (a.worker.as_str(), chrono::Datelike::day(&a.date), a.shift))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("a", 6, ShiftCode::Night),
                ("a", 8, ShiftCode::Day),
                ("b", 6, ShiftCode::Day),
                ("b", 7, ShiftCode::Day),
            ]
        );
    }
}
