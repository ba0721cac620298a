use super::constraints::{CellVars, ShiftModel};
use super::{DayState, PlanContext, SchedError, SolveStatus};
use crate::model::{Availability, Category};
use good_lp::solvers::highs::highs;
use good_lp::solvers::SolutionStatus;
use good_lp::{Expression, ResolutionError, Solution, SolverModel};
use std::fmt::Write as _;
use tracing::{info, warn};

/// Grille `[employé][date]` issue du solveur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PrimaryGrid {
    pub states: Vec<Vec<DayState>>,
    pub status: SolveStatus,
}

pub(super) fn solve(ctx: &PlanContext, model: ShiftModel, objective: Expression) -> Result<PrimaryGrid, SchedError> {
    let ShiftModel { vars, cells, constraints, .. } = model;
    info!(
        constraints = constraints.len(),
        time_limit_secs = ctx.options.time_limit_secs,
        "starting MILP solver"
    );

    let mut problem = vars
        .minimise(objective)
        .using(highs)
        .set_option("time_limit", ctx.options.time_limit_secs)
        .set_option("threads", 1)
        .set_option("mip_rel_gap", 0.0)
        .set_option("output_flag", false);
    for c in constraints {
        problem.add_constraint(c);
    }

    let solution = match problem.solve() {
        Ok(s) => s,
        Err(e) => {
            return Err(match failure_status(&e) {
                Some(SolveStatus::Infeasible) => {
                    no_plan(ctx, SolveStatus::Infeasible, "the solver proved the model infeasible")
                }
                Some(status) => no_plan(ctx, status, "time budget exhausted without a usable solution"),
                None => SchedError::Other(anyhow::anyhow!("solver failure: {e}")),
            });
        }
    };

    let status = run_status(solution.status());
    match read_grid(&cells, |v| solution.value(v)) {
        Some(states) => {
            info!(%status, "solver returned a plan");
            Ok(PrimaryGrid { states, status })
        }
        None => {
            warn!(%status, "solver incumbent is not a valid assignment");
            Err(no_plan(ctx, SolveStatus::NoSolution, "time budget exhausted without a usable solution"))
        }
    }
}

/// Échecs qui signifient « pas de plan » ; les autres erreurs du solveur
/// (option refusée, modèle mal chargé…) restent des erreurs techniques.
pub(super) fn failure_status(err: &ResolutionError) -> Option<SolveStatus> {
    match err {
        ResolutionError::Infeasible => Some(SolveStatus::Infeasible),
        ResolutionError::Other("NoSolutionFound") => Some(SolveStatus::NoSolution),
        _ => None,
    }
}

/// `GapLimit` : HiGHS a conclu à l'optimalité ; avec `mip_rel_gap = 0` seule
/// la tolérance absolue subsiste.
pub(super) fn run_status(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal | SolutionStatus::GapLimit => SolveStatus::Optimal,
        SolutionStatus::TimeLimit => SolveStatus::Feasible,
    }
}

/// Lit une issue par cellule ; `None` si une cellule n'a pas exactement
/// une variable à 1.
pub(super) fn read_grid<F>(cells: &[Vec<CellVars>], value: F) -> Option<Vec<Vec<DayState>>>
where
    F: Fn(good_lp::Variable) -> f64,
{
    cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    let mut chosen = [DayState::Day, DayState::Night, DayState::Free]
                        .into_iter()
                        .filter(|s| value(cell.get(*s)) >= 0.5);
                    match (chosen.next(), chosen.next()) {
                        (Some(state), None) => Some(state),
                        _ => None,
                    }
                })
                .collect()
        })
        .collect()
}

fn no_plan(ctx: &PlanContext, status: SolveStatus, detail: &str) -> SchedError {
    let explanation = explain(ctx, detail);
    warn!(%status, "no feasible plan");
    SchedError::NoFeasiblePlan { status, explanation }
}

/// Causes probables et diagnostics de l'exécution.
pub(super) fn explain(ctx: &PlanContext, detail: &str) -> String {
    let active: Vec<_> = ctx
        .workers
        .iter()
        .filter(|w| w.availability != Availability::PermanentlyUnavailable)
        .collect();
    let day_capable = active.iter().filter(|w| w.can_work_day).count();
    let night_capable = active.iter().filter(|w| w.can_work_night).count();
    let target = ctx.options.staffing_target as usize;

    let mut out = String::new();
    let _ = writeln!(out, "{detail}.");
    let _ = writeln!(out, "Likely causes:");
    if day_capable < target || night_capable < target {
        let _ = writeln!(
            out,
            "- too few eligible staff for a headcount of {target} ({day_capable} day-capable, {night_capable} night-capable)"
        );
    } else {
        let _ = writeln!(out, "- too few eligible staff on some dates for a headcount of {target}");
    }
    let _ = writeln!(out, "- overlapping approved absences");
    let _ = writeln!(out, "- category B quotas that cannot be met together with the other rules");
    let _ = writeln!(out, "Diagnostics:");
    let _ = writeln!(
        out,
        "- workers: {} ({} active, {day_capable} day-capable, {night_capable} night-capable)",
        ctx.workers.len(),
        active.len()
    );
    let _ = writeln!(out, "- approved absence days: {}", ctx.index.total_blocked_days());
    for worker in ctx.workers.iter().filter(|w| w.category == Category::B) {
        let _ = writeln!(
            out,
            "- category B {}: {} available days (quota needs {})",
            worker.id,
            ctx.index.available_days(&worker.id, &ctx.period),
            ctx.options.category_b_min_available_days
        );
    }
    out.trim_end().to_string()
}
