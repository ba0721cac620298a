//! Fonction objectif : effectifs, écart à la cible, souhaits.

use super::constraints::{headcount, ShiftModel};
use super::{DayState, PlanContext, Weights};
use crate::model::{Priority, Request, RequestKind};
use good_lp::{variable, Expression};

/// Coût par issue pour une cellule (employé, date).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct CellWeights {
    pub day: i64,
    pub night: i64,
    pub free: i64,
}

impl CellWeights {
    fn is_zero(&self) -> bool {
        self.day == 0 && self.night == 0 && self.free == 0
    }
}

/// Somme des termes de préférence de toutes les demandes d'une journée,
/// chacune pondérée par la priorité de l'employé.
pub(super) fn preference_weights(requests: &[Request], priority: Priority, weights: &Weights) -> CellWeights {
    let mut out = CellWeights::default();
    for request in requests {
        let (day, night, free) = match request.kind {
            RequestKind::DayPreferred => (-weights.preference, weights.preference, 0),
            RequestKind::NightPreferred => (weights.preference, -weights.preference, 0),
            RequestKind::ExtraWork => (-weights.extra_work, -weights.extra_work, 0),
            RequestKind::Vacation | RequestKind::NoWork if request.approved => (
                weights.approved_absence,
                weights.approved_absence,
                -weights.approved_absence,
            ),
            RequestKind::Vacation | RequestKind::NoWork => {
                (weights.unapproved_absence, weights.unapproved_absence, 0)
            }
        };
        out.day += priority.scale(day);
        out.night += priority.scale(night);
        out.free += priority.scale(free);
    }
    out
}

/// Ajoute au modèle les variables auxiliaires et retourne l'objectif à minimiser.
pub(super) fn compose(ctx: &PlanContext, model: &mut ShiftModel) -> Expression {
    let w = &ctx.options.weights;
    let mut objective = Expression::from(0.0);

    let target = f64::from(ctx.options.staffing_target);
    let max = f64::from(ctx.options.staffing_max);
    for (d, date) in ctx.dates.iter().enumerate() {
        for state in [DayState::Day, DayState::Night] {
            let staffed = headcount(model, d, state);
            let dev = model
                .vars
                .add(variable().min(0.0).name(format!("dev_{date}_{state:?}")));
            let empty = model
                .vars
                .add(variable().binary().name(format!("empty_{date}_{state:?}")));
            model.constraints.push((staffed.clone() - dev).leq(target));
            model.constraints.push((staffed.clone() + dev).geq(target));
            // empty = 1 <=> personne n'est affecté
            model.constraints.push((staffed.clone() + empty).geq(1.0));
            model.constraints.push((staffed + empty * max).leq(max));
            objective += w.staffing_deviation as f64 * dev;
            objective += w.uncovered_shift as f64 * empty;
        }
    }

    for (i, worker) in ctx.workers.iter().enumerate() {
        let wanted = f64::from(ctx.targets.shifts_for(&worker.id));
        let actual = ctx
            .dates
            .iter()
            .enumerate()
            .filter(|(_, date)| !ctx.index.is_blocked(&worker.id, **date))
            .fold(Expression::from(0.0), |acc, (d, _)| acc + model.cells[i][d].working());
        let dev = model
            .vars
            .add(variable().min(0.0).name(format!("{}_target_dev", worker.id)));
        model.constraints.push((actual.clone() - dev).leq(wanted));
        model.constraints.push((actual + dev).geq(wanted));
        objective += w.target_deviation as f64 * dev;
    }

    for (i, worker) in ctx.workers.iter().enumerate() {
        for (d, date) in ctx.dates.iter().enumerate() {
            let cost = preference_weights(ctx.index.requests_on(&worker.id, *date), worker.priority, w);
            if cost.is_zero() {
                continue;
            }
            let cell = model.cells[i][d];
            objective += cost.day as f64 * cell.day;
            objective += cost.night as f64 * cell.night;
            objective += cost.free as f64 * cell.free;
        }
    }

    objective
}
