//! Contraintes dures du modèle : une variable binaire par
//! (employé, date, issue) avec issue ∈ {Jour, Nuit, Repos}.

use super::{util, DayState, PlanContext, QuotaRelaxation};
use crate::model::{Category, ShiftCode, Worker};
use good_lp::{variable, Constraint, Expression, ProblemVariables, Variable};
use tracing::{debug, warn};

/// Variables d'une cellule (employé, date).
#[derive(Debug, Clone, Copy)]
pub(super) struct CellVars {
    pub day: Variable,
    pub night: Variable,
    pub free: Variable,
}

impl CellVars {
    pub fn get(&self, state: DayState) -> Variable {
        match state {
            DayState::Day => self.day,
            DayState::Night => self.night,
            DayState::Free => self.free,
        }
    }

    pub fn working(&self) -> Expression {
        self.day + self.night
    }
}

/// Modèle en construction : variables, contraintes, et quotas suspendus.
pub(super) struct ShiftModel {
    pub vars: ProblemVariables,
    /// `cells[w][d]`
    pub cells: Vec<Vec<CellVars>>,
    pub constraints: Vec<Constraint>,
    pub relaxations: Vec<QuotaRelaxation>,
}

impl ShiftModel {
    fn forbid(&mut self, var: Variable) {
        self.constraints.push(Expression::from(var).eq(0.0));
    }

    fn force(&mut self, var: Variable) {
        self.constraints.push(Expression::from(var).eq(1.0));
    }

    fn forbid_work(&mut self, w: usize, d: usize) {
        let cell = self.cells[w][d];
        self.forbid(cell.day);
        self.forbid(cell.night);
    }
}

pub(super) fn build(ctx: &PlanContext) -> ShiftModel {
    let mut vars = ProblemVariables::new();
    let cells: Vec<Vec<CellVars>> = ctx
        .workers
        .iter()
        .map(|worker| {
            ctx.dates
                .iter()
                .map(|date| CellVars {
                    day: vars.add(variable().binary().name(format!("{}_{date}_day", worker.id))),
                    night: vars.add(variable().binary().name(format!("{}_{date}_night", worker.id))),
                    free: vars.add(variable().binary().name(format!("{}_{date}_free", worker.id))),
                })
                .collect()
        })
        .collect();

    let mut model = ShiftModel {
        vars,
        cells,
        constraints: Vec::new(),
        relaxations: Vec::new(),
    };

    let weekends = util::weekend_units(&ctx.dates);

    for (w, worker) in ctx.workers.iter().enumerate() {
        exactly_one_outcome(&mut model, w);
        rest_after_night(ctx, &mut model, w, worker);
        eligibility(ctx, &mut model, w, worker);
        weekend_cap(&mut model, w, worker, &weekends);
        monthly_cap(&mut model, w, worker);
        consecutive_cap(&mut model, w, worker);
        category_b_quota(ctx, &mut model, w, worker);
        approved_absences(ctx, &mut model, w, worker);
    }
    staffing_upper_bound(ctx, &mut model);

    debug!(
        workers = ctx.workers.len(),
        days = ctx.dates.len(),
        constraints = model.constraints.len(),
        "hard constraints built"
    );
    model
}

fn exactly_one_outcome(model: &mut ShiftModel, w: usize) {
    for d in 0..model.cells[w].len() {
        let cell = model.cells[w][d];
        model
            .constraints
            .push((cell.day + cell.night + cell.free).eq(1.0));
    }
}

/// Nuit le jour d → pas de Jour le lendemain.
fn rest_after_night(ctx: &PlanContext, model: &mut ShiftModel, w: usize, worker: &Worker) {
    for d in 1..ctx.dates.len() {
        let (prev, next) = (model.cells[w][d - 1], model.cells[w][d]);
        model.constraints.push((prev.night + next.day).leq(1.0));
    }
    if ctx.previous_night.contains(&worker.id) && !ctx.dates.is_empty() {
        let first = model.cells[w][0];
        model.forbid(first.day);
    }
}

/// Aptitudes, mode de disponibilité et jours autorisés, tels que
/// `Worker::may_work` les définit.
fn eligibility(ctx: &PlanContext, model: &mut ShiftModel, w: usize, worker: &Worker) {
    for (d, date) in ctx.dates.iter().enumerate() {
        let cell = model.cells[w][d];
        if !worker.may_work(ShiftCode::Day, *date) {
            model.forbid(cell.day);
        }
        if !worker.may_work(ShiftCode::Night, *date) {
            model.forbid(cell.night);
        }
    }
}

fn weekend_cap(model: &mut ShiftModel, w: usize, worker: &Worker, units: &[Vec<usize>]) {
    let Some(cap) = worker.max_weekends_per_month else {
        return;
    };
    if cap as usize >= units.len() {
        return;
    }
    let mut worked_units = Expression::from(0.0);
    for unit in units {
        let flag = model.vars.add(variable().binary().name(format!("{}_we_{}", worker.id, unit[0])));
        let shifts = unit
            .iter()
            .fold(Expression::from(0.0), |acc, &d| acc + model.cells[w][d].working());
        // drapeau = au moins un service dans l'unité
        model.constraints.push(shifts.clone().geq(flag));
        model.constraints.push(shifts.leq(flag * unit.len() as f64));
        worked_units += flag;
    }
    model.constraints.push(worked_units.leq(f64::from(cap)));
}

fn monthly_cap(model: &mut ShiftModel, w: usize, worker: &Worker) {
    let Some(cap) = worker.max_shifts_per_month else {
        return;
    };
    let total = model.cells[w]
        .iter()
        .fold(Expression::from(0.0), |acc, cell| acc + cell.working());
    model.constraints.push(total.leq(f64::from(cap)));
}

/// Toute fenêtre de `cap + 1` dates contient au plus `cap` services.
fn consecutive_cap(model: &mut ShiftModel, w: usize, worker: &Worker) {
    let Some(cap) = worker.max_consecutive_days else {
        return;
    };
    let span = cap as usize + 1;
    if span > model.cells[w].len() {
        return;
    }
    let windows: Vec<Constraint> = model.cells[w]
        .windows(span)
        .map(|window| {
            window
                .iter()
                .fold(Expression::from(0.0), |acc, cell| acc + cell.working())
                .leq(f64::from(cap))
        })
        .collect();
    model.constraints.extend(windows);
}

fn category_b_quota(ctx: &PlanContext, model: &mut ShiftModel, w: usize, worker: &Worker) {
    if worker.category != Category::B {
        return;
    }
    let opts = &ctx.options;
    let available = ctx.index.available_days(&worker.id, &ctx.period) as u32;
    if available < opts.category_b_min_available_days {
        warn!(
            worker = %worker.id,
            available,
            required = opts.category_b_min_available_days,
            "category B quota suspended"
        );
        model.relaxations.push(QuotaRelaxation {
            worker: worker.id.clone(),
            available_days: available,
            required_days: opts.category_b_min_available_days,
        });
        return;
    }
    let days = model.cells[w]
        .iter()
        .fold(Expression::from(0.0), |acc, cell| acc + cell.day);
    let nights = model.cells[w]
        .iter()
        .fold(Expression::from(0.0), |acc, cell| acc + cell.night);
    model.constraints.push(days.geq(f64::from(opts.category_b_min_day)));
    model.constraints.push(nights.geq(f64::from(opts.category_b_min_night)));
}

fn approved_absences(ctx: &PlanContext, model: &mut ShiftModel, w: usize, worker: &Worker) {
    for (d, date) in ctx.dates.iter().enumerate() {
        if ctx.index.is_blocked(&worker.id, *date) {
            model.forbid_work(w, d);
            let free = model.cells[w][d].free;
            model.force(free);
        }
    }
}

/// Effectif par date et par service plafonné (seule contrainte entre employés).
fn staffing_upper_bound(ctx: &PlanContext, model: &mut ShiftModel) {
    let max = f64::from(ctx.options.staffing_max);
    for d in 0..ctx.dates.len() {
        for state in [DayState::Day, DayState::Night] {
            let headcount = headcount(model, d, state);
            model.constraints.push(headcount.leq(max));
        }
    }
}

/// Nombre d'employés affectés à `state` à la date `d`.
pub(super) fn headcount(model: &ShiftModel, d: usize, state: DayState) -> Expression {
    model
        .cells
        .iter()
        .fold(Expression::from(0.0), |acc, row| acc + row[d].get(state))
}
