//! Attribution gloutonne des services supplémentaires (Extra), après
//! résolution, sur les dates laissées libres par la grille.

use super::util::{is_mid_week, streak_through};
use super::{DayState, PlanContext};
use crate::model::{Availability, ShiftAssignment, ShiftCode, ShiftType, Worker};
use tracing::{debug, info};

struct Candidate<'a> {
    idx: usize,
    worker: &'a Worker,
    shortfall: u32,
    dates: Vec<usize>,
}

fn eligible(worker: &Worker, extra: &ShiftType) -> bool {
    let capable = if extra.is_night_class() {
        worker.can_work_night
    } else {
        worker.can_work_day
    };
    capable
        && !worker.no_extra_duty
        && !matches!(
            worker.availability,
            Availability::PermanentlyUnavailable | Availability::WeekendsOnly
        )
}

/// Une seule passe, sans retour arrière. Les compteurs par date et les
/// séries de jours travaillés ne vivent que le temps de l'appel.
pub(super) fn allocate(ctx: &PlanContext, extra: &ShiftType, grid: &[Vec<DayState>]) -> Vec<ShiftAssignment> {
    let mut queue: Vec<Candidate> = Vec::new();
    for (w, worker) in ctx.workers.iter().enumerate() {
        if !eligible(worker, extra) {
            continue;
        }
        let row = &grid[w];
        let primary = row.iter().filter(|s| s.is_working()).count() as u32;
        let shortfall = ctx.targets.shifts_for(&worker.id).saturating_sub(primary);
        if shortfall == 0 {
            continue;
        }
        let working: Vec<bool> = row.iter().map(|s| s.is_working()).collect();
        let dates: Vec<usize> = ctx
            .dates
            .iter()
            .enumerate()
            .filter(|(d, date)| {
                let d = *d;
                let after_night = if d == 0 {
                    ctx.previous_night.contains(&worker.id)
                } else {
                    row[d - 1] == DayState::Night
                };
                is_mid_week(**date)
                    && worker.may_work(ShiftCode::Extra, **date)
                    && !ctx.index.is_blocked(&worker.id, **date)
                    && row[d] == DayState::Free
                    && !after_night
                    && worker
                        .max_consecutive_days
                        .map_or(true, |cap| streak_through(&working, d) <= cap)
            })
            .map(|(d, _)| d)
            .collect();
        if dates.is_empty() {
            debug!(worker = %worker.id, shortfall, "no date available for extra duty");
            continue;
        }
        queue.push(Candidate { idx: w, worker, shortfall, dates });
    }
    // tri stable : à manque égal, l'ordre d'entrée est conservé
    queue.sort_by(|a, b| b.shortfall.cmp(&a.shortfall));

    let mut per_date = vec![0u32; ctx.dates.len()];
    let mut out = Vec::new();
    for cand in queue {
        let mut working: Vec<bool> = grid[cand.idx].iter().map(|s| s.is_working()).collect();
        let mut remaining = cand.shortfall;
        for d in cand.dates {
            if remaining == 0 {
                break;
            }
            if per_date[d] >= ctx.options.max_extra_per_date || working[d] {
                continue;
            }
            if let Some(cap) = cand.worker.max_consecutive_days {
                if streak_through(&working, d) > cap {
                    continue;
                }
            }
            per_date[d] += 1;
            working[d] = true;
            remaining -= 1;
            out.push(ShiftAssignment {
                worker: cand.worker.id.clone(),
                date: ctx.dates[d],
                shift: ShiftCode::Extra,
            });
        }
        debug!(
            worker = %cand.worker.id,
            granted = cand.shortfall - remaining,
            shortfall = cand.shortfall,
            "extra duties"
        );
    }
    info!(extra = out.len(), "extra duties allocated");
    out
}
