//! Conversion des heures cibles mensuelles en nombre de services cible.

use crate::model::{MonthlyTarget, ShiftCode, ShiftType, Worker, WorkerId};
use crate::scheduler::SchedError;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Cible d'un employé pour la période.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadTarget {
    pub hours: f64,
    pub shifts: u32,
    /// Aucune fiche mensuelle : valeur de repli utilisée.
    pub fallback: bool,
}

/// Cibles de tous les employés, figées pour une exécution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetTable {
    mean_shift_hours: f64,
    targets: HashMap<WorkerId, WorkloadTarget>,
}

impl TargetTable {
    /// `start` fixe l'année et le mois recherchés dans `records`.
    pub fn compute(
        workers: &[Worker],
        records: &[MonthlyTarget],
        shift_types: &[ShiftType],
        start: chrono::NaiveDate,
        fallback_hours: f64,
    ) -> Result<Self, SchedError> {
        let mean_shift_hours = mean_primary_hours(shift_types)?;
        let (year, month) = (start.year(), start.month());
        info!(mean_shift_hours, year, month, "computing workload targets");

        let mut targets = HashMap::with_capacity(workers.len());
        for worker in workers {
            let record = records
                .iter()
                .find(|r| r.worker == worker.id && r.year == year && r.month == month);
            let (hours, fallback) = match record {
                Some(r) => (r.target_hours, false),
                None => {
                    debug!(worker = %worker.id, fallback_hours, "no monthly target, fallback used");
                    (fallback_hours, true)
                }
            };
            let shifts = shift_count(hours, mean_shift_hours);
            debug!(worker = %worker.id, hours, shifts, "target");
            targets.insert(worker.id.clone(), WorkloadTarget { hours, shifts, fallback });
        }

        Ok(Self { mean_shift_hours, targets })
    }

    pub fn get(&self, worker: &WorkerId) -> Option<&WorkloadTarget> {
        self.targets.get(worker)
    }

    /// Nombre de services cible (0 si l'employé est inconnu).
    pub fn shifts_for(&self, worker: &WorkerId) -> u32 {
        self.targets.get(worker).map_or(0, |t| t.shifts)
    }

    pub fn mean_shift_hours(&self) -> f64 {
        self.mean_shift_hours
    }
}

/// Moyenne des durées Jour et Nuit.
pub fn mean_primary_hours(shift_types: &[ShiftType]) -> Result<f64, SchedError> {
    let hours = |code: ShiftCode| -> Result<f64, SchedError> {
        let st = shift_types
            .iter()
            .find(|t| t.code == code)
            .ok_or(SchedError::MissingShiftType(code))?;
        if !(st.hours.is_finite() && st.hours > 0.0) {
            return Err(SchedError::InvalidShiftType { code, hours: st.hours });
        }
        Ok(st.hours)
    };
    Ok((hours(ShiftCode::Day)? + hours(ShiftCode::Night)?) / 2.0)
}

/// Arrondi au pair le plus proche, comme l'outil historique.
pub fn shift_count(target_hours: f64, mean_shift_hours: f64) -> u32 {
    let raw = (target_hours / mean_shift_hours).round_ties_even();
    if raw.is_finite() && raw > 0.0 {
        raw as u32
    } else {
        0
    }
}
