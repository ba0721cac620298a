use crate::model::{ShiftCode, WorkerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Options du moteur. Les valeurs par défaut reprennent celles de l'outil
/// de planification d'origine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Budget du solveur, en secondes.
    pub time_limit_secs: f64,
    /// Effectif visé par service (Jour ou Nuit) et par date.
    pub staffing_target: u32,
    /// Effectif maximal (contrainte dure).
    pub staffing_max: u32,
    /// Services supplémentaires maximum par date, tous employés confondus.
    pub max_extra_per_date: u32,
    pub category_b_min_day: u32,
    pub category_b_min_night: u32,
    /// En dessous, le quota catégorie B est suspendu.
    pub category_b_min_available_days: u32,
    /// Heures cibles sans fiche mensuelle.
    pub fallback_target_hours: f64,
    pub weights: Weights,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            time_limit_secs: 360.0,
            staffing_target: 2,
            staffing_max: 4,
            max_extra_per_date: 2,
            category_b_min_day: 4,
            category_b_min_night: 4,
            category_b_min_available_days: 10,
            fallback_target_hours: 144.0,
            weights: Weights::default(),
        }
    }
}

/// Poids de l'objectif (minimisation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub staffing_deviation: i64,
    pub uncovered_shift: i64,
    pub target_deviation: i64,
    pub preference: i64,
    pub extra_work: i64,
    pub approved_absence: i64,
    pub unapproved_absence: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            staffing_deviation: 50_000,
            uncovered_shift: 1_000_000,
            target_deviation: 2_000,
            preference: 25_000,
            extra_work: 5_000,
            approved_absence: 1_000_000,
            unapproved_absence: 25_000,
        }
    }
}

/// État d'un employé à une date avant les services supplémentaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayState {
    Day,
    Night,
    Free,
}

impl DayState {
    pub fn is_working(self) -> bool {
        !matches!(self, DayState::Free)
    }

    pub fn shift(self) -> Option<ShiftCode> {
        match self {
            DayState::Day => Some(ShiftCode::Day),
            DayState::Night => Some(ShiftCode::Night),
            DayState::Free => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// Budget épuisé avec une solution, optimalité non prouvée.
    Feasible,
    Infeasible,
    /// Budget épuisé sans solution exploitable.
    NoSolution,
}

impl SolveStatus {
    pub fn is_usable(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::NoSolution => "no solution within budget",
        };
        f.write_str(s)
    }
}

/// Quota catégorie B suspendu faute de jours disponibles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRelaxation {
    pub worker: WorkerId,
    pub available_days: u32,
    pub required_days: u32,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid planning period: {0}")]
    InvalidPeriod(String),
    #[error("missing shift type: {0}")]
    MissingShiftType(ShiftCode),
    #[error("invalid shift type {code}: {hours} hours")]
    InvalidShiftType { code: ShiftCode, hours: f64 },
    #[error("invalid engine option: {0}")]
    InvalidOption(String),
    #[error("duplicate worker id: {0}")]
    DuplicateWorker(String),
    #[error("no feasible plan ({status}): {explanation}")]
    NoFeasiblePlan {
        status: SolveStatus,
        explanation: String,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchedError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SchedError::NoFeasiblePlan { .. })
    }
}
