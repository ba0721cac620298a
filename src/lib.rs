#![forbid(unsafe_code)]
//! Shiftplan — génération de plannings mensuels jour/nuit (sans BD).
//!
//! - Normalisation des fiches employés à la frontière.
//! - Modèle MILP (good_lp + HiGHS) pour les services Jour/Nuit.
//! - Services supplémentaires attribués ensuite, de façon gloutonne.
//! - Rapport par employé et audit des souhaits ; écriture atomique du plan.

pub mod io;
pub mod model;
pub mod preferences;
pub mod report;
pub mod requests;
pub mod scheduler;
pub mod storage;
pub mod targets;

pub use model::{
    Availability, Category, MonthlyTarget, Plan, PlanId, PlanningInput, PlanningPeriod, Priority,
    RawWorker, Request, RequestKind, ShiftAssignment, ShiftCode, ShiftType, WeekdaySet, Worker,
    WorkerId,
};
pub use preferences::{normalize, normalize_all};
pub use report::{audit_plan, RunReport, WishAudit, WishOutcome, WorkerSummary};
pub use scheduler::{EngineOptions, SchedError, Scheduler, SolveStatus, Weights};
pub use storage::{JsonPlanStore, PlanStore};
pub use targets::{TargetTable, WorkloadTarget};
