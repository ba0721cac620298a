use crate::scheduler::EngineOptions;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Identifiant fort pour Worker
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiant d'un plan généré (un par exécution).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Any,
    WeekendsOnly,
    WeekdaysOnly,
    PermanentlyUnavailable,
}

impl Availability {
    /// Le mode autorise-t-il un service primaire à cette date ?
    pub fn allows(self, date: NaiveDate) -> bool {
        match self {
            Availability::Any => true,
            Availability::WeekendsOnly => is_weekend(date),
            Availability::WeekdaysOnly => !is_weekend(date),
            Availability::PermanentlyUnavailable => false,
        }
    }
}

/// `A` : mélange libre ; `B` : quota minimal de jours ET de nuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Multiplicateur appliqué aux termes de préférence.
    pub fn scale(self, score: i64) -> i64 {
        // troncature vers zéro, comme l'outil historique
        match self {
            Priority::High => (score as f64 * 1.5) as i64,
            Priority::Low => (score as f64 * 0.8) as i64,
            Priority::Normal => score,
        }
    }
}

/// Ensemble de jours de semaine autorisés (0 = lundi … 6 = dimanche).
/// Vide = aucune restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet(BTreeSet<u8>);

impl WeekdaySet {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn from_days<I: IntoIterator<Item = u8>>(days: I) -> Self {
        Self(days.into_iter().filter(|d| *d <= 6).collect())
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    pub fn allows(&self, date: NaiveDate) -> bool {
        self.0.is_empty() || self.0.contains(&weekday_index(date))
    }

    pub fn days(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

/// Employé canonique, tel que consommé par le moteur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub can_work_day: bool,
    pub can_work_night: bool,
    pub night_weekends_only: bool,
    pub weekday_extras_only: bool,
    pub availability: Availability,
    pub category: Category,
    pub priority: Priority,
    pub max_shifts_per_month: Option<u32>,
    pub max_weekends_per_month: Option<u32>,
    pub max_consecutive_days: Option<u32>,
    pub allowed_weekdays: WeekdaySet,
    pub no_extra_duty: bool,
}

impl Worker {
    pub fn new<I: AsRef<str>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: WorkerId::new(id),
            name: name.into(),
            can_work_day: true,
            can_work_night: true,
            night_weekends_only: false,
            weekday_extras_only: false,
            availability: Availability::Any,
            category: Category::A,
            priority: Priority::Normal,
            max_shifts_per_month: None,
            max_weekends_per_month: None,
            max_consecutive_days: None,
            allowed_weekdays: WeekdaySet::unrestricted(),
            no_extra_duty: false,
        }
    }

    /// Peut-il tenir ce type de service à cette date (hors congés) ?
    /// Pour `Extra`, seuls le mode de disponibilité et la liste de jours comptent.
    pub fn may_work(&self, code: ShiftCode, date: NaiveDate) -> bool {
        if !self.availability.allows(date) || !self.allowed_weekdays.allows(date) {
            return false;
        }
        let weekend = is_weekend(date);
        match code {
            ShiftCode::Day => self.can_work_day && !(self.weekday_extras_only && !weekend),
            ShiftCode::Night => {
                self.can_work_night
                    && !(self.weekday_extras_only && !weekend)
                    && (!self.night_weekends_only || weekend)
            }
            ShiftCode::Extra => true,
        }
    }
}

/// Fiche employé brute, telle que stockée côté RH. Les champs ambigus
/// restent des `serde_json::Value` jusqu'à `preferences::normalize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWorker {
    pub id: WorkerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub can_work_day: serde_json::Value,
    #[serde(default)]
    pub can_work_night: serde_json::Value,
    #[serde(default)]
    pub night_weekends_only: serde_json::Value,
    #[serde(default)]
    pub weekday_extras_only: serde_json::Value,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub max_shifts_per_month: Option<u32>,
    #[serde(default)]
    pub max_weekends_per_month: Option<u32>,
    #[serde(default)]
    pub max_consecutive_days: Option<u32>,
    #[serde(default)]
    pub allowed_weekdays: serde_json::Value,
    #[serde(default)]
    pub no_extra_duty: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftCode {
    Day,
    Night,
    Extra,
}

impl ShiftCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftCode::Day => "Day",
            ShiftCode::Night => "Night",
            ShiftCode::Extra => "Extra",
        }
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type de service (données de référence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftType {
    pub code: ShiftCode,
    pub hours: f64,
    #[serde(default)]
    pub start: Option<NaiveTime>,
}

impl ShiftType {
    pub fn new(code: ShiftCode, hours: f64, start: Option<NaiveTime>) -> Self {
        Self { code, hours, start }
    }

    /// Un service démarrant à 18h ou plus tard compte comme un service de nuit.
    pub fn is_night_class(&self) -> bool {
        match self.code {
            ShiftCode::Night => true,
            ShiftCode::Day => false,
            ShiftCode::Extra => self.start.map_or(false, |t| t.hour() >= 18),
        }
    }
}

/// Période de planification, bornes incluses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PlanningPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if end < start {
            return Err("period end must not precede start".to_string());
        }
        Ok(Self { start, end })
    }

    /// Mois civil complet.
    pub fn month(year: i32, month: u32) -> Result<Self, String> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| format!("invalid month {year}-{month}"))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| format!("invalid month {year}-{month}"))?;
        let end = next.pred_opt().ok_or_else(|| "date underflow".to_string())?;
        Ok(Self { start, end })
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start.iter_days().take_while(|d| *d <= self.end).collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Affectation (employé, date, type) — seul artefact produit par le moteur.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub shift: ShiftCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Vacation,
    NoWork,
    DayPreferred,
    NightPreferred,
    ExtraWork,
}

impl RequestKind {
    pub fn is_absence(self) -> bool {
        matches!(self, RequestKind::Vacation | RequestKind::NoWork)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Vacation => "vacation",
            RequestKind::NoWork => "no_work",
            RequestKind::DayPreferred => "day_preferred",
            RequestKind::NightPreferred => "night_preferred",
            RequestKind::ExtraWork => "extra_work",
        }
    }
}

/// Demande de congé ou souhait de service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub worker: WorkerId,
    pub date: NaiveDate,
    pub kind: RequestKind,
    #[serde(default)]
    pub approved: bool,
}

impl Request {
    pub fn new(worker: &WorkerId, date: NaiveDate, kind: RequestKind, approved: bool) -> Self {
        Self { worker: worker.clone(), date, kind, approved }
    }

    /// Seules les absences approuvées sont des contraintes dures.
    pub fn is_hard_absence(&self) -> bool {
        self.approved && self.kind.is_absence()
    }
}

/// Objectif horaire mensuel d'un employé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTarget {
    pub worker: WorkerId,
    pub year: i32,
    pub month: u32,
    pub target_hours: f64,
    #[serde(default)]
    pub weekly_hours: Option<f64>,
}

/// Instantané des entrées d'une exécution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningInput {
    pub period: PlanningPeriod,
    pub workers: Vec<RawWorker>,
    pub shift_types: Vec<ShiftType>,
    #[serde(default)]
    pub requests: Vec<Request>,
    #[serde(default)]
    pub targets: Vec<MonthlyTarget>,
    /// Employés dont le dernier service avant la période était une nuit.
    #[serde(default)]
    pub previous_night: Vec<WorkerId>,
    #[serde(default)]
    pub options: EngineOptions,
}

/// Plan produit par une exécution : affectations + rapport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub period: PlanningPeriod,
    pub assignments: Vec<ShiftAssignment>,
    pub report: crate::report::RunReport,
}

/// 0 = lundi … 6 = dimanche.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
