//! Normalisation des préférences employé.
//!
//! Les fiches RH stockent la liste des jours autorisés et les drapeaux sous
//! des formes variées (liste JSON, chaîne, scalaire). Tout passe ici une
//! seule fois ; une valeur illisible devient « pas de restriction », jamais
//! une erreur.

use crate::model::{RawWorker, WeekdaySet, Worker};
use serde_json::Value;
use tracing::debug;

/// Au-delà de cette valeur, un plafond mensuel vaut « illimité ».
const UNLIMITED_SHIFTS: u32 = 999;

/// Convertit une fiche brute en employé canonique.
pub fn normalize(raw: &RawWorker) -> Worker {
    let allowed_weekdays = parse_weekdays(&raw.allowed_weekdays).unwrap_or_else(|| {
        debug!(worker = %raw.id, value = %raw.allowed_weekdays, "unreadable weekday list, treated as unrestricted");
        WeekdaySet::unrestricted()
    });

    Worker {
        id: raw.id.clone(),
        name: raw.name.clone(),
        can_work_day: flag(&raw.id, "can_work_day", &raw.can_work_day, true),
        can_work_night: flag(&raw.id, "can_work_night", &raw.can_work_night, true),
        night_weekends_only: flag(&raw.id, "night_weekends_only", &raw.night_weekends_only, false),
        weekday_extras_only: flag(&raw.id, "weekday_extras_only", &raw.weekday_extras_only, false),
        availability: raw.availability,
        category: raw.category,
        priority: raw.priority,
        max_shifts_per_month: raw
            .max_shifts_per_month
            .filter(|cap| *cap > 0 && *cap < UNLIMITED_SHIFTS),
        max_weekends_per_month: raw.max_weekends_per_month,
        max_consecutive_days: raw.max_consecutive_days.filter(|cap| *cap > 0),
        allowed_weekdays,
        no_extra_duty: flag(&raw.id, "no_extra_duty", &raw.no_extra_duty, false),
    }
}

pub fn normalize_all(raw: &[RawWorker]) -> Vec<Worker> {
    raw.iter().map(normalize).collect()
}

/// `None` si la valeur n'est pas exploitable.
fn parse_weekdays(value: &Value) -> Option<WeekdaySet> {
    match value {
        Value::Null => Some(WeekdaySet::unrestricted()),
        Value::Array(items) => {
            let days = items.iter().map(day_number).collect::<Option<Vec<_>>>()?;
            Some(into_set(days))
        }
        Value::Number(_) => day_number(value).map(|d| into_set(vec![d])),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(WeekdaySet::unrestricted());
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(inner @ (Value::Array(_) | Value::Number(_))) => parse_weekdays(&inner),
                Ok(_) => None,
                Err(_) => trimmed.parse::<i64>().ok().map(|d| into_set(vec![d])),
            }
        }
        Value::Bool(_) | Value::Object(_) => None,
    }
}

fn day_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn into_set(days: Vec<i64>) -> WeekdaySet {
    WeekdaySet::from_days(
        days.into_iter()
            .filter(|d| (0..=6).contains(d))
            .map(|d| d as u8),
    )
}

fn flag(worker: &crate::model::WorkerId, field: &str, value: &Value, default: bool) -> bool {
    match value {
        Value::Null => default,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(default, |f| f != 0.0),
        Value::String(s) => parse_bool(s).unwrap_or_else(|| {
            debug!(%worker, field, value = %s, "unreadable flag, default kept");
            default
        }),
        Value::Array(_) | Value::Object(_) => {
            debug!(%worker, field, "unexpected flag shape, default kept");
            default
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "ja" | "oui" | "on" | "x" => Some(true),
        "false" | "0" | "no" | "n" | "nein" | "non" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Availability, Category, Priority, WorkerId};
    use serde_json::json;

    fn raw_with_days(days: Value) -> RawWorker {
        RawWorker {
            id: WorkerId::new("w1"),
            name: "Ada".into(),
            allowed_weekdays: days,
            ..RawWorker::default()
        }
    }

    fn days(worker: &Worker) -> Vec<u8> {
        worker.allowed_weekdays.days().collect()
    }

    #[test]
    fn weekday_shapes_are_coerced() {
        assert_eq!(days(&normalize(&raw_with_days(json!([0, 2, 4])))), vec![0, 2, 4]);
        assert_eq!(days(&normalize(&raw_with_days(json!("[1, 3]")))), vec![1, 3]);
        assert_eq!(days(&normalize(&raw_with_days(json!(" 5 ")))), vec![5]);
        assert_eq!(days(&normalize(&raw_with_days(json!(6)))), vec![6]);
        assert_eq!(days(&normalize(&raw_with_days(json!(["2", 2, "4"])))), vec![2, 4]);
    }

    #[test]
    fn malformed_weekdays_mean_unrestricted() {
        for value in [json!("mon,tue"), json!({"d": 1}), json!([1, "x"]), json!(true), json!("")] {
            let worker = normalize(&raw_with_days(value.clone()));
            assert!(worker.allowed_weekdays.is_unrestricted(), "{value} should be lenient");
        }
    }

    #[test]
    fn out_of_range_days_are_dropped() {
        assert_eq!(days(&normalize(&raw_with_days(json!([-1, 3, 7, 12])))), vec![3]);
    }

    #[test]
    fn flags_become_strict_booleans() {
        let raw = RawWorker {
            id: WorkerId::new("w2"),
            can_work_day: json!("nein"),
            can_work_night: json!(null),
            night_weekends_only: json!(1),
            weekday_extras_only: json!("maybe"),
            no_extra_duty: json!("Yes"),
            ..RawWorker::default()
        };
        let worker = normalize(&raw);
        assert!(!worker.can_work_day);
        assert!(worker.can_work_night);
        assert!(worker.night_weekends_only);
        assert!(!worker.weekday_extras_only);
        assert!(worker.no_extra_duty);
    }

    #[test]
    fn sentinel_caps_mean_unlimited() {
        let raw = RawWorker {
            id: WorkerId::new("w3"),
            max_shifts_per_month: Some(999),
            max_consecutive_days: Some(0),
            max_weekends_per_month: Some(2),
            ..RawWorker::default()
        };
        let worker = normalize(&raw);
        assert_eq!(worker.max_shifts_per_month, None);
        assert_eq!(worker.max_consecutive_days, None);
        assert_eq!(worker.max_weekends_per_month, Some(2));
    }

    #[test]
    fn canonical_record_is_a_fixed_point() {
        let raw = RawWorker {
            id: WorkerId::new("w4"),
            name: "Grace".into(),
            can_work_night: json!("0"),
            availability: Availability::WeekdaysOnly,
            category: Category::B,
            priority: Priority::High,
            max_shifts_per_month: Some(18),
            max_consecutive_days: Some(5),
            allowed_weekdays: json!("[0, 1, 2, 9]"),
            no_extra_duty: json!(true),
            ..RawWorker::default()
        };
        let once = normalize(&raw);
        let reparsed: RawWorker = serde_json::from_value(serde_json::to_value(&once).unwrap()).unwrap();
        let twice = normalize(&reparsed);
        assert_eq!(once, twice);
    }
}
