use crate::model::is_weekend;
use chrono::{Datelike, NaiveDate, Weekday};

/// Regroupe les samedis/dimanches de la période par numéro de semaine ISO.
/// Retourne des indices de dates.
pub(super) fn weekend_units(dates: &[NaiveDate]) -> Vec<Vec<usize>> {
    let mut units: Vec<Vec<usize>> = Vec::new();
    let mut current_week = None;
    for (idx, date) in dates.iter().enumerate() {
        if !is_weekend(*date) {
            continue;
        }
        let week = date.iso_week().week();
        if current_week != Some(week) {
            current_week = Some(week);
            units.push(Vec::new());
        }
        if let Some(unit) = units.last_mut() {
            unit.push(idx);
        }
    }
    units
}

/// Mardi à vendredi.
pub(super) fn is_mid_week(date: NaiveDate) -> bool {
    matches!(
        date.weekday(),
        Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri
    )
}

/// Longueur de la série de jours travaillés contenant `idx` si l'on y
/// ajoute un service.
pub(super) fn streak_through(working: &[bool], idx: usize) -> u32 {
    let before = working[..idx].iter().rev().take_while(|w| **w).count();
    let after = working[idx + 1..].iter().take_while(|w| **w).count();
    (1 + before + after) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekend_units_follow_iso_weeks() {
        // 2026-04-01 est un mercredi
        let start = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let dates: Vec<NaiveDate> = start.iter_days().take(30).collect();
        let units = weekend_units(&dates);
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|u| u.len() == 2));
        assert_eq!(dates[units[0][0]], NaiveDate::from_ymd_opt(2026, 4, 4).unwrap());
    }

    #[test]
    fn lone_sunday_is_its_own_unit() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(); // dimanche
        let dates: Vec<NaiveDate> = start.iter_days().take(7).collect();
        let units = weekend_units(&dates);
        assert_eq!(units, vec![vec![0], vec![6]]);
    }

    #[test]
    fn streak_counts_both_sides() {
        let working = [true, true, false, true, false, true, true, true];
        assert_eq!(streak_through(&working, 2), 4);
        assert_eq!(streak_through(&working, 4), 5);
        assert_eq!(streak_through(&[false], 0), 1);
    }
}
