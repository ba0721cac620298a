//! Index des congés et souhaits par (employé, date).

use crate::model::{PlanningPeriod, Request, WorkerId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

/// Recherche O(1) des demandes d'un employé à une date, avec l'ensemble
/// des absences approuvées pré-calculé.
#[derive(Debug, Default, Clone)]
pub struct RequestIndex {
    by_day: HashMap<(WorkerId, NaiveDate), Vec<Request>>,
    blocked: HashMap<WorkerId, BTreeSet<NaiveDate>>,
}

impl RequestIndex {
    /// Construit l'index ; les demandes hors période ou pour un employé
    /// inconnu sont ignorées.
    pub fn build(requests: &[Request], period: &PlanningPeriod, known: &HashSet<&WorkerId>) -> Self {
        let mut index = Self::default();
        for request in requests {
            if !period.contains(request.date) {
                continue;
            }
            if !known.contains(&request.worker) {
                warn!(worker = %request.worker, date = %request.date, "request for unknown worker ignored");
                continue;
            }
            if request.is_hard_absence() {
                index
                    .blocked
                    .entry(request.worker.clone())
                    .or_default()
                    .insert(request.date);
            }
            index
                .by_day
                .entry((request.worker.clone(), request.date))
                .or_default()
                .push(request.clone());
        }
        index
    }

    pub fn requests_on(&self, worker: &WorkerId, date: NaiveDate) -> &[Request] {
        self.by_day
            .get(&(worker.clone(), date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Absence approuvée (`vacation` ou `no_work`) à cette date.
    pub fn is_blocked(&self, worker: &WorkerId, date: NaiveDate) -> bool {
        self.blocked
            .get(worker)
            .map_or(false, |dates| dates.contains(&date))
    }

    pub fn blocked_days(&self, worker: &WorkerId) -> usize {
        self.blocked.get(worker).map_or(0, BTreeSet::len)
    }

    /// Nombre de dates de la période sans absence approuvée.
    pub fn available_days(&self, worker: &WorkerId, period: &PlanningPeriod) -> usize {
        period.len_days().saturating_sub(self.blocked_days(worker))
    }

    pub fn total_blocked_days(&self) -> usize {
        self.blocked.values().map(BTreeSet::len).sum()
    }

    /// Toutes les demandes indexées, triées par employé puis date.
    pub fn all(&self) -> Vec<&Request> {
        let mut out: Vec<&Request> = self.by_day.values().flatten().collect();
        out.sort_by(|a, b| (&a.worker, a.date).cmp(&(&b.worker, b.date)));
        out
    }

    pub fn len(&self) -> usize {
        self.by_day.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestKind;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, day).unwrap()
    }

    #[test]
    fn only_approved_absences_block() {
        let w = WorkerId::new("w1");
        let period = PlanningPeriod::new(d(1), d(30)).unwrap();
        let known: HashSet<&WorkerId> = [&w].into_iter().collect();
        let requests = vec![
            Request::new(&w, d(3), RequestKind::Vacation, true),
            Request::new(&w, d(4), RequestKind::Vacation, false),
            Request::new(&w, d(5), RequestKind::NoWork, true),
            Request::new(&w, d(6), RequestKind::DayPreferred, true),
        ];
        let index = RequestIndex::build(&requests, &period, &known);
        assert!(index.is_blocked(&w, d(3)));
        assert!(!index.is_blocked(&w, d(4)));
        assert!(index.is_blocked(&w, d(5)));
        assert!(!index.is_blocked(&w, d(6)));
        assert_eq!(index.available_days(&w, &period), 28);
    }

    #[test]
    fn keeps_every_request_of_a_day() {
        let w = WorkerId::new("w1");
        let period = PlanningPeriod::new(d(1), d(7)).unwrap();
        let known: HashSet<&WorkerId> = [&w].into_iter().collect();
        let requests = vec![
            Request::new(&w, d(2), RequestKind::DayPreferred, false),
            Request::new(&w, d(2), RequestKind::Vacation, false),
        ];
        let index = RequestIndex::build(&requests, &period, &known);
        assert_eq!(index.requests_on(&w, d(2)).len(), 2);
        assert!(!index.is_blocked(&w, d(2)));
    }

    #[test]
    fn drops_out_of_period_and_unknown() {
        let w = WorkerId::new("w1");
        let ghost = WorkerId::new("ghost");
        let period = PlanningPeriod::new(d(1), d(7)).unwrap();
        let known: HashSet<&WorkerId> = [&w].into_iter().collect();
        let requests = vec![
            Request::new(&w, d(20), RequestKind::Vacation, true),
            Request::new(&ghost, d(2), RequestKind::Vacation, true),
        ];
        let index = RequestIndex::build(&requests, &period, &known);
        assert!(index.is_empty());
        assert_eq!(index.total_blocked_days(), 0);
    }
}
