use crate::model::{Plan, PlanningInput};
use crate::report::RunReport;
use anyhow::Context;
use csv::WriterBuilder;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Charge l'instantané d'entrée (JSON).
pub fn load_input<P: AsRef<Path>>(path: P) -> anyhow::Result<PlanningInput> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let input: PlanningInput =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(input)
}

/// Export CSV des affectations: header `worker,date,shift`
pub fn export_assignments_csv<P: AsRef<Path>>(path: P, plan: &Plan) -> anyhow::Result<()> {
    let file = fs::File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    write_assignments_csv(file, plan)
}

pub fn write_assignments_csv<W: Write>(out: W, plan: &Plan) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(out);
    w.write_record(["worker", "date", "shift"])?;
    for a in &plan.assignments {
        let date = a.date.format("%Y-%m-%d").to_string();
        w.write_record([a.worker.as_str(), date.as_str(), a.shift.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV du bilan par employé:
/// header `worker,name,day,night,extra,total,target_shifts,target_hours,difference`
pub fn export_summary_csv<P: AsRef<Path>>(path: P, report: &RunReport) -> anyhow::Result<()> {
    let file = fs::File::create(path.as_ref())
        .with_context(|| format!("creating {}", path.as_ref().display()))?;
    write_summary_csv(file, report)
}

pub fn write_summary_csv<W: Write>(out: W, report: &RunReport) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(out);
    w.write_record([
        "worker",
        "name",
        "day",
        "night",
        "extra",
        "total",
        "target_shifts",
        "target_hours",
        "difference",
    ])?;
    let mut bufs = [itoa::Buffer::new(); 6];
    for s in &report.workers {
        let hours = s.target_hours.to_string();
        let [day, night, extra, total, target, diff] = &mut bufs;
        w.write_record([
            s.worker.as_str(),
            s.name.as_str(),
            day.format(s.day),
            night.format(s.night),
            extra.format(s.extra),
            total.format(s.total),
            target.format(s.target_shifts),
            hours.as_str(),
            diff.format(s.difference),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlanId, PlanningPeriod, ShiftAssignment, ShiftCode, WorkerId};
    use crate::report::WorkerSummary;
    use crate::scheduler::SolveStatus;
    use chrono::NaiveDate;

    fn report() -> RunReport {
        RunReport {
            status: SolveStatus::Optimal,
            elapsed_ms: 12,
            primary_shifts: 3,
            extra_shifts: 1,
            workers: vec![
                WorkerSummary {
                    worker: WorkerId::new("w1"),
                    name: "Anna Keller".into(),
                    day: 2,
                    night: 1,
                    extra: 1,
                    total: 4,
                    target_shifts: 6,
                    target_hours: 60.0,
                    difference: -2,
                },
                WorkerSummary {
                    worker: WorkerId::new("w2"),
                    name: "Keller, Ben".into(),
                    day: 0,
                    night: 0,
                    extra: 0,
                    total: 0,
                    target_shifts: 0,
                    target_hours: 7.5,
                    difference: 0,
                },
            ],
            relaxations: Vec::new(),
            wishes: Vec::new(),
            hard_violations: 0,
        }
    }

    #[test]
    fn summary_csv_layout() {
        let mut out = Vec::new();
        write_summary_csv(&mut out, &report()).unwrap();
        let text = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(text, @r###"
        worker,name,day,night,extra,total,target_shifts,target_hours,difference
        w1,Anna Keller,2,1,1,4,6,60,-2
        w2,"Keller, Ben",0,0,0,0,0,7.5,0
        "###);
    }

    #[test]
    fn assignments_csv_layout() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        let w = WorkerId::new("w1");
        let plan = Plan {
            id: PlanId::random(),
            period: PlanningPeriod::new(d(1), d(30)).unwrap(),
            assignments: vec![
                ShiftAssignment { worker: w.clone(), date: d(1), shift: ShiftCode::Night },
                ShiftAssignment { worker: w.clone(), date: d(3), shift: ShiftCode::Extra },
            ],
            report: report(),
        };
        let mut out = Vec::new();
        write_assignments_csv(&mut out, &plan).unwrap();
        let text = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(text, @r###"
        worker,date,shift
        w1,2026-04-01,Night
        w1,2026-04-03,Extra
        "###);
    }

    #[test]
    fn load_input_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_input(&path).unwrap_err();
        assert!(format!("{err}").contains("input.json"));
    }
}
