#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shiftplan::{
    io, normalize_all,
    report::audit_plan,
    scheduler::{SchedError, Scheduler},
    storage::{JsonPlanStore, PlanStore},
    TargetTable,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification mensuelle jour/nuit (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer le plan du mois et l'enregistrer
    Generate {
        /// Instantané d'entrée (JSON)
        #[arg(long)]
        input: String,
        /// Fichier JSON du plan
        #[arg(long, default_value = "plan.json")]
        plan: String,
        /// Export CSV des affectations (optionnel)
        #[arg(long)]
        csv: Option<String>,
        /// Export CSV du bilan par employé (optionnel)
        #[arg(long)]
        summary_csv: Option<String>,
        /// Budget du solveur en secondes (remplace `options.time_limit_secs`)
        #[arg(long, allow_negative_numbers = true)]
        time_limit: Option<f64>,
    },

    /// Afficher les fiches employés normalisées
    Normalize {
        #[arg(long)]
        input: String,
    },

    /// Afficher les cibles en nombre de services
    Targets {
        #[arg(long)]
        input: String,
    },

    /// Recalculer le rapport d'un plan enregistré
    Audit {
        #[arg(long)]
        input: String,
        #[arg(long, default_value = "plan.json")]
        plan: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Generate {
            input,
            plan,
            csv,
            summary_csv,
            time_limit,
        } => {
            let input = io::load_input(input)?;
            let mut scheduler = Scheduler::new();
            if let Some(secs) = time_limit {
                scheduler = scheduler.with_time_limit(secs);
            }
            match scheduler.generate(&input) {
                Ok(generated) => {
                    // exports d'abord : un export en échec n'enregistre pas le plan
                    if let Some(path) = csv {
                        io::export_assignments_csv(path, &generated)?;
                    }
                    if let Some(path) = summary_csv {
                        io::export_summary_csv(path, &generated.report)?;
                    }
                    let store = JsonPlanStore::open(&plan)?;
                    store.commit(&generated)?;
                    let r = &generated.report;
                    println!(
                        "{} | {} | {} primary, {} extra | {} ms",
                        generated.id.as_str(),
                        r.status,
                        r.primary_shifts,
                        r.extra_shifts,
                        r.elapsed_ms
                    );
                    for rel in &r.relaxations {
                        eprintln!(
                            "warning: category B quota suspended for {} ({} of {} days available)",
                            rel.worker, rel.available_days, rel.required_days
                        );
                    }
                    0
                }
                Err(SchedError::NoFeasiblePlan { status, explanation }) => {
                    eprintln!("no feasible plan ({status})");
                    eprintln!("{explanation}");
                    // Code 3 = aucun plan, rien n'est enregistré
                    3
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Normalize { input } => {
            let input = io::load_input(input)?;
            let workers = normalize_all(&input.workers);
            println!("{}", serde_json::to_string_pretty(&workers)?);
            0
        }
        Commands::Targets { input } => {
            let input = io::load_input(input)?;
            let workers = normalize_all(&input.workers);
            let table = TargetTable::compute(
                &workers,
                &input.targets,
                &input.shift_types,
                input.period.start,
                input.options.fallback_target_hours,
            )?;
            println!("mean shift hours: {}", table.mean_shift_hours());
            for w in &workers {
                if let Some(t) = table.get(&w.id) {
                    let origin = if t.fallback { "fallback" } else { "record" };
                    println!("{} | {} h | {} shifts | {}", w.id, t.hours, t.shifts, origin);
                }
            }
            0
        }
        Commands::Audit { input, plan } => {
            let input = io::load_input(input)?;
            let store = JsonPlanStore::open(&plan)?;
            let Some(stored) = store.load()? else {
                bail!("no plan stored at {plan}");
            };
            let report = audit_plan(&input, &stored)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.hard_violations > 0 {
                eprintln!("Found {} approved absence(s) not honoured", report.hard_violations);
                // Code 2 = WARNING
                2
            } else {
                0
            }
        }
    };

    std::process::exit(code);
}
