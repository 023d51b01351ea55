mod catalog;
mod codec;
mod config;
mod db;
mod error;
mod models;
mod scoring;
mod telemetry;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::AppConfig;
use db::Database;
use error::StoreError;
use models::{
    AssessmentScore, BehavioralTrait, BigFiveTrait, JsonOutput, Module, RawValue, RiasecDomain,
    StrengthLabel,
};
use scoring::ScoringService;

#[derive(Parser)]
#[command(name = "carhythm")]
#[command(about = "Score RIASEC, Big Five and behavioral questionnaires into career profiles")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Database path (overrides CARHYTHM_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Ruleset JSON file (overrides CARHYTHM_RULESET)
    #[arg(long, global = true)]
    ruleset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Load the standard item bank
    Seed,

    /// List catalog items
    Items {
        /// Filter by module: riasec, big_five, behavioral
        #[arg(long, short)]
        module: Option<String>,
    },

    /// Record an answer for a session
    Answer {
        /// Session ID
        session: String,

        /// Item ID, e.g. R1 or FC_RI_1
        item: String,

        /// Likert value, or comma-separated option values
        value: String,
    },

    /// Recompute and store the scores for a session
    Score {
        /// Session ID
        session: String,
    },

    /// Show the stored scores for a session
    Show {
        /// Session ID
        session: String,
    },

    /// List scored sessions
    Scores,

    /// Print the active scoring rules
    Rules,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?.with_overrides(cli.db.clone(), cli.ruleset.clone());
    telemetry::init(&config.log_level)?;
    let ruleset = config.ruleset()?;

    config.ensure_db_dir()?;
    let db = Database::open(config.db_path())?;
    db.init()?;

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", config.db_path().display());
            }
        }

        Commands::Seed => {
            let count = db.seed_items(&catalog::standard_items())?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({ "items": count })))?
                );
            } else {
                println!("Seeded {} items.", count);
            }
        }

        Commands::Items { module } => {
            let module = match module {
                Some(m) => Some(Module::from_str(&m).ok_or_else(|| format!("unknown module '{m}'"))?),
                None => None,
            };
            let items = db.list_items(module)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&items))?);
            } else if items.is_empty() {
                println!("No items found. Run `carhythm seed` first.");
            } else {
                println!(
                    "{:<8} {:<11} {:<14} {:<14} REV",
                    "ID", "MODULE", "DOMAIN", "SCALE"
                );
                println!("{}", "-".repeat(55));
                for item in items {
                    let domain = match &item.domain {
                        Some(d) => d.clone(),
                        None => item
                            .options
                            .iter()
                            .map(|o| o.domain.as_str())
                            .collect::<Vec<_>>()
                            .join("/"),
                    };
                    println!(
                        "{:<8} {:<11} {:<14} {:<14} {}",
                        item.item_id,
                        item.module.as_str(),
                        truncate(&domain, 14),
                        item.scale_type.as_str(),
                        if item.reverse_scored { "yes" } else { "" }
                    );
                }
            }
        }

        Commands::Answer {
            session,
            item,
            value,
        } => {
            let meta = db
                .get_item(&item)?
                .ok_or_else(|| StoreError::UnknownItem(item.clone()))?;
            let raw = RawValue::parse_for(&meta, &value).ok_or_else(|| StoreError::InvalidAnswer {
                item_id: item.clone(),
                reason: format!("cannot read '{}' as a {} answer", value, meta.scale_type.as_str()),
            })?;
            db.save_answer(&session, &item, &raw)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Recorded {} for session {}.", item, session);
            }
        }

        Commands::Score { session } => {
            let service = ScoringService::new(&db, &db, ruleset);
            let score = service.calculate_and_save_scores(&session)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&score))?);
            } else {
                print_score(&score);
            }
        }

        Commands::Show { session } => {
            let service = ScoringService::new(&db, &db, ruleset);
            if let Some(score) = service.get_scores_for_response(&session)? {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&score))?);
                } else {
                    print_score(&score);
                }
            } else if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err("No scores for session"))?
                );
            } else {
                println!("No scores for session {}. Run `carhythm score {}`.", session, session);
            }
        }

        Commands::Scores => {
            let scores = db.list_scores()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&scores))?);
            } else if scores.is_empty() {
                println!("No scored sessions.");
            } else {
                println!(
                    "{:<24} {:<6} {:<7} {:<9} {:<11} UPDATED",
                    "SESSION", "CODE", "RIASEC", "BIG FIVE", "BEHAVIORAL"
                );
                println!("{}", "-".repeat(90));
                for s in scores {
                    println!(
                        "{:<24} {:<6} {:<7} {:<9} {:<11} {}",
                        truncate(&s.session_id, 24),
                        s.holland_code.as_deref().unwrap_or("-"),
                        check(s.riasec_complete),
                        check(s.big_five_complete),
                        check(s.behavioral_complete),
                        s.last_updated
                    );
                }
            }
        }

        Commands::Rules => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&ruleset))?);
            } else {
                println!("{}", serde_json::to_string_pretty(&ruleset)?);
            }
        }
    }

    Ok(())
}

fn check(done: bool) -> &'static str {
    if done {
        "done"
    } else {
        "-"
    }
}

fn score_line(name: &str, raw: Option<f64>, label: Option<&StrengthLabel>) {
    match raw {
        Some(raw) => println!(
            "  {:<22} {:>6.1}  {}",
            name,
            raw,
            label.map(|l| l.label()).unwrap_or("-")
        ),
        None => println!("  {:<22} {:>6}  -", name, "-"),
    }
}

fn section(title: &str, complete: bool) {
    println!();
    println!(
        "--- {} ({}) ---",
        title,
        if complete { "complete" } else { "incomplete" }
    );
}

fn print_score(score: &AssessmentScore) {
    let detail = &score.detail;
    println!("Session: {}", score.session_id);
    match (&score.holland_code, detail.top_domain) {
        (Some(code), Some(top)) => println!("Holland code: {} (top: {})", code, top.label()),
        _ => println!("Holland code: - (needs all six RIASEC domains)"),
    }

    section(Module::Riasec.label(), score.is_complete(Module::Riasec));
    for d in RiasecDomain::ALL {
        score_line(d.label(), score.riasec.get(d), detail.labels.riasec.get(&d));
    }

    section(Module::BigFive.label(), score.is_complete(Module::BigFive));
    for t in BigFiveTrait::ALL {
        score_line(t.as_str(), score.big_five.get(t), detail.labels.big_five.get(&t));
    }

    section(Module::Behavioral.label(), score.is_complete(Module::Behavioral));
    for t in BehavioralTrait::ALL {
        score_line(t.as_str(), score.behavioral.get(t), detail.labels.behavioral.get(&t));
    }

    println!();
    let raised: Vec<&str> = detail
        .flags
        .iter()
        .filter(|(_, on)| **on)
        .map(|(name, _)| name.as_str())
        .collect();
    println!(
        "Flags: {}",
        if raised.is_empty() {
            "-".to_string()
        } else {
            raised.join(", ")
        }
    );
    let z = &detail.zones;
    println!(
        "Zones: love {:.2}, mastery {:.2}, contribution {:.2}, sustainability {:.2}",
        z.love, z.mastery, z.contribution, z.sustainability
    );

    if !detail.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &detail.warnings {
            println!("  - {}", w);
        }
    }

    println!();
    println!("Rules: v{}", detail.ruleset_version);
    println!("First scored: {}", score.calculated_at);
    println!("Last updated: {}", score.last_updated);
}

// Counts chars, not bytes: session ids are free text
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
