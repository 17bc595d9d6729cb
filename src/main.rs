use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

mod adherence;
mod change;
mod days;
mod db;
mod error;
mod models;
mod overview;
mod report;
mod totals;
mod weeks;

use crate::models::{Nutrient, Target};
use crate::overview::{build_overview, Overview};
use crate::weeks::{parse_weekday, window_start, WeekCalendar};

#[derive(Parser)]
#[command(name = "nutrition-overview")]
#[command(about = "Daily and weekly nutrition overview with target adherence", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArgs {
    /// How far back to look; widened to the start of that week
    #[arg(long, default_value_t = 28, value_parser = clap::value_parser!(i64).range(1..=36500))]
    since_days: i64,
    /// First day of the week, e.g. monday or sunday
    #[arg(long, default_value = "monday", value_parser = parse_weekday)]
    week_start: Weekday,
    /// Reference date for deciding which weeks are finished (defaults to today)
    #[arg(long)]
    today: Option<NaiveDate>,
}

impl WindowArgs {
    fn calendar(&self) -> WeekCalendar {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        WeekCalendar::new(self.week_start, today)
    }

    fn since(&self, calendar: &WeekCalendar) -> anyhow::Result<NaiveDate> {
        window_start(calendar.today, self.since_days, calendar.first_day)
            .with_context(|| format!("--since-days {} reaches past the calendar", self.since_days))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic travel week and default targets
    Seed,
    /// Import logged entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Set the daily target range for a nutrient
    SetTarget {
        #[arg(long)]
        nutrient: Nutrient,
        #[arg(long)]
        min: Option<f64>,
        #[arg(long)]
        max: Option<f64>,
        /// Keep the range but leave it out of adherence scoring
        #[arg(long)]
        disabled: bool,
    },
    /// Show per-day totals and target progress
    Days {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show finished weeks with averages, adherence and week-over-week change
    Weeks {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value = "nutrition-report.md")]
        out: PathBuf,
    },
}

// Logs stay off stdout so `--format json` output remains parseable.
fn build_subscriber<W>(
    env_filter: &str,
    json_logs: bool,
    writer: W,
) -> Box<dyn tracing::Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(writer);

    if json_logs {
        Box::new(builder.with_target(false).json().finish())
    } else {
        Box::new(builder.finish())
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutrition_overview=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    tracing::subscriber::set_global_default(build_subscriber(
        &env_filter,
        json_logs,
        std::io::stderr,
    ))
    .context("failed to install tracing subscriber")
}

async fn load_overview(
    pool: &PgPool,
    window: &WindowArgs,
) -> anyhow::Result<(NaiveDate, Overview)> {
    let calendar = window.calendar();
    let since = window.since(&calendar)?;
    let entries = db::fetch_entries(pool, since).await?;
    let targets = db::fetch_targets(pool).await?;
    info!(%since, today = %calendar.today, entries = entries.len(), "loaded entries");
    Ok((since, build_overview(&entries, &targets, &calendar)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} entries from {}.", csv.display());
        }
        Commands::SetTarget {
            nutrient,
            min,
            max,
            disabled,
        } => {
            let target = Target {
                enabled: !disabled,
                min,
                max,
            };
            db::upsert_target(&pool, nutrient, &target).await?;
            println!("Target for {nutrient} saved.");
        }
        Commands::Days { window, format } => {
            let (_, overview) = load_overview(&pool, &window).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&overview.days)?)
                }
                OutputFormat::Text if overview.days.is_empty() => {
                    println!("No entries found for this window.");
                }
                OutputFormat::Text => {
                    for day in overview.days.iter().rev() {
                        println!("- {}", report::day_line(day));
                    }
                }
            }
        }
        Commands::Weeks { window, format } => {
            let (_, overview) = load_overview(&pool, &window).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&overview.weeks)?)
                }
                OutputFormat::Text if overview.weeks.is_empty() => {
                    println!("No finished weeks in this window.");
                }
                OutputFormat::Text => {
                    for summary in overview.weeks.iter().rev() {
                        println!("- {}", report::week_line(summary));
                    }
                }
            }
        }
        Commands::Report { window, out } => {
            let (since, overview) = load_overview(&pool, &window).await?;
            let report = report::build_report(since, &overview);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
