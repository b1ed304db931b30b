use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use garmin_connect_client::config::Config;
use garmin_connect_client::http_client::ReqwestGarminClient;
use garmin_connect_client::utils::parse_local_datetime;
use running_sync::filters::recent;
use running_sync::sync::is_rejected_login;
use running_sync::{
    ActivityArchive, ActivityFilters, RunningStats, SyncConfig, SyncError, SyncJob,
    monthly_summaries, weekly_summaries,
};

#[derive(Parser)]
#[command(version, about = "Sync running activities from Garmin Connect into a local JSON archive")]
struct Cli {
    /// Data directory (overrides RUNNING_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new activities, update the archive and recompute statistics
    Sync,
    /// Print statistics plus weekly and monthly summaries as JSON
    Stats {
        #[arg(long, default_value_t = 12)]
        weeks: u32,
        #[arg(long, default_value_t = 12)]
        months: u32,
    },
    /// Print archived activities as JSON
    List(ListArgs),
}

#[derive(Args)]
struct ListArgs {
    /// Only the N most recent activities
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long, value_parser = parse_when)]
    start_date: Option<NaiveDateTime>,
    #[arg(long, value_parser = parse_when)]
    end_date: Option<NaiveDateTime>,
    /// Kilometers
    #[arg(long)]
    min_distance: Option<f64>,
    /// Kilometers
    #[arg(long)]
    max_distance: Option<f64>,
    /// Minutes per kilometer
    #[arg(long)]
    min_pace: Option<f64>,
    /// Minutes per kilometer
    #[arg(long)]
    max_pace: Option<f64>,
}

fn parse_when(s: &str) -> Result<NaiveDateTime, String> {
    parse_local_datetime(s).ok_or_else(|| format!("not a date or datetime: {s}"))
}

fn init_tracing() {
    // `RUNNING_SYNC_LOG_LEVEL` wins over `RUST_LOG`; default `info`.
    let log_env = std::env::var("RUNNING_SYNC_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let combined_filter = format!("{},reqwest=warn,hyper=warn", log_env);
    let env_filter = tracing_subscriber::EnvFilter::try_new(combined_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,reqwest=warn,hyper=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

async fn run_sync(config: SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting Garmin data sync...");
    println!("Data directory: {}", config.data_dir().display());

    let api = Config::from_env().map_err(SyncError::from)?;
    let client = ReqwestGarminClient::new(&api.base_url)?;
    let job = SyncJob::new(Arc::new(client), api.credentials, config);

    let report = match job.run(Local::now().naive_local()).await {
        Ok(report) => report,
        Err(e) => {
            if is_rejected_login(&e) {
                eprintln!("Garmin rejected the login; check GARMIN_EMAIL and GARMIN_PASSWORD");
            }
            return Err(e.into());
        }
    };
    println!(
        "Fetched {} activities since {}",
        report.fetched, report.window_start
    );
    println!("Saved {} new activities", report.new);
    println!("Updated {} existing activities", report.updated);
    if report.failed > 0 {
        println!("Failed to save {} activities", report.failed);
    }
    println!(
        "Statistics: {} activities, {} km total",
        report.stats.total_activities, report.stats.total_distance_km
    );
    println!("Sync completed");
    Ok(())
}

fn run_stats(config: &SyncConfig, weeks: u32, months: u32) -> Result<(), Box<dyn std::error::Error>> {
    let records = ActivityArchive::new(config.activities_dir()).load_all();
    let now = Local::now().naive_local();
    let stats = std::fs::read_to_string(config.stats_file())
        .ok()
        .and_then(|body| serde_json::from_str::<RunningStats>(&body).ok())
        .unwrap_or_else(|| RunningStats::compute(&records, now));
    let out = serde_json::json!({
        "stats": stats,
        "weekly_summaries": weekly_summaries(&records, weeks, now.date()),
        "monthly_summaries": monthly_summaries(&records, months, now.date()),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_list(config: &SyncConfig, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let records = ActivityArchive::new(config.activities_dir()).load_all();
    let filters = ActivityFilters {
        start_date: args.start_date,
        end_date: args.end_date,
        min_distance_km: args.min_distance,
        max_distance_km: args.max_distance,
        min_pace: args.min_pace,
        max_pace: args.max_pace,
    };
    let matched = if filters.is_empty() {
        records
    } else {
        filters.apply(records)
    };
    let activities = recent(matched, args.limit.unwrap_or(usize::MAX));
    let out = serde_json::json!({
        "count": activities.len(),
        "activities": activities,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut config = SyncConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir().display(), "configuration loaded");

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => run_sync(config).await,
        Commands::Stats { weeks, months } => run_stats(&config, weeks, months),
        Commands::List(args) => run_list(&config, args),
    }
}
