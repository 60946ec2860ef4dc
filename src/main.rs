//! CLI entry point for the tire rater.
//!
//! Provides subcommands for predicting wear metrics from CSV exports,
//! benchmarking brands, forecasting tire lifecycles, summarising monthly
//! tread history, and syncing a tenant's report from Supabase to S3/R2.

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tire_rater::config::WearPolicy;
use tire_rater::ingest::{load_fleet_rows, load_histories, load_snapshots, load_tread_readings};
use tire_rater::output::{append_metrics, print_json, print_pretty};
use tire_rater::prediction::benchmark::benchmark_brands;
use tire_rater::prediction::history::monthly_wear_history;
use tire_rater::prediction::lifecycle::forecast_lifecycle;
use tire_rater::prediction::report::{build_fleet_report, write_report_json};
use tire_rater::prediction::upload::{s3_client, upload_json};
use tire_rater::source::{InspectionSource, SupabaseSource};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "tire_rater")]
#[command(about = "Tire wear, lifecycle and CPK prediction for fleets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute wear metrics for every tire from CSV exports
    Predict {
        /// CSV with tire_id,date,odometer_km,tread_mm
        #[arg(short, long)]
        inspections: String,

        /// CSV with the tire registry (tire_id,serial_number,brand,model,...)
        #[arg(short, long)]
        tires: String,

        /// JSON file overriding the prediction policy constants
        #[arg(short, long)]
        policy: Option<String>,

        /// Write the fleet report as JSON to this path
        #[arg(short, long)]
        output: Option<String>,

        /// Append per-tire metric rows to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Rank brand/model groups by mean cost per km
    Benchmark {
        /// CSV with brand,model,total_km,cpk
        #[arg(short, long)]
        fleet: String,
    },
    /// Forecast remaining life of mounted tires, most urgent first
    Lifecycle {
        /// CSV with tire snapshots
        #[arg(short, long, required_unless_present = "tenant_id", conflicts_with = "tenant_id")]
        snapshots: Option<String>,

        /// Read snapshots for this tenant from Supabase instead
        #[arg(long)]
        tenant_id: Option<String>,

        /// Maximum number of tires to report
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// JSON file overriding the prediction policy constants
        #[arg(short, long)]
        policy: Option<String>,
    },
    /// Average tread depth per month over a recent window
    WearHistory {
        /// CSV with tire_id,date,odometer_km,tread_mm
        #[arg(short, long, required_unless_present = "tenant_id", conflicts_with = "tenant_id")]
        inspections: Option<String>,

        /// Read inspections for this tenant from Supabase instead
        #[arg(long)]
        tenant_id: Option<String>,

        /// Window size in days
        #[arg(short, long, default_value_t = 180)]
        days: i64,
    },
    /// Build a tenant's fleet report from Supabase and store it
    Sync {
        /// Tenant whose tires are evaluated
        #[arg(long)]
        tenant_id: String,

        /// JSON file overriding the prediction policy constants
        #[arg(short, long)]
        policy: Option<String>,

        /// Write the fleet report as JSON to this path
        #[arg(short, long)]
        output: Option<String>,

        /// Optional: S3/R2 bucket to upload the report to
        #[arg(long)]
        s3_bucket: Option<String>,

        /// Optional: Gzip compress the report before uploading
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/tire_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("tire_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            inspections,
            tires,
            policy,
            output,
            csv,
        } => {
            let policy = WearPolicy::load_or_default(policy.as_deref())?;
            let histories = load_histories(&inspections, &tires)?;
            let report = build_fleet_report(&histories, &policy, Utc::now().date_naive(), None);

            if let Some(path) = csv {
                append_metrics(&path, &report.tires)?;
            }
            match output {
                Some(path) => write_report_json(&path, &report)?,
                None => print_json(&report)?,
            }
        }
        Commands::Benchmark { fleet } => {
            let rows = load_fleet_rows(&fleet)?;
            let ranking = benchmark_brands(&rows);

            info!(rows = rows.len(), groups = ranking.len(), "Benchmark complete");
            print_json(&ranking)?;
        }
        Commands::Lifecycle {
            snapshots,
            tenant_id,
            limit,
            policy,
        } => {
            let policy = WearPolicy::load_or_default(policy.as_deref())?;
            let snapshots = match (snapshots, tenant_id) {
                (Some(path), _) => load_snapshots(&path)?,
                (None, Some(tenant_id)) => {
                    SupabaseSource::from_env()?
                        .tire_snapshots(&tenant_id)
                        .await?
                }
                (None, None) => unreachable!("clap requires snapshots or tenant_id"),
            };

            let forecasts = forecast_lifecycle(&snapshots, &policy, limit);
            print_pretty(&forecasts);
            print_json(&forecasts)?;
        }
        Commands::WearHistory {
            inspections,
            tenant_id,
            days,
        } => {
            let since = Utc::now() - Duration::days(days);
            let readings = match (inspections, tenant_id) {
                (Some(path), _) => load_tread_readings(&path)?,
                (None, Some(tenant_id)) => {
                    SupabaseSource::from_env()?
                        .tread_readings(&tenant_id, since)
                        .await?
                }
                (None, None) => unreachable!("clap requires inspections or tenant_id"),
            };

            let history = monthly_wear_history(&readings, since);
            print_json(&history)?;
        }
        Commands::Sync {
            tenant_id,
            policy,
            output,
            s3_bucket,
            gzip,
        } => {
            sync_tenant(&tenant_id, policy, output, s3_bucket, gzip).await?;
        }
    }

    Ok(())
}

/// Loads a tenant's fleet from Supabase, builds its report, and writes it
/// to disk and/or an S3-compatible bucket.
#[tracing::instrument(skip(policy, output, s3_bucket))]
async fn sync_tenant(
    tenant_id: &str,
    policy: Option<String>,
    output: Option<String>,
    s3_bucket: Option<String>,
    gzip: bool,
) -> Result<()> {
    let policy = WearPolicy::load_or_default(policy.as_deref())?;
    let source = SupabaseSource::from_env()?;

    info!("Fetching fleet data from Supabase");
    let histories = source.tire_histories(tenant_id).await?;

    let today = Utc::now().date_naive();
    let report = build_fleet_report(&histories, &policy, today, Some(tenant_id));

    if let Some(path) = &output {
        write_report_json(path, &report)?;
    }

    match s3_bucket {
        Some(bucket) => {
            let endpoint = std::env::var("R2_ENDPOINT").ok();
            info!(bucket = %bucket, gzip, custom_endpoint = endpoint.is_some(), "S3 upload enabled");

            let client = s3_client(endpoint.as_deref()).await;
            let key = format!(
                "reports/tenant_id={}/date={}.json",
                tenant_id,
                today.format("%Y-%m-%d")
            );
            upload_json(&client, &bucket, &key, &report, gzip).await?;
        }
        None if output.is_none() => print_json(&report)?,
        None => info!("S3 bucket not specified, skipping upload"),
    }

    Ok(())
}
