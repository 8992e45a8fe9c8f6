use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

use propinsight_pipeline::app::check_use_case::CheckUseCase;
use propinsight_pipeline::app::process_use_case::ProcessUseCase;
use propinsight_pipeline::config::Config;
use propinsight_pipeline::domain::{Source, Timestamp};
use propinsight_pipeline::infra::jsonl_output_adapter::JsonlRecordSink;
use propinsight_pipeline::infra::raw_input_adapter::read_raw_records;
use propinsight_pipeline::infra::rejection_report_adapter::FileRejectionSink;
use propinsight_pipeline::logging;
use propinsight_pipeline::observability;
use propinsight_pipeline::pipeline::processing::dedupe::FingerprintIndex;
use propinsight_pipeline::pipeline::PipelineCoordinator;

#[derive(Parser)]
#[command(name = "propinsight")]
#[command(about = "Normalize, validate and score scraped Singapore property records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Serve Prometheus metrics on this port while running
    #[arg(long)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run raw scraper output through the pipeline
    Process {
        /// Source the input came from: reddit, government, propertyguru, hardwarezone
        #[arg(long)]
        source: String,
        /// JSONL file of raw scraper records
        #[arg(long)]
        input: PathBuf,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Re-validate an existing universal-record JSONL file
    Check {
        #[arg(long)]
        input: PathBuf,
    },
}

async fn run_process(config: &Config, source: &str, input: &Path, output_dir: &str) -> Result<()> {
    let source: Source = source.parse().context("Unsupported --source")?;
    let raws = read_raw_records(input, source.as_str())?;
    info!("Loaded {} raw {} records from {}", raws.len(), source, input.display());

    let run_started_at = chrono::Utc::now();
    let coordinator = PipelineCoordinator::with_defaults(
        Arc::new(FingerprintIndex::new()),
        Timestamp::from_datetime(run_started_at),
    )
    .with_duplicate_policy(config.pipeline.duplicate_policy);

    let use_case = ProcessUseCase::new(
        Arc::new(coordinator),
        Box::new(JsonlRecordSink::new(output_dir, config.output.max_records_per_file)?),
        Box::new(FileRejectionSink::new(output_dir, run_started_at.date_naive())?),
        config.pipeline.workers,
    );

    let outcomes = use_case.process_batch_at(raws, run_started_at).await?;
    let stats = ProcessUseCase::get_batch_stats(&outcomes);

    println!("\n📊 Pipeline Results for {}:", source);
    println!("   Total records: {}", stats.total_records);
    println!("   Accepted: {} ({:.1}%)", stats.accepted_count, stats.acceptance_rate());
    println!("   Rejected: {}", stats.rejected_count);
    println!("   Duplicates: {}", stats.duplicate_count);
    if let (Some(min), Some(max)) = (stats.min_quality_score, stats.max_quality_score) {
        println!(
            "   Quality score: min {:.3} / avg {:.3} / max {:.3}",
            min, stats.avg_quality_score, max
        );
    }
    if !stats.rejections_by_rule.is_empty() {
        println!("\n⚠️  Rejections by rule:");
        for (rule, count) in &stats.rejections_by_rule {
            println!("   - {}: {}", rule, count);
        }
    }
    println!("\n   Output directory: {}", output_dir);
    Ok(())
}

fn run_check(input: &Path) -> Result<bool> {
    let report = CheckUseCase::default().check_file(input)?;
    println!("Checked {} records: {} valid, {} invalid", report.total_lines, report.valid_count, report.invalid.len());
    for invalid in &report.invalid {
        match &invalid.decode_error {
            Some(e) => println!("   - line {}: {}", invalid.line, e),
            None => {
                for err in &invalid.errors {
                    println!("   - line {} ({}): {}", invalid.line, invalid.id.as_deref().unwrap_or("?"), err);
                }
            }
        }
    }
    Ok(report.is_clean())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(&cli.config).context("Failed to load configuration")?;
    let directive = format!(
        "propinsight_pipeline={level},propinsight={level}",
        level = config.logging.level
    );
    logging::init_logging(&config.logging.dir, &directive);

    if let Err(e) = observability::init(cli.metrics_port) {
        error!("Failed to initialize metrics: {}", e);
    }

    match cli.command {
        Commands::Process { source, input, output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            println!("🔄 Processing {} records from {}...", source, input.display());
            run_process(&config, &source, &input, &output_dir).await?;
        }
        Commands::Check { input } => {
            if !run_check(&input)? {
                std::process::exit(1);
            }
        }
    }

    if let Some(rendered) = observability::metrics::render() {
        debug!("Final metrics:\n{}", rendered);
    }
    Ok(())
}
