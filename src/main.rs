use actualcode::{
    logging, persist, AppConfig, ChatCompletionsClient, Difficulty, FileSource, Orchestrator,
    ProblemType, RepositorySource, RunRequest, SyntheticSource,
};
use actualcode::metrics::METRICS;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// Generate a coding assessment grounded in a repository
#[derive(Debug, Parser)]
#[command(name = "actualcode", version, about)]
struct Cli {
    /// Repository URL or owner/name
    repo_url: String,

    /// easy, medium, hard or expert
    #[arg(long, short = 'd')]
    difficulty: Option<Difficulty>,

    /// feature, bug-fix, refactor or optimization
    #[arg(long, short = 't')]
    problem_type: Option<ProblemType>,

    /// Time limit in minutes
    #[arg(long)]
    time_limit: Option<u32>,

    /// Pre-gathered repository dataset (JSON); skips the scan
    #[arg(long, value_name = "FILE")]
    repo_data: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', value_name = "FILE", env = "ACTUALCODE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Record every prompt and response
    #[arg(long)]
    transcript: bool,

    /// Print prometheus metrics after the run
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = &cli.output_dir {
        config.pipeline.output_dir = dir.clone();
    }
    if cli.transcript {
        config.pipeline.save_transcript = true;
    }
    logging::init(&config.logging);

    let request = RunRequest::new(&cli.repo_url)
        .difficulty(cli.difficulty.unwrap_or(config.pipeline.default_difficulty))
        .problem_type(cli.problem_type.unwrap_or(config.pipeline.default_problem_type))
        .time_limit(cli.time_limit.unwrap_or(config.pipeline.default_time_limit_minutes));

    let source: Arc<dyn RepositorySource> = match &cli.repo_data {
        Some(path) => Arc::new(FileSource::new(path)),
        None => {
            warn!("No dataset file given; using synthetic repository data");
            Arc::new(SyntheticSource::new())
        }
    };

    let llm = Arc::new(ChatCompletionsClient::new(&config.llm)?);
    let orchestrator = Orchestrator::from_config(&config, llm, source)?;
    let output_dir = config.pipeline.output_dir.clone();

    let outcome = orchestrator.generate_assessment(request).await;

    if let Err(e) = persist::save_transcript(&output_dir, orchestrator.transcript()).await {
        warn!("Could not save transcript: {:#}", e);
    }

    let code = match outcome {
        Ok(result) => {
            let problem = result.assessment.problem.record();
            let validation = result.assessment.validation.record();
            println!("Problem:    {}", problem.title);
            println!("Difficulty: {}", problem.difficulty);
            println!("Time:       {} minutes", problem.estimated_time);
            println!(
                "QA score:   {}/100 ({})",
                validation.overall_score,
                if validation.is_approved { "approved" } else { "not approved" }
            );

            let path = persist::save_assessment(&output_dir, &result).await?;
            info!("Run {} finished", result.assessment.metadata.conversation_id);
            println!("Saved:      {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.report())?);
            ExitCode::FAILURE
        }
    };

    if cli.metrics {
        println!("{}", METRICS.export_prometheus());
    }

    Ok(code)
}
