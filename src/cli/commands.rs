//! CLI command definitions for exam-forge.
//!
//! `serve` runs the HTTP API; `generate` drives the whole wizard locally on a
//! set of PDF files and writes the question paper and answer key to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::export::Exporter;
use crate::generator::{GenerationSummary, IdStrategy, QuestionGenerator};
use crate::question::{ExamDetails, OptionsCount, QuestionConfig};
use crate::server::{self, AppState};
use crate::workflow::{Transition, Wizard};

/// Default output directory for exported papers.
const DEFAULT_OUTPUT_DIR: &str = "./exam-papers";

/// Generate exam papers from PDF study material with an LLM.
#[derive(Parser)]
#[command(name = "exam-forge")]
#[command(about = "Generate exam question papers and answer keys from PDF study material")]
#[command(version)]
#[command(
    long_about = "exam-forge turns PDF study material into multiple-choice, short-answer and long-answer questions using an OpenAI-compatible model.\n\nExample usage:\n  exam-forge serve --port 3001\n  exam-forge generate notes.pdf --university \"State University\" --branch \"Computer Science\" --subject \"Data Structures\""
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// YAML configuration file.
    #[arg(short, long, env = "EXAM_FORGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),

    /// Generate a question paper and answer key from PDF files.
    #[command(alias = "gen")]
    Generate(GenerateArgs),
}

/// Model endpoint flags shared by both commands.
#[derive(Parser, Debug, Clone, Default)]
pub struct LlmArgs {
    /// Model used for generation.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API key (can also be set via OPENAI_API_KEY env var).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long)]
    pub api_base: Option<String>,
}

/// Arguments for the serve command.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// Arguments for the generate command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// PDF files with the study material.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// University or institution name.
    #[arg(long)]
    pub university: String,

    /// Branch or department.
    #[arg(long)]
    pub branch: String,

    /// Subject of the exam.
    #[arg(long)]
    pub subject: String,

    /// Exam date (YYYY-MM-DD).
    #[arg(long, default_value = "")]
    pub date: String,

    /// Exam duration, e.g. "3 hours".
    #[arg(long, default_value = "")]
    pub duration: String,

    /// Total marks printed on the paper.
    #[arg(long, default_value_t = 100)]
    pub total_marks: u32,

    /// JSON or YAML file with a full question configuration.
    #[arg(long)]
    pub questions: Option<PathBuf>,

    /// Number of multiple-choice questions.
    #[arg(long)]
    pub mcq: Option<u32>,

    /// Number of short-answer questions.
    #[arg(long)]
    pub short: Option<u32>,

    /// Number of long-answer questions.
    #[arg(long)]
    pub long: Option<u32>,

    /// Options per multiple-choice question (4 or 5).
    #[arg(long, value_parser = clap::value_parser!(u8).range(4..=5))]
    pub options: Option<u8>,

    /// Number questions q-1..q-N instead of per kind.
    #[arg(long)]
    pub sequential_ids: bool,

    /// Output directory for the exported documents.
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Output JSON to stdout instead of a human-readable summary.
    #[arg(short = 'j', long)]
    pub json: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve(args) => run_serve_command(config, args).await,
        Commands::Generate(args) => run_generate_command(config, args).await,
    }
}

fn apply_llm_args(config: &mut AppConfig, args: &LlmArgs) {
    if let Some(model) = &args.model {
        config.generation.model = model.clone();
    }
    if let Some(key) = &args.api_key {
        config.llm.api_key = Some(key.clone());
    }
    if let Some(base) = &args.api_base {
        config.llm.api_base = base.clone();
    }
}

fn build_generator(config: &AppConfig) -> anyhow::Result<QuestionGenerator> {
    let client = config
        .llm
        .build_client(&config.generation.model)
        .context("Failed to initialize LLM client. Provide --api-key or set OPENAI_API_KEY")?;
    info!(model = %config.generation.model, api_base = %client.api_base(), "Using LLM endpoint");
    Ok(QuestionGenerator::new(
        Arc::new(client),
        config.generation.clone(),
    ))
}

// ============================================================================
// Serve Command Implementation
// ============================================================================

async fn run_serve_command(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    apply_llm_args(&mut config, &args.llm);
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    let generator = build_generator(&config)?;
    let app = server::router_with_limit(AppState::new(generator), config.server.body_limit_bytes);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    server::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Generate Command Implementation
// ============================================================================

/// JSON output of the generate command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub status: String,
    pub subject: String,
    pub model: String,
    pub questions: usize,
    pub marks: u32,
    pub summary: GenerationSummary,
    pub files: Vec<String>,
    pub total_duration_ms: u64,
}

/// Builds the question configuration from an optional file plus flag
/// overrides.
pub fn build_question_config(args: &GenerateArgs) -> anyhow::Result<QuestionConfig> {
    let mut config = match &args.questions {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid question configuration in {}", path.display()))?
        }
        None => QuestionConfig::default(),
    };

    if let Some(count) = args.mcq {
        config.mcq.count = count;
    }
    if let Some(count) = args.short {
        config.short_answer.count = count;
    }
    if let Some(count) = args.long {
        config.long_answer.count = count;
    }
    if let Some(options) = args.options {
        config.mcq.options_count =
            OptionsCount::try_from(options).map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(config)
}

fn exam_details(args: &GenerateArgs) -> ExamDetails {
    ExamDetails {
        university_name: args.university.clone(),
        branch: args.branch.clone(),
        subject: args.subject.clone(),
        exam_date: args.date.clone(),
        exam_duration: args.duration.clone(),
        total_marks: args.total_marks,
    }
}

fn advance(transition: Transition) -> anyhow::Result<Wizard> {
    transition.map_err(|rejected| anyhow::Error::new(rejected.error))
}

/// Runs the upload, details and configuration steps.
pub fn prepare_wizard(args: &GenerateArgs) -> anyhow::Result<Wizard> {
    let mut wizard = Wizard::new();
    for path in &args.files {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = file_name(path);
        wizard = advance(wizard.upload(&name, &bytes))
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }

    let wizard = advance(wizard.submit_documents())?;
    let wizard = advance(wizard.submit_details(exam_details(args)))?;
    advance(wizard.submit_config(build_question_config(args)?))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn run_generate_command(mut config: AppConfig, args: GenerateArgs) -> anyhow::Result<()> {
    apply_llm_args(&mut config, &args.llm);
    if args.sequential_ids {
        config.generation.id_strategy = IdStrategy::Sequential;
    }
    config.validate()?;

    let wizard = prepare_wizard(&args)?;
    let generator = build_generator(&config)?;

    let start = std::time::Instant::now();
    let wizard = advance(wizard.generate(&generator).await)?;

    let (paper, summary) = match (wizard.paper(), wizard.summary()) {
        (Some(paper), Some(summary)) => (paper, summary),
        _ => anyhow::bail!("Generation finished without a question paper"),
    };

    let bundle = Exporter::default().export(paper)?;
    let written = bundle.write_to(&args.output)?;

    let output = GenerateOutput {
        status: if summary.is_complete() {
            "success".to_string()
        } else {
            "partial".to_string()
        },
        subject: paper.exam_details.subject.clone(),
        model: config.generation.model.clone(),
        questions: paper.questions.len(),
        marks: paper.generated_marks(),
        summary: summary.clone(),
        files: written.iter().map(|p| p.display().to_string()).collect(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    if args.json {
        let json_output = serde_json::to_string_pretty(&output)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
        println!("{}", json_output);
        return Ok(());
    }

    if !summary.is_complete() {
        warn!("The model returned fewer questions than requested.");
    }
    println!(
        "Generated {} questions ({} marks) for {}",
        output.questions, output.marks, output.subject
    );
    for section in &summary.sections {
        println!(
            "  {:<6} {}/{}",
            section.kind.id_prefix(),
            section.delivered,
            section.requested
        );
    }
    for file in &output.files {
        println!("Wrote {}", file);
    }

    Ok(())
}
