use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use cefr_assess_core::history::domain::run_recorder::RunRecorder;
use cefr_assess_core::history::domain::run_report::RunMetadata;
use cefr_assess_core::history::history_summary::render_history;
use cefr_assess_core::history::infrastructure::file_run_recorder::FileRunRecorder;
use cefr_assess_core::pipeline::assess_speech_use_case::{AssessSpeechUseCase, AssessmentRequest};
use cefr_assess_core::pipeline::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use cefr_assess_core::pipeline::self_test::SelfTest;
use cefr_assess_core::rubric::domain::scorer::Scorer;
use cefr_assess_core::rubric::infrastructure::ollama_scorer::{list_models, OllamaScorer};
use cefr_assess_core::rubric::infrastructure::timeout_scorer::TimeoutScorer;
use cefr_assess_core::shared::cefr_level::CefrLevel;
use cefr_assess_core::shared::constants::{
    DEFAULT_OLLAMA_URL, DEFAULT_SCORER_MODEL, DEFAULT_SCORER_TIMEOUT_SECS,
    DEFAULT_TRANSCRIBER_MODEL,
};
use cefr_assess_core::shared::engine_config::{default_log_dir, EngineConfig};
use cefr_assess_core::transcript::domain::transcript_source::TranscriptSource;
use cefr_assess_core::transcript::infrastructure::json_transcript_reader::JsonTranscriptReader;

/// CEFR speaking assessment from timed transcripts.
#[derive(Parser, Debug)]
#[command(name = "cefr-assess")]
struct Cli {
    /// Transcript JSON file (array of segments or {"segments": [...]}).
    input: Option<PathBuf>,

    /// Language code of the transcript.
    #[arg(long, default_value = "it")]
    language: String,

    /// Transcription model label recorded with the run.
    #[arg(long, default_value = DEFAULT_TRANSCRIBER_MODEL)]
    transcriber: String,

    /// Ollama model used to score the rubric.
    #[arg(long, default_value = DEFAULT_SCORER_MODEL)]
    llm: String,

    /// Base URL of the Ollama server.
    #[arg(long, default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    /// Seconds to wait for one scorer reply.
    #[arg(long, default_value_t = DEFAULT_SCORER_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Compare the run against this level's baseline (A1..C2).
    #[arg(long)]
    target_level: Option<CefrLevel>,

    /// Free-form label stored with the run.
    #[arg(long, default_value = "")]
    label: String,

    /// Free-form notes stored with the run.
    #[arg(long, default_value = "")]
    notes: String,

    /// Input identifier stored with the run (defaults to the file name).
    #[arg(long)]
    input_id: Option<String>,

    /// History directory (defaults to the platform data directory).
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Do not record the run.
    #[arg(long)]
    no_log: bool,

    /// TOML file overriding baselines, lexicons and the pause threshold.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the built-in end-to-end check and exit.
    #[arg(long)]
    self_test: bool,

    /// Let the self-test record into this directory.
    #[arg(long)]
    self_test_dir: Option<PathBuf>,

    /// List models available on the Ollama server and exit.
    #[arg(long)]
    list_models: bool,

    /// Print recorded runs and exit.
    #[arg(long)]
    history: bool,

    /// Restore tabular history rows missing for recorded runs and exit.
    #[arg(long)]
    repair_history: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.self_test {
        return run_self_test(cli.self_test_dir.as_deref());
    }
    if cli.list_models {
        return run_list_models(&cli);
    }
    if cli.history || cli.repair_history {
        let recorder = FileRunRecorder::new(&resolve_log_dir(cli.log_dir.as_deref())?);
        if cli.repair_history {
            let restored = recorder.repair_tabular()?;
            log::info!(
                "Restored {restored} tabular rows in {}",
                recorder.tabular_path().display()
            );
        }
        if cli.history {
            print!("{}", render_history(&recorder.read_history()?));
        }
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        eprintln!("Error: a transcript file is required (or use --self-test, --history, --list-models)");
        process::exit(2);
    };
    run_assessment(&cli, input)
}

fn run_self_test(scratch_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = LogPipelineLogger::new();
    let report = SelfTest::new(scratch_dir, None).run(&mut logger)?;
    logger.summary();

    if report.passed() {
        println!("Self-test passed");
        return Ok(());
    }
    eprintln!("Self-test failed:");
    for mismatch in &report.mismatches {
        eprintln!("  {mismatch}");
    }
    process::exit(1);
}

fn run_list_models(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let models = list_models(&cli.ollama_url, Duration::from_secs(cli.timeout_secs))?;
    if models.is_empty() {
        eprintln!("No models installed on {}", cli.ollama_url);
    }
    for name in models {
        println!("{name}");
    }
    Ok(())
}

fn run_assessment(cli: &Cli, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let reader = JsonTranscriptReader::new(input);
    let transcript = reader.load()?;

    let timeout = Duration::from_secs(cli.timeout_secs);
    let ollama: Arc<dyn Scorer> = Arc::new(OllamaScorer::new(&cli.ollama_url, &cli.llm, timeout)?);
    let scorer: Box<dyn Scorer> = Box::new(TimeoutScorer::new(ollama, timeout));

    let recorder: Option<Box<dyn RunRecorder>> = if cli.no_log {
        None
    } else {
        let dir = resolve_log_dir(cli.log_dir.as_deref())?;
        log::info!("Recording history in {}", dir.display());
        Some(Box::new(FileRunRecorder::new(&dir)))
    };

    let use_case = AssessSpeechUseCase::new(
        config.metrics_extractor()?,
        config.baseline_table()?,
        scorer,
        recorder,
        None,
    );
    let request = AssessmentRequest {
        language: cli.language.clone(),
        target_level: cli.target_level,
        input_id: cli.input_id.clone().unwrap_or_else(|| reader.input_id()),
        label: cli.label.clone(),
        notes: cli.notes.clone(),
        metadata: RunMetadata {
            scorer_model: cli.llm.clone(),
            transcriber_model: cli.transcriber.clone(),
        },
    };

    let mut logger = LogPipelineLogger::new();
    let outcome = use_case.run(&transcript, &request, &mut logger)?;
    logger.summary();

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn resolve_log_dir(explicit: Option<&Path>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => default_log_dir()
            .ok_or_else(|| "No platform data directory; pass --log-dir".into()),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if cli.timeout_secs == 0 {
        return Err("Timeout must be at least 1 second".into());
    }
    if cli.no_log && (cli.history || cli.repair_history) {
        return Err("--no-log cannot be combined with --history or --repair-history".into());
    }
    if cli.self_test_dir.is_some() && !cli.self_test {
        return Err("--self-test-dir requires --self-test".into());
    }
    if cli.llm.trim().is_empty() {
        return Err("--llm must name a model".into());
    }
    Ok(())
}
