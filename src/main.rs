//! Cyclesense: PCOS risk triage from a questionnaire.
//!
//! Reads a questionnaire as JSON, trains the classifier in-process, and
//! prints the annotated prediction.
//!
//! # Usage
//!
//! ```bash
//! cyclesense [--input <path|->] [--format json|text]
//! ```

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cyclesense::adapters::mlp::{MlpClassifier, TrainingConfig};
use cyclesense::adapters::sanitize::SanitizingMakeWriter;
use cyclesense::application::{TriageProgress, TriageService, TriageWorker};
use cyclesense::domain::{PredictionResult, Questionnaire, MEDICAL_DISCLAIMER};

const USAGE: &str = "Usage: cyclesense [--input <path|->] [--format json|text]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

struct Args {
    input: Option<std::path::PathBuf>,
    format: OutputFormat,
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}\n{USAGE}");
    std::process::exit(2);
}

fn parse_args() -> Args {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        input: None,
        format: OutputFormat::Json,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" | "-i" => {
                let p = args.next().unwrap_or_default();
                if p.is_empty() {
                    usage_error("Missing value for --input");
                }
                parsed.input = (p != "-").then(|| std::path::PathBuf::from(p));
            }
            "--format" | "-f" => {
                parsed.format = match args.next().as_deref() {
                    Some("json") => OutputFormat::Json,
                    Some("text") => OutputFormat::Text,
                    other => usage_error(&format!("Unsupported format: {other:?}")),
                };
            }
            "-h" | "--help" => {
                println!(
                    "{USAGE}\n\nReads a questionnaire (JSON) from --input or stdin and prints the PCOS risk assessment.\nThe classifier is trained on synthetic data at startup; results are informational only."
                );
                std::process::exit(0);
            }
            _ => usage_error(&format!("Unknown arg: {arg}")),
        }
    }
    parsed
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout carries the result, so logs default to stderr.
    let log_mode = std::env::var("CYCLESENSE_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file = std::env::var("CYCLESENSE_LOG_FILE")
            .unwrap_or_else(|_| "cyclesense.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn read_questionnaire(path: Option<&std::path::Path>) -> Result<Questionnaire> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read {}", p.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read questionnaire from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Questionnaire JSON does not match the expected shape")
}

fn render_text(result: &PredictionResult) -> String {
    let mut out = format!(
        "Risk level: {} ({}% confidence)\n{}\n",
        result.risk_level,
        result.confidence,
        result.risk_level.message()
    );

    if !result.symptoms.is_empty() {
        out.push_str("\nSymptoms noted:\n");
        for symptom in &result.symptoms {
            out.push_str(&format!("  - {symptom}\n"));
        }
    }

    let recs = &result.specific_recommendations;
    for (title, items) in [
        ("Diet", &recs.diet),
        ("Exercise", &recs.exercise),
        ("Lifestyle", &recs.lifestyle),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{title}:\n"));
        for item in items {
            out.push_str(&format!("  - {item}\n"));
        }
    }

    out.push_str(&format!("\n{MEDICAL_DISCLAIMER}\n"));
    out
}

fn main() -> Result<()> {
    let args = parse_args();
    let _guard = init_logging()?;

    let questionnaire = read_questionnaire(args.input.as_deref())?;

    let config = TrainingConfig::from_env_or_default();
    tracing::info!(
        "Starting Cyclesense (samples={}, epochs={}, batch={})",
        config.samples,
        config.epochs,
        config.batch_size
    );

    let samples = config.samples;
    let service = Arc::new(TriageService::new(
        move || MlpClassifier::new(config.clone()),
        samples,
    ));

    let outcome = TriageWorker::spawn(service, questionnaire).wait(|progress| match progress {
        TriageProgress::Training => tracing::info!("Training classifier on synthetic data..."),
        TriageProgress::Classifying => tracing::debug!("Classifying questionnaire"),
        _ => {}
    });

    let result = match outcome {
        TriageProgress::Complete(result) => result,
        TriageProgress::Error(msg) => bail!("Assessment failed: {msg}"),
        other => bail!("Unexpected worker state: {other:?}"),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", render_text(&result)),
    }

    Ok(())
}
