//! lens-rx: extract an optical prescription from a PDF, DOCX or TXT upload
//! and print the draft as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lens_rx_core::extractor::parse_calendar_date;
use lens_rx_core::{Dispatcher, ExtractContext, ExtractorConfig, PatientForm, RoutingPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Routing {
    /// Section extractors for .txt only; PDF/DOCX go straight to whole-text
    ByFormat,
    /// Full fallback chain for every format
    Unified,
}

impl From<Routing> for RoutingPolicy {
    fn from(routing: Routing) -> Self {
        match routing {
            Routing::ByFormat => RoutingPolicy::ByFormat,
            Routing::Unified => RoutingPolicy::Unified,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "lens-rx", version, about = "Extract an optical prescription from a document")]
struct Cli {
    /// Prescription file (.pdf, .docx or .txt)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON extractor configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured routing policy
    #[arg(long, value_enum)]
    routing: Option<Routing>,

    /// Date used for missing exam dates (defaults to today, UTC)
    #[arg(long, value_name = "DATE", value_parser = parse_run_date)]
    run_date: Option<ExtractContext>,

    /// Print the draft merged into a blank patient form instead of the raw outcome
    #[arg(long, default_value_t = false)]
    form: bool,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_run_date(raw: &str) -> Result<ExtractContext, String> {
    parse_calendar_date(raw)
        .map(ExtractContext::new)
        .ok_or_else(|| format!("unrecognized date: {raw}"))
}

impl Cli {
    fn extractor_config(&self) -> Result<ExtractorConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExtractorConfig::default(),
        };
        if let Some(routing) = self.routing {
            config.routing = routing.into();
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.extractor_config()?;
    let ctx = cli.run_date.unwrap_or_else(ExtractContext::today);
    tracing::debug!(routing = ?config.routing, run_date = %ctx.run_date, "starting extraction");

    let dispatcher = Dispatcher::new(config);
    let outcome = dispatcher
        .extract_file(&cli.file, &ctx)
        .await
        .with_context(|| format!("Failed to extract {}", cli.file.display()))?;

    let json = if cli.form {
        let mut form = PatientForm::new(ctx.run_date);
        form.merge_draft(&outcome.draft, ctx.run_date);
        to_json(&form, cli.pretty)?
    } else {
        to_json(&outcome, cli.pretty)?
    };
    println!("{json}");

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
