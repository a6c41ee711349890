//! Straitwatch CLI
//!
//! Scheduled Taiwan-Strait risk scoring from open-source news and LLM
//! indicator classification. Intended to run once per day; the scheduler
//! must guarantee runs do not overlap, since the score file is a plain
//! read-modify-write.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use straitwatch_classify::{
    create_backend, create_gemini_backend, GeminiConfig, OpenAIBackendConfig, TriggerClassifier,
};
use straitwatch_core::{DecayConfig, RunArtifact};
use straitwatch_runtime::{Pipeline, PipelineConfig};
use straitwatch_sources::{HttpConfig, LocalPulseSource, NewsApiSource, OfficialFeedSource};

#[derive(Parser)]
#[command(name = "straitwatch")]
#[command(author, version, about = "Straitwatch: daily Taiwan-Strait risk scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one scoring run and rewrite the score file
    Run {
        /// Indicator catalog JSON file
        #[arg(long, default_value = "indicators.json")]
        catalog: PathBuf,

        /// Score file (read at start, rewritten at the end)
        #[arg(long, default_value = "scores.json")]
        state: PathBuf,

        /// NewsAPI key (or set NEWS_API_KEY env var)
        #[arg(long, env = "NEWS_API_KEY")]
        news_api_key: Option<String>,

        /// DeepSeek API key (or set DEEPSEEK_API_KEY env var)
        #[arg(long, env = "DEEPSEEK_API_KEY")]
        deepseek_key: Option<String>,

        /// Gemini API key (or set GEMINI_API_KEY env var)
        #[arg(long, env = "GEMINI_API_KEY")]
        gemini_key: Option<String>,

        /// Use Gemini instead of DeepSeek
        #[arg(long)]
        gemini: bool,

        /// Gemini model name (only with --gemini)
        #[arg(long, default_value = "gemini-2.0-flash")]
        model: String,

        /// Daily decay multiplier for non-retriggered indicators
        #[arg(long, default_value = "0.75")]
        decay_factor: f64,

        /// Weight below which an indicator is evicted
        #[arg(long, default_value = "1.0")]
        weight_floor: f64,

        /// Per-request HTTP timeout in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,

        /// Override the local-sentiment note fed to the classifier
        #[arg(long)]
        local_note: Option<String>,
    },

    /// Print the current score file
    Show {
        /// Score file to read
        #[arg(long, default_value = "scores.json")]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match cli.command {
        Commands::Run {
            catalog,
            state,
            news_api_key,
            deepseek_key,
            gemini_key,
            gemini,
            model,
            decay_factor,
            weight_floor,
            timeout,
            local_note,
        } => {
            run(
                catalog,
                state,
                news_api_key,
                deepseek_key,
                gemini_key,
                gemini,
                &model,
                decay_factor,
                weight_floor,
                timeout,
                local_note,
            )
            .await?;
        }
        Commands::Show { state } => {
            show(&state)?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run(
    catalog: PathBuf,
    state: PathBuf,
    news_api_key: Option<String>,
    deepseek_key: Option<String>,
    gemini_key: Option<String>,
    use_gemini: bool,
    model: &str,
    decay_factor: f64,
    weight_floor: f64,
    timeout: u64,
    local_note: Option<String>,
) -> Result<()> {
    println!("🛰️  Straitwatch - daily risk scoring\n");

    // All credentials are checked before any state is touched
    let backend = if use_gemini {
        let key = gemini_key.ok_or_else(|| {
            anyhow::anyhow!("Gemini API key required. Set GEMINI_API_KEY or use --gemini-key")
        })?;
        create_gemini_backend(GeminiConfig::new(&key, model))?
    } else {
        let key = deepseek_key.ok_or_else(|| {
            anyhow::anyhow!("DeepSeek API key required. Set DEEPSEEK_API_KEY or use --deepseek-key")
        })?;
        create_backend(OpenAIBackendConfig::deepseek(&key))?
    };

    let news_key = news_api_key.ok_or_else(|| {
        anyhow::anyhow!("NewsAPI key required. Set NEWS_API_KEY or use --news-api-key")
    })?;

    let classifier = TriggerClassifier::new(backend);
    println!("📡 Model: {}", classifier.model_name());
    println!("📋 Catalog: {}", catalog.display());
    println!("💾 State: {}\n", state.display());

    let decay = DecayConfig::new(decay_factor, weight_floor)?;
    let http = HttpConfig {
        timeout_secs: timeout,
        ..HttpConfig::default()
    };

    let local = match local_note {
        Some(note) => LocalPulseSource::new(&note),
        None => LocalPulseSource::default(),
    };

    let config = PipelineConfig {
        catalog_path: catalog,
        artifact_path: state,
        decay,
    };

    let pipeline = Pipeline::new(config, classifier)
        .with_source(Box::new(NewsApiSource::new(&news_key, http.clone())?))
        .with_source(Box::new(OfficialFeedSource::new(http)?))
        .with_source(Box::new(local));

    let artifact = pipeline.run().await?;

    println!("\n✅ Run complete. Score: {}/100", artifact.score);
    println!(
        "   {} of {} indicators active",
        artifact.active_indicators_count, artifact.total_indicators_possible
    );

    Ok(())
}

fn show(state: &PathBuf) -> Result<()> {
    let artifact = RunArtifact::load(state)
        .map_err(|e| anyhow::anyhow!("cannot read score file {}: {}", state.display(), e))?;

    println!("Score: {}/100 (updated {})", artifact.score, artifact.last_updated);
    println!(
        "Active indicators: {}/{}\n",
        artifact.active_indicators_count, artifact.total_indicators_possible
    );

    for (id, entry) in &artifact.active_indicators {
        println!(
            "  {:<10} {:>6.2} / {:<6.2} (triggered {})",
            id, entry.current_weight, entry.base_weight, entry.triggered_on
        );
    }

    if !artifact.category_reasoning.is_empty() {
        println!("\nReasoning:");
        for (key, reasoning) in &artifact.category_reasoning {
            println!("  [{key}] {reasoning}");
        }
    }

    Ok(())
}
