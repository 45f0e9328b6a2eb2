use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use presence_client::{ReqwestFetcher, WebAggregator, web_aggregator};
use presence_core::models::{AggregatedRecord, Locator};
use presence_core::traits::{Fetcher, MemorySink};
use presence_core::{BatchScheduler, PipelineConfig, TracingReporter, validate_locators};
use presence_sink::{CsvSink, DEFAULT_CSV_PATH, MultiSink};

#[derive(Parser)]
#[command(name = "presence", version, about = "Company web-presence aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one or more company sites and print the records as JSON
    Resolve {
        /// Company site URLs (bare domains are accepted)
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Prompt for URLs one at a time
    Interactive {
        #[command(flatten)]
        run: RunArgs,
    },
}

/// Pipeline flags; unset values fall back to `PRESENCE_*` variables, then defaults.
#[derive(Args)]
struct RunArgs {
    /// Items processed concurrently per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Pause between batches, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// CSV file that receives every batch
    #[arg(short, long, env = "PRESENCE_OUTPUT", default_value = DEFAULT_CSV_PATH)]
    output: PathBuf,

    /// Skip CSV output entirely
    #[arg(long, default_value_t = false)]
    no_csv: bool,

    /// Render pages in headless Chromium instead of plain HTTP
    #[cfg(feature = "browser")]
    #[arg(long, default_value_t = false)]
    browser: bool,
}

impl RunArgs {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env().context("Invalid PRESENCE_* configuration")?;
        if let Some(size) = self.batch_size {
            config = config.with_batch_size(size);
        }
        if let Some(ms) = self.delay_ms {
            config = config.with_inter_batch_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_fetch_timeout(Duration::from_millis(ms));
        }
        config.validate()?;
        Ok(config)
    }

    fn csv_path(&self) -> Option<PathBuf> {
        (!self.no_csv).then(|| self.output.clone())
    }
}

enum Mode {
    Resolve(Vec<String>),
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("presence=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (run, mode) = match cli.command {
        Commands::Resolve { urls, run } => (run, Mode::Resolve(urls)),
        Commands::Interactive { run } => (run, Mode::Interactive),
    };

    let config = run.pipeline_config()?;
    let csv_path = run.csv_path();

    #[cfg(feature = "browser")]
    if run.browser {
        let fetcher = presence_client::BrowserFetcher::new(config.fetch_timeout);
        return execute(Pipeline::new(fetcher, config, csv_path)?, mode).await;
    }

    // The CLI user controls the machine, so local targets are fine.
    let fetcher = ReqwestFetcher::new(config.fetch_timeout)
        .context("Failed to create HTTP client")?
        .allow_private_urls();
    execute(Pipeline::new(fetcher, config, csv_path)?, mode).await
}

async fn execute<F: Fetcher>(pipeline: Pipeline<F>, mode: Mode) -> Result<()> {
    match mode {
        Mode::Resolve(urls) => cmd_resolve(&pipeline, &urls).await,
        Mode::Interactive => cmd_interactive(&pipeline).await,
    }
}

/// Scheduler plus the sinks every run writes to.
struct Pipeline<F: Fetcher> {
    scheduler: BatchScheduler<WebAggregator<F>>,
    csv_path: Option<PathBuf>,
}

impl<F: Fetcher> Pipeline<F> {
    fn new(fetcher: F, config: PipelineConfig, csv_path: Option<PathBuf>) -> Result<Self> {
        let scheduler = BatchScheduler::new(web_aggregator(fetcher), config)?;
        Ok(Self {
            scheduler,
            csv_path,
        })
    }

    async fn resolve(&self, locators: &[Locator]) -> Result<Vec<AggregatedRecord>> {
        let mut memory = MemorySink::new();

        let summary = match &self.csv_path {
            Some(path) => {
                let mut sink = MultiSink::new()
                    .with(&mut memory)
                    .with(CsvSink::new(path));
                self.scheduler.run(locators, &mut sink, &TracingReporter).await?
            }
            None => {
                self.scheduler
                    .run(locators, &mut memory, &TracingReporter)
                    .await?
            }
        };

        if summary.sink_failures > 0 {
            tracing::warn!(
                failures = summary.sink_failures,
                "Some batches were not written to CSV"
            );
        }

        Ok(memory.into_records())
    }
}

async fn cmd_resolve<F: Fetcher>(pipeline: &Pipeline<F>, urls: &[String]) -> Result<()> {
    let locators = validate_locators(urls)?;
    tracing::info!(count = locators.len(), "Resolving");

    let records = pipeline.resolve(&locators).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn cmd_interactive<F: Fetcher>(pipeline: &Pipeline<F>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("Enter a website URL (or \"exit\" to quit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        let locators = match validate_locators(&[input]) {
            Ok(locators) => locators,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        println!("\nProcessing {input}...\n");
        match pipeline.resolve(&locators).await {
            Ok(records) => println!("{}", serde_json::to_string_pretty(&records)?),
            Err(e) => println!("Error: {e:#}"),
        }
        println!("\n-------------------\n");
    }

    Ok(())
}
