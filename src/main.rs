//! @ai:module:intent CLI for the inference endpoint benchmark
//! @ai:module:layer presentation

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use inference_bench::{
    config::BenchmarkConfig,
    console::Console,
    corpus::{CorpusLoader, CorpusLoaderTrait, Prompt},
    endpoint::{EndpointFamily, EndpointPlan},
    metrics::{EndpointSummary, MetricsAggregator, MetricsAggregatorTrait, SummaryReport},
    report::{find_latest_results, ReportGenerator},
    runner::{
        DocumentSource, EndpointInvoker, ExtensionSource, InferenceTransport, KeypressExtension,
        MockTransport, NoExtension, RunController, RuntimeClient,
    },
    sink::{read_records, ResultSink, RESULT_COLUMNS},
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Parser)]
#[command(name = "inference-bench")]
#[command(about = "Latency and throughput benchmark for hosted model inference endpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark and write a results dataset
    Run(RunArgs),

    /// Summarise a results dataset into tables and charts
    Report {
        /// Results CSV (defaults to the newest benchmark_*.csv)
        #[arg(short, long)]
        results: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "benchmark.toml")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-call timeout ceiling in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Iteration override as MODEL_ID=N (repeatable)
    #[arg(long = "iterations", value_name = "MODEL_ID=N")]
    iterations: Vec<String>,

    /// Offer to add iterations after each call when the extension key is pressed
    #[arg(long)]
    extend: bool,

    /// Pause between calls in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Skip the interactive configuration prompts
    #[arg(long)]
    no_prompt: bool,

    /// Use canned responses instead of calling the endpoints
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let mut dataset = None;
            let result = run_benchmark(args, &mut dataset).await;

            if let Err(e) = &result {
                println!("\nBenchmark interrupted: {:#}", e);
                match &dataset {
                    Some(path) => println!(
                        "Partial results may have been saved to {}. Run `inference-bench report` to summarise them.",
                        path.display()
                    ),
                    None => println!("No results were written."),
                }
            }

            result
        }
        Commands::Report { results, config } => {
            init_tracing(None)?;
            generate_reports(results, config)
        }
        Commands::Init { output } => {
            init_tracing(None)?;
            init_config(output)
        }
    }
}

/// @ai:intent Install stderr logging plus an optional non-ANSI file layer
/// @ai:effects fs:write, global:subscriber
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("inference_bench=info".parse()?);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

/// @ai:intent Run the benchmark end to end
/// @ai:post `dataset` is set once the results file exists
/// @ai:effects network, fs:read, fs:write, io
async fn run_benchmark(args: RunArgs, dataset: &mut Option<PathBuf>) -> Result<()> {
    let mut config = load_or_default_config(args.config.as_deref())?;
    apply_run_overrides(&mut config, &args)?;

    init_tracing(Some(&config.paths.log_file))?;

    let corpus = CorpusLoader::new().load(&config.paths.questions_file, &config.paths.reference_file)?;
    if corpus.prompts.is_empty() {
        tracing::warn!(
            "No questions found in {}",
            config.paths.questions_file.display()
        );
    }

    if !args.no_prompt && std::io::stdin().is_terminal() {
        Console::stdio().configure(&mut config)?;
    }

    let plans = config.endpoint_plans()?;
    if !plans.iter().any(EndpointPlan::is_enabled) {
        println!("No models selected. Nothing to run.");
        return Ok(());
    }

    tracing::info!(
        "Starting benchmark with timeout of {} seconds",
        config.api.timeout().as_secs()
    );

    let documents =
        DocumentSource::from_config(&config.run.rerank_documents, Arc::new(corpus.reference));
    let reranks = plans
        .iter()
        .any(|p| p.is_enabled() && p.endpoint.kind.family() == EndpointFamily::Rerank);
    if reranks {
        documents.validate()?;
    }

    let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let results_dir = &config.paths.results_dir;

    if args.dry_run {
        tracing::info!("Running in dry-run mode");
        let (transport, sink) = open_dataset(Ok(MockTransport::new()), results_dir, &stamp)?;
        *dataset = Some(sink.path().to_path_buf());
        drive(transport, &config, plans, documents, sink, &corpus.prompts).await
    } else {
        let (transport, sink) = open_dataset(RuntimeClient::new(&config.api), results_dir, &stamp)?;
        *dataset = Some(sink.path().to_path_buf());
        drive(transport, &config, plans, documents, sink, &corpus.prompts).await
    }
}

/// @ai:intent Create `benchmark_{stamp}.csv` only once the transport is usable
/// @ai:post on error no file has been created
/// @ai:effects fs:write
fn open_dataset<T: InferenceTransport>(
    transport: Result<T>,
    results_dir: &Path,
    stamp: &str,
) -> Result<(Arc<T>, ResultSink)> {
    let transport = Arc::new(transport?);

    let results_path = results_dir.join(format!("benchmark_{}.csv", stamp));
    let mut sink = ResultSink::open(&results_path)?;
    sink.write_header(&RESULT_COLUMNS)?;
    tracing::info!("Writing results to {}", results_path.display());

    Ok((transport, sink))
}

/// @ai:intent Pick the extension source and hand off to the controller
/// @ai:effects network, fs:write, io
async fn drive<T: InferenceTransport>(
    transport: Arc<T>,
    config: &BenchmarkConfig,
    plans: Vec<EndpointPlan>,
    documents: DocumentSource,
    sink: ResultSink,
    prompts: &[Prompt],
) -> Result<()> {
    let invoker = EndpointInvoker::new(transport, config.api.timeout(), documents);
    let cooldown = config.run.cooldown();

    if config.run.interactive_extension {
        let extension = KeypressExtension::new(config.run.extension_key);
        if extension.is_active() {
            println!(
                "Press '{}' during a run to add iterations for the current question.",
                config.run.extension_key
            );
        }
        execute_run(
            RunController::new(invoker, plans, cooldown, extension, sink),
            prompts,
        )
        .await
    } else {
        execute_run(
            RunController::new(invoker, plans, cooldown, NoExtension, sink),
            prompts,
        )
        .await
    }
}

/// @ai:intent Run the controller until completion or Ctrl-C
/// @ai:effects network, fs:write, io
async fn execute_run<T: InferenceTransport, X: ExtensionSource>(
    mut controller: RunController<T, X>,
    prompts: &[Prompt],
) -> Result<()> {
    tracing::info!(
        "{} questions, {} planned calls",
        prompts.len(),
        controller.planned_calls(prompts.len())
    );

    let outcome = tokio::select! {
        result = controller.run(prompts) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let results_path = controller.sink().path().display().to_string();

    match outcome {
        Some(Ok(count)) => {
            tracing::info!("Benchmark complete: {} calls recorded", count);

            let summary = MetricsAggregator::new().aggregate(controller.records(), &results_path);
            print_summary(&summary);

            println!("\nResults saved to {}", results_path);
            println!("Run `inference-bench report` to generate the summary files and charts.");
            Ok(())
        }
        Some(Err(e)) => Err(e),
        None => {
            tracing::warn!(
                "Run stopped after {} records",
                controller.sink().appended()
            );
            bail!("received Ctrl-C, {} records kept in {}", controller.sink().appended(), results_path)
        }
    }
}

/// @ai:intent Apply command-line overrides on top of file configuration
/// @ai:effects pure
fn apply_run_overrides(config: &mut BenchmarkConfig, args: &RunArgs) -> Result<()> {
    if let Some(timeout) = args.timeout {
        config.api.timeout_secs = timeout.max(1);
    }
    for spec in &args.iterations {
        config.apply_iteration_override(spec)?;
    }
    if args.extend {
        config.run.interactive_extension = true;
    }
    if let Some(cooldown_ms) = args.cooldown_ms {
        config.run.cooldown_ms = cooldown_ms;
    }
    Ok(())
}

/// @ai:intent Summarise a results dataset and write every artifact
/// @ai:effects fs:read, fs:write
fn generate_reports(results: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_or_default_config(config_path.as_deref())?;

    let results_path = match results {
        Some(path) => path,
        None => match find_latest_results(&config.paths.results_dir)? {
            Some(path) => path,
            None => {
                println!(
                    "No benchmark results found in {}",
                    config.paths.results_dir.display()
                );
                return Ok(());
            }
        },
    };

    tracing::info!("Summarising {}", results_path.display());
    let records = read_records(&results_path)?;
    if records.is_empty() {
        println!("{} contains no records", results_path.display());
        return Ok(());
    }

    let summary =
        MetricsAggregator::new().aggregate(&records, &results_path.display().to_string());
    let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();

    let generated = ReportGenerator::new().generate_all(
        &summary,
        &config.paths.results_dir,
        &config.paths.graphs_dir,
        &stamp,
    )?;

    print_summary(&summary);

    println!();
    println!("Summary saved to {}", generated.summary_csv.display());
    println!("Reports saved to {} and {}", generated.json.display(), generated.markdown.display());
    for chart in &generated.charts {
        println!("Chart saved to {}", chart.display());
    }

    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BenchmarkConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<&Path>) -> Result<BenchmarkConfig> {
    match path {
        Some(p) => BenchmarkConfig::load(p),
        None => {
            let default_path = Path::new("benchmark.toml");
            if default_path.exists() {
                BenchmarkConfig::load(default_path)
            } else {
                Ok(BenchmarkConfig::default())
            }
        }
    }
}

/// @ai:intent Print the per-endpoint table to the console
/// @ai:effects io
fn print_summary(summary: &SummaryReport) {
    println!();
    println!("Benchmark Summary");
    println!("=================");
    println!();

    if summary.endpoints.is_empty() {
        println!("No records.");
        return;
    }

    for endpoint in &summary.endpoints {
        println!("{} ({} calls)", endpoint.model_id, endpoint.calls);
        for (heading, value) in EndpointSummary::HEADINGS[1..].iter().zip(endpoint.values()) {
            println!("  {:<26} {:>12.2}", format!("{}:", heading), value);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_bench::config::ApiConfig;
    use tempfile::TempDir;

    #[test]
    fn test_missing_api_key_writes_no_dataset() {
        let temp = TempDir::new().unwrap();
        let api = ApiConfig {
            api_key_env: "INFERENCE_BENCH_TEST_UNSET_KEY".to_string(),
            ..ApiConfig::default()
        };

        let result = open_dataset(RuntimeClient::new(&api), temp.path(), "20260119_000000");

        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("INFERENCE_BENCH_TEST_UNSET_KEY not set"));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
        assert!(find_latest_results(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_usable_transport_opens_header_only_dataset() {
        let temp = TempDir::new().unwrap();

        let (_, sink) =
            open_dataset(Ok(MockTransport::new()), temp.path(), "20260119_000000").unwrap();

        let expected = temp.path().join("benchmark_20260119_000000.csv");
        assert_eq!(sink.path(), expected.as_path());
        assert!(read_records(&expected).unwrap().is_empty());
        assert_eq!(find_latest_results(temp.path()).unwrap(), Some(expected));
    }
}
