use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use vibration_monitor::config::{load_config, MonitorConfig, DEFAULT_CONFIG_PATH};
use vibration_monitor::evaluator::batch::write_csv;
use vibration_monitor::evaluator::{BatchEvaluator, BatchSummary, StreamEvaluator};
use vibration_monitor::ipc::{MonitorChannels, MonitorEvent};
use vibration_monitor::metrics::TimingMetrics;
use vibration_monitor::sensor::anomaly::Scorer;
use vibration_monitor::sensor::generator::VibrationSimulator;
use vibration_monitor::sensor::LabeledSample;
use vibration_monitor::threaded_impl::{spawn_monitor_thread, MonitorOptions};

#[derive(Parser)]
#[command(name = "vibration-monitor", about = "Spindle vibration anomaly monitor")]
struct Cli {
    #[arg(long, env = "VIBRATION_MONITOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score the simulated live signal at the configured cadence
    Monitor {
        /// Number of ticks to run before stopping
        #[arg(long, default_value_t = 120)]
        ticks: u64,
    },
    /// Label every row of a CSV with timestamp,X,Y,Z columns
    Batch {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibration_monitor=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    // Model artifacts load once; nothing is served if they are unusable
    let scorer =
        Arc::new(Scorer::from_artifacts(&cfg.scoring.model_dir, cfg.scoring.threshold)?);
    let metrics = TimingMetrics::new().map_err(|e| anyhow!("metrics setup failed: {:?}", e))?;

    match cli.command {
        Command::Monitor { ticks } => run_monitor(&cfg, scorer, metrics, ticks),
        Command::Batch { input, output } => run_batch(scorer, metrics, input, output),
    }
}

fn run_monitor(
    cfg: &MonitorConfig,
    scorer: Arc<Scorer>,
    metrics: TimingMetrics,
    ticks: u64,
) -> Result<()> {
    let seed = cfg.simulator.seed;
    let mode = cfg.simulator.timestamps;
    let mut session = 0u64;
    let evaluator =
        StreamEvaluator::open(scorer, &cfg.stream.log_path, cfg.evaluator_config(), move || {
            // each reset gets a new stream, reproducible from the seed
            session += 1;
            VibrationSimulator::new(seed.wrapping_add(session)).with_timestamps(mode)
        })?;
    let log = evaluator.log().clone();

    println!("===========================================");
    println!("Starting vibration monitoring ({} ticks every {:?})", ticks, cfg.tick_interval());
    println!("===========================================\n");

    let MonitorChannels { event_tx, event_rx } = MonitorChannels::new(cfg.stream.event_buffer);
    let (handle, _shutdown) = spawn_monitor_thread(
        evaluator,
        MonitorOptions { interval: cfg.tick_interval(), max_ticks: Some(ticks) },
        event_tx,
        metrics.clone(),
    );

    // ends when the monitor thread drops its sender
    for event in event_rx.iter() {
        match event {
            MonitorEvent::Tick { labeled, anomaly_count } if labeled.is_anomaly => {
                println!(
                    "Anomaly #{} at {} (error {:.4})",
                    anomaly_count, labeled.sample.timestamp, labeled.error
                );
            }
            MonitorEvent::Tick { .. } => {}
            MonitorEvent::LogFailure { labeled, reason, .. } => {
                println!("Anomaly at {} NOT persisted: {}", labeled.sample.timestamp, reason);
            }
            MonitorEvent::Rejected { reason } => {
                println!("Sample rejected: {}", reason);
            }
        }
    }

    let snapshot = handle.join().map_err(|_| anyhow!("monitor thread panicked"))?;
    let report = metrics.report();

    println!("\n===========================================");
    println!("FINAL MONITORING SUMMARY");
    println!("===========================================");
    println!("Total Anomalies Detected: {}", snapshot.anomaly_count);
    println!("Window: {}/{} samples", snapshot.window.len(), snapshot.capacity);
    for labeled in snapshot.anomalies() {
        print_sample(labeled);
    }
    println!("Anomaly log: {} ({} records)", log.path().display(), log.record_count()?);
    println!(
        "Tick latency P50: {:?}, P99: {:?}, max: {:?}",
        report.tick_p50, report.tick_p99, report.tick_max
    );
    println!("Rejected: {}, log failures: {}", report.rejected, report.log_failures);
    Ok(())
}

fn run_batch(
    scorer: Arc<Scorer>,
    metrics: TimingMetrics,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
    let started = Instant::now();
    let rows = BatchEvaluator::new(scorer).evaluate_csv(file)?;
    metrics.record_batch(started.elapsed(), rows.len());

    let summary = BatchSummary::from_rows(&rows);
    println!(
        "Total Anomalies Detected: {} of {} rows",
        summary.anomaly_count, summary.total
    );
    for labeled in &summary.anomalies {
        print_sample(labeled);
    }
    println!("Per-row scoring P50: {:?}", metrics.report().batch_row_p50);

    if let Some(path) = output {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_csv(BufWriter::new(file), &rows)?;
        println!("Labeled table written to {}", path.display());
    }
    Ok(())
}

fn print_sample(labeled: &LabeledSample) {
    let s = &labeled.sample;
    println!("  {} X={:.3} Y={:.3} Z={:.3}", s.timestamp, s.x, s.y, s.z);
}
