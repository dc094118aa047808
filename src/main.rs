//! Memory Optimiser CLI
//!
//! Continuous mode ticks until Ctrl-C or SIGTERM. `--test` runs one
//! simulated pass and exits.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use memory_optimiser::core::config::{OptimizationConfig, Settings};
use memory_optimiser::logging;
use memory_optimiser::monitor::render_status;
use memory_optimiser::platform::{
    self, ConsoleNotifier, MemorySampler, SimulatedReclaimer, SystemSampler,
};
use memory_optimiser::{install_signal_handlers, OptimizationLoop, ShutdownSignal, TickOutcome};

#[derive(Parser)]
#[command(name = "memory-optimiser")]
#[command(about = "Monitors memory usage and frees inactive memory", long_about = None)]
struct Cli {
    /// Check interval in seconds (default: 300)
    #[arg(long)]
    interval: Option<u64>,

    /// Memory usage threshold percentage (default: 75.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Automatically optimise memory when the threshold is exceeded
    #[arg(long)]
    auto: bool,

    /// Run one simulated pass and exit
    #[arg(long)]
    test: bool,

    /// Config file (default: <config dir>/memory-optimiser/config.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for memory_optimiser.log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,
}

impl Cli {
    /// Defaults < config file < flags
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => match Settings::default_path().filter(|p| p.exists()) {
                Some(path) => Settings::load(&path)?,
                None => Settings::default(),
            },
        };

        if let Some(interval) = self.interval {
            settings.monitor.interval_secs = interval;
        }
        if let Some(threshold) = self.threshold {
            settings.monitor.threshold_percent = threshold;
        }
        if self.auto {
            settings.monitor.auto_optimise = true;
        }
        if let Some(dir) = &self.log_dir {
            settings.logging.log_dir = dir.clone();
        }
        if self.no_log_file || self.test {
            settings.logging.file = false;
        }

        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (settings, config) = match startup(&cli) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("memory-optimiser: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.test {
        run_test_mode(&settings, config).await;
        return ExitCode::SUCCESS;
    }

    match run_continuous(&settings, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Everything that can fail before the first tick
fn startup(cli: &Cli) -> anyhow::Result<(Settings, OptimizationConfig)> {
    let settings = cli.settings()?;
    let config = settings.optimization_config()?;
    logging::init(&settings.logging)?;
    Ok((settings, config))
}

async fn run_continuous(settings: &Settings, config: OptimizationConfig) -> anyhow::Result<()> {
    info!("Memory Optimiser started");
    info!("System: {}", platform::host_description());
    info!("Monitoring interval: {} seconds", config.interval_secs);
    info!("Memory threshold: {:.1}%", config.threshold_percent);
    info!(
        "Auto-optimisation: {}",
        if config.auto_optimise { "Enabled" } else { "Disabled" }
    );
    if settings.logging.file {
        info!(
            "Logging to {}",
            logging::log_file_path(&settings.logging.log_dir).display()
        );
    }
    if config.auto_optimise && !platform::is_reclaim_supported() && settings.reclaim.command.is_none() {
        warn!("Memory optimisation is not supported on this platform; reclaim attempts will fail");
    }
    info!("{}", "-".repeat(80));

    let shutdown = ShutdownSignal::new();
    install_signal_handlers(shutdown.clone())?;

    let optimizer = OptimizationLoop::new(config, platform::create_collaborators(settings));
    optimizer.run(&shutdown).await;

    info!("Memory Optimiser ended");
    Ok(())
}

async fn run_test_mode(settings: &Settings, config: OptimizationConfig) {
    println!("\n=== Memory Optimiser Test Mode ===");

    match SystemSampler::new().sample() {
        Ok(snapshot) => print!("{}", render_status(&snapshot, &config, chrono::Local::now())),
        Err(e) => println!("\nCould not read memory status: {}", e),
    }

    println!("\nRunning one pass (reclaim is simulated)...");
    let collaborators = platform::create_collaborators(settings)
        .with_reclaimer(SimulatedReclaimer)
        .with_notifier(ConsoleNotifier);
    let optimizer = OptimizationLoop::new(config, collaborators);

    match optimizer.tick().await {
        TickOutcome::SampleFailed { error } => println!("\nSampling failed: {}", error),
        TickOutcome::Normal { percent_used } => println!(
            "\nMemory usage ({:.1}%) is below the threshold ({:.1}%); nothing to do",
            percent_used,
            optimizer.config().threshold_percent
        ),
        TickOutcome::Notified { .. } => {
            println!("\nRe-run with --auto to simulate the purge path")
        }
        TickOutcome::Reclaimed { .. } | TickOutcome::ReclaimFailed { .. } => {}
    }

    println!("\nTest completed. Exiting...");
}
