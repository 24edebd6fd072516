mod app;
mod cohort;
mod explorer;
mod scale;
mod sim;
mod util;
mod view;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::egui::{Vec2, vec2};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{CohortOrbitApp, LoadSettings};
use crate::cohort::{CohortInput, collect_cohort, default_workers};
use crate::explorer::{Explorer, ExplorerConfig};
use crate::sim::SimulationConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding roster.json and one <id>.json record file per subject
    #[arg(long, conflicts_with = "demo")]
    data_dir: Option<PathBuf>,
    /// Use a generated cohort (the default when no data directory is given)
    #[arg(long)]
    demo: bool,
    #[arg(long, default_value_t = 60)]
    demo_size: u32,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Aggregation worker threads, defaults to the available parallelism
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long, default_value_t = 600)]
    fade_ms: u64,
    /// Settle the layout without a window and print it as JSON
    #[arg(long)]
    headless: bool,
    #[arg(long, requires = "headless")]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 760.0)]
    height: f32,
}

impl Args {
    fn input(&self) -> CohortInput {
        match &self.data_dir {
            Some(dir) if !self.demo => CohortInput::Directory(dir.clone()),
            _ => CohortInput::Demo {
                seed: self.seed,
                size: self.demo_size,
            },
        }
    }

    fn explorer_config(&self) -> ExplorerConfig {
        ExplorerConfig {
            seed: self.seed,
            fade_secs: self.fade_ms as f64 / 1000.0,
            simulation: SimulationConfig::default(),
        }
    }

    fn viewport(&self) -> Vec2 {
        vec2(self.width.max(1.0), self.height.max(1.0))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let workers = args.workers.unwrap_or_else(default_workers).max(1);

    if args.headless {
        return run_headless(&args, workers);
    }

    let settings = LoadSettings {
        input: args.input(),
        workers,
        explorer: args.explorer_config(),
        viewport: args.viewport(),
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([args.width + 300.0, args.height + 40.0]),
        ..Default::default()
    };

    eframe::run_native(
        "cohort-orbit",
        options,
        Box::new(move |cc| Ok(Box::new(CohortOrbitApp::new(cc, settings)))),
    )
    .map_err(|error| anyhow!("failed to run window: {error}"))
}

fn run_headless(args: &Args, workers: usize) -> Result<()> {
    let cohort = collect_cohort(&args.input(), workers)?;
    let mut explorer = Explorer::new(cohort, args.viewport(), args.explorer_config());
    let settled = explorer.settle_all();
    info!(settled, ticks = explorer.total_ticks(), "layout settled");

    let json = serde_json::to_string_pretty(&explorer.export())
        .context("failed to serialize layout")?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write layout to {}", path.display()))?;
            info!(path = %path.display(), "layout written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write layout to stdout")?;
        }
    }

    Ok(())
}
