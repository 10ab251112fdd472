use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use droneswarm_core::{
    run_batch, run_batch_on_layout, run_on_layout, run_simulation, setup_logging, BatchStats,
    DroneSwarmConfig, Grid, Raster, SwarmError,
};

#[derive(Parser)]
#[command(author, version, about = "Cellular-automaton drone swarm coverage simulator")]
struct Cli {
    /// JSON configuration file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of independent simulations
    #[arg(short = 'n', long)]
    simulations: Option<usize>,

    /// Coverage percentage each simulation must reach
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Base seed; simulation i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Drones placed on each generated layout
    #[arg(long)]
    drones: Option<usize>,

    /// Probability that a cell of a generated layout is an obstacle
    #[arg(long)]
    obstacle_density: Option<f64>,

    /// Run the decision phase on a single thread
    #[arg(long)]
    sequential: bool,

    /// Grayscale obstacle map; dark pixels are obstacles. Every simulation
    /// runs on this layout instead of a generated one.
    #[arg(long, requires = "drone_map")]
    obstacle_map: Option<PathBuf>,

    /// Grayscale drone map; dark pixels are drones
    #[arg(long, requires = "obstacle_map")]
    drone_map: Option<PathBuf>,

    /// Write the final grid of the first simulation as JSON
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print batch statistics as JSON
    #[arg(long)]
    json: bool,

    /// Tracing filter directive, e.g. "info" or "droneswarm_core=debug"
    #[arg(long)]
    log_level: Option<String>,
}

struct Run {
    config: DroneSwarmConfig,
    layout: Option<(Raster, Raster)>,
    snapshot: Option<PathBuf>,
    json: bool,
}

impl Cli {
    fn into_run(self) -> Result<Run> {
        let mut config = match &self.config {
            Some(path) => DroneSwarmConfig::from_json_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => DroneSwarmConfig::new(),
        };

        if let Some(n) = self.simulations {
            config.driver.simulations = n;
        }
        if let Some(t) = self.threshold {
            config.driver.threshold = t;
        }
        if let Some(seed) = self.seed {
            config.swarm.seed = seed;
        }
        if let Some(w) = self.width {
            config.swarm.grid_width = w;
        }
        if let Some(h) = self.height {
            config.swarm.grid_height = h;
        }
        if let Some(d) = self.drones {
            config.layout.drone_count = d;
        }
        if let Some(density) = self.obstacle_density {
            config.layout.obstacle_density = density;
        }
        if self.sequential {
            config.swarm.parallel = false;
        }
        config.validate().context("invalid configuration")?;

        let layout = match (&self.obstacle_map, &self.drone_map) {
            (Some(obstacles), Some(drones)) => Some((load_map(obstacles)?, load_map(drones)?)),
            _ => None,
        };

        Ok(Run {
            config,
            layout,
            snapshot: self.snapshot,
            json: self.json,
        })
    }
}

fn load_map(path: &Path) -> Result<Raster> {
    let raster =
        Raster::load(path).with_context(|| format!("loading layout map {}", path.display()))?;
    info!(
        "Loaded {} ({}x{}, {} set pixels)",
        path.display(),
        raster.width(),
        raster.height(),
        raster.count_set()
    );
    Ok(raster)
}

/// Invariant violations are logged as a simulation abort before propagating.
fn report(err: SwarmError) -> anyhow::Error {
    if err.is_invariant_violation() {
        error!("Simulation aborted on an engine invariant violation: {}", err);
    }
    anyhow::Error::new(err)
}

impl Run {
    fn first_grid(&self) -> droneswarm_core::Result<Grid> {
        let (_, grid) = match &self.layout {
            Some((obstacles, drones)) => run_on_layout(&self.config, 0, obstacles, drones)?,
            None => run_simulation(&self.config, 0)?,
        };
        Ok(grid)
    }

    fn batch(&self) -> droneswarm_core::Result<BatchStats> {
        match &self.layout {
            Some((obstacles, drones)) => run_batch_on_layout(&self.config, obstacles, drones),
            None => run_batch(&self.config),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.clone());

    let run = cli.into_run()?;
    let config = &run.config;
    info!(
        "Starting {} simulations on a {}x{} grid ({}, threshold {:.1}%)",
        config.driver.simulations,
        config.swarm.grid_width,
        config.swarm.grid_height,
        if run.layout.is_some() {
            "fixed layout".to_string()
        } else {
            format!("{} drones per generated layout", config.layout.drone_count)
        },
        config.driver.threshold
    );

    if let Some(path) = &run.snapshot {
        let grid = run
            .first_grid()
            .map_err(report)
            .context("snapshot simulation failed")?;
        let json = serde_json::to_string(&grid.snapshot())?;
        std::fs::write(path, json)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        info!("Wrote final grid of simulation 0 to {}", path.display());
    }

    let stats = run.batch().map_err(report).context("batch failed")?;
    if run.json {
        println!("{}", stats.to_json()?);
    } else {
        println!("Minimum Number of Iterations: {}", stats.min);
        println!("Maximum Number of Iterations: {}", stats.max);
        println!("Average Number of Iterations: {:.2}", stats.mean);
    }

    Ok(())
}
