//! Simulation driver: run ticks until a coverage threshold, and batches of
//! independent runs.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::SwarmEngine;
use super::grid::Grid;
use super::layout::generate_layout;
use super::raster::Raster;
use crate::core::config::DroneSwarmConfig;
use crate::core::error::{Result, SwarmError};
use crate::utils::benchmark::BatchStats;

/// Result of a single run-until-threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Ticks needed to reach the threshold
    pub ticks: u64,
    /// Coverage percentage when the run stopped
    pub progress: f64,
    /// Drones still alive at the end
    pub drones_left: usize,
}

/// Step `engine` until its coverage reaches `threshold` percent.
///
/// Stops with [`SwarmError::Extinct`] when no drone is left to make progress
/// and with [`SwarmError::TickLimit`] after `max_ticks` ticks.
pub fn run_until_threshold(engine: &mut SwarmEngine, threshold: f64) -> Result<RunOutcome> {
    let max_ticks = engine.config().max_ticks;
    let mut drones = engine.grid().drone_count();

    loop {
        let progress = engine.progress();
        if progress >= threshold {
            return Ok(RunOutcome {
                ticks: engine.tick_count(),
                progress,
                drones_left: drones,
            });
        }
        if drones == 0 {
            return Err(SwarmError::Extinct {
                tick: engine.tick_count(),
                progress,
            });
        }
        if engine.tick_count() >= max_ticks {
            return Err(SwarmError::TickLimit {
                ticks: engine.tick_count(),
                progress,
            });
        }
        drones = engine.step()?.drones;
    }
}

/// Run simulation `index` of a batch on a freshly generated layout.
///
/// Each run derives its seed from the configured one, so a batch is
/// reproducible regardless of scheduling.
pub fn run_simulation(config: &DroneSwarmConfig, index: usize) -> Result<(RunOutcome, Grid)> {
    let seed = run_seed(config, index);
    let (obstacles, drones) = generate_layout(&config.swarm, &config.layout, seed);
    run_on_layout(config, index, &obstacles, &drones)
}

/// Run simulation `index` of a batch on caller-supplied rasters. Only the
/// tie-break seed differs between runs of the same layout.
pub fn run_on_layout(
    config: &DroneSwarmConfig,
    index: usize,
    obstacles: &Raster,
    drones: &Raster,
) -> Result<(RunOutcome, Grid)> {
    let swarm = config.swarm.clone().with_seed(run_seed(config, index));
    let mut engine = SwarmEngine::from_rasters(swarm, obstacles, drones)?;
    let outcome = run_until_threshold(&mut engine, config.driver.threshold)?;
    info!(
        "[Driver] Simulation {} reached {:.2}% in {} ticks ({} drones left)",
        index, outcome.progress, outcome.ticks, outcome.drones_left
    );
    Ok((outcome, engine.into_grid()))
}

/// Run `config.driver.simulations` independent simulations on the rayon pool,
/// each on its own generated layout.
pub fn run_batch(config: &DroneSwarmConfig) -> Result<BatchStats> {
    config.validate()?;
    let ticks = (0..config.driver.simulations)
        .into_par_iter()
        .map(|i| run_simulation(config, i).map(|(outcome, _)| outcome.ticks))
        .collect::<Result<Vec<u64>>>()?;
    summarize(&ticks)
}

/// Run `config.driver.simulations` simulations of one fixed layout.
pub fn run_batch_on_layout(
    config: &DroneSwarmConfig,
    obstacles: &Raster,
    drones: &Raster,
) -> Result<BatchStats> {
    config.validate()?;
    let ticks = (0..config.driver.simulations)
        .into_par_iter()
        .map(|i| run_on_layout(config, i, obstacles, drones).map(|(outcome, _)| outcome.ticks))
        .collect::<Result<Vec<u64>>>()?;
    summarize(&ticks)
}

fn run_seed(config: &DroneSwarmConfig, index: usize) -> u64 {
    config.swarm.seed.wrapping_add(index as u64)
}

fn summarize(ticks: &[u64]) -> Result<BatchStats> {
    let stats = BatchStats::from_ticks(ticks)
        .ok_or_else(|| SwarmError::Config("batch produced no runs".to_string()))?;
    stats.log();
    Ok(stats)
}
