//! Seeded procedural layouts, used when no bitmap input is supplied.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::raster::Raster;
use super::SwarmConfig;
use crate::core::error::{Result, SwarmError};

/// Parameters for [`generate_layout`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Probability that a logical cell is an obstacle
    pub obstacle_density: f64,
    /// Drones placed on distinct free cells (capped by the free area)
    pub drone_count: usize,
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.obstacle_density) {
            return Err(SwarmError::Config(format!(
                "obstacle_density must be within 0..=1, got {}",
                self.obstacle_density
            )));
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            obstacle_density: 0.15,
            drone_count: 64,
        }
    }
}

/// Obstacle and drone rasters sized to the logical grid.
pub fn generate_layout(config: &SwarmConfig, layout: &LayoutConfig, seed: u64) -> (Raster, Raster) {
    let (w, h) = (config.grid_width, config.grid_height);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut obstacles = Raster::empty(w, h);
    let mut free = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            if rng.gen_bool(layout.obstacle_density.clamp(0.0, 1.0)) {
                obstacles.set(x, y, true);
            } else {
                free.push((x, y));
            }
        }
    }

    let count = layout.drone_count.min(free.len());
    let spots: Vec<(usize, usize)> = free.choose_multiple(&mut rng, count).copied().collect();
    let drones = Raster::from_points(w, h, &spots);
    (obstacles, drones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drones_never_land_on_obstacles() {
        let cfg = SwarmConfig::new(20, 15);
        let layout = LayoutConfig {
            obstacle_density: 0.4,
            drone_count: 50,
        };
        let (obstacles, drones) = generate_layout(&cfg, &layout, 3);
        assert_eq!(drones.count_set(), 50);
        for x in 0..20 {
            for y in 0..15 {
                assert!(!(obstacles.get(x, y) && drones.get(x, y)));
            }
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let cfg = SwarmConfig::new(16, 16);
        let layout = LayoutConfig::default();
        assert_eq!(generate_layout(&cfg, &layout, 9), generate_layout(&cfg, &layout, 9));
    }

    #[test]
    fn drone_count_capped_by_free_area() {
        let cfg = SwarmConfig::new(4, 4);
        let layout = LayoutConfig {
            obstacle_density: 1.0,
            drone_count: 10,
        };
        let (obstacles, drones) = generate_layout(&cfg, &layout, 0);
        assert_eq!(obstacles.count_set(), 16);
        assert_eq!(drones.count_set(), 0);
    }

    #[test]
    fn density_out_of_range_rejected() {
        let layout = LayoutConfig {
            obstacle_density: 1.5,
            drone_count: 1,
        };
        assert!(layout.validate().is_err());
    }
}
