// grid.rs: layered cell grid.
//
// Struct-of-arrays: one i8 column per layer, x-major over the padded area.
// The border is `padding` cells wide on every side, so a big-zone lookup from
// any logical cell never leaves the buffer.  Border cells are obstacles.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::raster::Raster;
use super::window::Window;
use super::SwarmConfig;
use crate::core::error::Result;

/// Grid layer selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Obstacle,
    Drone,
    Visit,
    Scratch,
    ParityA,
    ParityB,
}

/// Drone layer value.
///
/// `Unknown` carries any raw code outside the known set; the engine treats it
/// as an invariant violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DroneStatus {
    None,
    Here,
    Near,
    Vector,
    Unknown(i8),
}

impl DroneStatus {
    pub const fn code(self) -> i8 {
        match self {
            DroneStatus::None => 0,
            DroneStatus::Near => 5,
            DroneStatus::Here => 10,
            DroneStatus::Vector => 11,
            DroneStatus::Unknown(v) => v,
        }
    }

    pub const fn from_code(code: i8) -> Self {
        match code {
            0 => DroneStatus::None,
            5 => DroneStatus::Near,
            10 => DroneStatus::Here,
            11 => DroneStatus::Vector,
            v => DroneStatus::Unknown(v),
        }
    }

    /// Near or Vector: advisory annotations around a drone.
    pub const fn is_marker(self) -> bool {
        matches!(self, DroneStatus::Near | DroneStatus::Vector)
    }
}

/// Visitation layer value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visit {
    Visited,
    Unvisited,
    Unreachable,
}

impl Visit {
    pub const fn code(self) -> i8 {
        match self {
            Visit::Visited => 1,
            Visit::Unvisited => 0,
            Visit::Unreachable => -1,
        }
    }

    pub const fn from_code(code: i8) -> Self {
        match code {
            1 => Visit::Visited,
            0 => Visit::Unvisited,
            _ => Visit::Unreachable,
        }
    }
}

/// Layered grid with a fixed obstacle border.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    padding: usize,
    /// Padded extent along y; stride between consecutive x columns.
    stride: usize,
    obstacle: Vec<i8>,
    drone: Vec<i8>,
    visit: Vec<i8>,
    scratch: Vec<i8>,
    parity_a: Vec<i8>,
    parity_b: Vec<i8>,
}

impl Grid {
    /// Obstacle-free, drone-free grid; every logical cell Unvisited.
    pub fn new(config: &SwarmConfig) -> Result<Self> {
        config.validate()?;
        let (width, height, padding) = (config.grid_width, config.grid_height, config.padding);
        let padded_w = width + 2 * padding;
        let stride = height + 2 * padding;
        let cells = padded_w * stride;

        let mut grid = Grid {
            width,
            height,
            padding,
            stride,
            obstacle: vec![1; cells],
            drone: vec![DroneStatus::None.code(); cells],
            visit: vec![Visit::Unreachable.code(); cells],
            scratch: vec![0; cells],
            parity_a: vec![0; cells],
            parity_b: vec![0; cells],
        };

        for x in grid.padded_x_range() {
            for y in grid.padded_y_range() {
                let i = grid.index(x, y);
                grid.parity_a[i] = (x.rem_euclid(2) == y.rem_euclid(2)) as i8;
                grid.parity_b[i] = (x.rem_euclid(2) == 1) as i8;
                if grid.in_bounds(x, y) {
                    grid.obstacle[i] = 0;
                    grid.visit[i] = Visit::Unvisited.code();
                }
            }
        }
        Ok(grid)
    }

    /// Build the initial grid from obstacle and drone rasters.
    ///
    /// Both rasters must cover the logical area; pixels beyond it are ignored.
    /// Drone pixels that coincide with an obstacle are dropped.
    pub fn from_rasters(config: &SwarmConfig, obstacles: &Raster, drones: &Raster) -> Result<Self> {
        let mut grid = Grid::new(config)?;
        obstacles.ensure_covers("obstacle", grid.width, grid.height)?;
        drones.ensure_covers("drone", grid.width, grid.height)?;

        for x in 0..grid.width {
            for y in 0..grid.height {
                if obstacles.get(x, y) {
                    let i = grid.index(x as i32, y as i32);
                    grid.obstacle[i] = 1;
                    grid.visit[i] = Visit::Unreachable.code();
                }
            }
        }

        let mut placed = 0usize;
        for x in 0..grid.width {
            for y in 0..grid.height {
                let (cx, cy) = (x as i32, y as i32);
                if drones.get(x, y) && !grid.is_obstacle(cx, cy) {
                    grid.set_drone(cx, cy, DroneStatus::Here);
                    placed += 1;
                }
            }
        }

        info!(
            "[Grid] Initialized {}x{} (padding {}), {} drones",
            grid.width, grid.height, grid.padding, placed
        );
        Ok(grid)
    }

    // ── Geometry ────────────────────────────────────────────────────────────

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Inside the logical `width x height` area.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Inside the padded buffer.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let p = self.padding as i32;
        x >= -p && y >= -p && x < self.width as i32 + p && y < self.height as i32 + p
    }

    fn padded_x_range(&self) -> std::ops::Range<i32> {
        let p = self.padding as i32;
        -p..self.width as i32 + p
    }

    fn padded_y_range(&self) -> std::ops::Range<i32> {
        let p = self.padding as i32;
        -p..self.height as i32 + p
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.contains(x, y), "({x}, {y}) outside padded grid");
        let p = self.padding as i32;
        (x + p) as usize * self.stride + (y + p) as usize
    }

    fn column(&self, layer: Layer) -> &[i8] {
        match layer {
            Layer::Obstacle => &self.obstacle,
            Layer::Drone => &self.drone,
            Layer::Visit => &self.visit,
            Layer::Scratch => &self.scratch,
            Layer::ParityA => &self.parity_a,
            Layer::ParityB => &self.parity_b,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────────────

    /// Raw layer value. Any coordinate within the padding is valid, which
    /// covers every neighborhood lookup around a logical cell.
    #[inline]
    pub fn get_layer(&self, x: i32, y: i32, layer: Layer) -> i8 {
        self.column(layer)[self.index(x, y)]
    }

    #[inline]
    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.obstacle[self.index(x, y)] != 0
    }

    #[inline]
    pub fn drone(&self, x: i32, y: i32) -> DroneStatus {
        DroneStatus::from_code(self.drone[self.index(x, y)])
    }

    #[inline]
    pub fn visit(&self, x: i32, y: i32) -> Visit {
        Visit::from_code(self.visit[self.index(x, y)])
    }

    #[inline]
    pub fn parity_a(&self, x: i32, y: i32) -> bool {
        self.parity_a[self.index(x, y)] != 0
    }

    #[inline]
    pub fn parity_b(&self, x: i32, y: i32) -> bool {
        self.parity_b[self.index(x, y)] != 0
    }

    /// Copy of the square patch of side `2 * radius + 1` centred on `(cx, cy)`.
    pub fn extract_window(&self, cx: i32, cy: i32, radius: i32) -> Window {
        Window::extract(self, cx, cy, radius)
    }

    /// Drone positions in row-major order (x ascending, then y ascending).
    pub fn drones(&self) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                if self.drone(x, y) == DroneStatus::Here {
                    out.push((x, y));
                }
            }
        }
        out
    }

    pub fn drone_count(&self) -> usize {
        self.drones().len()
    }

    // ── Writes ──────────────────────────────────────────────────────────────

    /// Overwrite the drone layer. No consistency checks; the engine heals
    /// drones placed on obstacles at the next tick.
    #[inline]
    pub fn set_drone(&mut self, x: i32, y: i32, status: DroneStatus) {
        let i = self.index(x, y);
        self.drone[i] = status.code();
    }

    /// Unvisited becomes Visited; Visited and Unreachable are left alone.
    #[inline]
    pub fn mark_visited(&mut self, x: i32, y: i32) {
        let i = self.index(x, y);
        if self.visit[i] == Visit::Unvisited.code() {
            self.visit[i] = Visit::Visited.code();
        }
    }

    /// Reset mutable layers to `other` without reallocating.
    /// Both grids must share dimensions.
    pub(crate) fn copy_from(&mut self, other: &Grid) {
        debug_assert_eq!(
            (self.width, self.height, self.padding),
            (other.width, other.height, other.padding)
        );
        self.drone.copy_from_slice(&other.drone);
        self.visit.copy_from_slice(&other.visit);
        self.scratch.copy_from_slice(&other.scratch);
    }

    // ── Export ──────────────────────────────────────────────────────────────

    /// Read-only copy of the logical area for renderers.
    pub fn snapshot(&self) -> GridSnapshot {
        let mut snap = GridSnapshot {
            width: self.width,
            height: self.height,
            obstacle: Vec::with_capacity(self.width * self.height),
            drone: Vec::with_capacity(self.width * self.height),
            visit: Vec::with_capacity(self.width * self.height),
        };
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                snap.obstacle.push(self.get_layer(x, y, Layer::Obstacle));
                snap.drone.push(self.get_layer(x, y, Layer::Drone));
                snap.visit.push(self.get_layer(x, y, Layer::Visit));
            }
        }
        snap
    }
}

/// Logical-area layers in x-major order (`index = x * height + y`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    pub obstacle: Vec<i8>,
    pub drone: Vec<i8>,
    pub visit: Vec<i8>,
}

impl GridSnapshot {
    pub fn drone_at(&self, x: usize, y: usize) -> DroneStatus {
        DroneStatus::from_code(self.drone[x * self.height + y])
    }

    pub fn visit_at(&self, x: usize, y: usize) -> Visit {
        Visit::from_code(self.visit[x * self.height + y])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
