//! Boolean rasters for initial obstacle and drone layouts.
//!
//! Layouts come from grayscale image files, raw luminance buffers, or
//! explicit point lists.

use std::path::Path;

use crate::core::error::{Result, SwarmError};

/// Luminance below this value counts as a set pixel (dark = occupied).
pub const LUMA_THRESHOLD: u8 = 128;

/// Row-major boolean bitmap. `get(x, y)` addresses column `x`, row `y`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl Raster {
    /// All-clear raster.
    pub fn empty(width: usize, height: usize) -> Self {
        Raster {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<bool>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(SwarmError::RasterSize {
                expected: width * height,
                actual: pixels.len(),
            });
        }
        Ok(Raster {
            width,
            height,
            pixels,
        })
    }

    /// Threshold an 8-bit grayscale buffer: pixels darker than
    /// [`LUMA_THRESHOLD`] are set.
    pub fn from_luma(width: usize, height: usize, luma: &[u8]) -> Result<Self> {
        Self::from_pixels(width, height, luma.iter().map(|&v| v < LUMA_THRESHOLD).collect())
    }

    /// Decode an image file (PNG, BMP, PGM, ...) and threshold its luminance.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path.as_ref())?.into_luma8();
        let (width, height) = img.dimensions();
        Self::from_luma(width as usize, height as usize, img.as_raw())
    }

    /// Raster with exactly the listed pixels set. Points outside are ignored.
    pub fn from_points(width: usize, height: usize, points: &[(usize, usize)]) -> Self {
        let mut raster = Raster::empty(width, height);
        for &(x, y) in points {
            raster.set(x, y, true);
        }
        raster
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }

    pub fn count_set(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }

    /// Fails with [`SwarmError::RasterTooSmall`] unless the raster covers a
    /// `width x height` area. Extra pixels are fine and ignored later.
    pub fn ensure_covers(&self, layer: &'static str, width: usize, height: usize) -> Result<()> {
        if self.width < width || self.height < height {
            return Err(SwarmError::RasterTooSmall {
                layer,
                width: self.width,
                height: self.height,
                required_width: width,
                required_height: height,
            });
        }
        Ok(())
    }
}
