// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binarized wall/free raster of a floor plan

use crate::config::BinarizeConfig;
use crate::error::Result;
use crate::image_ops::{bilateral_filter, morphological_open, threshold, to_grayscale};
use crate::types::SpatialItem;
use image::{DynamicImage, GrayImage, ImageReader, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::path::Path;
use std::sync::Arc;

/// Pixel value of walls and other obstacles
pub const WALL: u8 = 0;
/// Pixel value of free space
pub const FREE: u8 = 255;

/// Wall (`0`) / free (`255`) grid with the dimensions of the source image.
///
/// The pixel buffer is shared; cloning a raster is cheap and masking always
/// writes into a fresh copy.
#[derive(Debug, Clone)]
pub struct FloorPlanRaster {
    pixels: Arc<GrayImage>,
}

impl FloorPlanRaster {
    /// Wrap an already binarized image. Values other than `0` count as free.
    pub fn from_binary(image: GrayImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    /// Binarize a grayscale floor plan:
    /// bilateral smoothing, erosion then dilation, fixed threshold.
    pub fn binarize(grayscale: &GrayImage, config: &BinarizeConfig) -> Self {
        let smoothed = bilateral_filter(
            grayscale,
            config.bilateral_diameter,
            config.sigma_color,
            config.sigma_space,
        );
        let cleaned = morphological_open(&smoothed, config.morph_radius);
        Self::from_binary(threshold(&cleaned, config.wall_threshold))
    }

    pub fn from_image(image: &DynamicImage, config: &BinarizeConfig) -> Self {
        Self::binarize(&to_grayscale(image), config)
    }

    /// Load and binarize an image file
    pub fn open(path: impl AsRef<Path>, config: &BinarizeConfig) -> Result<Self> {
        let image = ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?;
        Ok(Self::from_image(&image, config))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &GrayImage {
        &self.pixels
    }

    /// Whether the pixel at `(x, y)` is a wall; out-of-bounds is not
    pub fn is_wall(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        self.pixels.get_pixel(x as u32, y as u32).0[0] == WALL
    }

    /// Count wall pixels in row `y`, columns `from..=to` (clamped)
    pub fn walls_in_row(&self, y: i64, from: i64, to: i64) -> usize {
        if y < 0 || y >= self.height() as i64 {
            return 0;
        }
        let from = from.max(0);
        let to = to.min(self.width() as i64 - 1);
        (from..=to).filter(|&x| self.is_wall(x, y)).count()
    }

    /// Count wall pixels in column `x`, rows `from..=to` (clamped)
    pub fn walls_in_column(&self, x: i64, from: i64, to: i64) -> usize {
        if x < 0 || x >= self.width() as i64 {
            return 0;
        }
        let from = from.max(0);
        let to = to.min(self.height() as i64 - 1);
        (from..=to).filter(|&y| self.is_wall(x, y)).count()
    }

    /// Copy of this raster with each item's footprint whited out.
    ///
    /// Boxes grow by `margin` of their width/height (truncated to whole
    /// pixels) and are clamped to the raster. `self` is never modified.
    pub fn mask(&self, items: &[&SpatialItem], margin: f64) -> FloorPlanRaster {
        let mut masked: GrayImage = (*self.pixels).clone();
        let (width, height) = (self.width() as i64, self.height() as i64);

        for item in items {
            let (x_min, y_min) = (item.x1 as i64, item.y1 as i64);
            let (x_max, y_max) = (item.x2 as i64, item.y2 as i64);
            let x_margin = ((x_max - x_min) as f64 * margin) as i64;
            let y_margin = ((y_max - y_min) as f64 * margin) as i64;

            let x_min = (x_min - x_margin).max(0);
            let y_min = (y_min - y_margin).max(0);
            let x_max = (x_max + x_margin).min(width);
            let y_max = (y_max + y_margin).min(height);

            if x_max <= x_min || y_max <= y_min {
                continue;
            }

            let rect = Rect::at(x_min as i32, y_min as i32)
                .of_size((x_max - x_min) as u32, (y_max - y_min) as u32);
            draw_filled_rect_mut(&mut masked, rect, Luma([FREE]));
        }

        FloorPlanRaster::from_binary(masked)
    }
}
