// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line-of-sight obstruction between two facing items
//!
//! The path between the item centers is rasterized and, at every point, a
//! band perpendicular to the facing axis is checked for wall pixels. The band
//! is as wide as the larger item. The worst cross-section along the path
//! decides the rate: one fully walled cross-section blocks the view.

use crate::error::{Error, Result};
use crate::line_ops::bresenham_line;
use crate::raster::FloorPlanRaster;
use crate::types::{ObstructionResult, Orientation, SpatialItem};

/// Wall pixel count of the perpendicular band centered on `point`
fn band_walls(
    raster: &FloorPlanRaster,
    point: (i64, i64),
    half_range: i64,
    orientation: Orientation,
) -> usize {
    let (x, y) = point;
    match orientation {
        // Vertical facing: scan across columns at a fixed row
        Orientation::Vertical => raster.walls_in_row(y, x - half_range, x + half_range),
        // Horizontal facing: scan across rows at a fixed column
        Orientation::Horizontal => raster.walls_in_column(x, y - half_range, y + half_range),
    }
}

/// Score how obstructed the view between two items is.
///
/// `raster` must already have both items' footprints masked to free space
/// (see [`FloorPlanRaster::mask`]). Both items must share an orientation.
pub fn scan_obstruction(
    raster: &FloorPlanRaster,
    first: &SpatialItem,
    second: &SpatialItem,
) -> Result<ObstructionResult> {
    let orientation = first.require_orientation()?;
    if second.require_orientation()? != orientation {
        return Err(Error::InvalidOrientation(format!(
            "cannot scan between {} '{}' and {} '{}'",
            orientation,
            first.name,
            second.require_orientation()?,
            second.name
        )));
    }

    let (x0, y0) = first.pixel_center();
    let (x1, y1) = second.pixel_center();
    let scan_points = bresenham_line(x0, y0, x1, y1);

    let scan_range = first.length()?.max(second.length()?);
    let half_range = (scan_range / 2.0).round_ties_even() as i64;

    let max_black_point = scan_points
        .iter()
        .map(|&point| band_walls(raster, point, half_range, orientation))
        .max()
        .unwrap_or(0);

    let rate = if scan_range > 0.0 {
        (max_black_point as f64 / scan_range).min(1.0)
    } else {
        0.0
    };

    tracing::trace!(
        first = %first.name,
        second = %second.name,
        points = scan_points.len(),
        max_black_point,
        scan_range,
        rate,
        "Scanned line of sight"
    );

    Ok(ObstructionResult {
        first: first.clone(),
        second: second.clone(),
        scan_points,
        rate,
    })
}

/// Mask both items on a private copy of `base`, then scan between them
pub fn masked_obstruction(
    base: &FloorPlanRaster,
    first: &SpatialItem,
    second: &SpatialItem,
    margin: f64,
) -> Result<ObstructionResult> {
    let masked = base.mask(&[first, second], margin);
    scan_obstruction(&masked, first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{FREE, WALL};
    use image::{GrayImage, Luma};

    fn open_plan(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([FREE]))
    }

    fn vertical(x1: f64, y1: f64, x2: f64, y2: f64) -> SpatialItem {
        SpatialItem::new(x1, y1, x2, y2, "door", Some(Orientation::Vertical))
    }

    #[test]
    fn test_clear_path() {
        let raster = FloorPlanRaster::from_binary(open_plan(200, 200));
        let a = vertical(80.0, 10.0, 120.0, 30.0);
        let b = vertical(80.0, 170.0, 120.0, 190.0);

        let result = scan_obstruction(&raster, &a, &b).unwrap();
        assert_eq!(result.rate, 0.0);
        assert_eq!(result.scan_points.first(), Some(&(100, 20)));
        assert_eq!(result.scan_points.last(), Some(&(100, 180)));
    }

    #[test]
    fn test_full_wall_blocks() {
        let mut img = open_plan(200, 200);
        for y in 95..105 {
            for x in 0..200 {
                img.put_pixel(x, y, Luma([WALL]));
            }
        }
        let raster = FloorPlanRaster::from_binary(img);
        let a = vertical(80.0, 10.0, 120.0, 30.0);
        let b = vertical(80.0, 170.0, 120.0, 190.0);

        let result = scan_obstruction(&raster, &a, &b).unwrap();
        assert_eq!(result.rate, 1.0);
    }

    #[test]
    fn test_partial_wall() {
        let mut img = open_plan(200, 200);
        // Wall covers x in [60, 100) on one row; band spans x in [80, 120]
        for x in 60..100 {
            img.put_pixel(x, 100, Luma([WALL]));
        }
        let raster = FloorPlanRaster::from_binary(img);
        let a = vertical(80.0, 10.0, 120.0, 30.0);
        let b = vertical(80.0, 170.0, 120.0, 190.0);

        let result = scan_obstruction(&raster, &a, &b).unwrap();
        assert!((result.rate - 20.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_horizontal_band() {
        let mut img = open_plan(200, 200);
        for y in 0..200 {
            img.put_pixel(100, y, Luma([WALL]));
        }
        let raster = FloorPlanRaster::from_binary(img);
        let a = SpatialItem::new(10.0, 80.0, 30.0, 120.0, "door", Some(Orientation::Horizontal));
        let b = SpatialItem::new(170.0, 90.0, 190.0, 110.0, "door", Some(Orientation::Horizontal));

        // Band of rows [80, 120] at column 100, scan range 40 => 41 wall pixels, capped
        let result = scan_obstruction(&raster, &a, &b).unwrap();
        assert_eq!(result.rate, 1.0);
    }

    #[test]
    fn test_zero_scan_range() {
        let raster = FloorPlanRaster::from_binary(open_plan(50, 50));
        let a = vertical(10.0, 10.0, 10.0, 20.0);
        let b = vertical(10.0, 30.0, 10.0, 40.0);
        assert_eq!(scan_obstruction(&raster, &a, &b).unwrap().rate, 0.0);
    }

    #[test]
    fn test_mismatched_orientation_fails() {
        let raster = FloorPlanRaster::from_binary(open_plan(50, 50));
        let a = vertical(10.0, 10.0, 20.0, 20.0);
        let b = a.with_orientation(Orientation::Horizontal);
        assert!(matches!(
            scan_obstruction(&raster, &a, &b),
            Err(Error::InvalidOrientation(_))
        ));

        let unset = SpatialItem::new(10.0, 10.0, 20.0, 20.0, "door", None);
        assert!(scan_obstruction(&raster, &a, &unset).is_err());
    }

    #[test]
    fn test_own_footprint_is_masked() {
        // Items drawn as dark boxes on the plan must not block themselves
        let mut img = open_plan(200, 200);
        for y in 10..30 {
            for x in 80..120 {
                img.put_pixel(x, y, Luma([WALL]));
            }
        }
        let raster = FloorPlanRaster::from_binary(img);
        let a = vertical(80.0, 10.0, 120.0, 30.0);
        let b = vertical(80.0, 170.0, 120.0, 190.0);

        assert_eq!(scan_obstruction(&raster, &a, &b).unwrap().rate, 1.0);
        assert_eq!(masked_obstruction(&raster, &a, &b, 0.02).unwrap().rate, 0.0);
        assert!(raster.is_wall(100, 20));
    }
}
