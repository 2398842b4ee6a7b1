// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image processing operations for floor plan binarization

use image::{DynamicImage, GrayImage, Luma};
use imageproc::morphology::Mask;

/// Convert any decoded image to 8-bit grayscale
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// Edge-preserving smoothing over a square window of `window_size` pixels
pub fn bilateral_filter(
    image: &GrayImage,
    window_size: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    imageproc::filter::bilateral_filter(image, window_size, sigma_color, sigma_space)
}

/// Grayscale erosion - shrinks bright regions, thickens dark walls
pub fn erode(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::grayscale_erode(image, &Mask::square(radius))
}

/// Grayscale dilation - expands bright regions
pub fn dilate(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::grayscale_dilate(image, &Mask::square(radius))
}

/// Morphological opening of the free space (erode then dilate) - removes
/// small bright specks while keeping walls continuous
pub fn morphological_open(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::grayscale_open(image, &Mask::square(radius))
}

/// Simple threshold - pixels at or above threshold become white, below become black
pub fn threshold(image: &GrayImage, threshold_value: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] >= threshold_value { 255 } else { 0 };
        result.put_pixel(x, y, Luma([value]));
    }

    result
}
