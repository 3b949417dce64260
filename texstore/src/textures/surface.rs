//! CPU-side image helpers for preparing cube-map faces.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::borrow::Cow;

/// Size of `(width, height)` scaled down so that neither side exceeds `max`.
///
/// Keeps the aspect ratio and never returns a zero side. Sizes already within the limit are
/// returned unchanged.
pub fn downscaled_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let largest = width.max(height);
    if largest <= max || largest == 0 {
        return (width, height);
    }

    let scale = |dim: u32| ((u64::from(dim) * u64::from(max)) / u64::from(largest)).max(1) as u32;
    (scale(width), scale(height))
}

/// Resizes `image` to fit `max`, or borrows it if it already does.
pub fn fit_within(image: &RgbaImage, max: u32, filter: FilterType) -> Cow<'_, RgbaImage> {
    let (width, height) = downscaled_dimensions(image.width(), image.height(), max);
    if (width, height) == image.dimensions() {
        return Cow::Borrowed(image);
    }

    Cow::Owned(imageops::resize(image, width, height, filter))
}

/// Like [`fit_within`], for images that are owned already.
pub fn fit_within_owned(image: RgbaImage, max: u32, filter: FilterType) -> RgbaImage {
    let (width, height) = downscaled_dimensions(image.width(), image.height(), max);
    if (width, height) == image.dimensions() {
        return image;
    }

    imageops::resize(&image, width, height, filter)
}

/// Copies the `cell` of a grid with `columns × rows` equally sized cells.
///
/// Cells are `width / columns` by `height / rows`, rounded down.
pub fn grid_cell(image: &RgbaImage, columns: u32, rows: u32, cell: (u32, u32)) -> RgbaImage {
    let cell_width = image.width() / columns;
    let cell_height = image.height() / rows;
    let (column, row) = cell;

    imageops::crop_imm(
        image,
        column * cell_width,
        row * cell_height,
        cell_width,
        cell_height,
    )
    .to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn downscale_keeps_aspect() {
        assert_eq!(downscaled_dimensions(4096, 2048, 1024), (1024, 512));
        assert_eq!(downscaled_dimensions(300, 7000, 700), (30, 700));
        assert_eq!(downscaled_dimensions(5000, 1, 100), (100, 1));
        assert_eq!(downscaled_dimensions(512, 512, 1024), (512, 512));
    }

    #[test]
    fn fit_within_resizes_only_when_needed() {
        let small = RgbaImage::new(8, 4);
        assert!(matches!(fit_within(&small, 8, FilterType::Nearest), Cow::Borrowed(_)));

        let large = RgbaImage::new(32, 16);
        assert_eq!(fit_within(&large, 8, FilterType::Nearest).dimensions(), (8, 4));
    }

    #[test]
    fn grid_cell_floors_cell_size() {
        let mut atlas = RgbaImage::new(9, 7);
        atlas.put_pixel(4, 2, Rgba([1, 2, 3, 4]));

        let cell = grid_cell(&atlas, 4, 3, (2, 1));

        assert_eq!(cell.dimensions(), (2, 2));
        assert_eq!(*cell.get_pixel(0, 0), Rgba([1, 2, 3, 4]));
    }
}
