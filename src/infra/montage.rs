// ============================================================
// Layer 6 — Image Montage
// ============================================================
// Pastes snapshot images onto a black RGB canvas.
//
//   Horizontal row:  | a | b | c |      width  = Σ widths
//                                        height = max height
//
//   Grid (rows×cols): every cell is max width × max height;
//                     image k goes to row k / cols, column k % cols.
//                     Images that do not fit the grid are dropped.
//
// Images are converted to RGB8 before pasting, so any alpha
// channel is discarded.

use anyhow::{ensure, Context, Result};
use image::{imageops, DynamicImage, RgbImage};
use std::path::{Path, PathBuf};

/// Lay `images` out left to right, top aligned.
pub fn combine_horizontal(images: &[DynamicImage]) -> Result<RgbImage> {
    ensure!(!images.is_empty(), "No images to combine");

    let total_width: u32 = images.iter().map(|i| i.width()).sum();
    let max_height = images.iter().map(|i| i.height()).max().unwrap_or(0);

    let mut canvas = RgbImage::new(total_width, max_height);
    let mut x_offset = 0i64;
    for img in images {
        imageops::replace(&mut canvas, &img.to_rgb8(), x_offset, 0);
        x_offset += i64::from(img.width());
    }
    Ok(canvas)
}

/// Lay `images` out on a `rows × cols` grid of equal cells.
pub fn combine_grid(images: &[DynamicImage], rows: u32, cols: u32) -> Result<RgbImage> {
    ensure!(!images.is_empty(), "No images to combine");
    ensure!(rows > 0 && cols > 0, "Grid must have at least one cell, got {rows}x{cols}");

    let cell_w = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let cell_h = images.iter().map(|i| i.height()).max().unwrap_or(0);

    let mut canvas = RgbImage::new(cell_w * cols, cell_h * rows);
    for (idx, img) in images.iter().take((rows * cols) as usize).enumerate() {
        let idx = idx as u32;
        let (row, col) = (idx / cols, idx % cols);
        imageops::replace(
            &mut canvas,
            &img.to_rgb8(),
            i64::from(col * cell_w),
            i64::from(row * cell_h),
        );
    }
    Ok(canvas)
}

fn open_all(paths: &[PathBuf]) -> Result<Vec<DynamicImage>> {
    paths
        .iter()
        .map(|p| image::open(p).with_context(|| format!("Cannot open image '{}'", p.display())))
        .collect()
}

fn save(canvas: &RgbImage, output: &Path) -> Result<()> {
    canvas
        .save(output)
        .with_context(|| format!("Cannot write image '{}'", output.display()))
}

/// Open `paths`, combine them into one row and write it to `output`.
pub fn combine_files_horizontal(paths: &[PathBuf], output: &Path) -> Result<()> {
    let canvas = combine_horizontal(&open_all(paths)?)?;
    save(&canvas, output)?;
    tracing::info!("Combined image saved to {}", output.display());
    Ok(())
}

/// Open `paths`, combine them on a grid and write it to `output`.
pub fn combine_files_grid(paths: &[PathBuf], output: &Path, rows: u32, cols: u32) -> Result<()> {
    let canvas = combine_grid(&open_all(paths)?, rows, cols)?;
    save(&canvas, output)?;
    tracing::info!("Grid image saved to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(w: u32, h: u32, px: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(px)))
    }

    #[test]
    fn test_horizontal_of_equal_images() {
        let images: Vec<_> = (0..4u8).map(|i| solid(10, 6, [i * 50, 0, 0])).collect();
        let out = combine_horizontal(&images).unwrap();
        assert_eq!(out.dimensions(), (40, 6));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(15, 3), &Rgb([50, 0, 0]));
        assert_eq!(out.get_pixel(39, 5), &Rgb([150, 0, 0]));
    }

    #[test]
    fn test_horizontal_pads_short_images_with_black() {
        let images = vec![solid(4, 8, [255, 255, 255]), solid(6, 3, [0, 255, 0])];
        let out = combine_horizontal(&images).unwrap();
        assert_eq!(out.dimensions(), (10, 8));
        assert_eq!(out.get_pixel(5, 2), &Rgb([0, 255, 0]));
        assert_eq!(out.get_pixel(5, 6), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_grid_uses_largest_cell() {
        let images = vec![solid(10, 4, [1, 1, 1]), solid(6, 9, [2, 2, 2])];
        let out = combine_grid(&images, 2, 1).unwrap();
        assert_eq!(out.dimensions(), (10, 18));
        assert_eq!(out.get_pixel(0, 0), &Rgb([1, 1, 1]));
        assert_eq!(out.get_pixel(0, 9), &Rgb([2, 2, 2]));
        assert_eq!(out.get_pixel(8, 12), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_grid_drops_overflow_images() {
        let images = vec![
            solid(2, 2, [1, 0, 0]),
            solid(2, 2, [2, 0, 0]),
            solid(2, 2, [3, 0, 0]),
        ];
        let out = combine_grid(&images, 1, 2).unwrap();
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.get_pixel(3, 1), &Rgb([2, 0, 0]));
    }

    #[test]
    fn test_rgba_input_is_flattened_to_rgb() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(3, 3, image::Rgba([9, 8, 7, 0])));
        let out = combine_horizontal(&[rgba]).unwrap();
        assert_eq!(out.get_pixel(1, 1), &Rgb([9, 8, 7]));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(combine_horizontal(&[]).is_err());
        assert!(combine_grid(&[], 2, 2).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        solid(5, 5, [10, 20, 30]).save(&a).unwrap();
        solid(3, 7, [40, 50, 60]).save(&b).unwrap();

        let out = dir.path().join("row.png");
        combine_files_horizontal(&[a, b], &out).unwrap();
        let row = image::open(&out).unwrap();
        assert_eq!((row.width(), row.height()), (8, 7));
    }
}
