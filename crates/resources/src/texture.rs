//! Texture loading from image files and small generated images.

use std::path::Path;
use std::sync::Arc;

use lumen_rhi::command::CommandPool;
use lumen_rhi::device::Device;
use lumen_rhi::texture::Texture;
use tracing::info;

use crate::error::{ResourceError, ResourceResult};

/// Decodes an image file (PNG or JPEG) and uploads it as an sRGB texture.
pub fn load_texture(
    device: Arc<Device>,
    pool: &CommandPool,
    path: &Path,
) -> ResourceResult<Arc<Texture>> {
    if !path.exists() {
        return Err(ResourceError::FileNotFound(path.to_path_buf()));
    }

    let image = image::open(path)
        .map_err(|source| ResourceError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();

    let texture = Texture::from_rgba8(
        device,
        pool,
        width,
        height,
        image.as_raw(),
        &path.display().to_string(),
    )?;
    info!("Loaded texture {} ({}x{})", path.display(), width, height);

    Ok(Arc::new(texture))
}

/// Uploads a `size`x`size` checkerboard with square cells of `cell` pixels.
pub fn checkerboard_texture(
    device: Arc<Device>,
    pool: &CommandPool,
    size: u32,
    cell: u32,
    colors: [[u8; 4]; 2],
    name: &str,
) -> ResourceResult<Arc<Texture>> {
    let pixels = checkerboard_pixels(size, cell, colors);
    Ok(Arc::new(Texture::from_rgba8(
        device, pool, size, size, &pixels, name,
    )?))
}

/// RGBA8 pixels of a checkerboard, row-major.
pub fn checkerboard_pixels(size: u32, cell: u32, colors: [[u8; 4]; 2]) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let parity = ((x / cell) + (y / cell)) % 2;
            pixels.extend_from_slice(&colors[parity as usize]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];

    fn pixel(pixels: &[u8], size: u32, x: u32, y: u32) -> &[u8] {
        let start = ((y * size + x) * 4) as usize;
        &pixels[start..start + 4]
    }

    #[test]
    fn test_checkerboard_size() {
        assert_eq!(checkerboard_pixels(8, 2, [BLACK, WHITE]).len(), 8 * 8 * 4);
    }

    #[test]
    fn test_checkerboard_alternates_cells() {
        let pixels = checkerboard_pixels(4, 2, [BLACK, WHITE]);
        assert_eq!(pixel(&pixels, 4, 0, 0), BLACK);
        assert_eq!(pixel(&pixels, 4, 1, 1), BLACK);
        assert_eq!(pixel(&pixels, 4, 2, 0), WHITE);
        assert_eq!(pixel(&pixels, 4, 0, 2), WHITE);
        assert_eq!(pixel(&pixels, 4, 3, 3), BLACK);
    }

    #[test]
    fn test_checkerboard_zero_cell_is_per_pixel() {
        let pixels = checkerboard_pixels(2, 0, [BLACK, WHITE]);
        assert_eq!(pixel(&pixels, 2, 0, 0), BLACK);
        assert_eq!(pixel(&pixels, 2, 1, 0), WHITE);
    }
}
