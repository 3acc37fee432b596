//! Image sequence input and output.

use bytemuck::Pod;
use flowseg::prelude::v1::*;
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// List image files of a directory, in name order.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    frames.sort();

    Ok(frames)
}

pub fn load_frame(path: &Path) -> Result<ColorFrame> {
    let img = image::open(path)
        .map_err(|e| anyhow!("unable to open {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();

    let rgb = Frame::<[u8; 3]>::from_bytes(
        width as _,
        height as _,
        width as usize * 3,
        img.as_raw(),
    )?;

    Ok(rgb.map(|px| Bgr::from_rgb_slice(&px)))
}

pub fn color_image(frame: &ColorFrame) -> Result<RgbImage> {
    let (width, height) = frame.dim();
    RgbImage::from_raw(width as _, height as _, packed_bytes(&frame.map(Bgr::to_rgb)))
        .ok_or_else(|| anyhow!("{width}x{height} frame does not fit an image buffer"))
}

pub fn gray_image(frame: &GrayFrame) -> Result<GrayImage> {
    let (width, height) = frame.dim();
    GrayImage::from_raw(width as _, height as _, packed_bytes(frame))
        .ok_or_else(|| anyhow!("{width}x{height} frame does not fit an image buffer"))
}

/// Copy out the visible bytes of every row, without stride padding.
fn packed_bytes<T: Pod>(frame: &Frame<T>) -> Vec<u8> {
    let (width, height) = frame.dim();
    let px = std::mem::size_of::<T>();
    let line = frame.stride() * px;

    if line == 0 {
        return vec![];
    }

    frame
        .as_bytes()
        .chunks(line)
        .take(height)
        .flat_map(|row| &row[..width * px])
        .copied()
        .collect()
}

#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("motion-detect-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
