// ============================================================================
// BITMAP I/O - load any supported format, save PNG / JPEG / BMP by extension
// ============================================================================

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};

use crate::canvas::{BACKGROUND, blend_over};
use crate::error::BitmapIoError;

/// JPEG quality used for saves.
pub const JPEG_QUALITY: u8 = 90;

/// Formats the editor writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Bmp,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
        }
    }

    fn from_extension(ext: &str) -> Option<SaveFormat> {
        match ext.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            _ => None,
        }
    }
}

/// Pick the format from the file extension. Anything unrecognised is saved
/// as PNG with `.png` appended to the full file name.
pub fn resolve_save_path(path: &Path) -> (PathBuf, SaveFormat) {
    let known = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(SaveFormat::from_extension);
    match known {
        Some(format) => (path.to_path_buf(), format),
        None => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".png");
            (PathBuf::from(name), SaveFormat::Png)
        }
    }
}

/// Decode a file into RGBA8.
pub fn load_bitmap(path: &Path) -> Result<RgbaImage, BitmapIoError> {
    let img = image::open(path).map_err(|source| BitmapIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img.into_rgba8())
}

/// Write `image` to `path`, returning the path actually written (which gains
/// a `.png` suffix when the extension was not recognised).
pub fn save_bitmap(image: &RgbaImage, path: &Path) -> Result<PathBuf, BitmapIoError> {
    let (path, format) = resolve_save_path(path);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    encode_into(image, format, &mut writer).map_err(|e| match e {
        BitmapIoError::Encode(source) => BitmapIoError::Write { path: path.clone(), source },
        other => other,
    })?;
    writer.flush()?;
    log::info!("saved {}", path.display());
    Ok(path)
}

/// PNG bytes of `image`, for the export server.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, BitmapIoError> {
    let mut buf = Vec::new();
    encode_into(image, SaveFormat::Png, &mut buf)?;
    Ok(buf)
}

fn encode_into<W: Write>(image: &RgbaImage, format: SaveFormat, writer: &mut W) -> Result<(), BitmapIoError> {
    let (w, h) = image.dimensions();
    match format {
        SaveFormat::Png => {
            PngEncoder::new(writer).write_image(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Jpeg => {
            let rgb = flatten_to_rgb(image);
            JpegEncoder::new_with_quality(writer, JPEG_QUALITY).encode(&rgb, w, h, ColorType::Rgb8)?;
        }
        SaveFormat::Bmp => {
            BmpEncoder::new(writer).encode(image.as_raw(), w, h, ColorType::Rgba8)?;
        }
    }
    Ok(())
}

/// JPEG has no alpha: composite onto the background first.
fn flatten_to_rgb(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for px in image.pixels() {
        let Rgba([r, g, b, _]) = blend_over(BACKGROUND, *px);
        out.extend_from_slice(&[r, g, b]);
    }
    out
}
