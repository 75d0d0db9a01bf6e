//! Screenshot scratch files and compression.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use thiserror::Error;

use super::shell::CommandRunner;
use super::DeviceError;

/// Default JPEG quality for screenshots sent to the model.
pub const DEFAULT_JPEG_QUALITY: u8 = 50;

/// Screenshot compression errors.
#[derive(Error, Debug)]
pub enum ScreenshotError {
    #[error("Failed to read image: {0}")]
    ImageReadFailed(String),
    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// A compressed screenshot ready to attach to a result.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub base64_data: String,
    pub width: u32,
    pub height: u32,
}

/// Convert a captured image to RGB and re-encode it as JPEG.
///
/// Dimensions are preserved; only the color type and encoding change.
pub fn compress_screenshot(raw: &[u8], quality: u8) -> Result<Screenshot, ScreenshotError> {
    let img = image::load_from_memory(raw)
        .map_err(|e| ScreenshotError::ImageReadFailed(e.to_string()))?;
    let (width, height) = (img.width(), img.height());
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|e| ScreenshotError::EncodeFailed(e.to_string()))?;

    Ok(Screenshot {
        base64_data: STANDARD.encode(buffer.into_inner()),
        width,
        height,
    })
}

/// Directory holding transient capture files.
pub(crate) fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join("desktop-agent")
}

/// Fresh capture path inside the scratch directory.
pub(crate) fn scratch_path() -> std::io::Result<PathBuf> {
    let dir = scratch_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(format!("screenshot_{}.png", uuid::Uuid::new_v4().simple())))
}

/// Read a capture file and remove it.
pub(crate) fn take_scratch_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    if let Err(e) = std::fs::remove_file(path) {
        tracing::debug!("Could not remove {}: {}", path.display(), e);
    }
    Ok(bytes)
}

/// Remove a capture file left behind by a failed capture.
fn discard_scratch_file(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Run a capture command that writes a PNG to `path`, then read and remove it.
///
/// `path` is appended after `flags`. The file is removed on every error path.
pub(crate) async fn capture_into(
    runner: &CommandRunner,
    program: &str,
    flags: &[&str],
    path: &Path,
) -> Result<Vec<u8>, DeviceError> {
    let path_str = path.to_string_lossy().into_owned();
    let mut args = flags.to_vec();
    args.push(path_str.as_str());

    let output = match runner.run(program, &args).await {
        Ok(output) => output,
        Err(e) => {
            discard_scratch_file(path);
            return Err(e);
        }
    };
    if !output.success() || !path.is_file() {
        discard_scratch_file(path);
        return Err(DeviceError::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            detail: format!("status {}: {}", output.status, output.stderr.trim()),
        });
    }
    Ok(take_scratch_file(path)?)
}
