use std::path::Path;

use gauss_blur_core::shared::pixel_buffer::PixelBuffer;

/// Decodes an image file into a 3-channel RGB pixel buffer.
pub fn read_rgb(path: &Path) -> Result<PixelBuffer, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(PixelBuffer::new(img.into_raw(), width, height, 3)?)
}

/// Encodes an RGB pixel buffer, choosing the format from the file extension.
pub fn write_rgb(path: &Path, buffer: &PixelBuffer) -> Result<(), Box<dyn std::error::Error>> {
    if buffer.channels() != 3 {
        return Err(format!("expected an RGB buffer, got {} channels", buffer.channels()).into());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let img = image::RgbImage::from_raw(buffer.width(), buffer.height(), buffer.samples().to_vec())
        .ok_or("Failed to create image from pixel buffer")?;
    img.save(path)?;
    Ok(())
}
