use crate::blurring::domain::blur_error::BlurError;

/// Raw image samples: contiguous interleaved bytes in row-major order.
///
/// The caller owns the buffer and lends it to the engine for one run.
/// Decoding and encoding happen outside the core; here pixel data is opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    samples: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl PixelBuffer {
    pub fn new(samples: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self, BlurError> {
        if width == 0 || height == 0 {
            return Err(BlurError::InvalidConfiguration(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        if !(1..=4).contains(&channels) {
            return Err(BlurError::InvalidConfiguration(format!(
                "channel count must be between 1 and 4, got {channels}"
            )));
        }
        let expected = (width as usize) * (height as usize) * (channels as usize);
        if samples.len() != expected {
            return Err(BlurError::InvalidBuffer {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            samples,
            width,
            height,
            channels,
        })
    }

    /// Buffer of the given geometry with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self, BlurError> {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self::new(vec![value; len], width, height, channels)
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Bytes in one row of pixels.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels as usize
    }
}
