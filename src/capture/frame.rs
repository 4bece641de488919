//! Frame types: raw frames read from a live stream and encoded stills.

use std::time::Instant;

use image::RgbImage;

use super::Resolution;
use crate::submission::DataUrl;

/// Bytes per pixel of a [`VideoFrame`] (packed RGB8).
pub const BYTES_PER_PIXEL: usize = 3;

/// One picture read from a live stream, before any scaling or encoding.
#[derive(Clone)]
pub struct VideoFrame {
    image: RgbImage,
    sequence: u64,
    read_at: Instant,
}

impl VideoFrame {
    /// Wraps an already decoded image.
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            read_at: Instant::now(),
        }
    }

    /// Wraps a packed RGB8 buffer. Returns `None` if the buffer is not
    /// exactly `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return None;
        }
        RgbImage::from_raw(width, height, pixels).map(|image| Self::new(image, sequence))
    }

    /// Pixels of the frame.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the frame and returns its image.
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Dimensions of the frame as delivered.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.image.width(), self.image.height())
    }

    /// Position in the stream, starting at 1.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the frame was read from the stream.
    #[inline]
    pub fn read_at(&self) -> Instant {
        self.read_at
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("resolution", &self.resolution())
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Compressed image format of a [`CapturedFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedFormat {
    /// Baseline JPEG.
    Jpeg,
}

impl EncodedFormat {
    /// MIME type used in data URLs.
    pub fn mime_type(self) -> &'static str {
        match self {
            EncodedFormat::Jpeg => "image/jpeg",
        }
    }
}

/// An encoded still, ready to preview or submit.
///
/// Immutable once produced.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
    format: EncodedFormat,
}

impl CapturedFrame {
    pub(crate) fn new(width: u32, height: u32, bytes: Vec<u8>, format: EncodedFormat) -> Self {
        Self {
            width,
            height,
            bytes,
            format,
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded image bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoding of [`bytes`](Self::bytes).
    #[inline]
    pub fn format(&self) -> EncodedFormat {
        self.format
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the encoded payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Renders the frame as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        DataUrl::encode(self.format.mime_type(), &self.bytes)
    }

    /// Decodes the payload back into pixels.
    pub fn decode(&self) -> image::ImageResult<image::DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, image::ImageFormat::Jpeg)
    }
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("encoded_bytes", &self.bytes.len())
            .finish()
    }
}
