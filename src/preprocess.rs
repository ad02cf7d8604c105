//! Frame preprocessing.
//!
//! Sampled frames are cleaned up before they are persisted so that on-screen
//! text stands out for the recognizer. [`TextEnhancer`] binarizes the frame
//! with a local (adaptive) Gaussian threshold and then closes small gaps in
//! the strokes with a dilate/erode pass.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::{
    distance_transform::Norm,
    filter::gaussian_blur_f32,
    map::map_colors2,
    morphology::{dilate, erode},
};

/// An opaque frame → frame transform applied before a frame is saved.
pub trait FramePreprocessor: Send + Sync {
    /// Produce the image that will be persisted for a sampled frame.
    fn process(&self, frame: &DynamicImage) -> DynamicImage;
}

/// Leaves frames untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl FramePreprocessor for Passthrough {
    fn process(&self, frame: &DynamicImage) -> DynamicImage {
        frame.clone()
    }
}

/// Grayscale + adaptive Gaussian threshold + morphological close.
///
/// A pixel becomes white when it is brighter than the Gaussian-weighted mean
/// of its `block_size × block_size` neighbourhood minus `offset`, black
/// otherwise. The binary image is then dilated and eroded once with a square
/// `kernel_size` structuring element.
///
/// # Example
///
/// ```no_run
/// use endscan::{FramePreprocessor, TextEnhancer};
///
/// let frame = image::open("frame.png")?;
/// let cleaned = TextEnhancer::new().process(&frame);
/// cleaned.save("frame_clean.png")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TextEnhancer {
    /// Neighbourhood size for the local threshold. Odd, at least 3.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub offset: i16,
    /// Side of the square structuring element. Odd, at least 1.
    pub kernel_size: u32,
}

impl Default for TextEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEnhancer {
    /// Block size 11, offset 2, 3×3 kernel.
    pub fn new() -> Self {
        Self {
            block_size: 11,
            offset: 2,
            kernel_size: 3,
        }
    }

    /// Set the threshold neighbourhood size. Even values are bumped to the
    /// next odd number and the minimum is 3.
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = (block_size.max(3)) | 1;
        self
    }

    /// Set the constant subtracted from the local mean.
    pub fn with_offset(mut self, offset: i16) -> Self {
        self.offset = offset;
        self
    }

    /// Set the structuring element size. Even values are bumped to the next
    /// odd number.
    pub fn with_kernel_size(mut self, kernel_size: u32) -> Self {
        self.kernel_size = kernel_size.max(1) | 1;
        self
    }

    /// Gaussian sigma matching the kernel size, as OpenCV derives it.
    fn sigma(&self) -> f32 {
        0.3 * ((self.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    fn adaptive_threshold(&self, gray: &GrayImage) -> GrayImage {
        let local_mean = gaussian_blur_f32(gray, self.sigma());
        map_colors2(gray, &local_mean, |value, mean| {
            let threshold = i16::from(mean.0[0]) - self.offset;
            Luma([if i16::from(value.0[0]) > threshold { 255 } else { 0 }])
        })
    }

    /// Chessboard radius of the square structuring element.
    fn kernel_radius(&self) -> u8 {
        u8::try_from(self.kernel_size / 2).unwrap_or(u8::MAX)
    }

    /// Run the full transform on an already-grayscale image.
    pub fn enhance(&self, gray: &GrayImage) -> GrayImage {
        if gray.width() == 0 || gray.height() == 0 {
            return gray.clone();
        }
        let binary = self.adaptive_threshold(gray);
        let radius = self.kernel_radius();
        erode(&dilate(&binary, Norm::LInf, radius), Norm::LInf, radius)
    }
}

impl FramePreprocessor for TextEnhancer {
    fn process(&self, frame: &DynamicImage) -> DynamicImage {
        DynamicImage::ImageLuma8(self.enhance(&frame.to_luma8()))
    }
}
