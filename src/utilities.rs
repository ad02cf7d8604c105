//! Internal utility functions.
//!
//! Pixel-buffer packing and timestamp conversion shared by the media
//! module.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Pack the first plane of an RGB24 frame into a buffer without row padding.
///
/// FFmpeg rows are often wider than `width * 3` bytes. The returned buffer
/// can be handed straight to [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
    for row in 0..(height as usize) {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_bytes]);
    }
    buffer
}

/// Rescale a PTS value from the stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Convert seconds to a container seek position in AV_TIME_BASE units.
///
/// `Input::seek` with no stream selected expects microseconds.
pub(crate) fn seconds_to_seek_position(seconds: f64) -> i64 {
    (seconds * 1_000_000.0) as i64
}

/// Read a stream frame rate, falling back to the raw rate field.
pub(crate) fn rational_to_fps(primary: Rational, fallback: Rational) -> f64 {
    if primary.denominator() != 0 && primary.numerator() != 0 {
        f64::from(primary.numerator()) / f64::from(primary.denominator())
    } else if fallback.denominator() != 0 {
        f64::from(fallback.numerator()) / f64::from(fallback.denominator())
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_rescales_by_time_base() {
        let seconds = pts_to_seconds(90_000, Rational::new(1, 90_000));
        assert!((seconds - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn seek_position_is_microseconds() {
        assert_eq!(seconds_to_seek_position(2.5), 2_500_000);
    }

    #[test]
    fn fps_falls_back_when_average_missing() {
        let fps = rational_to_fps(Rational::new(0, 0), Rational::new(25, 1));
        assert!((fps - 25.0).abs() < f64::EPSILON);
        assert_eq!(rational_to_fps(Rational::new(0, 0), Rational::new(0, 0)), 0.0);
    }
}
