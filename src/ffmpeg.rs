//! FFmpeg console verbosity.
//!
//! Decoders print their own warnings to stderr, independently of the `log`
//! facade. Sampling seeks around a lot, and some containers complain on
//! every seek, so batch runs usually want FFmpeg quieter than its default.
//!
//! ```no_run
//! use endscan::FfmpegLogLevel;
//!
//! endscan::set_ffmpeg_log_level(FfmpegLogLevel::Error);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

use crate::error::EndscanError;

/// How much FFmpeg itself prints, from silent to chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    Quiet,
    Error,
    /// FFmpeg's own default.
    #[default]
    Warning,
    Info,
    Debug,
}

impl FfmpegLogLevel {
    fn level(self) -> Level {
        match self {
            Self::Quiet => Level::Quiet,
            Self::Error => Level::Error,
            Self::Warning => Level::Warning,
            Self::Info => Level::Info,
            Self::Debug => Level::Debug,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = EndscanError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(Self::Quiet),
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(EndscanError::InvalidInput(format!(
                "unknown FFmpeg log level '{other}' (quiet, error, warning, info, debug)"
            ))),
        }
    }
}

/// Set FFmpeg's console verbosity for the whole process.
///
/// Does not affect messages emitted through the `log` crate.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    log::debug!("FFmpeg log level set to {level}");
    ffmpeg_next::util::log::set_level(level.level());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("WARN".parse::<FfmpegLogLevel>().unwrap(), FfmpegLogLevel::Warning);
        assert_eq!("off".parse::<FfmpegLogLevel>().unwrap(), FfmpegLogLevel::Quiet);
        assert_eq!(" debug ".parse::<FfmpegLogLevel>().unwrap(), FfmpegLogLevel::Debug);
        assert!("trace".parse::<FfmpegLogLevel>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for level in [
            FfmpegLogLevel::Quiet,
            FfmpegLogLevel::Error,
            FfmpegLogLevel::Warning,
            FfmpegLogLevel::Info,
            FfmpegLogLevel::Debug,
        ] {
            assert_eq!(level.to_string().parse::<FfmpegLogLevel>().unwrap(), level);
        }
    }
}
