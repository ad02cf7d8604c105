//! Boundary planning.
//!
//! Splits a declared episode count across the video files of a batch and
//! turns each file's share into checkpoint timestamps: the places where an
//! episode boundary would sit if every episode in that file had the same
//! length. Checkpoints are only estimates; the sampler searches a window
//! around each one.
//!
//! # Example
//!
//! ```
//! use endscan::planner::{allocate_episodes, compute_checkpoints};
//!
//! let allocation = allocate_episodes(2, 5)?;
//! assert_eq!(allocation, vec![3, 2]);
//!
//! let checkpoints = compute_checkpoints(1200.0, 3)?;
//! assert_eq!(checkpoints, vec![400.0, 800.0]);
//! # Ok::<(), endscan::EndscanError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::error::EndscanError;

/// Distribute `episode_count` episodes over `file_count` files.
///
/// Every file receives `episode_count / file_count` episodes and the first
/// `episode_count % file_count` files receive one more, so the entries sum
/// to `episode_count` and differ by at most one.
///
/// # Errors
///
/// Returns [`EndscanError::InvalidInput`] if either count is zero.
pub fn allocate_episodes(file_count: usize, episode_count: u32) -> Result<Vec<u32>, EndscanError> {
    if file_count == 0 {
        return Err(EndscanError::InvalidInput(
            "at least one video file is required".to_string(),
        ));
    }
    if episode_count == 0 {
        return Err(EndscanError::InvalidInput(
            "episode count must be at least 1".to_string(),
        ));
    }

    let files = u32::try_from(file_count).map_err(|_| {
        EndscanError::InvalidInput(format!("too many video files: {file_count}"))
    })?;
    let base = episode_count / files;
    let remainder = (episode_count % files) as usize;

    let allocation: Vec<u32> = (0..file_count)
        .map(|index| if index < remainder { base + 1 } else { base })
        .collect();

    log::debug!("Allocated {episode_count} episodes over {file_count} files: {allocation:?}");
    Ok(allocation)
}

/// Compute the estimated episode boundaries inside one video.
///
/// A file holding `k` episodes has `k - 1` internal boundaries, placed at
/// `duration * i / k` for `i = 1..k`. The result is sorted ascending with
/// duplicates removed. Files with zero or one episode have no boundaries.
///
/// # Errors
///
/// Returns [`EndscanError::UnreadableMedia`] if `duration_seconds` is not a
/// positive finite number, which means the duration could not be derived
/// from the video. The error's path is empty; [`crate::Pipeline`] fills in
/// the video it was processing.
pub fn compute_checkpoints(
    duration_seconds: f64,
    episodes_in_file: u32,
) -> Result<Vec<f64>, EndscanError> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(EndscanError::UnreadableMedia {
            path: PathBuf::new(),
            reason: format!("duration is not a positive number ({duration_seconds})"),
        });
    }

    if episodes_in_file <= 1 {
        return Ok(Vec::new());
    }

    let interval = duration_seconds / f64::from(episodes_in_file);
    let mut checkpoints: Vec<f64> = (1..episodes_in_file)
        .map(|index| interval * f64::from(index))
        .collect();
    checkpoints.sort_by(f64::total_cmp);
    checkpoints.dedup();

    Ok(checkpoints)
}

/// Parse a user-supplied episode count.
///
/// Accepts a decimal integer made only of ASCII digits (surrounding
/// whitespace is ignored). Signs, decimals, and zero are rejected.
///
/// # Errors
///
/// Returns [`EndscanError::InvalidInput`] for anything that is not a
/// positive integer.
///
/// # Example
///
/// ```
/// use endscan::planner::parse_episode_count;
///
/// assert_eq!(parse_episode_count(" 12\n").unwrap(), 12);
/// assert!(parse_episode_count("twelve").is_err());
/// assert!(parse_episode_count("0").is_err());
/// ```
pub fn parse_episode_count(input: &str) -> Result<u32, EndscanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(EndscanError::InvalidInput(format!(
            "'{trimmed}' is not a valid number"
        )));
    }

    let count: u32 = trimmed
        .parse()
        .map_err(|_| EndscanError::InvalidInput(format!("'{trimmed}' is too large")))?;

    if count == 0 {
        return Err(EndscanError::InvalidInput(
            "episode count must be at least 1".to_string(),
        ));
    }

    Ok(count)
}

/// Check that `input` names an existing directory.
///
/// # Errors
///
/// Returns [`EndscanError::InvalidInput`] if the path is empty, missing, or
/// not a directory.
pub fn validate_video_folder<P: AsRef<Path>>(input: P) -> Result<PathBuf, EndscanError> {
    let path = input.as_ref();
    if path.as_os_str().is_empty() {
        return Err(EndscanError::InvalidInput(
            "folder path cannot be empty".to_string(),
        ));
    }
    if !path.exists() {
        return Err(EndscanError::InvalidInput(format!(
            "the folder {} does not exist",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(EndscanError::InvalidInput(format!(
            "{} is not a folder",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}
