//! Campaign progress persistence.
//!
//! The only state carried between runs is a single integer: the highest
//! level the player has reached. It is read when the program starts and
//! rewritten after a level is won, never shrinking.

use std::{fs, io, path::Path};

use thiserror::Error;

/// Level every fresh campaign starts on.
const FIRST_LEVEL: u32 = 1;

/// Errors raised while reading or writing the campaign file.
#[derive(Debug, Error)]
pub(crate) enum CampaignError {
    /// The campaign file could not be read or written.
    #[error("accessing campaign file: {0}")]
    Io(#[from] io::Error),
    /// The campaign file held something other than an integer.
    #[error("campaign file holds {0:?}, expected an integer")]
    Malformed(String),
}

/// Highest level reached so far; a missing file means a fresh campaign.
pub(crate) fn highest_level_reached(path: &Path) -> Result<u32, CampaignError> {
    if !path.exists() {
        return Ok(FIRST_LEVEL);
    }
    let raw = fs::read_to_string(path)?;
    let trimmed = raw.trim();
    trimmed
        .parse::<u32>()
        .map_err(|_| CampaignError::Malformed(trimmed.to_owned()))
}

/// Records that the player reached `level`, keeping the stored maximum.
pub(crate) fn record_level_reached(path: &Path, level: u32) -> Result<u32, CampaignError> {
    let highest = highest_level_reached(path)?.max(level);
    fs::write(path, format!("{highest}\n"))?;
    Ok(highest)
}
