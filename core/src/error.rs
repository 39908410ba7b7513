use std::{io, path::PathBuf};

use crate::testing::ExitKind;

/// Conditions that abort the whole session.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("Malformed case name '{0}': no numeric id in file name")]
    MalformedCaseName(String),

    #[error("Staging failed: {0}")]
    Staging(#[from] fsutil::Error),

    #[error("Failed to spawn '{}': {}", .0.to_string_lossy(), .1)]
    Spawn(PathBuf, #[source] io::Error),

    #[error("Failed to wait for the subject program: {0}")]
    Communicate(#[source] io::Error),

    #[error("Subject program ended abnormally ({0}) without timing out")]
    FatalRun(ExitKind),
}
