use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::RunConfig;
use crate::host::Invocation;

#[derive(Debug, Error)]
pub enum BinaryError {
    #[error("external binary not found: {0}")]
    Missing(PathBuf),
    #[error("external binary is not executable: {0}")]
    NotExecutable(PathBuf),
}

/// The binary must be a regular file with at least one execute bit set.
pub fn verify_binary(path: &Path) -> Result<(), BinaryError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(BinaryError::Missing(path.to_path_buf())),
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(BinaryError::NotExecutable(path.to_path_buf()));
        }
    }
    #[cfg(not(unix))]
    let _ = metadata;

    Ok(())
}

pub fn probe_invocation(binary: &Path) -> Invocation {
    Invocation::new(binary).args(["inspect", "runners", "--json"])
}

/// `run <target> --execute --mode .. --max-attempts .. --timeout-seconds ..`
/// plus the gamescope flags when enabled.
pub fn run_invocation(config: &RunConfig, target: &Path) -> Invocation {
    let mut invocation = Invocation::new(&config.binary)
        .arg("run")
        .arg(target)
        .arg("--execute")
        .args(["--mode", config.mode.as_str()])
        .args(["--max-attempts".to_string(), config.max_attempts.to_string()])
        .args([
            "--timeout-seconds".to_string(),
            config.timeout_seconds.to_string(),
        ]);

    if let Some(gamescope) = &config.gamescope {
        invocation = invocation
            .arg("--use-gamescope")
            .args(["--gamescope-res", gamescope.resolution.as_str()])
            .args(["--gamescope-fps".to_string(), gamescope.fps.to_string()]);
    }

    invocation
}
