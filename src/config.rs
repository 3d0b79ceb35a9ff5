use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BINARY_NAME: &str = "window2linux";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 180;
pub const DEFAULT_GAMESCOPE_RES: &str = "1920x1080";
pub const DEFAULT_GAMESCOPE_FPS: u32 = 144;

/// Execution mode forwarded to the external binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    Install,
    Play,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Install => "install",
            Mode::Play => "play",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamescopeSettings {
    pub resolution: String,
    pub fps: u32,
}

/// Everything a single launcher run needs, built once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub setup_only: bool,
    pub no_install: bool,
    pub binary: PathBuf,
    pub mode: Mode,
    pub max_attempts: u32,
    pub timeout_seconds: u32,
    /// `Some` only when the compositor wrapper was requested.
    pub gamescope: Option<GamescopeSettings>,
    pub target: Option<PathBuf>,
}

impl RunConfig {
    /// A configuration with every default applied, pointing at `binary`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            setup_only: false,
            no_install: false,
            binary: binary.into(),
            mode: Mode::Auto,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            gamescope: None,
            target: None,
        }
    }
}

/// Accepts only plain ASCII digits, so `+5`, `-1` and ` 5` are all rejected.
pub fn parse_count(raw: &str) -> Result<u32, String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{raw}' is not a non-negative integer"));
    }
    raw.parse::<u32>()
        .map_err(|_| format!("'{raw}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::{Mode, parse_count};

    #[test]
    fn parse_count_accepts_plain_digits() {
        assert_eq!(parse_count("0"), Ok(0));
        assert_eq!(parse_count("180"), Ok(180));
    }

    #[test]
    fn parse_count_rejects_signs_and_letters() {
        for raw in ["", "abc", "+5", "-1", " 5", "5 ", "1.5", "3x"] {
            assert!(parse_count(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn parse_count_rejects_overflow() {
        let err = parse_count("99999999999").expect_err("overflow must fail");
        assert!(err.contains("too large"));
    }

    #[test]
    fn mode_displays_lowercase() {
        assert_eq!(Mode::Play.to_string(), "play");
        assert_eq!(Mode::Auto.as_str(), "auto");
    }
}
