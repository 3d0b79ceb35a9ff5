use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;

use crate::config::{
    DEFAULT_BINARY_NAME, DEFAULT_GAMESCOPE_FPS, DEFAULT_GAMESCOPE_RES, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_TIMEOUT_SECONDS, GamescopeSettings, Mode, RunConfig, parse_count,
};
use crate::env_detect::HostPaths;
use crate::host::SystemHost;
use crate::pipeline;

const LOG_ENV: &str = "SMART_RUN_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "smart-run",
    version,
    about = "Prepare this machine and launch a Windows application through window2linux"
)]
pub struct Cli {
    /// Install dependencies and print status, then exit without launching
    #[arg(long)]
    setup_only: bool,
    /// Skip the dependency installation step
    #[arg(long)]
    no_install: bool,
    /// Path to the window2linux binary (defaults to the one next to this launcher)
    #[arg(long, value_name = "PATH")]
    binary: Option<PathBuf>,
    /// Execution mode forwarded to window2linux
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,
    /// Attempt budget forwarded to window2linux
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = parse_count)]
    max_attempts: u32,
    /// Per-attempt timeout forwarded to window2linux
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TIMEOUT_SECONDS, value_parser = parse_count)]
    timeout_seconds: u32,
    /// Run the target inside the gamescope compositor
    #[arg(long)]
    use_gamescope: bool,
    /// Gamescope output resolution
    #[arg(long, value_name = "WxH", default_value = DEFAULT_GAMESCOPE_RES)]
    gamescope_res: String,
    /// Gamescope refresh rate
    #[arg(long, value_name = "N", default_value_t = DEFAULT_GAMESCOPE_FPS, value_parser = parse_count)]
    gamescope_fps: u32,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
    /// Windows executable or installer to launch
    target: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<RunConfig> {
        let binary = match self.binary {
            Some(binary) => binary,
            None => default_binary()?,
        };

        let gamescope = self.use_gamescope.then(|| GamescopeSettings {
            resolution: self.gamescope_res,
            fps: self.gamescope_fps,
        });

        Ok(RunConfig {
            setup_only: self.setup_only,
            no_install: self.no_install,
            binary,
            mode: self.mode,
            max_attempts: self.max_attempts,
            timeout_seconds: self.timeout_seconds,
            gamescope,
            target: self.target,
        })
    }
}

fn default_binary() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("locating the launcher executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("launcher path {} has no parent directory", exe.display()))?;
    Ok(dir.join(DEFAULT_BINARY_NAME))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

pub fn run() -> i32 {
    run_from(std::env::args_os())
}

/// Parse `args` and run the launch pipeline, returning the process exit code.
pub fn run_from<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version come through here too
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return code;
        }
    };

    init_logging(cli.verbose);

    match launch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

fn launch(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.into_config()?;
    let paths = HostPaths::detect()?;
    tracing::debug!("running with {config:?}");

    let code = pipeline::run(&SystemHost, &config, &paths)?;
    Ok(code)
}
