pub mod cli;
pub mod config;
pub mod dispatch;
pub mod env_detect;
pub mod history;
pub mod host;
pub mod installer;
pub mod pipeline;
pub mod runtime_detect;
pub mod status;
pub mod target;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    cli::run()
}
