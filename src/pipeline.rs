//! The launch sequence: install, status, resolve, dispatch.
//!
//! Install failures are logged and absorbed; binary and target problems
//! abort the run with a [`LaunchError`].

use chrono::Utc;
use thiserror::Error;

use crate::config::RunConfig;
use crate::dispatch::{BinaryError, run_invocation, verify_binary};
use crate::env_detect::{HostPaths, PackageManager};
use crate::history::{LaunchRecord, record_launch};
use crate::host::Host;
use crate::installer::{InstallOutcome, SkipReason, install_dependencies};
use crate::runtime_detect::has_compat_runtime;
use crate::status::{collect_status, probe_runners};
use crate::target::{TargetError, TargetSearch, resolve_target, verify_target};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Binary(#[from] BinaryError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run every step for `config` and return the exit code to report.
pub fn run(host: &impl Host, config: &RunConfig, paths: &HostPaths) -> Result<i32, LaunchError> {
    let manager = PackageManager::detect(host);

    let outcome = if config.no_install {
        InstallOutcome::Skipped(SkipReason::NoInstallRequested)
    } else {
        let with_runtime_client = !has_compat_runtime(host, &paths.home);
        install_dependencies(host, manager, with_runtime_client)
    };
    report_install(&outcome);

    verify_binary(&config.binary)?;

    println!("{}", collect_status(host, paths, manager, &config.binary));
    probe_runners(host, &config.binary);

    if config.setup_only {
        println!("Setup complete; not launching a target (--setup-only)");
        return Ok(0);
    }

    let search = TargetSearch::for_host(paths);
    let target = resolve_target(config.target.as_deref(), &search)?;
    verify_target(&target)?;

    let invocation = run_invocation(config, &target);
    println!("Launching {}", target.display());
    let code = host.run(&invocation).map_err(|source| LaunchError::Spawn {
        binary: config.binary.display().to_string(),
        source,
    })?;

    if let Some(data_dir) = &paths.data_dir {
        let record = LaunchRecord {
            target,
            mode: config.mode,
            exit_code: code,
            timestamp: Utc::now(),
        };
        if let Err(err) = record_launch(data_dir, record) {
            tracing::warn!("could not record launch history: {err:#}");
        }
    }

    Ok(code)
}

fn report_install(outcome: &InstallOutcome) {
    match outcome {
        InstallOutcome::Installed {
            manager,
            optional_failures,
        } => {
            if optional_failures.is_empty() {
                tracing::info!("dependencies installed with {manager}");
            } else {
                tracing::info!(
                    "dependencies installed with {manager}; optional steps failed: {}",
                    optional_failures.join(", ")
                );
            }
        }
        InstallOutcome::Skipped(SkipReason::NoInstallRequested) => {
            tracing::debug!("dependency installation skipped (--no-install)");
        }
        InstallOutcome::Skipped(SkipReason::UnsupportedPackageManager) => {}
        InstallOutcome::Failed(err) => {
            tracing::warn!("dependency installation failed, continuing anyway: {err}");
        }
    }
}
