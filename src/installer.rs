use serde::Serialize;
use thiserror::Error;

use crate::env_detect::PackageManager;
use crate::host::{Host, Invocation};

const APT_PACKAGES: &[&str] = &[
    "wine",
    "winetricks",
    "cabextract",
    "p7zip-full",
    "unzip",
    "curl",
    "ca-certificates",
];
const DNF_PACKAGES: &[&str] = &[
    "wine",
    "winetricks",
    "cabextract",
    "p7zip",
    "p7zip-plugins",
    "unzip",
    "curl",
    "ca-certificates",
];
const PACMAN_PACKAGES: &[&str] = &[
    "wine",
    "winetricks",
    "cabextract",
    "p7zip",
    "unzip",
    "curl",
    "ca-certificates",
];
const ZYPPER_PACKAGES: &[&str] = PACMAN_PACKAGES;

const COMPOSITOR_PACKAGE: &str = "gamescope";

#[derive(Debug, Serialize)]
pub struct InstallPlan {
    pub manager: PackageManager,
    pub steps: Vec<InstallStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallStep {
    pub description: String,
    pub command: String,
    /// Optional steps may fail without failing the plan.
    pub required: bool,
    #[serde(skip)]
    pub invocation: Invocation,
}

impl InstallStep {
    fn new(description: impl Into<String>, invocation: Invocation, required: bool) -> Self {
        Self {
            description: description.into(),
            command: invocation.to_string(),
            required,
            invocation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Already running as root.
    None,
    /// Prefix every command with `sudo -n`.
    Sudo,
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(
        "installing dependencies requires root privileges and passwordless sudo is unavailable; \
         re-run with `sudo` or pass --no-install"
    )]
    NeedsPrivileges,
    #[error("step '{description}' exited with status {code}")]
    StepFailed { description: String, code: i32 },
    #[error("step '{description}' could not be started: {source}")]
    Spawn {
        description: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoInstallRequested,
    UnsupportedPackageManager,
}

#[derive(Debug)]
pub enum InstallOutcome {
    Installed {
        manager: PackageManager,
        optional_failures: Vec<String>,
    },
    Skipped(SkipReason),
    Failed(InstallError),
}

/// Build the family-specific plan; `with_runtime_client` adds the Steam client.
pub fn plan_install(
    manager: PackageManager,
    elevation: Elevation,
    with_runtime_client: bool,
) -> InstallPlan {
    let wrap = |inv: Invocation| match elevation {
        Elevation::None => inv,
        Elevation::Sudo => inv.elevated(),
    };

    let (refresh, install, client_package): (Option<Invocation>, Invocation, &str) = match manager {
        PackageManager::Apt => (
            Some(Invocation::new("apt-get").arg("update")),
            Invocation::new("apt-get").args(["install", "-y"]),
            "steam-installer",
        ),
        PackageManager::Dnf => (None, Invocation::new("dnf").args(["install", "-y"]), "steam"),
        PackageManager::Pacman => (
            Some(Invocation::new("pacman").args(["-Sy", "--noconfirm"])),
            Invocation::new("pacman").args(["-S", "--needed", "--noconfirm"]),
            "steam",
        ),
        PackageManager::Zypper => (
            Some(Invocation::new("zypper").args(["--non-interactive", "refresh"])),
            Invocation::new("zypper").args(["--non-interactive", "install"]),
            "steam",
        ),
    };

    let packages = match manager {
        PackageManager::Apt => APT_PACKAGES,
        PackageManager::Dnf => DNF_PACKAGES,
        PackageManager::Pacman => PACMAN_PACKAGES,
        PackageManager::Zypper => ZYPPER_PACKAGES,
    };

    let mut steps = Vec::new();
    if let Some(refresh) = refresh {
        steps.push(InstallStep::new(
            format!("Refresh {manager} package indices"),
            wrap(refresh),
            true,
        ));
    }
    steps.push(InstallStep::new(
        "Install Wine runtime and tooling",
        wrap(install.clone().args(packages)),
        true,
    ));
    steps.push(InstallStep::new(
        "Install gamescope compositor (optional)",
        wrap(install.clone().arg(COMPOSITOR_PACKAGE)),
        false,
    ));
    if with_runtime_client {
        steps.push(InstallStep::new(
            "Install Steam client for Proton (optional)",
            wrap(install.arg(client_package)),
            false,
        ));
    }

    InstallPlan { manager, steps }
}

pub fn resolve_elevation(host: &impl Host) -> Result<Elevation, InstallError> {
    if host.is_root() {
        return Ok(Elevation::None);
    }

    if host.has_command("sudo") {
        let probe = Invocation::new("sudo").args(["-n", "true"]);
        if matches!(host.run(&probe), Ok(0)) {
            return Ok(Elevation::Sudo);
        }
    }

    Err(InstallError::NeedsPrivileges)
}

/// Best-effort dependency installation.
///
/// Never returns an error directly: every failure is folded into
/// [`InstallOutcome::Failed`] so callers can decide whether to continue.
pub fn install_dependencies(
    host: &impl Host,
    manager: Option<PackageManager>,
    with_runtime_client: bool,
) -> InstallOutcome {
    let Some(manager) = manager else {
        tracing::warn!(
            "no supported package manager found (apt, dnf, pacman, zypper); \
             install wine, winetricks, cabextract and p7zip manually"
        );
        return InstallOutcome::Skipped(SkipReason::UnsupportedPackageManager);
    };

    let elevation = match resolve_elevation(host) {
        Ok(elevation) => elevation,
        Err(err) => return InstallOutcome::Failed(err),
    };

    let plan = plan_install(manager, elevation, with_runtime_client);
    match serde_json::to_string(&plan) {
        Ok(json) => tracing::debug!("install plan: {json}"),
        Err(err) => tracing::debug!("install plan could not be serialized: {err}"),
    }
    match execute_plan(host, &plan) {
        Ok(optional_failures) => InstallOutcome::Installed {
            manager,
            optional_failures,
        },
        Err(err) => InstallOutcome::Failed(err),
    }
}

/// Run every step in order; returns descriptions of optional steps that failed.
pub fn execute_plan(host: &impl Host, plan: &InstallPlan) -> Result<Vec<String>, InstallError> {
    println!(
        "Installing dependencies with {} ({} steps)",
        plan.manager,
        plan.steps.len()
    );

    let mut optional_failures = Vec::new();
    for (idx, step) in plan.steps.iter().enumerate() {
        println!("==> [{}/{}] {}", idx + 1, plan.steps.len(), step.description);

        let error = match host.run(&step.invocation) {
            Ok(0) => continue,
            Ok(code) => InstallError::StepFailed {
                description: step.description.clone(),
                code,
            },
            Err(source) => InstallError::Spawn {
                description: step.description.clone(),
                source,
            },
        };

        if step.required {
            return Err(error);
        }
        tracing::warn!("{error}; continuing");
        optional_failures.push(step.description.clone());
    }

    Ok(optional_failures)
}
