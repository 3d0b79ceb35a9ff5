use std::fmt;
use std::path::{Path, PathBuf};

use crate::dispatch::probe_invocation;
use crate::env_detect::{HostPaths, PackageManager, os_description};
use crate::history::{LaunchRecord, load_history};
use crate::host::Host;
use crate::runtime_detect::{RuntimeLocation, locate_compat_runtime};

const TOOLS: [&str; 6] = ["wine", "winetricks", "cabextract", "7z", "gamescope", "steam"];

#[derive(Debug)]
pub struct StatusReport {
    pub os: String,
    pub package_manager: Option<PackageManager>,
    pub tools: Vec<(&'static str, bool)>,
    pub runtime: Option<RuntimeLocation>,
    pub binary: PathBuf,
    pub last_launch: Option<LaunchRecord>,
}

pub fn collect_status(
    host: &impl Host,
    paths: &HostPaths,
    package_manager: Option<PackageManager>,
    binary: &Path,
) -> StatusReport {
    let last_launch = paths.data_dir.as_deref().and_then(|dir| {
        load_history(dir)
            .map_err(|err| tracing::warn!("ignoring launch history: {err:#}"))
            .ok()
            .and_then(|history| history.last().cloned())
    });

    StatusReport {
        os: os_description(),
        package_manager,
        tools: TOOLS
            .into_iter()
            .map(|tool| (tool, host.has_command(tool)))
            .collect(),
        runtime: locate_compat_runtime(host, &paths.home),
        binary: binary.to_path_buf(),
        last_launch,
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Host: {}", self.os)?;
        match self.package_manager {
            Some(pm) => writeln!(f, "Package manager: {pm}")?,
            None => writeln!(f, "Package manager: unsupported")?,
        }

        writeln!(f, "Tools:")?;
        let width = self.tools.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, found) in &self.tools {
            let state = if *found { "found" } else { "missing" };
            writeln!(f, "  {name:<width$}  {state}")?;
        }

        match &self.runtime {
            Some(location) => writeln!(f, "Proton runtime: detected ({location})")?,
            None => writeln!(f, "Proton runtime: not detected")?,
        }
        writeln!(f, "External binary: {}", self.binary.display())?;

        if let Some(last) = &self.last_launch {
            write!(
                f,
                "Last launch: {} ({}, exit {}) at {}",
                last.target.display(),
                last.mode,
                last.exit_code,
                last.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            )?;
        } else {
            write!(f, "Last launch: none")?;
        }
        Ok(())
    }
}

/// Run `<binary> inspect runners --json`; failures are logged, never fatal.
pub fn probe_runners(host: &impl Host, binary: &Path) -> bool {
    println!("Runner status:");
    match host.run(&probe_invocation(binary)) {
        Ok(0) => true,
        Ok(code) => {
            tracing::warn!("runner probe exited with status {code}; continuing");
            false
        }
        Err(err) => {
            tracing::warn!("runner probe could not be started: {err}; continuing");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{collect_status, probe_runners};
    use crate::config::Mode;
    use crate::env_detect::{HostPaths, PackageManager};
    use crate::history::{LaunchRecord, record_launch};
    use crate::host::testing::FakeHost;

    fn paths(root: &std::path::Path) -> HostPaths {
        HostPaths {
            home: root.join("home"),
            wine_prefix: root.join("home/.wine"),
            data_dir: Some(root.join("data")),
        }
    }

    #[test]
    fn report_lists_tools_and_last_launch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        record_launch(
            paths.data_dir.as_deref().unwrap(),
            LaunchRecord {
                target: "/tmp/app.exe".into(),
                mode: Mode::Install,
                exit_code: 2,
                timestamp: Utc::now(),
            },
        )
        .unwrap();

        let host = FakeHost::with_commands(&["wine", "7z"]);
        let report = collect_status(
            &host,
            &paths,
            Some(PackageManager::Pacman),
            "/opt/w2l".as_ref(),
        );
        let text = report.to_string();

        assert!(text.contains("Package manager: pacman"));
        assert!(text.contains("wine        found"));
        assert!(text.contains("winetricks  missing"));
        assert!(text.contains("Proton runtime: "));
        assert!(text.contains("Last launch: /tmp/app.exe (install, exit 2)"));
    }

    #[test]
    fn failing_probe_is_tolerated() {
        let host = FakeHost::default().fail("w2l inspect runners --json", 3);
        assert!(!probe_runners(&host, "w2l".as_ref()));
        assert_eq!(host.rendered_calls(), vec!["w2l inspect runners --json"]);
    }
}
