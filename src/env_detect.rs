use std::fmt;
use std::path::PathBuf;

use anyhow::anyhow;
use serde::Serialize;
use sysinfo::System;

use crate::host::Host;

/// Package-manager families the installer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Apt,
    Dnf,
    Pacman,
    Zypper,
}

impl PackageManager {
    /// Probe order; the first family whose command exists wins.
    pub const PRIORITY: [PackageManager; 4] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Pacman,
        PackageManager::Zypper,
    ];

    pub fn command(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
        }
    }

    pub fn detect(host: &impl Host) -> Option<PackageManager> {
        Self::PRIORITY
            .into_iter()
            .find(|pm| host.has_command(pm.command()))
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
        };
        f.write_str(name)
    }
}

/// Filesystem locations the launcher reads from or writes to.
#[derive(Debug, Clone)]
pub struct HostPaths {
    pub home: PathBuf,
    pub wine_prefix: PathBuf,
    /// Where launch history lives; `None` disables recording.
    pub data_dir: Option<PathBuf>,
}

impl HostPaths {
    pub fn detect() -> anyhow::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
        let wine_prefix = std::env::var_os("WINEPREFIX")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".wine"));
        let data_dir = dirs::data_dir().map(|d| d.join("window2linux"));

        Ok(Self {
            home,
            wine_prefix,
            data_dir,
        })
    }

    pub fn drive_c(&self) -> PathBuf {
        self.wine_prefix.join("drive_c")
    }
}

pub fn os_description() -> String {
    System::long_os_version()
        .or_else(System::os_version)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::{HostPaths, PackageManager};
    use crate::host::testing::FakeHost;

    #[test]
    fn detects_first_manager_in_priority_order() {
        let host = FakeHost::with_commands(&["zypper", "pacman", "dnf"]);
        assert_eq!(PackageManager::detect(&host), Some(PackageManager::Dnf));
    }

    #[test]
    fn detects_nothing_on_unknown_distro() {
        let host = FakeHost::with_commands(&["apk", "emerge"]);
        assert_eq!(PackageManager::detect(&host), None);
    }

    #[test]
    fn drive_c_sits_under_prefix() {
        let paths = HostPaths {
            home: "/home/u".into(),
            wine_prefix: "/home/u/.wine".into(),
            data_dir: None,
        };
        assert_eq!(paths.drive_c(), std::path::Path::new("/home/u/.wine/drive_c"));
    }
}
