//! Heuristic lookup for an installed Proton runtime.
//!
//! Used only to decide whether the Steam client is worth installing, so a
//! miss costs at most one redundant package install.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::Host;

const RUNTIME_COMMANDS: [&str; 2] = ["proton", "steam"];

/// `(directory relative to home, entry-name pattern)` pairs.
const HOME_GLOBS: [(&str, &str); 6] = [
    (".steam/steam/steamapps/common", "Proton*"),
    (".steam/root/compatibilitytools.d", "GE-Proton*"),
    (".steam/root/compatibilitytools.d", "Proton-GE*"),
    (".local/share/Steam/steamapps/common", "Proton*"),
    (".local/share/Steam/compatibilitytools.d", "GE-Proton*"),
    (".local/share/Steam/compatibilitytools.d", "Proton-GE*"),
];

const SYSTEM_GLOBS: [(&str, &str); 1] = [("/usr/share/steam/compatibilitytools.d", "*Proton*")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeLocation {
    Command(&'static str),
    Directory(PathBuf),
}

impl fmt::Display for RuntimeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeLocation::Command(name) => write!(f, "command '{name}'"),
            RuntimeLocation::Directory(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn locate_compat_runtime(host: &impl Host, home: &Path) -> Option<RuntimeLocation> {
    if let Some(name) = RUNTIME_COMMANDS.into_iter().find(|c| host.has_command(c)) {
        return Some(RuntimeLocation::Command(name));
    }

    let home_dirs = HOME_GLOBS
        .iter()
        .map(|(dir, pattern)| (home.join(dir), *pattern));
    let system_dirs = SYSTEM_GLOBS
        .iter()
        .map(|(dir, pattern)| (PathBuf::from(dir), *pattern));

    home_dirs
        .chain(system_dirs)
        .find_map(|(dir, pattern)| first_matching_dir(&dir, pattern))
        .map(RuntimeLocation::Directory)
}

pub fn has_compat_runtime(host: &impl Host, home: &Path) -> bool {
    locate_compat_runtime(host, home).is_some()
}

fn first_matching_dir(dir: &Path, pattern: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries.flatten().map(|e| e.path()).find(|path| {
        path.is_dir()
            && path
                .file_name()
                .map(|name| glob_matches(pattern, &name.to_string_lossy()))
                .unwrap_or(false)
    })
}

/// Minimal glob supporting `*` only, which is all the patterns above use.
fn glob_matches(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if !name.starts_with(first) || name.len() < first.len() + last.len() {
        return false;
    }
    let mut rest = &name[first.len()..];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(idx) => rest = &rest[idx + middle.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}
