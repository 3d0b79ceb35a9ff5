use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use which::which;

/// A program plus its arguments, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run this invocation through `sudo -n` instead of directly.
    pub fn elevated(self) -> Self {
        let mut args = vec![OsString::from("-n"), self.program.into_os_string()];
        args.extend(self.args);
        Self {
            program: PathBuf::from("sudo"),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// The side effects the launcher needs from the machine it runs on.
pub trait Host {
    fn has_command(&self, name: &str) -> bool;
    fn is_root(&self) -> bool;
    /// Run to completion with inherited stdio and return the exit code.
    fn run(&self, invocation: &Invocation) -> io::Result<i32>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn has_command(&self, name: &str) -> bool {
        which(name).is_ok()
    }

    fn is_root(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn run(&self, invocation: &Invocation) -> io::Result<i32> {
        tracing::debug!("running {invocation}");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()?;
        Ok(exit_code(status))
    }
}

/// Exit code of a finished child, mapping death-by-signal to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::io;

    use super::{Host, Invocation};

    /// Records every invocation instead of spawning it.
    #[derive(Debug, Default)]
    pub struct FakeHost {
        pub commands: HashSet<String>,
        pub root: bool,
        /// Exit code keyed by the full rendered invocation; unknown ones exit 0.
        pub exit_codes: HashMap<String, i32>,
        pub calls: RefCell<Vec<Invocation>>,
    }

    impl FakeHost {
        pub fn with_commands(commands: &[&str]) -> Self {
            Self {
                commands: commands.iter().map(|c| c.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn fail(mut self, rendered: &str, code: i32) -> Self {
            self.exit_codes.insert(rendered.to_string(), code);
            self
        }

        pub fn rendered_calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.to_string()).collect()
        }
    }

    impl Host for FakeHost {
        fn has_command(&self, name: &str) -> bool {
            self.commands.contains(name)
        }

        fn is_root(&self) -> bool {
            self.root
        }

        fn run(&self, invocation: &Invocation) -> io::Result<i32> {
            self.calls.borrow_mut().push(invocation.clone());
            Ok(self
                .exit_codes
                .get(&invocation.to_string())
                .copied()
                .unwrap_or(0))
        }
    }
}
