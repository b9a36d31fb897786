use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("no command given, expected one of build, run, detect or release")]
    Missing,

    #[error("unknown command {0:?}, expected one of build, run, detect or release")]
    Unknown(String),
}

/// Procedure requested by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Build,
    Run,
    Detect,
    Release,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "build" => Some(Command::Build),
            "run" => Some(Command::Run),
            "detect" => Some(Command::Detect),
            "release" => Some(Command::Release),
            _ => None,
        }
    }

    /// Splits the process arguments into the command and its own arguments.
    ///
    /// The peer executes `bin/build`, `bin/run` and so on, usually links to a
    /// single binary, so the program name selects the command. When it does
    /// not, the first argument does: `k8scc-launcher build <args>`.
    pub fn parse(mut args: Vec<String>) -> Result<(Self, Vec<String>), CommandError> {
        if args.is_empty() {
            return Err(CommandError::Missing);
        }

        let program = args.remove(0);
        let program_name = Path::new(&program)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if let Some(command) = Self::from_name(program_name) {
            return Ok((command, args));
        }

        if args.is_empty() {
            return Err(CommandError::Missing);
        }
        let name = args.remove(0);
        let command = Self::from_name(&name).ok_or(CommandError::Unknown(name))?;

        Ok((command, args))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Build => "build",
            Command::Run => "run",
            Command::Detect => "detect",
            Command::Release => "release",
        };

        f.write_str(name)
    }
}
