// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::path::PathBuf;

/// Errors raised by the pipeline stages.
///
/// Every kind is fatal: it is detected synchronously at the point of use,
/// aborts the run, and is never retried. Artifacts written by earlier stages
/// are left in place; a failed run requires a clean rebuild of derived
/// outputs.
#[derive(Debug)]
pub enum Error {
    /// A required input file does not exist.
    MissingFile(PathBuf),
    /// A manifest is missing a required field or failed validation.
    MalformedManifest {
        path: Option<PathBuf>,
        detail: String,
    },
    /// An instance or topology directive names a module with no entry in the
    /// config store.
    UnknownModuleReference {
        module: String,
        referenced_by: String,
    },
    /// A port declaration uses a feature outside the supported subset, such
    /// as an `inout` direction.
    UnsupportedPort {
        module: String,
        port: String,
        detail: String,
    },
    /// One net name was allocated at two different widths, which would
    /// mis-wire the design.
    NetWidthConflict { net: String, widths: (usize, usize) },
    /// An underlying I/O failure.
    Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn manifest(detail: impl Into<String>) -> Error {
        Error::MalformedManifest {
            path: None,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingFile(path) => write!(f, "missing input file: {}", path.display()),
            Error::MalformedManifest {
                path: Some(path),
                detail,
            } => {
                write!(f, "malformed manifest {}: {}", path.display(), detail)
            }
            Error::MalformedManifest { path: None, detail } => {
                write!(f, "malformed manifest: {detail}")
            }
            Error::UnknownModuleReference {
                module,
                referenced_by,
            } => {
                write!(f, "unknown module '{module}' referenced by {referenced_by}")
            }
            Error::UnsupportedPort {
                module,
                port,
                detail,
            } => {
                write!(f, "unsupported port {module}.{port}: {detail}")
            }
            Error::NetWidthConflict { net, widths } => {
                write!(
                    f,
                    "net '{net}' allocated at conflicting widths {} and {}",
                    widths.0, widths.1
                )
            }
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
