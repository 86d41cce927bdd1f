//! Request resolution errors
//!
//! One variant per fallible step. Every variant is request-scoped and
//! reported to the client as 404 with the variant's message.

use hyper::StatusCode;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Path is empty or does not start with a known verb
    #[error("Unknown route: {path}")]
    UnknownRoute { path: String },

    /// `PKG` without a package name or without a file below it
    #[error("Not enough information supplied: {path}")]
    InsufficientArguments { path: String },

    /// The lookup service does not know the package
    #[error("Resource not found: {package}")]
    PackageNotFound { package: String },

    /// Target missing, unreadable, or not a regular file
    #[error("Requested file not found: {path}")]
    FileNotFound { path: String, target: PathBuf },

    /// Target resolves outside the package directory. The client sees the
    /// same message as for a missing file.
    #[error("Requested file not found: {path}")]
    OutsidePackage { path: String, target: PathBuf },

    /// Any other I/O failure once the file was opened
    #[error("File Not Found: {path}")]
    GenericIo {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    pub const fn status(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }

    /// Short identifier for log lines
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownRoute { .. } => "unknown_route",
            Self::InsufficientArguments { .. } => "insufficient_arguments",
            Self::PackageNotFound { .. } => "package_not_found",
            Self::FileNotFound { .. } => "file_not_found",
            Self::OutsidePackage { .. } => "outside_package",
            Self::GenericIo { .. } => "io_failure",
        }
    }

    /// Filesystem path the request resolved to, when it got that far
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound { target, .. } | Self::OutsidePackage { target, .. } => {
                Some(target.as_path())
            }
            _ => None,
        }
    }

    /// Attempts to leave a package directory are worth a warning
    pub const fn is_suspicious(&self) -> bool {
        matches!(self, Self::OutsidePackage { .. })
    }
}
