//! Consistent view over the configuration files of a Steam installation.
//!
//! [`InstallationView`] holds each parsed file as an optional field that a
//! dedicated `load_*` call fills in. The resolver functions it builds on
//! ([`select_library_folders`], [`select_active_user`],
//! [`merge_app_manifests`], [`extract_categories`]) take their inputs as
//! explicit parameters and can be used on their own.

pub mod categories;
pub mod install;
pub mod library;
pub mod paths;
pub mod users;

use std::path::PathBuf;

use steamconfig_vdf::VdfError;

// Re-export primary types.
pub use categories::{Categories, extract_categories};
pub use install::{InstallationView, load_text_vdf, save_text_vdf};
pub use library::{RESERVED_LIBRARY_KEYS, merge_app_manifests, select_library_folders};
pub use paths::{PathKind, Paths};
pub use users::{ActiveUser, account_id_from_steam_id64, list_user_ids, select_active_user};

/// Errors for Steam installation operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to parse {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: VdfError,
    },

    #[error("{} has no '{key}'", path.display())]
    MissingKey { path: PathBuf, key: String },

    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SteamError {
    /// Maps an I/O failure on `path`, turning a missing file into `NotFound`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            SteamError::NotFound(path)
        } else {
            SteamError::Io { path, source }
        }
    }

    /// Attaches `path` to a codec error, unwrapping codec-level I/O.
    pub(crate) fn vdf(path: impl Into<PathBuf>, source: VdfError) -> Self {
        match source {
            VdfError::Io(e) => SteamError::io(path, e),
            source => SteamError::Format {
                path: path.into(),
                source,
            },
        }
    }

    /// Returns true for errors caused by file contents rather than access.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            SteamError::Format { .. } | SteamError::MissingKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = SteamError::io(
            "/steam/registry.vdf",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, SteamError::NotFound(p) if p == PathBuf::from("/steam/registry.vdf")));

        let err = SteamError::io(
            "/steam/registry.vdf",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, SteamError::Io { .. }));
    }

    #[test]
    fn vdf_errors_carry_path() {
        let err = SteamError::vdf(
            "/steam/config/config.vdf",
            VdfError::Syntax {
                line: 3,
                message: "unmatched '}'".into(),
            },
        );
        assert!(err.is_format_error());
        assert_eq!(
            err.to_string(),
            "failed to parse /steam/config/config.vdf: syntax error on line 3: unmatched '}'"
        );

        let err = SteamError::vdf(
            "/x",
            VdfError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
        );
        assert!(matches!(err, SteamError::NotFound(_)));
    }
}
