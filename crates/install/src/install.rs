//! The installation view and its load operations.
//!
//! Every field starts out absent and is filled by its own `load_*` call.
//! Loads can be repeated; a successful load replaces the field and a failed
//! one leaves it untouched. Ordering between loads is the caller's job:
//! operations that need earlier state return [`SteamError::Precondition`]
//! instead of guessing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use steamconfig_vdf::{AppInfoRecord, Node, Section, ShortcutRecord, appinfo, shortcuts, text};

use crate::SteamError;
use crate::categories::{Categories, extract_categories};
use crate::library::{merge_app_manifests, select_library_folders};
use crate::paths::{PathKind, Paths};
use crate::users::{ActiveUser, select_active_user};

/// Parsed configuration of one Steam installation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationView {
    root: Option<PathBuf>,
    registry: Option<Section>,
    config: Option<Section>,
    login_users: Option<Section>,
    active_user: Option<ActiveUser>,
    library_folders: Option<Vec<PathBuf>>,
    app_manifests: Option<Vec<Section>>,
    app_info: Option<Vec<AppInfoRecord>>,
    shared_config: Option<Section>,
    local_config: Option<Section>,
    shortcuts: Option<Vec<ShortcutRecord>>,
}

impl InstallationView {
    /// Creates an empty view with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the installation root. The directory must exist.
    pub fn set_install_path(&mut self, dir: impl AsRef<Path>) -> Result<(), SteamError> {
        let dir = dir.as_ref();
        let meta = fs::metadata(dir).map_err(|e| SteamError::io(dir, e))?;
        if !meta.is_dir() {
            return Err(SteamError::InvalidValue(format!(
                "install path {} is not a directory",
                dir.display()
            )));
        }
        self.root = Some(dir.to_path_buf());
        Ok(())
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn registry(&self) -> Option<&Section> {
        self.registry.as_ref()
    }

    pub fn config(&self) -> Option<&Section> {
        self.config.as_ref()
    }

    /// SteamID64 -> login record, from loginusers.vdf.
    pub fn login_users(&self) -> Option<&Section> {
        self.login_users.as_ref()
    }

    pub fn active_user(&self) -> Option<&ActiveUser> {
        self.active_user.as_ref()
    }

    pub fn library_folders(&self) -> Option<&[PathBuf]> {
        self.library_folders.as_deref()
    }

    pub fn app_manifests(&self) -> Option<&[Section]> {
        self.app_manifests.as_deref()
    }

    pub fn app_info(&self) -> Option<&[AppInfoRecord]> {
        self.app_info.as_deref()
    }

    pub fn shared_config(&self) -> Option<&Section> {
        self.shared_config.as_ref()
    }

    pub fn local_config(&self) -> Option<&Section> {
        self.local_config.as_ref()
    }

    pub fn shortcuts(&self) -> Option<&[ShortcutRecord]> {
        self.shortcuts.as_deref()
    }

    fn paths(&self) -> Result<Paths, SteamError> {
        self.root
            .as_ref()
            .map(Paths::with_base)
            .ok_or(SteamError::Precondition("install path must be set first"))
    }

    fn account_id(&self) -> Result<String, SteamError> {
        self.active_user
            .as_ref()
            .map(ActiveUser::account_id_string)
            .ok_or(SteamError::Precondition("an active user must be selected first"))
    }

    /// Returns the location of a well-known directory or per-user file.
    pub fn path_to(&self, kind: PathKind) -> Result<PathBuf, SteamError> {
        let paths = self.paths()?;
        let account_id = if kind.is_per_user() {
            Some(self.account_id()?)
        } else {
            None
        };
        paths
            .resolve(kind, account_id.as_deref())
            .ok_or(SteamError::Precondition("an active user must be selected first"))
    }

    pub fn load_registry(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.registry_path();
        self.registry = Some(load_text_vdf(&path)?);
        Ok(())
    }

    pub fn load_config(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.config_path();
        self.config = Some(load_text_vdf(&path)?);
        Ok(())
    }

    pub fn load_login_users(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.login_users_path();
        let root = load_text_vdf(&path)?;
        let users = child_section(&root, "users", &path)?;
        tracing::debug!(path = %path.display(), users = users.len(), "loaded login users");
        self.login_users = Some(users);
        Ok(())
    }

    /// Selects the active user from the loaded registry and login users.
    ///
    /// No matching user leaves the active user absent; that is not an error.
    pub fn set_user(&mut self) -> Result<(), SteamError> {
        let login_users = self
            .login_users
            .as_ref()
            .ok_or(SteamError::Precondition("login users must be loaded first"))?;
        let registry = self
            .registry
            .as_ref()
            .ok_or(SteamError::Precondition("registry must be loaded first"))?;

        let user = select_active_user(login_users, registry)?;
        match &user {
            Some(u) => tracing::debug!(account_id = u.account_id, "selected active user"),
            None => tracing::debug!("no login user matches the auto-login account"),
        }
        self.active_user = user;
        Ok(())
    }

    pub fn load_library_folders(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.library_folders_path();
        let root = load_text_vdf(&path)?;
        let folders = select_library_folders(&child_section(&root, "LibraryFolders", &path)?);
        tracing::debug!(
            path = %path.display(),
            libraries = folders.len(),
            "loaded library folders"
        );
        self.library_folders = Some(folders);
        Ok(())
    }

    /// Merges the manifests of every library folder, then of the root.
    ///
    /// A library entry equal to the root is skipped so the root is read
    /// once; current libraryfolders.vdf files list it as library "0".
    pub fn load_steam_apps(&mut self) -> Result<(), SteamError> {
        let paths = self.paths()?;
        let folders = self.library_folders.as_ref().ok_or(SteamError::Precondition(
            "library folders must be loaded before app manifests",
        ))?;

        let libraries: Vec<PathBuf> = folders
            .iter()
            .filter(|lib| lib.as_path() != paths.base_dir())
            .cloned()
            .collect();
        let apps = merge_app_manifests(&libraries, paths.base_dir())?;
        tracing::debug!(
            apps = apps.len(),
            libraries = libraries.len() + 1,
            "loaded app manifests"
        );
        self.app_manifests = Some(apps);
        Ok(())
    }

    pub fn load_app_info(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.app_info_path();
        let records = appinfo::load_app_info(&path).map_err(|e| SteamError::vdf(&path, e))?;
        tracing::debug!(path = %path.display(), records = records.len(), "loaded appinfo");
        self.app_info = Some(records);
        Ok(())
    }

    pub fn load_shared_config(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.shared_config_path(&self.account_id()?);
        self.shared_config = Some(load_text_vdf(&path)?);
        Ok(())
    }

    pub fn load_local_config(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.local_config_path(&self.account_id()?);
        self.local_config = Some(load_text_vdf(&path)?);
        Ok(())
    }

    /// Loads the active user's non-Steam shortcuts.
    ///
    /// Shortcuts are optional: a missing or unreadable shortcuts.vdf yields
    /// an empty list. Missing preconditions are still errors.
    pub fn load_shortcuts(&mut self) -> Result<(), SteamError> {
        let path = self.paths()?.shortcuts_path(&self.account_id()?);
        let records = match shortcuts::load_shortcuts(&path) {
            Ok(records) => records,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no usable shortcuts file");
                Vec::new()
            }
        };
        self.shortcuts = Some(records);
        Ok(())
    }

    /// Categories from the loaded sharedconfig.vdf.
    pub fn categories(&self) -> Result<Categories, SteamError> {
        self.shared_config
            .as_ref()
            .map(extract_categories)
            .ok_or(SteamError::Precondition("shared config must be loaded first"))
    }
}

/// Reads and parses a text VDF file, attaching the path to any error.
pub fn load_text_vdf(path: &Path) -> Result<Section, SteamError> {
    let data = fs::read(path).map_err(|e| SteamError::io(path, e))?;
    let section = text::parse(&data).map_err(|e| SteamError::vdf(path, e))?;
    tracing::debug!(path = %path.display(), "loaded text vdf");
    Ok(section)
}

/// Writes a section to `path` in the text format.
///
/// Only the first top-level section survives a later [`load_text_vdf`], so
/// `section` should have a single root key.
pub fn save_text_vdf(path: &Path, section: &Section) -> Result<(), SteamError> {
    text::save(path, section).map_err(|e| SteamError::vdf(path, e))
}

/// Takes the named top-level section out of a parsed file.
fn child_section(root: &Section, key: &str, path: &Path) -> Result<Section, SteamError> {
    root.get_ci(key)
        .and_then(Node::as_section)
        .cloned()
        .ok_or_else(|| SteamError::MissingKey {
            path: path.to_path_buf(),
            key: key.to_owned(),
        })
}
