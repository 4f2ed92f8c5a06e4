use std::path::{Path, PathBuf};

/// Well-known locations inside a Steam installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// `appcache/`, home of appinfo.vdf.
    AppInfo,
    /// `appcache/`, home of packageinfo.vdf.
    PackageInfo,
    /// `config/`, home of config.vdf.
    Config,
    /// `config/`, home of loginusers.vdf.
    LoginUsers,
    /// `steamapps/` of the installation root.
    SteamApps,
    /// Per-user `7/remote/sharedconfig.vdf`.
    SharedConfig,
    /// Per-user `config/localconfig.vdf`.
    LocalConfig,
    /// Per-user `config/shortcuts.vdf`.
    Shortcuts,
}

impl PathKind {
    /// Returns true for locations under `userdata/<account id>`.
    pub fn is_per_user(&self) -> bool {
        matches!(
            self,
            PathKind::SharedConfig | PathKind::LocalConfig | PathKind::Shortcuts
        )
    }
}

/// Provides access to Steam directory paths under one installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Creates a new `Paths` instance rooted at `base_dir`.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the Steam base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.base_dir.join("registry.vdf")
    }

    /// Returns the installation-wide config directory.
    pub fn config_dir(&self) -> PathBuf {
        self.base_dir.join("config")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("config.vdf")
    }

    pub fn login_users_path(&self) -> PathBuf {
        self.config_dir().join("loginusers.vdf")
    }

    pub fn app_cache_dir(&self) -> PathBuf {
        self.base_dir.join("appcache")
    }

    pub fn app_info_path(&self) -> PathBuf {
        self.app_cache_dir().join("appinfo.vdf")
    }

    pub fn steamapps_dir(&self) -> PathBuf {
        steamapps_dir(&self.base_dir)
    }

    pub fn library_folders_path(&self) -> PathBuf {
        self.steamapps_dir().join("libraryfolders.vdf")
    }

    /// Returns the userdata directory.
    pub fn user_data_dir(&self) -> PathBuf {
        self.base_dir.join("userdata")
    }

    /// Returns the directory for a specific account id.
    pub fn user_dir(&self, account_id: &str) -> PathBuf {
        self.user_data_dir().join(account_id)
    }

    /// Returns the config directory for a user.
    pub fn user_config_dir(&self, account_id: &str) -> PathBuf {
        self.user_dir(account_id).join("config")
    }

    pub fn shared_config_path(&self, account_id: &str) -> PathBuf {
        self.user_dir(account_id)
            .join("7")
            .join("remote")
            .join("sharedconfig.vdf")
    }

    pub fn local_config_path(&self, account_id: &str) -> PathBuf {
        self.user_config_dir(account_id).join("localconfig.vdf")
    }

    /// Returns the path to shortcuts.vdf for a user.
    pub fn shortcuts_path(&self, account_id: &str) -> PathBuf {
        self.user_config_dir(account_id).join("shortcuts.vdf")
    }

    /// Resolves a [`PathKind`]. Per-user kinds need an account id and yield
    /// `None` without one.
    pub fn resolve(&self, kind: PathKind, account_id: Option<&str>) -> Option<PathBuf> {
        let path = match kind {
            PathKind::AppInfo | PathKind::PackageInfo => self.app_cache_dir(),
            PathKind::Config | PathKind::LoginUsers => self.config_dir(),
            PathKind::SteamApps => self.steamapps_dir(),
            PathKind::SharedConfig => self.shared_config_path(account_id?),
            PathKind::LocalConfig => self.local_config_path(account_id?),
            PathKind::Shortcuts => self.shortcuts_path(account_id?),
        };
        Some(path)
    }
}

/// Returns the `steamapps` directory of a library folder.
pub fn steamapps_dir(library: &Path) -> PathBuf {
    library.join("steamapps")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_with_base() {
        let paths = Paths::with_base("/tmp/steam");
        assert_eq!(paths.base_dir(), Path::new("/tmp/steam"));
        assert_eq!(paths.user_data_dir(), PathBuf::from("/tmp/steam/userdata"));
        assert_eq!(
            paths.registry_path(),
            PathBuf::from("/tmp/steam/registry.vdf")
        );
    }

    #[test]
    fn installation_files() {
        let paths = Paths::with_base("/steam");
        assert_eq!(
            paths.login_users_path(),
            PathBuf::from("/steam/config/loginusers.vdf")
        );
        assert_eq!(paths.config_path(), PathBuf::from("/steam/config/config.vdf"));
        assert_eq!(
            paths.library_folders_path(),
            PathBuf::from("/steam/steamapps/libraryfolders.vdf")
        );
        assert_eq!(
            paths.app_info_path(),
            PathBuf::from("/steam/appcache/appinfo.vdf")
        );
    }

    #[test]
    fn user_dir_structure() {
        let paths = Paths::with_base("/steam");
        assert_eq!(
            paths.user_dir("12345"),
            PathBuf::from("/steam/userdata/12345")
        );
        assert_eq!(
            paths.shared_config_path("12345"),
            PathBuf::from("/steam/userdata/12345/7/remote/sharedconfig.vdf")
        );
        assert_eq!(
            paths.local_config_path("12345"),
            PathBuf::from("/steam/userdata/12345/config/localconfig.vdf")
        );
        assert_eq!(
            paths.shortcuts_path("12345"),
            PathBuf::from("/steam/userdata/12345/config/shortcuts.vdf")
        );
    }

    #[test]
    fn resolve_kinds() {
        let paths = Paths::with_base("/steam");
        assert_eq!(
            paths.resolve(PathKind::PackageInfo, None),
            Some(PathBuf::from("/steam/appcache"))
        );
        assert_eq!(
            paths.resolve(PathKind::LoginUsers, None),
            Some(PathBuf::from("/steam/config"))
        );
        assert_eq!(
            paths.resolve(PathKind::SteamApps, None),
            Some(PathBuf::from("/steam/steamapps"))
        );
        for kind in [
            PathKind::SharedConfig,
            PathKind::LocalConfig,
            PathKind::Shortcuts,
        ] {
            assert!(kind.is_per_user());
            assert_eq!(paths.resolve(kind, None), None, "{kind:?}");
            assert!(paths.resolve(kind, Some("7")).is_some());
        }
    }
}
