//! Library folders and the installed-app manifests they hold.

use std::fs;
use std::path::{Path, PathBuf};

use steamconfig_vdf::{Node, Section, text};

use crate::SteamError;
use crate::paths::steamapps_dir;

/// Entries of the `LibraryFolders` section that are metadata, not paths.
/// Matched ignoring ASCII case.
pub const RESERVED_LIBRARY_KEYS: &[&str] = &["TimeNextStatsReport", "ContentStatsID"];

const MANIFEST_EXTENSION: &str = "acf";

/// Returns the library paths listed in a `LibraryFolders` section, in
/// section order.
///
/// Plain string entries are paths. Section entries (the layout Steam has
/// written since 2021) contribute their `path` value; those without one are
/// skipped.
pub fn select_library_folders(library_folders: &Section) -> Vec<PathBuf> {
    library_folders
        .iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .filter_map(|(_, node)| match node {
            Node::Section(entry) => entry.get_ci("path").and_then(Node::as_str),
            other => other.as_str(),
        })
        .map(PathBuf::from)
        .collect()
}

fn is_reserved_key(key: &str) -> bool {
    RESERVED_LIBRARY_KEYS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(key))
}

/// Parses every `*.acf` manifest of each library, then of `steam_root`.
///
/// Libraries are visited in order and the root last; within one library,
/// manifests are read in file-name order. Each result is the manifest's
/// `AppState` section. The same app id appearing in two libraries is kept
/// twice.
pub fn merge_app_manifests(
    libraries: &[PathBuf],
    steam_root: &Path,
) -> Result<Vec<Section>, SteamError> {
    let mut apps = Vec::new();
    for library in libraries
        .iter()
        .map(PathBuf::as_path)
        .chain(std::iter::once(steam_root))
    {
        for path in manifest_files(library)? {
            apps.push(load_manifest(&path)?);
        }
    }
    Ok(apps)
}

/// Lists the manifest files in a library's `steamapps` directory.
fn manifest_files(library: &Path) -> Result<Vec<PathBuf>, SteamError> {
    let dir = steamapps_dir(library);
    let entries = fs::read_dir(&dir).map_err(|e| SteamError::io(&dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SteamError::io(&dir, e))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_manifest(path: &Path) -> Result<Section, SteamError> {
    let data = fs::read(path).map_err(|e| SteamError::io(path, e))?;
    let root = text::parse(&data).map_err(|e| SteamError::vdf(path, e))?;
    root.get_ci("AppState")
        .and_then(Node::as_section)
        .cloned()
        .ok_or_else(|| SteamError::MissingKey {
            path: path.to_path_buf(),
            key: "AppState".into(),
        })
}
