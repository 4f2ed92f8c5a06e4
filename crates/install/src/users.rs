use std::fs;

use serde::Serialize;
use steamconfig_vdf::{Node, Section};

use crate::SteamError;
use crate::paths::Paths;

/// Registry path of the account name Steam logs in automatically.
const AUTO_LOGIN_PATH: &[&str] = &[
    "Registry",
    "HKCU",
    "Software",
    "Valve",
    "Steam",
    "AutoLoginUser",
];

/// The login record selected as the current user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    /// SteamID64, the record's key in loginusers.vdf.
    pub steam_id: u64,
    /// Low 32 bits of the SteamID64; names the `userdata/<id>` directory.
    pub account_id: u32,
    /// Copy of the loginusers.vdf record (`AccountName`, `PersonaName`, ...).
    pub record: Section,
}

impl ActiveUser {
    /// Account id as the decimal string used in userdata paths.
    pub fn account_id_string(&self) -> String {
        self.account_id.to_string()
    }

    pub fn account_name(&self) -> Option<&str> {
        self.record.get_str("AccountName")
    }
}

/// Extracts the account id from a SteamID64.
pub fn account_id_from_steam_id64(steam_id: u64) -> u32 {
    (steam_id & 0xffff_ffff) as u32
}

/// Picks the login record whose `AccountName` equals the registry's
/// auto-login user. With several matches the last record in file order is
/// used.
///
/// `login_users` is the `users` section of loginusers.vdf; `registry` is
/// the parsed registry.vdf. No auto-login entry or no matching record yields
/// `Ok(None)`.
pub fn select_active_user(
    login_users: &Section,
    registry: &Section,
) -> Result<Option<ActiveUser>, SteamError> {
    let Some(auto_login) = registry.get_path_ci(AUTO_LOGIN_PATH).and_then(Node::as_str) else {
        return Ok(None);
    };

    // Several records can share an account name; the last one wins.
    let matched = login_users
        .iter()
        .filter_map(|(key, node)| {
            let record = node.as_section()?;
            (record.get_str("AccountName") == Some(auto_login)).then_some((key, record))
        })
        .last();
    let Some((key, record)) = matched else {
        return Ok(None);
    };

    let steam_id: u64 = key.parse().map_err(|e| {
        SteamError::InvalidValue(format!("login user key '{key}' is not a SteamID64: {e}"))
    })?;

    Ok(Some(ActiveUser {
        steam_id,
        account_id: account_id_from_steam_id64(steam_id),
        record: record.clone(),
    }))
}

/// Returns the account ids that have a userdata directory, ascending.
pub fn list_user_ids(paths: &Paths) -> Result<Vec<u32>, SteamError> {
    let user_data_dir = paths.user_data_dir();

    let entries =
        fs::read_dir(&user_data_dir).map_err(|e| SteamError::io(&user_data_dir, e))?;

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SteamError::io(&user_data_dir, e))?;

        if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }

        // Verify it's a numeric account id
        let Ok(id) = entry.file_name().to_string_lossy().parse::<u32>() else {
            continue;
        };

        // Skip "0" directory — temporary Steam directory, not a real user
        if id == 0 {
            continue;
        }

        ids.push(id);
    }
    ids.sort_unstable();

    Ok(ids)
}
