//! `userdata/<id>/config/shortcuts.vdf`: non-Steam shortcuts.
//!
//! The file is a binary KV tree with one root section, `shortcuts`, whose
//! children are keyed "0", "1", ... Each child is decoded into a typed
//! [`ShortcutRecord`]:
//!
//! - numeric-keyed sub-sections (`tags`) become real sequences,
//! - `LastPlayTime` becomes a timestamp,
//! - 0/1 flags become booleans.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::Serialize;

use crate::VdfError;
use crate::binary;
use crate::node::{Node, Scalar, Section};

/// Keys holding epoch seconds.
const DATE_FIELDS: &[&str] = &["LastPlayTime"];

/// A non-Steam game shortcut.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutRecord {
    /// Position key in the file ("0", "1", ...).
    pub index: String,
    pub app_id: u32,
    pub app_name: String,
    pub exe: String,
    pub start_dir: String,
    pub icon: String,
    pub shortcut_path: String,
    pub launch_options: String,
    pub is_hidden: bool,
    pub allow_desktop_config: bool,
    pub allow_overlay: bool,
    pub open_vr: bool,
    pub devkit: bool,
    pub devkit_game_id: String,
    pub devkit_override_app_id: u32,
    /// `None` when the shortcut was never launched.
    pub last_play_time: Option<DateTime<Utc>>,
    pub flatpak_app_id: String,
    pub tags: Vec<String>,
    /// Keys this decoder does not model, with the array policy applied.
    pub extra: Section,
}

/// Reads and decodes a shortcuts.vdf file.
pub fn load_shortcuts(path: &Path) -> Result<Vec<ShortcutRecord>, VdfError> {
    let data = fs::read(path)?;
    parse_shortcuts(&data)
}

/// Decodes binary shortcuts.vdf data.
pub fn parse_shortcuts(data: &[u8]) -> Result<Vec<ShortcutRecord>, VdfError> {
    let mut cur = Cursor::new(data);
    let tree = binary::read_tree(&mut cur)?;

    let root = tree
        .get_ci("shortcuts")
        .and_then(Node::as_section)
        .ok_or_else(|| VdfError::Structure("expected root section 'shortcuts'".into()))?;

    root.iter()
        .map(|(index, node)| {
            let entry = node.as_section().ok_or_else(|| {
                VdfError::Structure(format!("shortcut '{index}' is not a section"))
            })?;
            Ok(decode_entry(index, entry.clone()))
        })
        .collect()
}

fn decode_entry(index: &str, entry: Section) -> ShortcutRecord {
    let mut sc = ShortcutRecord {
        index: index.to_owned(),
        app_id: 0,
        app_name: String::new(),
        exe: String::new(),
        start_dir: String::new(),
        icon: String::new(),
        shortcut_path: String::new(),
        launch_options: String::new(),
        is_hidden: false,
        allow_desktop_config: false,
        allow_overlay: false,
        open_vr: false,
        devkit: false,
        devkit_game_id: String::new(),
        devkit_override_app_id: 0,
        last_play_time: None,
        flatpak_app_id: String::new(),
        tags: Vec::new(),
        extra: Section::new(),
    };
    let mut app_id = None;

    for (key, node) in entry {
        let node = listify(node);
        match key.to_ascii_lowercase().as_str() {
            "appid" => app_id = int_value(&node).map(|v| v as u32),
            "appname" => sc.app_name = text_value(node),
            "exe" => sc.exe = text_value(node),
            "startdir" => sc.start_dir = text_value(node),
            "icon" => sc.icon = text_value(node),
            "shortcutpath" => sc.shortcut_path = text_value(node),
            "launchoptions" => sc.launch_options = text_value(node),
            "ishidden" => sc.is_hidden = flag_value(&node),
            "allowdesktopconfig" => sc.allow_desktop_config = flag_value(&node),
            "allowoverlay" => sc.allow_overlay = flag_value(&node),
            "openvr" => sc.open_vr = flag_value(&node),
            "devkit" => sc.devkit = flag_value(&node),
            "devkitgameid" => sc.devkit_game_id = text_value(node),
            "devkitoverrideappid" => {
                sc.devkit_override_app_id = int_value(&node).unwrap_or(0) as u32
            }
            "flatpakappid" => sc.flatpak_app_id = text_value(node),
            "tags" => sc.tags = tag_values(node),
            _ if is_date_field(&key) => sc.last_play_time = timestamp_value(&node),
            _ => {
                sc.extra.insert(key, node);
            }
        }
    }

    // Older files carry no appid; Steam derives it from exe + name.
    sc.app_id = app_id.unwrap_or_else(|| generate_app_id(&sc.exe, &sc.app_name));
    sc
}

/// Converts numeric-keyed sections into [`Node::List`], depth first.
fn listify(node: Node) -> Node {
    match node {
        Node::Section(section) => match section.into_sequence() {
            Ok(items) => Node::List(items.into_iter().map(listify).collect()),
            Err(section) => Node::Section(
                section
                    .into_iter()
                    .map(|(k, v)| (k, listify(v)))
                    .collect(),
            ),
        },
        other => other,
    }
}

fn is_date_field(key: &str) -> bool {
    DATE_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(key))
}

fn text_value(node: Node) -> String {
    match node {
        Node::Scalar(Scalar::String(s) | Scalar::WideString(s)) => s,
        Node::Scalar(other) => other.to_string(),
        _ => String::new(),
    }
}

fn int_value(node: &Node) -> Option<i64> {
    node.as_i64()
}

fn flag_value(node: &Node) -> bool {
    int_value(node).is_some_and(|v| v != 0)
}

fn timestamp_value(node: &Node) -> Option<DateTime<Utc>> {
    // Stored as int32 but written by Steam as unsigned seconds.
    let secs = match node.as_scalar()? {
        Scalar::Int32(v) => i64::from(*v as u32),
        _ => int_value(node)?,
    };
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

fn tag_values(node: Node) -> Vec<String> {
    match node {
        Node::List(items) => items
            .into_iter()
            .filter(|n| matches!(n, Node::Scalar(_)))
            .map(text_value)
            .collect(),
        // Sparse indices ("0", "2") do not form a sequence; keep the values
        // in file order.
        Node::Section(section) => section
            .into_iter()
            .filter(|(_, n)| matches!(n, Node::Scalar(_)))
            .map(|(_, n)| text_value(n))
            .collect(),
        _ => Vec::new(),
    }
}

/// Generates a Steam shortcut app ID from executable path and name.
///
/// Matches Steam's algorithm: `CRC32(exe + name) | 0x80000000 | 0x02000000`.
pub fn generate_app_id(exe: &str, name: &str) -> u32 {
    let key = format!("{exe}{name}");
    let mut hasher = Hasher::new();
    hasher.update(key.as_bytes());
    let crc = hasher.finalize();
    (crc | 0x80000000) | 0x02000000
}
