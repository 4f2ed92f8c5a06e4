//! User-defined library categories from sharedconfig.vdf.

use serde::Serialize;
use steamconfig_vdf::{Node, Section};

const APPS_PATH: &[&str] = &[
    "UserRoamingConfigStore",
    "Software",
    "Valve",
    "Steam",
    "Apps",
];

/// Category labels in first-seen order and how many apps carry any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Categories {
    pub labels: Vec<String>,
    pub tagged_apps: usize,
}

/// Collects the categories assigned in a parsed sharedconfig.vdf.
///
/// An app counts as tagged when its `tags` collection is non-empty. A config
/// without an apps section has no categories.
pub fn extract_categories(shared_config: &Section) -> Categories {
    let mut out = Categories::default();
    let Some(apps) = shared_config
        .get_path_ci(APPS_PATH)
        .and_then(Node::as_section)
    else {
        return out;
    };

    for app in apps.values().filter_map(Node::as_section) {
        let tags = app.get_ci("tags").map(tag_labels).unwrap_or_default();
        if tags.is_empty() {
            continue;
        }
        out.tagged_apps += 1;
        for tag in tags {
            if !out.labels.iter().any(|l| l == tag) {
                out.labels.push(tag.to_owned());
            }
        }
    }
    out
}

fn tag_labels(node: &Node) -> Vec<&str> {
    match node {
        Node::Section(tags) => tags.values().filter_map(Node::as_str).collect(),
        Node::List(tags) => tags.iter().filter_map(Node::as_str).collect(),
        Node::Scalar(_) => Vec::new(),
    }
}
