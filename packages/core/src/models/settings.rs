//! Preference blobs stored in the settings file.
//!
//! Each struct is read and written as a whole object under a fixed key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const LAYOUT_KEY: &str = "layout";
pub const KEYBINDINGS_KEY: &str = "keybindings";
pub const WORKSPACE_KEY: &str = "workspace";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidebarPosition {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub sidebar_position: SidebarPosition,
}

/// Partial layout merged over the stored one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_position: Option<SidebarPosition>,
}

impl Layout {
    pub fn merge(mut self, patch: LayoutPatch) -> Self {
        if let Some(position) = patch.sidebar_position {
            self.sidebar_position = position;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keybindings {
    #[serde(default = "default_toggle_sidebar")]
    pub toggle_sidebar: String,
    #[serde(default = "default_select_all")]
    pub select_all: String,
}

fn default_toggle_sidebar() -> String {
    "Mod-b".to_string()
}

fn default_select_all() -> String {
    "Mod-a".to_string()
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            toggle_sidebar: default_toggle_sidebar(),
            select_all: default_select_all(),
        }
    }
}

/// Durable navigation state: the active space and the last page opened per space
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePrefs {
    #[serde(default)]
    pub active_space_id: Option<String>,
    #[serde(default)]
    pub last_opened: HashMap<String, String>,
}
