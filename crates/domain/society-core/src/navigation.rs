use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routes::menu_group;

/// Where the user was and which sidebar groups were open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub active_path: Option<String>,
    pub expanded_menus: BTreeMap<String, bool>,
}

impl NavigationState {
    /// Records a route change and opens the group the new path lives under.
    pub fn visit(&mut self, path: &str) {
        self.active_path = Some(path.to_string());
        if let Some(group) = menu_group(path) {
            self.expanded_menus.insert(group.to_string(), true);
        }
    }

    pub fn toggle_menu(&mut self, group: &str) -> bool {
        let open = !self.is_expanded(group);
        self.expanded_menus.insert(group.to_string(), open);
        open
    }

    pub fn is_expanded(&self, group: &str) -> bool {
        self.expanded_menus.get(group).copied().unwrap_or(false)
    }
}
