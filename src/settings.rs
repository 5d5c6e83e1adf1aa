// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::fs::write;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;

pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Per-profile settings, persisted next to the stroke documents.
///
/// A missing or unreadable file yields the defaults; unknown keys from a
/// newer version are ignored on load.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The user's master switch for ink persistence. When off, incoming
    /// stroke saves are dropped before any I/O.
    pub save_strokes_enabled: bool,
    /// Which toolbar buttons the user has hidden, by button name.
    pub toolbar_visibility: BTreeMap<String, bool>,
    /// User-remapped shortcuts, action name to key sequence.
    pub hotkeys: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_strokes_enabled: true,
            toolbar_visibility: BTreeMap::new(),
            hotkeys: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn load(directory: &Path) -> Self {
        let path = directory.join(SETTINGS_FILE_NAME);
        let text = match read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    log::error!("failed to read {}: {e}", path.display());
                }
                return Self::default();
            }
        };
        match toml::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring unparseable {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, directory: &Path) -> Fallible<()> {
        let text = toml::to_string(self)?;
        write(directory.join(SETTINGS_FILE_NAME), text)?;
        Ok(())
    }
}
