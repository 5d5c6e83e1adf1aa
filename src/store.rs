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

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fs::create_dir_all;
use std::fs::read_to_string;
use std::fs::remove_file;
use std::fs::write;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use crate::document::StrokeDocument;
use crate::error::Fallible;
use crate::types::card_id::CardId;
use crate::types::side::Side;
use crate::types::window_size::WindowSize;

/// The durable mapping from (card, side) to stroke document text.
///
/// One JSON file per slot under the per-profile base directory:
/// `card_<id>_front.json`, `card_<id>_all.json`, and the read-only legacy
/// unsplit format `card_<id>.json`, which is migrated into the requested
/// slot the first time it is hit.
///
/// No operation on this type propagates an error to the caller: I/O
/// failures are logged and reported through the boolean/optional return
/// values, so a broken disk never interrupts card review.
pub struct StrokeStore {
    base: PathBuf,
    /// Card ids whose legacy file was already migrated this process, so
    /// repeated loads don't re-run the migration write.
    migrated: HashSet<CardId>,
}

impl StrokeStore {
    /// Open the store rooted at `base`, creating the directory if needed.
    pub fn open(base: &Path) -> Fallible<Self> {
        create_dir_all(base)?;
        Ok(Self {
            base: base.to_path_buf(),
            migrated: HashSet::new(),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn document_path(&self, card: &CardId, side: Side) -> PathBuf {
        self.base.join(format!("card_{}_{}.json", card, side.tag()))
    }

    fn legacy_path(&self, card: &CardId) -> PathBuf {
        self.base.join(format!("card_{card}.json"))
    }

    /// Persist a document for one side of one card. When a window size is
    /// given it is attached to the document before writing; a document
    /// that won't decode is written unchanged, since losing ink over a
    /// geometry annotation would be the wrong trade.
    pub fn save(
        &self,
        card: &CardId,
        side: Side,
        text: &str,
        window_size: Option<WindowSize>,
    ) -> bool {
        let text = match window_size {
            Some(size) => match StrokeDocument::decode(text) {
                Ok(doc) => match doc.attach_window_size(size).encode() {
                    Ok(encoded) => encoded,
                    Err(e) => {
                        log::warn!("card {card}: could not re-encode with window size: {e}");
                        text.to_string()
                    }
                },
                Err(e) => {
                    log::warn!("card {card}: not attaching window size: {e}");
                    text.to_string()
                }
            },
            None => text.to_string(),
        };
        let path = self.document_path(card, side);
        match write(&path, &text) {
            Ok(()) => {
                log::debug!("saved {} bytes to {}", text.len(), path.display());
                true
            }
            Err(e) => {
                log::error!("failed to write {}: {e}", path.display());
                false
            }
        }
    }

    /// Load the document text for one side of one card. On a miss, falls
    /// back to the legacy unsplit file and migrates it into the requested
    /// slot (at most once per card per process).
    pub fn load(&mut self, card: &CardId, side: Side) -> Option<String> {
        let path = self.document_path(card, side);
        match read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => self.load_legacy(card, side),
            Err(e) => {
                log::error!("failed to read {}: {e}", path.display());
                None
            }
        }
    }

    fn load_legacy(&mut self, card: &CardId, side: Side) -> Option<String> {
        let path = self.legacy_path(card);
        let text = match read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    log::error!("failed to read {}: {e}", path.display());
                }
                return None;
            }
        };
        if self.migrated.insert(card.clone()) {
            if self.save(card, side, &text, None) {
                log::debug!(
                    "migrated legacy document for card {card} into the {} slot",
                    side.tag()
                );
            }
        }
        Some(text)
    }

    /// The window geometry captured in the stored document, if any. A
    /// missing document, a missing field, and a document that won't decode
    /// all yield `None`.
    pub fn window_size(&mut self, card: &CardId, side: Side) -> Option<WindowSize> {
        let text = self.load(card, side)?;
        match StrokeDocument::decode(&text) {
            Ok(doc) => doc.window_size,
            Err(e) => {
                log::warn!("card {card}: {e}");
                None
            }
        }
    }

    /// Remove every document file for a card: front, all, and legacy.
    /// Missing files are not an error.
    pub fn delete(&self, card: &CardId) -> bool {
        let mut ok = true;
        for path in self.slot_paths(card) {
            match remove_file(&path) {
                Ok(()) => log::debug!("deleted {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    log::error!("failed to delete {}: {e}", path.display());
                    ok = false;
                }
            }
        }
        ok
    }

    fn slot_paths(&self, card: &CardId) -> [PathBuf; 3] {
        [
            self.document_path(card, Side::Front),
            self.document_path(card, Side::All),
            self.legacy_path(card),
        ]
    }

    /// The document files that exist on disk for a card.
    pub fn files_for(&self, card: &CardId) -> Vec<PathBuf> {
        self.slot_paths(card)
            .into_iter()
            .filter(|path| path.exists())
            .collect()
    }

    /// Every document file in the store, sorted for consistent output.
    pub fn document_files(&self) -> Fallible<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in self.base.read_dir()? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_document_file_name(&entry.file_name().to_string_lossy()) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// The distinct card identities with at least one document on disk.
    pub fn card_ids(&self) -> Fallible<BTreeSet<CardId>> {
        let mut ids = BTreeSet::new();
        for path in self.document_files()? {
            if let Some(name) = path.file_name() {
                if let Some(id) = card_id_of_file_name(&name.to_string_lossy()) {
                    ids.insert(id);
                }
            }
        }
        Ok(ids)
    }
}

pub fn is_document_file_name(name: &str) -> bool {
    name.starts_with("card_") && name.ends_with(".json")
}

/// Extract the card identity from a document file name, for any of the
/// three slot formats. Ids are opaque strings; no digit check.
pub fn card_id_of_file_name(name: &str) -> Option<CardId> {
    let stem = name.strip_prefix("card_")?.strip_suffix(".json")?;
    let id = stem
        .strip_suffix("_front")
        .or_else(|| stem.strip_suffix("_all"))
        .unwrap_or(stem);
    if id.is_empty() {
        return None;
    }
    Some(CardId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::create_tmp_profile;
    use crate::helper::sample_document;

    #[test]
    fn test_save_load_round_trip() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("42");
        let text = sample_document(2).encode()?;
        assert!(store.save(&card, Side::Front, &text, None));
        assert_eq!(store.load(&card, Side::Front), Some(text));
        Ok(())
    }

    #[test]
    fn test_load_missing() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        assert_eq!(store.load(&CardId::new("42"), Side::Front), None);
        assert_eq!(store.load(&CardId::new("42"), Side::All), None);
        Ok(())
    }

    #[test]
    fn test_sides_are_independent() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("42");
        let front = sample_document(1).encode()?;
        let all = sample_document(3).encode()?;
        store.save(&card, Side::Front, &front, None);
        store.save(&card, Side::All, &all, None);
        assert_eq!(store.load(&card, Side::Front), Some(front));
        assert_eq!(store.load(&card, Side::All), Some(all));
        Ok(())
    }

    #[test]
    fn test_delete_then_load() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("42");
        let text = sample_document(1).encode()?;
        store.save(&card, Side::Front, &text, None);
        store.save(&card, Side::All, &text, None);
        assert!(store.delete(&card));
        assert_eq!(store.load(&card, Side::Front), None);
        assert_eq!(store.load(&card, Side::All), None);
        Ok(())
    }

    #[test]
    fn test_delete_missing_is_ok() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = StrokeStore::open(dir.path())?;
        assert!(store.delete(&CardId::new("nope")));
        Ok(())
    }

    /// Given only `card_7.json`, a front load returns its content and
    /// writes `card_7_front.json` with identical content.
    #[test]
    fn test_legacy_migration() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("7");
        let text = sample_document(2).encode()?;
        std::fs::write(dir.path().join("card_7.json"), &text)?;

        assert_eq!(store.load(&card, Side::Front), Some(text.clone()));
        let migrated = read_to_string(dir.path().join("card_7_front.json"))?;
        assert_eq!(migrated, text);

        // Subsequent loads hit the new slot directly.
        assert_eq!(store.load(&card, Side::Front), Some(text));
        Ok(())
    }

    #[test]
    fn test_save_attaches_window_size() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("42");
        let text = sample_document(1).encode()?;
        store.save(&card, Side::Front, &text, Some(WindowSize::new(800, 600)));
        assert_eq!(
            store.window_size(&card, Side::Front),
            Some(WindowSize::new(800, 600))
        );
        Ok(())
    }

    #[test]
    fn test_window_size_absent() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("42");
        store.save(&card, Side::Front, &sample_document(1).encode()?, None);
        assert_eq!(store.window_size(&card, Side::Front), None);
        Ok(())
    }

    /// A document that won't decode is still written: geometry is dropped,
    /// ink is not.
    #[test]
    fn test_save_malformed_keeps_raw_text() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let mut store = StrokeStore::open(dir.path())?;
        let card = CardId::new("42");
        assert!(store.save(&card, Side::All, "not json", Some(WindowSize::new(1, 1))));
        assert_eq!(store.load(&card, Side::All), Some("not json".to_string()));
        assert_eq!(store.window_size(&card, Side::All), None);
        Ok(())
    }

    #[test]
    fn test_document_files_ignores_other_files() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = StrokeStore::open(dir.path())?;
        store.save(&CardId::new("1"), Side::Front, "{}", None);
        store.save(&CardId::new("2"), Side::All, "{}", None);
        std::fs::write(dir.path().join("settings.toml"), "x = 1")?;
        std::fs::write(dir.path().join("metadata.json"), "{}")?;
        assert_eq!(store.document_files()?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_card_ids() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = StrokeStore::open(dir.path())?;
        store.save(&CardId::new("1"), Side::Front, "{}", None);
        store.save(&CardId::new("1"), Side::All, "{}", None);
        store.save(&CardId::new("2"), Side::All, "{}", None);
        std::fs::write(dir.path().join("card_3.json"), "{}")?;
        let ids = store.card_ids()?;
        let expected: BTreeSet<CardId> = ["1", "2", "3"].iter().map(|s| CardId::new(s)).collect();
        assert_eq!(ids, expected);
        Ok(())
    }

    #[test]
    fn test_card_id_of_file_name() {
        assert_eq!(
            card_id_of_file_name("card_42_front.json"),
            Some(CardId::new("42"))
        );
        assert_eq!(
            card_id_of_file_name("card_42_all.json"),
            Some(CardId::new("42"))
        );
        assert_eq!(card_id_of_file_name("card_42.json"), Some(CardId::new("42")));
        assert_eq!(card_id_of_file_name("metadata.json"), None);
        assert_eq!(card_id_of_file_name("card_.json"), None);
    }
}
