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

use std::fs::File;
use std::fs::read;
use std::fs::read_to_string;
use std::fs::remove_file;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use serde::Deserialize;
use serde::Serialize;
use tempfile::Builder;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Fallible;
use crate::error::fail;
use crate::store::StrokeStore;
use crate::types::card_id::CardId;

pub const METADATA_FILE_NAME: &str = "metadata.json";

pub const ARCHIVE_FORMAT_VERSION: &str = "1.0";

/// Written once into every exported archive; read back on import so newer
/// versions can handle older backups.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    pub export_time: String,
    pub version: String,
    pub profile: String,
}

/// The external collaborator that knows which cards still exist in the
/// host's collection. Lookups are allowed to fail; the sweep treats a
/// failed lookup the same as a deleted card.
pub trait CardCatalog {
    fn card_exists(&self, card: &CardId) -> Fallible<bool>;
}

/// The default file name for a backup archive, timestamped to the second.
pub fn default_archive_name() -> String {
    format!("cardink_backup_{}.zip", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Export every stored document into a single zip archive at
/// `destination` (`.zip` appended when missing). Returns the archive path,
/// or `None` when the store is empty or the export failed.
pub fn export_all(store: &StrokeStore, profile: &str, destination: &Path) -> Option<PathBuf> {
    match try_export(store, profile, destination) {
        Ok(path) => path,
        Err(e) => {
            log::error!("export failed: {e}");
            None
        }
    }
}

fn try_export(
    store: &StrokeStore,
    profile: &str,
    destination: &Path,
) -> Fallible<Option<PathBuf>> {
    let files = store.document_files()?;
    if files.is_empty() {
        log::warn!("nothing to export: the store holds no documents");
        return Ok(None);
    }
    let destination = ensure_zip_extension(destination);
    let metadata = ArchiveMetadata {
        export_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        version: ARCHIVE_FORMAT_VERSION.to_string(),
        profile: profile.to_string(),
    };

    let file = File::create(&destination)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(METADATA_FILE_NAME, options)?;
    zip.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;
    for path in &files {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };
        zip.start_file(name, options)?;
        zip.write_all(&read(path)?)?;
    }
    zip.finish()?;
    log::debug!(
        "exported {} documents to {}",
        files.len(),
        destination.display()
    );
    Ok(Some(destination))
}

fn ensure_zip_extension(path: &Path) -> PathBuf {
    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));
    if is_zip {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{}.zip", path.display()))
    }
}

/// Import documents from an exported archive. Existing files are skipped
/// unless `overwrite`. Returns the number of files imported; a corrupt
/// archive is logged and yields zero.
pub fn import_all(store: &StrokeStore, source: &Path, overwrite: bool) -> usize {
    match try_import(store, source, overwrite) {
        Ok(count) => count,
        Err(e) => {
            log::error!("import failed: {e}");
            0
        }
    }
}

fn try_import(store: &StrokeStore, source: &Path, overwrite: bool) -> Fallible<usize> {
    let file = File::open(source)?;
    let mut archive = ZipArchive::new(file)?;

    // Extract to a scratch directory first; the guard removes it on every
    // exit path, including errors.
    let scratch = Builder::new()
        .prefix("cardink_import_")
        .tempdir_in(store.base())?;
    archive.extract(scratch.path())?;

    let metadata_path = scratch.path().join(METADATA_FILE_NAME);
    if metadata_path.exists() {
        match serde_json::from_str::<ArchiveMetadata>(&read_to_string(&metadata_path)?) {
            Ok(metadata) => log::info!(
                "importing backup of profile {} exported {}",
                metadata.profile,
                metadata.export_time
            ),
            Err(e) => log::warn!("unreadable archive metadata: {e}"),
        }
    }

    let mut imported = 0;
    for entry in WalkDir::new(scratch.path()) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };
        if !name.ends_with(".json") || name == METADATA_FILE_NAME {
            continue;
        }
        let target = store.base().join(&name);
        if target.exists() && !overwrite {
            continue;
        }
        std::fs::copy(path, &target)?;
        imported += 1;
    }
    Ok(imported)
}

/// Delete the documents of every card the catalog no longer knows.
/// Returns the number of files removed.
pub fn sweep_invalid(store: &StrokeStore, catalog: &dyn CardCatalog) -> usize {
    let ids = match store.card_ids() {
        Ok(ids) => ids,
        Err(e) => {
            log::error!("sweep failed to enumerate the store: {e}");
            return 0;
        }
    };
    let mut removed = 0;
    for card in ids {
        let exists = match catalog.card_exists(&card) {
            Ok(exists) => exists,
            Err(e) => {
                log::warn!("card {card}: lookup failed, treating as deleted: {e}");
                false
            }
        };
        if exists {
            continue;
        }
        let files = store.files_for(&card);
        store.delete(&card);
        removed += files.iter().filter(|path| !path.exists()).count();
    }
    removed
}

/// The number of document files in the store.
pub fn count_documents(store: &StrokeStore) -> usize {
    match store.document_files() {
        Ok(files) => files.len(),
        Err(e) => {
            log::error!("failed to enumerate the store: {e}");
            0
        }
    }
}

/// Total size in bytes of the store's document files.
pub fn storage_size(store: &StrokeStore) -> u64 {
    let files = match store.document_files() {
        Ok(files) => files,
        Err(e) => {
            log::error!("failed to enumerate the store: {e}");
            return 0;
        }
    };
    files
        .iter()
        .filter_map(|path| path.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Delete every document in the store, writing a timestamped backup
/// archive into `backup_dir` first. An empty store is a no-op
/// (`Ok(None)`); a store that cannot be backed up is left untouched.
pub fn clear_all(
    store: &StrokeStore,
    profile: &str,
    backup_dir: &Path,
) -> Fallible<Option<PathBuf>> {
    let files = store.document_files()?;
    if files.is_empty() {
        return Ok(None);
    }
    let backup = match export_all(store, profile, &backup_dir.join(default_archive_name())) {
        Some(path) => path,
        None => return fail("refusing to clear: backup could not be written."),
    };
    for path in files {
        remove_file(&path)?;
    }
    log::debug!("cleared the store, backup at {}", backup.display());
    Ok(Some(backup))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::error::ErrorReport;
    use crate::helper::create_tmp_profile;
    use crate::helper::sample_document;
    use crate::types::side::Side;

    struct SetCatalog {
        known: BTreeSet<CardId>,
    }

    impl SetCatalog {
        fn new(ids: &[&str]) -> Self {
            Self {
                known: ids.iter().map(|id| CardId::new(id)).collect(),
            }
        }
    }

    impl CardCatalog for SetCatalog {
        fn card_exists(&self, card: &CardId) -> Fallible<bool> {
            Ok(self.known.contains(card))
        }
    }

    /// A collection backend that is down: every lookup errors.
    struct FailingCatalog;

    impl CardCatalog for FailingCatalog {
        fn card_exists(&self, _card: &CardId) -> Fallible<bool> {
            Err(ErrorReport::new("collection unavailable"))
        }
    }

    fn populated_store(dir: &Path) -> Fallible<StrokeStore> {
        let store = StrokeStore::open(dir)?;
        let text = sample_document(1).encode()?;
        store.save(&CardId::new("1"), Side::Front, &text, None);
        store.save(&CardId::new("1"), Side::All, &text, None);
        store.save(&CardId::new("2"), Side::All, &text, None);
        Ok(store)
    }

    #[test]
    fn test_export_empty_store() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let out = create_tmp_profile()?;
        let store = StrokeStore::open(dir.path())?;
        assert_eq!(
            export_all(&store, "tester", &out.path().join("backup.zip")),
            None
        );
        Ok(())
    }

    /// N document files produce an archive with N+1 entries: the documents
    /// plus the metadata record.
    #[test]
    fn test_export_entry_count() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let out = create_tmp_profile()?;
        let store = populated_store(dir.path())?;

        let path = export_all(&store, "tester", &out.path().join("backup")).unwrap();
        assert!(path.to_string_lossy().ends_with(".zip"));

        let mut archive = ZipArchive::new(File::open(&path)?)?;
        assert_eq!(archive.len(), 4);
        let metadata: ArchiveMetadata = {
            let entry = archive.by_name(METADATA_FILE_NAME)?;
            serde_json::from_reader(entry)?
        };
        assert_eq!(metadata.version, ARCHIVE_FORMAT_VERSION);
        assert_eq!(metadata.profile, "tester");
        Ok(())
    }

    #[test]
    fn test_import_round_trip() -> Fallible<()> {
        let source_dir = create_tmp_profile()?;
        let target_dir = create_tmp_profile()?;
        let out = create_tmp_profile()?;
        let source = populated_store(source_dir.path())?;
        let archive = export_all(&source, "tester", &out.path().join("backup.zip")).unwrap();

        let mut target = StrokeStore::open(target_dir.path())?;
        assert_eq!(import_all(&target, &archive, false), 3);
        assert_eq!(
            target.load(&CardId::new("1"), Side::Front),
            Some(sample_document(1).encode()?)
        );
        assert_eq!(count_documents(&target), 3);
        Ok(())
    }

    #[test]
    fn test_import_skips_existing() -> Fallible<()> {
        let source_dir = create_tmp_profile()?;
        let target_dir = create_tmp_profile()?;
        let out = create_tmp_profile()?;
        let source = populated_store(source_dir.path())?;
        let archive = export_all(&source, "tester", &out.path().join("backup.zip")).unwrap();

        let mut target = StrokeStore::open(target_dir.path())?;
        let local = sample_document(5).encode()?;
        target.save(&CardId::new("1"), Side::Front, &local, None);

        assert_eq!(import_all(&target, &archive, false), 2);
        assert_eq!(target.load(&CardId::new("1"), Side::Front), Some(local));
        Ok(())
    }

    #[test]
    fn test_import_overwrites_when_asked() -> Fallible<()> {
        let source_dir = create_tmp_profile()?;
        let target_dir = create_tmp_profile()?;
        let out = create_tmp_profile()?;
        let source = populated_store(source_dir.path())?;
        let archive = export_all(&source, "tester", &out.path().join("backup.zip")).unwrap();

        let mut target = StrokeStore::open(target_dir.path())?;
        target.save(&CardId::new("1"), Side::Front, &sample_document(5).encode()?, None);

        assert_eq!(import_all(&target, &archive, true), 3);
        assert_eq!(
            target.load(&CardId::new("1"), Side::Front),
            Some(sample_document(1).encode()?)
        );
        Ok(())
    }

    #[test]
    fn test_import_corrupt_archive() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = StrokeStore::open(dir.path())?;
        let bogus = dir.path().join("bogus.zip");
        std::fs::write(&bogus, "this is not a zip file")?;
        assert_eq!(import_all(&store, &bogus, true), 0);
        Ok(())
    }

    /// The scratch directory is gone after the import, and the metadata
    /// record is never installed as a document.
    #[test]
    fn test_import_leaves_store_clean() -> Fallible<()> {
        let source_dir = create_tmp_profile()?;
        let target_dir = create_tmp_profile()?;
        let out = create_tmp_profile()?;
        let source = populated_store(source_dir.path())?;
        let archive = export_all(&source, "tester", &out.path().join("backup.zip")).unwrap();

        let target = StrokeStore::open(target_dir.path())?;
        import_all(&target, &archive, false);

        for entry in target_dir.path().read_dir()? {
            let entry = entry?;
            assert!(entry.path().is_file());
            assert_ne!(entry.file_name().to_string_lossy(), METADATA_FILE_NAME);
        }
        Ok(())
    }

    #[test]
    fn test_sweep_removes_only_missing_cards() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = populated_store(dir.path())?;
        std::fs::write(dir.path().join("card_3.json"), "{}")?;

        let removed = sweep_invalid(&store, &SetCatalog::new(&["1"]));
        // Card 2 has one file, card 3 one legacy file; card 1 survives.
        assert_eq!(removed, 2);
        assert_eq!(store.files_for(&CardId::new("1")).len(), 2);
        assert!(store.files_for(&CardId::new("2")).is_empty());
        assert!(store.files_for(&CardId::new("3")).is_empty());
        Ok(())
    }

    #[test]
    fn test_sweep_treats_lookup_errors_as_absent() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = populated_store(dir.path())?;
        let removed = sweep_invalid(&store, &FailingCatalog);
        assert_eq!(removed, 3);
        assert_eq!(count_documents(&store), 0);
        Ok(())
    }

    #[test]
    fn test_stats() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let store = populated_store(dir.path())?;
        assert_eq!(count_documents(&store), 3);
        assert!(storage_size(&store) > 0);
        Ok(())
    }

    #[test]
    fn test_clear_all_backs_up_first() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let backups = create_tmp_profile()?;
        let store = populated_store(dir.path())?;

        let backup = clear_all(&store, "tester", backups.path())?.unwrap();
        assert!(backup.exists());
        assert_eq!(count_documents(&store), 0);

        let mut archive = ZipArchive::new(File::open(&backup)?)?;
        assert_eq!(archive.len(), 4);
        let _ = archive.by_name(METADATA_FILE_NAME)?;
        Ok(())
    }

    #[test]
    fn test_clear_all_empty_store() -> Fallible<()> {
        let dir = create_tmp_profile()?;
        let backups = create_tmp_profile()?;
        let store = StrokeStore::open(dir.path())?;
        assert_eq!(clear_all(&store, "tester", backups.path())?, None);
        Ok(())
    }
}
