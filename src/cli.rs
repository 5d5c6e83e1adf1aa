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
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;

use crate::archive::CardCatalog;
use crate::archive::clear_all;
use crate::archive::count_documents;
use crate::archive::default_archive_name;
use crate::archive::export_all;
use crate::archive::import_all;
use crate::archive::storage_size;
use crate::archive::sweep_invalid;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::StrokeStore;
use crate::types::card_id::CardId;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Export every stored stroke document to a zip archive.
    Export {
        /// Path to the profile's stroke directory.
        directory: PathBuf,
        /// Where to write the archive. Defaults to a timestamped file in
        /// the current directory.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Profile name recorded in the archive metadata. Defaults to the
        /// directory name.
        #[arg(long)]
        profile: Option<String>,
    },
    /// Import stroke documents from a previously exported archive.
    Import {
        /// Path to the profile's stroke directory.
        directory: PathBuf,
        /// The archive to import.
        archive: PathBuf,
        /// Replace documents that already exist.
        #[arg(long)]
        overwrite: bool,
    },
    /// Delete documents whose card no longer exists.
    Sweep {
        /// Path to the profile's stroke directory.
        directory: PathBuf,
        /// File listing the live card ids, one per line.
        #[arg(long)]
        cards: PathBuf,
    },
    /// Show document count and storage size.
    Stats {
        /// Path to the profile's stroke directory.
        directory: PathBuf,
    },
    /// Delete every stored document, writing a backup archive first.
    Clear {
        /// Path to the profile's stroke directory.
        directory: PathBuf,
        /// Where to put the automatic backup. Defaults to the current
        /// directory.
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Export {
            directory,
            output,
            profile,
        } => {
            let store = open_existing(&directory)?;
            let profile = profile.unwrap_or_else(|| directory_name(&directory));
            let output = match output {
                Some(path) => path,
                None => std::env::current_dir()?.join(default_archive_name()),
            };
            match export_all(&store, &profile, &output) {
                Some(path) => {
                    println!("Exported to {}.", path.display());
                    Ok(())
                }
                None => fail("nothing to export."),
            }
        }
        Command::Import {
            directory,
            archive,
            overwrite,
        } => {
            if !archive.exists() {
                return fail("archive does not exist.");
            }
            let store = StrokeStore::open(&directory)?;
            let imported = import_all(&store, &archive, overwrite);
            println!("Imported {imported} documents.");
            Ok(())
        }
        Command::Sweep { directory, cards } => {
            let store = open_existing(&directory)?;
            let catalog = ManifestCatalog::from_file(&cards)?;
            let removed = sweep_invalid(&store, &catalog);
            println!("Removed {removed} files.");
            Ok(())
        }
        Command::Stats { directory } => {
            let store = open_existing(&directory)?;
            let count = count_documents(&store);
            let size = storage_size(&store) as f64 / (1024.0 * 1024.0);
            println!("{count} documents, {size:.2} MB.");
            Ok(())
        }
        Command::Clear {
            directory,
            backup_dir,
        } => {
            let store = open_existing(&directory)?;
            let profile = directory_name(&directory);
            let backup_dir = match backup_dir {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            match clear_all(&store, &profile, &backup_dir)? {
                Some(backup) => {
                    println!("Cleared. Backup at {}.", backup.display());
                    Ok(())
                }
                None => {
                    println!("Nothing to clear.");
                    Ok(())
                }
            }
        }
    }
}

fn open_existing(directory: &Path) -> Fallible<StrokeStore> {
    if !directory.exists() {
        return fail("directory does not exist.");
    }
    StrokeStore::open(directory)
}

fn directory_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "default".to_string())
}

/// A card catalog backed by a manifest file: one card id per line, blank
/// lines ignored. Hosts export such a list so the sweep can run outside
/// the host process.
pub struct ManifestCatalog {
    ids: BTreeSet<CardId>,
}

impl ManifestCatalog {
    pub fn from_file(path: &Path) -> Fallible<Self> {
        let content = read_to_string(path)?;
        let ids = content
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(CardId::new)
            .collect();
        Ok(Self { ids })
    }
}

impl CardCatalog for ManifestCatalog {
    fn card_exists(&self, card: &CardId) -> Fallible<bool> {
        Ok(self.ids.contains(card))
    }
}
