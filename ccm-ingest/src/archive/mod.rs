//! Archive walker
//!
//! Enumerates the entries of a ZIP container one at a time and turns every
//! accepted content file into a [`DiscoveredItem`]. The item list and the
//! distinct creator-name set are built in the same single pass.
//!
//! Entries are pulled from the local file headers one at a time, in archive
//! order; the central directory is never loaded. The next entry is not read
//! until the current one has been classified and its payload skipped (or,
//! when payload verification is on, decompressed and CRC-checked). Entries
//! sharing a name are reported once each. Payloads are never buffered.
//!
//! Entries written with a trailing data descriptor cannot be read this way
//! and fail the scan.
//!
//! The scan is all-or-nothing. Items accumulated before a failure are
//! dropped with the accumulator; callers only ever see a complete
//! [`ScanOutcome`] or an error.

mod provenance;

pub use provenance::{
    classify_entry, derive_provenance, DiscoveredItem, EntryClass, ProvenanceRules,
    CONTENT_EXTENSION, GENERAL_COLLECTION, MODS_FOLDER, UNKNOWN_CREATOR,
};

use crate::config::IngestSettings;
use crate::error::{IngestError, IngestResult};
use ccm_common::events::{EventBus, IngestEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};
use uuid::Uuid;
use zip::read::read_zipfile_from_stream;
use zip::result::ZipError;

/// Default progress event cadence (entries)
pub const DEFAULT_PROGRESS_INTERVAL: usize = 500;

const LOCAL_HEADER_SIGNATURE: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const END_OF_DIRECTORY_SIGNATURE: [u8; 4] = [b'P', b'K', 0x05, 0x06];

/// Result of one complete archive pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Scan session identifier (matches emitted events)
    pub session_id: Uuid,
    /// Accepted items in archive order
    pub items: Vec<DiscoveredItem>,
    /// Every `creator_name` appearing in `items`, "Unknown" included
    pub distinct_creator_names: BTreeSet<String>,
    /// Entries enumerated, including directories and skipped files
    pub entries_seen: usize,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Single-owner accumulator for an in-progress scan
///
/// Lives only inside [`ArchiveWalker::walk`]; moved out on success.
#[derive(Default)]
struct ScanAccumulator {
    items: Vec<DiscoveredItem>,
    creators: BTreeSet<String>,
    entries_seen: usize,
}

impl ScanAccumulator {
    fn accept(&mut self, item: DiscoveredItem) {
        if !self.creators.contains(&item.creator_name) {
            self.creators.insert(item.creator_name.clone());
        }
        self.items.push(item);
    }

    fn finish(self, session_id: Uuid) -> ScanOutcome {
        ScanOutcome {
            session_id,
            items: self.items,
            distinct_creator_names: self.creators,
            entries_seen: self.entries_seen,
        }
    }
}

/// Streaming ZIP scanner
#[derive(Clone, Default)]
pub struct ArchiveWalker {
    settings: IngestSettings,
    event_bus: Option<EventBus>,
}

impl ArchiveWalker {
    /// Create walker with built-in settings (".package" files, "Mods" folder)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create walker with resolved settings
    pub fn with_settings(settings: IngestSettings) -> Self {
        Self {
            settings,
            event_bus: None,
        }
    }

    /// Publish scan lifecycle events to `event_bus`
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Scan an archive without blocking the async runtime
    ///
    /// The entry loop runs on tokio's blocking pool; the returned future
    /// resolves once, with either the full outcome or the first error.
    pub async fn scan(&self, archive_path: &Path) -> IngestResult<ScanOutcome> {
        let walker = self.clone();
        let path = archive_path.to_path_buf();
        tokio::task::spawn_blocking(move || walker.scan_blocking(&path)).await?
    }

    /// Scan an archive on the current thread
    pub fn scan_blocking(&self, archive_path: &Path) -> IngestResult<ScanOutcome> {
        let session_id = Uuid::new_v4();

        info!(
            archive = %archive_path.display(),
            %session_id,
            verify_payloads = self.settings.verify_payloads,
            "Archive scan started"
        );
        self.emit(IngestEvent::ScanStarted {
            session_id,
            archive: archive_path.display().to_string(),
            timestamp: chrono::Utc::now(),
        });

        let result = self.walk(archive_path, session_id);

        match &result {
            Ok(outcome) => {
                info!(
                    archive = %archive_path.display(),
                    entries = outcome.entries_seen,
                    items = outcome.items.len(),
                    creators = outcome.distinct_creator_names.len(),
                    "Archive scan complete"
                );
                self.emit(IngestEvent::ScanCompleted {
                    session_id,
                    items_found: outcome.items.len(),
                    creators_found: outcome.distinct_creator_names.len(),
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                warn!(archive = %archive_path.display(), error = %e, "Archive scan failed");
                self.emit(IngestEvent::ScanFailed {
                    session_id,
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        result
    }

    fn walk(&self, archive_path: &Path, session_id: Uuid) -> IngestResult<ScanOutcome> {
        if !archive_path.exists() {
            return Err(IngestError::ArchiveNotFound(archive_path.to_path_buf()));
        }

        let open_error = |source: ZipError| IngestError::ArchiveOpen {
            path: archive_path.to_path_buf(),
            source,
        };

        let file = File::open(archive_path).map_err(|e| open_error(ZipError::Io(e)))?;
        let mut reader = BufReader::new(file);
        if !starts_with_entries(&mut reader).map_err(open_error)? {
            info!(archive = %archive_path.display(), "Archive has no entries");
            return Ok(ScanAccumulator::default().finish(session_id));
        }

        let rules = ProvenanceRules {
            mods_folder: &self.settings.mods_folder,
            content_extension: &self.settings.content_extension,
        };
        let mut acc = ScanAccumulator::default();

        // Local headers are pulled in archive order until the central directory
        loop {
            let index = acc.entries_seen;
            let mut entry = match read_zipfile_from_stream(&mut reader) {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(read_error(archive_path, index, e)),
            };
            acc.entries_seen += 1;

            match classify_entry(entry.name(), &rules) {
                EntryClass::Directory => trace!(entry = %entry.name(), "Skipping directory"),
                EntryClass::NotContent => {
                    trace!(entry = %entry.name(), "Skipping non-content file")
                }
                EntryClass::Content(item) => {
                    if self.settings.verify_payloads {
                        std::io::copy(&mut entry, &mut std::io::sink())
                            .map_err(|e| read_error(archive_path, index, ZipError::Io(e)))?;
                    }
                    trace!(
                        entry = %entry.name(),
                        creator = %item.creator_name,
                        collection = %item.collection_name,
                        "Accepted content file"
                    );
                    acc.accept(item);
                }
            }
            // Dropping the entry skips the rest of its payload undecoded
            drop(entry);

            let interval = self.settings.progress_interval;
            if interval > 0 && acc.entries_seen % interval == 0 {
                self.emit(IngestEvent::ScanProgress {
                    session_id,
                    entries_seen: acc.entries_seen,
                    items_found: acc.items.len(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        Ok(acc.finish(session_id))
    }

    fn emit(&self, event: IngestEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}

/// Check the leading signature, then rewind
///
/// `Ok(false)` is a well-formed archive without entries (end of central
/// directory record first). Anything other than a local file header is
/// not a ZIP container.
fn starts_with_entries(reader: &mut BufReader<File>) -> Result<bool, ZipError> {
    let mut signature = [0u8; 4];
    reader.read_exact(&mut signature)?;
    reader.seek(SeekFrom::Start(0))?;

    match signature {
        LOCAL_HEADER_SIGNATURE => Ok(true),
        END_OF_DIRECTORY_SIGNATURE => Ok(false),
        _ => Err(ZipError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "missing local file header signature",
        ))),
    }
}

fn read_error(path: &Path, index: usize, source: ZipError) -> IngestError {
    IngestError::ArchiveRead {
        path: PathBuf::from(path),
        index,
        source,
    }
}
