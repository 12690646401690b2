//! Entry classification and path-derived provenance
//!
//! Archive entry paths are split on `/` and read through a two-branch
//! decision table keyed on the first segment:
//!
//! | layout          | creator              | collection                                   |
//! |-----------------|----------------------|----------------------------------------------|
//! | `Mods/…`        | 2nd segment          | 3rd segment, unless it is the file name      |
//! | `<creator>/…`   | 1st segment          | 2nd segment, unless it is the content file   |
//! | bare file name  | "Unknown"            | "General"                                    |
//!
//! The asymmetry is intentional: under `Mods/` a file directly below the
//! folder is taken as the creator name, while under a creator folder a file
//! directly below it falls into "General".

use serde::{Deserialize, Serialize};

/// Literal top-level folder that shifts provenance by one segment
pub const MODS_FOLDER: &str = "Mods";

/// Accepted content-file suffix
pub const CONTENT_EXTENSION: &str = ".package";

/// Creator sentinel for entries with no creator segment
pub const UNKNOWN_CREATOR: &str = "Unknown";

/// Collection sentinel for entries with no collection segment
pub const GENERAL_COLLECTION: &str = "General";

/// One content file found inside the archive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveredItem {
    pub creator_name: String,
    pub collection_name: String,
    /// Final path segment of the entry
    pub file_name: String,
}

/// Names the provenance rules depend on
#[derive(Debug, Clone, Copy)]
pub struct ProvenanceRules<'a> {
    pub mods_folder: &'a str,
    pub content_extension: &'a str,
}

impl Default for ProvenanceRules<'static> {
    fn default() -> Self {
        Self {
            mods_folder: MODS_FOLDER,
            content_extension: CONTENT_EXTENSION,
        }
    }
}

/// What an archive entry turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryClass {
    /// Directory marker (name ends in a separator)
    Directory,
    /// File whose basename lacks the content extension
    NotContent,
    /// Accepted content file
    Content(DiscoveredItem),
}

/// Which branch of the decision table a path falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathLayout {
    /// `Mods/<creator>[/<collection>]/…`
    ModsRooted,
    /// `<creator>[/<collection>]/…`
    CreatorRooted,
    /// Single segment, no derivation attempted
    RootFile,
}

fn layout_of(segments: &[&str], rules: &ProvenanceRules<'_>) -> PathLayout {
    if segments.len() < 2 {
        PathLayout::RootFile
    } else if segments[0] == rules.mods_folder {
        PathLayout::ModsRooted
    } else {
        PathLayout::CreatorRooted
    }
}

/// Classify one entry by name
pub fn classify_entry(entry_name: &str, rules: &ProvenanceRules<'_>) -> EntryClass {
    if entry_name.ends_with('/') || entry_name.ends_with('\\') {
        return EntryClass::Directory;
    }

    let basename = entry_name.rsplit('/').next().unwrap_or(entry_name);
    if !basename.ends_with(rules.content_extension) {
        return EntryClass::NotContent;
    }

    EntryClass::Content(derive_provenance(entry_name, rules))
}

/// Derive `(creator, collection, file)` from an entry path
///
/// Does not filter; callers that need the directory/extension checks use
/// [`classify_entry`].
pub fn derive_provenance(entry_name: &str, rules: &ProvenanceRules<'_>) -> DiscoveredItem {
    let segments: Vec<&str> = entry_name.split('/').collect();
    let file_name = segments.last().copied().unwrap_or(entry_name);

    let (creator_name, collection_name) = match layout_of(&segments, rules) {
        PathLayout::RootFile => (UNKNOWN_CREATOR, GENERAL_COLLECTION),
        PathLayout::ModsRooted => {
            // Third segment is a folder only when something follows it
            let collection = match segments.as_slice() {
                [_, _, collection, _, ..] => *collection,
                _ => GENERAL_COLLECTION,
            };
            (segments.get(1).copied().unwrap_or(UNKNOWN_CREATOR), collection)
        }
        PathLayout::CreatorRooted => {
            let collection = match segments.get(1) {
                Some(second) if !second.ends_with(rules.content_extension) => *second,
                _ => GENERAL_COLLECTION,
            };
            (segments[0], collection)
        }
    };

    DiscoveredItem {
        creator_name: creator_name.to_string(),
        collection_name: collection_name.to_string(),
        file_name: file_name.to_string(),
    }
}
