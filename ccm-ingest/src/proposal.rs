//! Import proposal
//!
//! Runs the two pipeline stages in sequence (scan, then reconcile) and
//! packages `{items, matches}` for human review. Nothing here persists.

use crate::archive::{ArchiveWalker, DiscoveredItem};
use crate::config::IngestSettings;
use crate::error::IngestResult;
use crate::reconcile::{CreatorMatch, NameReconciler, ReconcileSummary};
use crate::registry::{RegistryEntry, RegistrySource};
use ccm_common::events::{EventBus, IngestEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Items grouped creator → collection → file names
pub type GroupedItems<'a> = BTreeMap<&'a str, BTreeMap<&'a str, Vec<&'a str>>>;

/// Scan + reconciliation result presented for confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProposal {
    pub session_id: Uuid,
    pub archive: PathBuf,
    pub items: Vec<DiscoveredItem>,
    pub matches: Vec<CreatorMatch>,
}

impl ImportProposal {
    /// No content files were found; the import is a no-op
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Matches a human has to decide on
    pub fn pending_confirmations(&self) -> impl Iterator<Item = &CreatorMatch> {
        self.matches.iter().filter(|m| m.needs_confirmation)
    }

    pub fn match_for(&self, found_name: &str) -> Option<&CreatorMatch> {
        self.matches.iter().find(|m| m.found_name == found_name)
    }

    pub fn summary(&self) -> ReconcileSummary {
        ReconcileSummary::of(&self.matches)
    }

    /// Items grouped for review, file names in archive order
    pub fn grouped(&self) -> GroupedItems<'_> {
        let mut groups: GroupedItems<'_> = BTreeMap::new();
        for item in &self.items {
            groups
                .entry(item.creator_name.as_str())
                .or_default()
                .entry(item.collection_name.as_str())
                .or_default()
                .push(item.file_name.as_str());
        }
        groups
    }
}

/// Scan an archive and reconcile its creators against a registry source
///
/// The snapshot is loaded first so a bad registry fails before any archive
/// I/O. Reconciliation runs on the blocking pool: it is CPU-bound in
/// `names × registry × name_length²`.
pub async fn build_proposal(
    archive_path: &Path,
    registry_source: &dyn RegistrySource,
    settings: &IngestSettings,
    event_bus: Option<EventBus>,
) -> IngestResult<ImportProposal> {
    let registry = registry_source.load_snapshot().await?;
    info!(
        source = registry_source.source_id(),
        creators = registry.len(),
        "Using registry snapshot"
    );

    let mut walker = ArchiveWalker::with_settings(settings.clone());
    if let Some(bus) = &event_bus {
        walker = walker.with_event_bus(bus.clone());
    }
    let outcome = walker.scan(archive_path).await?;

    let session_id = outcome.session_id;
    let names = outcome.distinct_creator_names;
    let reconciler = NameReconciler::new().with_threshold(settings.fuzzy_threshold);
    let matches =
        tokio::task::spawn_blocking(move || reconciler.reconcile(&names, &registry)).await?;

    let proposal = ImportProposal {
        session_id,
        archive: archive_path.to_path_buf(),
        items: outcome.items,
        matches,
    };

    let summary = proposal.summary();
    if let Some(bus) = &event_bus {
        bus.emit_lossy(IngestEvent::ReconcileCompleted {
            session_id,
            exact: summary.exact,
            fuzzy: summary.fuzzy,
            new: summary.new,
            timestamp: chrono::Utc::now(),
        });
    }

    Ok(proposal)
}

/// Reconcile an existing scan against an in-memory snapshot
pub fn propose_from_scan(
    archive_path: &Path,
    outcome: crate::archive::ScanOutcome,
    registry: &[RegistryEntry],
    reconciler: &NameReconciler,
) -> ImportProposal {
    let matches = reconciler.reconcile(&outcome.distinct_creator_names, registry);
    ImportProposal {
        session_id: outcome.session_id,
        archive: archive_path.to_path_buf(),
        items: outcome.items,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{derive_provenance, ProvenanceRules, ScanOutcome};
    use crate::reconcile::MatchVerdict;

    fn outcome(entries: &[&str]) -> ScanOutcome {
        let rules = ProvenanceRules::default();
        let items: Vec<DiscoveredItem> = entries
            .iter()
            .map(|e| derive_provenance(e, &rules))
            .collect();
        ScanOutcome {
            session_id: Uuid::new_v4(),
            distinct_creator_names: items.iter().map(|i| i.creator_name.clone()).collect(),
            entries_seen: items.len(),
            items,
        }
    }

    #[test]
    fn test_grouping_and_pending() {
        let scan = outcome(&[
            "Mods/JaneDoe/Kitchen/table.package",
            "Mods/JaneDoe/Kitchen/chair.package",
            "Mods/JaneDoe/lamp.package",
            "Bob/sink.package",
            "loose.package",
        ]);
        let registry = vec![RegistryEntry::new("1", "janedoe")];
        let reconciler = NameReconciler::new();
        let proposal = propose_from_scan(Path::new("cc.zip"), scan, &registry, &reconciler);

        let grouped = proposal.grouped();
        assert_eq!(grouped["JaneDoe"]["Kitchen"], vec!["table.package", "chair.package"]);
        assert_eq!(grouped["JaneDoe"]["General"], vec!["lamp.package"]);
        assert_eq!(grouped["Unknown"]["General"], vec!["loose.package"]);

        // "Unknown" is grouped but never classified
        assert_eq!(proposal.matches.len(), 2);
        assert!(proposal.match_for("Unknown").is_none());
        assert_eq!(proposal.match_for("JaneDoe").unwrap().verdict(), MatchVerdict::Exact);

        let pending: Vec<&str> = proposal
            .pending_confirmations()
            .map(|m| m.found_name.as_str())
            .collect();
        assert_eq!(pending, vec!["Bob"]);
        assert!(!proposal.is_empty());
    }
}
