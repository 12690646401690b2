//! Confirmed creator mapping and import plan
//!
//! After review, every discovered creator name maps to either a new
//! creator or an existing registry entry. [`ImportPlan::build`] turns that
//! mapping into the rows a persistence layer must upsert, keyed by the
//! natural keys `(owner, collection_name)` and `(collection, file_name)` so
//! importing the same archive twice plans the same rows.

use crate::archive::UNKNOWN_CREATOR;
use crate::error::{IngestError, IngestResult};
use crate::proposal::ImportProposal;
use crate::reconcile::MatchVerdict;
use crate::registry::{find_by_id, RegistryEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// What to do with one discovered creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionAction {
    /// Create a new registry entry
    New,
    /// Attach to an existing registry entry
    Existing { target_id: String },
}

/// Human-confirmed decision for one discovered creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorDecision {
    #[serde(flatten)]
    pub action: DecisionAction,
    /// Editable name; the new creator's name, or the existing one's display name
    pub target_name: String,
}

impl CreatorDecision {
    pub fn new_creator(target_name: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::New,
            target_name: target_name.into(),
        }
    }

    pub fn existing(target_id: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::Existing {
                target_id: target_id.into(),
            },
            target_name: target_name.into(),
        }
    }
}

/// `found_name → decision`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmedMapping {
    decisions: BTreeMap<String, CreatorDecision>,
}

impl ConfirmedMapping {
    /// Accept every suggestion in the proposal as-is
    pub fn suggested(proposal: &ImportProposal) -> Self {
        let decisions = proposal
            .matches
            .iter()
            .map(|m| {
                let decision = match (m.verdict(), &m.existing_id) {
                    (MatchVerdict::Exact | MatchVerdict::Fuzzy, Some(id)) => {
                        let name = m.existing_name.as_ref().unwrap_or(&m.found_name);
                        CreatorDecision::existing(id.clone(), name.clone())
                    }
                    _ => CreatorDecision::new_creator(m.found_name.clone()),
                };
                (m.found_name.clone(), decision)
            })
            .collect();

        Self { decisions }
    }

    /// Record (or replace) the decision for one discovered name
    pub fn set(&mut self, found_name: impl Into<String>, decision: CreatorDecision) {
        self.decisions.insert(found_name.into(), decision);
    }

    pub fn get(&self, found_name: &str) -> Option<&CreatorDecision> {
        self.decisions.get(found_name)
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Check the mapping covers the proposal and targets real registry entries
    pub fn validate(
        &self,
        proposal: &ImportProposal,
        registry: &[RegistryEntry],
    ) -> IngestResult<()> {
        for m in &proposal.matches {
            if !self.decisions.contains_key(&m.found_name) {
                return Err(IngestError::InvalidDecision(format!(
                    "No decision for creator '{}'",
                    m.found_name
                )));
            }
        }

        let known: BTreeSet<&str> = proposal
            .items
            .iter()
            .map(|i| i.creator_name.as_str())
            .collect();

        for (found_name, decision) in &self.decisions {
            if !known.contains(found_name.as_str()) {
                return Err(IngestError::InvalidDecision(format!(
                    "Decision for '{}' which is not in the archive",
                    found_name
                )));
            }

            if decision.target_name.trim().is_empty() {
                return Err(IngestError::InvalidDecision(format!(
                    "Empty target name for '{}'",
                    found_name
                )));
            }

            if let DecisionAction::Existing { target_id } = &decision.action {
                if find_by_id(registry, target_id).is_none() {
                    return Err(IngestError::InvalidDecision(format!(
                        "'{}' mapped to unknown creator id '{}'",
                        found_name, target_id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Decision for a name, with "Unknown" defaulting to a new creator
    fn resolve(&self, found_name: &str) -> Option<CreatorDecision> {
        match self.decisions.get(found_name) {
            Some(decision) => Some(decision.clone()),
            None if found_name == UNKNOWN_CREATOR => {
                Some(CreatorDecision::new_creator(UNKNOWN_CREATOR))
            }
            None => None,
        }
    }
}

/// Creator a planned row belongs to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreatorRef {
    Existing { id: String },
    New { name: String },
}

impl From<&CreatorDecision> for CreatorRef {
    fn from(decision: &CreatorDecision) -> Self {
        match &decision.action {
            DecisionAction::Existing { target_id } => CreatorRef::Existing {
                id: target_id.clone(),
            },
            DecisionAction::New => CreatorRef::New {
                name: decision.target_name.clone(),
            },
        }
    }
}

/// Collection row, natural key `(owner, name)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlannedCollection {
    pub owner: CreatorRef,
    pub name: String,
}

/// Item row, natural key `(owner, collection_name, file_name)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlannedItem {
    pub owner: CreatorRef,
    pub collection_name: String,
    pub file_name: String,
}

/// Rows to upsert for one confirmed import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPlan {
    /// New creator names, first-seen order
    pub creators_to_create: Vec<String>,
    pub collections: Vec<PlannedCollection>,
    pub items: Vec<PlannedItem>,
    /// Archive items collapsing onto an already planned item key
    pub duplicate_items: usize,
}

impl ImportPlan {
    /// Apply a validated mapping to a proposal
    pub fn build(
        proposal: &ImportProposal,
        mapping: &ConfirmedMapping,
        registry: &[RegistryEntry],
    ) -> IngestResult<Self> {
        mapping.validate(proposal, registry)?;

        let mut plan = ImportPlan::default();
        let mut seen_creators = BTreeSet::new();
        let mut seen_collections = BTreeSet::new();
        let mut seen_items = BTreeSet::new();

        for item in &proposal.items {
            let decision = mapping.resolve(&item.creator_name).ok_or_else(|| {
                IngestError::InvalidDecision(format!(
                    "No decision for creator '{}'",
                    item.creator_name
                ))
            })?;
            let owner = CreatorRef::from(&decision);

            if let CreatorRef::New { name } = &owner {
                if seen_creators.insert(name.clone()) {
                    plan.creators_to_create.push(name.clone());
                }
            }

            let collection = PlannedCollection {
                owner: owner.clone(),
                name: item.collection_name.clone(),
            };
            if seen_collections.insert(collection.clone()) {
                plan.collections.push(collection);
            }

            let planned = PlannedItem {
                owner,
                collection_name: item.collection_name.clone(),
                file_name: item.file_name.clone(),
            };
            if seen_items.insert(planned.clone()) {
                plan.items.push(planned);
            } else {
                debug!(
                    creator = %item.creator_name,
                    collection = %item.collection_name,
                    file = %item.file_name,
                    "Duplicate item key"
                );
                plan.duplicate_items += 1;
            }
        }

        info!(
            creators = plan.creators_to_create.len(),
            collections = plan.collections.len(),
            items = plan.items.len(),
            duplicates = plan.duplicate_items,
            "Import plan built"
        );
        Ok(plan)
    }
}
