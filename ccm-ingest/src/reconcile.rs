//! Creator name reconciliation
//!
//! Classifies each discovered creator name against a registry snapshot:
//! - similarity == 1.0: exact (case-insensitive) match, no confirmation
//! - DEFAULT_FUZZY_THRESHOLD < similarity < 1.0: fuzzy candidate, needs confirmation
//! - otherwise: new creator, needs confirmation
//!
//! Thresholds and the similarity metric are fields of [`NameReconciler`];
//! the classification control flow does not depend on either.

use crate::archive::UNKNOWN_CREATOR;
use crate::registry::RegistryEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Fuzzy candidates must score strictly above this
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.7;

/// Similarity metric signature
pub type SimilarityFn = fn(&str, &str) -> f64;

/// Normalized Levenshtein similarity over lowercased input
///
/// `(max_len - distance) / max_len`, lengths counted in chars.
/// Two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

/// Reconciliation verdict for one discovered name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorMatch {
    pub found_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<String>,
    /// 1.0 for exact, 0.0 for new, else the candidate's score
    pub similarity: f64,
    pub needs_confirmation: bool,
}

/// Verdict category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchVerdict {
    Exact,
    Fuzzy,
    New,
}

impl CreatorMatch {
    pub fn verdict(&self) -> MatchVerdict {
        match (&self.existing_id, self.needs_confirmation) {
            (Some(_), false) => MatchVerdict::Exact,
            (Some(_), true) => MatchVerdict::Fuzzy,
            (None, _) => MatchVerdict::New,
        }
    }

    fn exact(found_name: &str, entry: &RegistryEntry) -> Self {
        Self {
            found_name: found_name.to_string(),
            existing_name: Some(entry.name.clone()),
            existing_id: Some(entry.id.clone()),
            similarity: 1.0,
            needs_confirmation: false,
        }
    }

    fn fuzzy(found_name: &str, entry: &RegistryEntry, score: f64) -> Self {
        Self {
            found_name: found_name.to_string(),
            existing_name: Some(entry.name.clone()),
            existing_id: Some(entry.id.clone()),
            similarity: score,
            needs_confirmation: true,
        }
    }

    fn new_creator(found_name: &str) -> Self {
        Self {
            found_name: found_name.to_string(),
            existing_name: None,
            existing_id: None,
            similarity: 0.0,
            needs_confirmation: true,
        }
    }
}

/// Verdict counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub exact: usize,
    pub fuzzy: usize,
    pub new: usize,
}

impl ReconcileSummary {
    pub fn of(matches: &[CreatorMatch]) -> Self {
        let mut summary = Self::default();
        for m in matches {
            match m.verdict() {
                MatchVerdict::Exact => summary.exact += 1,
                MatchVerdict::Fuzzy => summary.fuzzy += 1,
                MatchVerdict::New => summary.new += 1,
            }
        }
        summary
    }
}

/// Three-tier creator name classifier
#[derive(Debug, Clone)]
pub struct NameReconciler {
    /// Exclusive lower bound for fuzzy candidacy
    fuzzy_threshold: f64,
    metric: SimilarityFn,
}

impl Default for NameReconciler {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            metric: similarity,
        }
    }
}

impl NameReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, fuzzy_threshold: f64) -> Self {
        self.fuzzy_threshold = fuzzy_threshold;
        self
    }

    /// Substitute the similarity metric (must return values in [0, 1])
    pub fn with_metric(mut self, metric: SimilarityFn) -> Self {
        self.metric = metric;
        self
    }

    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }

    /// Classify every discovered name except the "Unknown" sentinel
    ///
    /// Output follows the set's (sorted) order, one verdict per name.
    pub fn reconcile(
        &self,
        discovered_names: &BTreeSet<String>,
        registry: &[RegistryEntry],
    ) -> Vec<CreatorMatch> {
        let matches: Vec<CreatorMatch> = discovered_names
            .iter()
            .filter(|name| name.as_str() != UNKNOWN_CREATOR)
            .map(|name| self.classify(name, registry))
            .collect();

        let summary = ReconcileSummary::of(&matches);
        info!(
            names = matches.len(),
            registry = registry.len(),
            exact = summary.exact,
            fuzzy = summary.fuzzy,
            new = summary.new,
            "Creator reconciliation complete"
        );

        matches
    }

    /// Classify a single name
    pub fn classify(&self, found_name: &str, registry: &[RegistryEntry]) -> CreatorMatch {
        // Exact check: first case-insensitive match in registry order wins
        let lowered = found_name.to_lowercase();
        if let Some(entry) = registry.iter().find(|e| e.name.to_lowercase() == lowered) {
            debug!(found = %found_name, id = %entry.id, "Exact creator match");
            return CreatorMatch::exact(found_name, entry);
        }

        // Fuzzy scan: strictly greatest viable score, first seen on ties
        let mut best: Option<(&RegistryEntry, f64)> = None;
        for entry in registry {
            let score = (self.metric)(found_name, &entry.name);
            if !self.is_viable(score) {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) => {
                debug!(
                    found = %found_name,
                    candidate = %entry.name,
                    similarity = score,
                    "Fuzzy creator candidate"
                );
                CreatorMatch::fuzzy(found_name, entry, score)
            }
            None => {
                debug!(found = %found_name, "No registry candidate, new creator");
                CreatorMatch::new_creator(found_name)
            }
        }
    }

    fn is_viable(&self, score: f64) -> bool {
        score > self.fuzzy_threshold
    }
}
