//! ccm-ingest library interface
//!
//! Archive scanning and creator reconciliation for custom-content imports:
//! - [`archive`]: streaming ZIP enumeration and path-derived provenance
//! - [`reconcile`]: fuzzy matching of discovered creators against a registry
//! - [`proposal`] / [`decision`]: review payload and confirmed import plan

pub mod archive;
pub mod config;
pub mod decision;
pub mod error;
pub mod proposal;
pub mod reconcile;
pub mod registry;

pub use crate::archive::{ArchiveWalker, DiscoveredItem, ScanOutcome};
pub use crate::config::{IngestOverrides, IngestSettings};
pub use crate::decision::{ConfirmedMapping, CreatorDecision, DecisionAction, ImportPlan};
pub use crate::error::{IngestError, IngestResult};
pub use crate::proposal::{build_proposal, ImportProposal};
pub use crate::reconcile::{similarity, CreatorMatch, MatchVerdict, NameReconciler};
pub use crate::registry::{JsonRegistryFile, RegistryEntry, RegistrySource, StaticRegistry};
