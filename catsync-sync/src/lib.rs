//! Catalog reconciliation engine for catsync.
//!
//! Keeps the entities of an external asset catalog (catalog → schema →
//! table / volume / function / model) and the elements of the internal
//! metadata repository consistent with each other, in either or both
//! directions.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Remote**: [`CatalogClient`] and its implementations
//!   ([`UnityCatalogClient`], [`MemoryCatalog`])
//! - **Correlation**: [`no_mismatch`] and [`CorrelationState`], which link
//!   elements to external identifiers and detect conflicting links
//! - **Decision**: [`decide`], a pure function from the state of both sides
//!   to a [`SyncAction`]
//! - **Members**: [`MemberIterator`], cursor-paged iteration over
//!   repository elements
//! - **Kinds**: one [`KindAdapter`] per entity kind
//! - **Synchronizer**: [`KindSynchronizer`], the generic two-sweep driver
//! - **Orchestrator**: [`SyncOrchestrator`], which runs the kinds in
//!   dependency order and reacts to repository changes
//!
//! ## Reconciliation cycle
//!
//! 1. **Local sweep**: each repository element is looked up in the catalog
//! 2. **Remote sweep**: each catalog entity not yet seen is looked up in the
//!    repository
//! 3. **Decide**: both sides' change stamps, the correlation state and the
//!    direction policy select one action
//! 4. **Dispatch**: the action is applied and the correlation record is
//!    confirmed
//!
//! Consecutive cycles with no external change take no action: writes made
//! by the engine are covered by the correlation record's
//! `last_synchronized` stamp.

mod config;
mod context;
mod correlation;
mod decision;
mod error;
mod filter;
pub mod kinds;
mod members;
mod orchestrator;
pub mod remote;
mod synchronizer;

pub use config::SyncSettings;
pub use context::{CycleContext, CycleReport};
pub use correlation::{CorrelationState, no_mismatch};
pub use decision::{Stamp, SyncAction, decide};
pub use error::{SyncError, SyncResult};
pub use filter::NameFilter;
pub use kinds::{KindAdapter, NestedAttribute, adapter_for};
pub use members::{Member, MemberIterator};
pub use orchestrator::{ChangeNotification, RefreshReport, SyncOrchestrator};
pub use remote::{
    CatalogClient, Fetch, MemoryCatalog, UNITY_CATALOG_CONNECTOR, UnityCatalogClient,
    UnityCatalogConfig,
};
pub use synchronizer::{KindSynchronizer, ParentScope, ResolvedSettings};
