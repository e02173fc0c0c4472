/*
 * This module consolidates the platform-agnostic logic of the reference
 * switcher: the ledger of project-to-binary substitutions, its two-generation
 * file history, the packaged-reference heuristic, and the coordinator that
 * drives a host's project model. It re-exports the key data structures and
 * the trait abstractions (`LedgerStoreOperations`, `ReferenceHostOperations`,
 * `ConfigManagerOperations`) used for dependency injection.
 */
pub mod classifier;
pub mod config;
pub mod discovery;
pub mod ledger_store;
pub mod logging;
pub mod path_codec;
pub mod path_utils;
pub mod project_context;
pub mod reference_host;
pub mod switch_coordinator;
pub mod transformation;


// Re-export key structures and enums
pub use project_context::{CURRENT_LEDGER_SUFFIX, PREVIOUS_LEDGER_SUFFIX, ProjectContext};
pub use transformation::{Generation, TransformationRecord};

// Re-export ledger related items
pub use ledger_store::{
    CoreLedgerStore, LedgerError, LedgerStoreOperations, ParsedLedger, SkipReason, SkippedLine,
};

// Re-export host and coordinator related items
pub use classifier::{ClassifiedReferences, is_packaged};
pub use reference_host::{HostError, ReferenceHandle, ReferenceHostOperations};
pub use switch_coordinator::{
    BinarySwitchRequest, SwitchCoordinator, SwitchError, SwitchFailure, SwitchReport, SwitchStep,
};

pub use discovery::{DiscoveredLedger, find_ledgers};

// Re-export config and logging related items
pub use config::{ConfigError, ConfigManagerOperations, CoreConfigManager, SwitcherSettings};
pub use logging::{LoggingError, init_logging};
