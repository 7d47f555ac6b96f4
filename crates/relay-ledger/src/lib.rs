//! Credential lifecycle and traffic reconciliation for a relay inbound.
//!
//! [`ReconciliationEngine`] keeps the relay's live user set in step with the
//! durable ledger and folds the relay's resettable traffic counters into
//! cumulative per-user totals. [`RegistrationAuthority`] turns single-use
//! invite tokens into identities.

pub mod counter;
mod engine;
mod error;
mod locks;
mod registration;

pub use counter::{parse_counter_name, CounterCategory, CounterName, Direction};
pub use engine::{
    EngineConfig, InboundTraffic, IssuedCredential, ReconcileReport, ReconciliationEngine,
    RestoreReport,
};
pub use error::{LedgerError, LedgerResult};
pub use registration::RegistrationAuthority;
