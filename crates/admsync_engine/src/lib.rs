//! # AdmSync Engine
//!
//! Change detection and transactional synchronization of administrative
//! objects held in a remote configuration store.
//!
//! This crate provides:
//! - The [`RemoteSession`] seam to the remote store
//! - The change detector ([`needs_sync`], [`RemoteVersion`], [`LocalMarker`])
//! - Reset block and script assembly ([`ScriptBuilder`])
//! - Scoped history suspension and transaction guards
//! - The [`Synchronizer`] driving one sync end to end
//!
//! ## Sync Sequence
//!
//! 1. Re-decode the object from the remote store
//! 2. Suspend history recording
//! 3. Build the reset block and the full script
//! 4. Begin, execute, commit; abort on any failure
//! 5. Re-enable history
//!
//! ## Key Invariants
//!
//! - A transaction is never left open
//! - History is re-enabled on every exit path
//! - A missing or unparsable remote version always forces a sync
//! - Remote error text is carried verbatim

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change;
mod config;
mod error;
mod executor;
mod history;
mod script;
mod session;
mod transaction;

pub use change::{needs_sync, LocalMarker, RemoteVersion};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use executor::{SyncOutcome, Synchronizer};
pub use history::HistoryGuard;
pub use script::{escape_script_value, quote, reset_block, ScriptBuilder, SyncReport, UpdateRequest};
pub use session::{MockSession, RemoteSession, SessionError, SessionResult};
pub use transaction::TransactionGuard;
