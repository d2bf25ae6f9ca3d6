//! Safety checks applied before the agent touches the host.
//!
//! These are pattern-based allow/deny checks plus interactive confirmation,
//! not a containment layer: nothing here isolates a command from the host
//! process once it is allowed to run.
//!
//! - [`PathGuard`]: deny-list for filesystem paths
//! - [`CommandClassifier`]: dangerous-command detection and package-manager
//!   exit code diagnostics
//! - [`PrivilegeEscalator`]: sudo password prompt and verification

pub mod classifier;
pub mod path;
pub mod privilege;

pub use classifier::{CommandClassifier, Diagnosis};
pub use path::PathGuard;
pub use privilege::PrivilegeEscalator;
