//! Concrete pipeline phases.

pub mod build;
pub mod init;
pub mod javadoc;
pub mod update;
pub mod validate;

pub use build::BuildPhase;
pub use init::{InitPhase, InitSettings, OwnerSource};
pub use javadoc::JavadocPhase;
pub use test::{outcome_from_output, TestPhase};
pub use update::UpdatePhase;
pub use validate::{InjectedFile, ValidatePhase};
