//! Shared DTOs (schemas-as-code) for the mendloop workspace.
//!
//! # Design constraints
//! - These types are intended to be serialized to disk and exchanged with
//!   external collaborator commands.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod artifact;
pub mod finding;
pub mod fix;
pub mod outcome;
pub mod run;
pub mod stats;

/// Schema identifiers.
pub mod schema {
    pub const MENDLOOP_FINDINGS_V1: &str = "mendloop.findings.v1";
    pub const MENDLOOP_RUN_V1: &str = "mendloop.run.v1";
}
