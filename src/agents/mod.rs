//! Research and meta-control agents.
//!
//! The research agent turns one search pass into a scored, synthesized
//! outcome; the verification agent is the pure decision policy the
//! planner consults after every attempt.

pub mod meta;
pub mod research;

pub use meta::{Decision, DecisionKind, VerificationAgent};
pub use research::{ResearchAgent, Researcher};
