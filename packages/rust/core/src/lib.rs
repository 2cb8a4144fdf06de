//! Lint pipeline and domain checks for corpuslint.
//!
//! This crate runs the stages over a loaded corpus
//! (`Loading → Validating → LinkChecking → Aggregating → Reporting`)
//! and renders the resulting [`report::LintReport`].

pub mod aggregator;
pub mod links;
pub mod pipeline;
pub mod report;
pub mod validator;
