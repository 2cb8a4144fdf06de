//! Corpus loading: directory walking and concurrent lesson parsing.
//!
//! This crate provides:
//! - [`walk`]: turns a corpus root into an ordered course/section plan
//! - [`engine`]: reads and parses every planned file with bounded concurrency

pub mod engine;
pub mod walk;

pub use engine::{LoadOutcome, Loader};
pub use walk::{CoursePlan, CorpusPlan, SectionPlan, plan_corpus, section_number};
