//! Workflow integration tests
//!
//! Complete workflows that exercise several commands against one project.

pub mod build_and_report;
pub mod diff_and_rank;
pub mod edge_cases;
pub mod git;
pub mod graph;
