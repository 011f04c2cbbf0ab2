//! Scan engine: eligibility filter, tree traversal, drain-and-delete.

pub mod drain;
pub mod filter;
pub mod walker;
