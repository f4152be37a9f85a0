//! Flutter-facing bindings for the StudyHub core.

pub mod api;
