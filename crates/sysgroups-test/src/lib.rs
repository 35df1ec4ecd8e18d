//! System group engine - integration test support.
//!
//! This crate re-exports the workspace crates so integration tests can use
//! `sysgroups_test::component::` paths.

#![allow(ambiguous_glob_reexports)]

pub mod component {
    // Both crates have an `error` module; tests name error types directly.
    pub use sysgroups_core::*;
    pub use sysgroups_service::*;
}
