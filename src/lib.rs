//! FDX Dynamic Client Registration (DCR) toolkit library crate.
//!
//! Validates and normalizes FDX client registration requests against the
//! FDX policy rules and renders stored client metadata into the FDX
//! registration response, for use inside a host Open Banking accelerator
//! pipeline.

pub mod config;
pub mod dcr;
pub mod errors;
