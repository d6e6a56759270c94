// crates/release-ledger-config/src/lib.rs
// ============================================================================
// Module: Release Ledger Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for release-ledger.toml semantics.
// Dependencies: release-ledger-core, serde, toml
// ============================================================================

//! ## Overview
//! `release-ledger-config` defines the canonical configuration model for
//! Release Ledger. It provides strict, fail-closed validation and resolves
//! into the explicit per-run settings struct the engine consumes.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
