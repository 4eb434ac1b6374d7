//! Shared test utilities for the cfgmend workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not each
//! carry their own copy of the agent config template. It is a dev-dependency
//! only and is never published.
//!
//! # Modules
//!
//! - [`fixtures`] - template, current document and edit request fixtures
//! - [`workspace`] - [`TestWorkspace`](workspace::TestWorkspace) for tests that
//!   need the fixtures on disk

pub mod fixtures;
pub mod workspace;
