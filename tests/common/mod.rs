//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.

// Not every test binary uses every helper.
#![allow(dead_code)]

mod client;
mod push;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use push::ScriptedPushTransport;
pub use server::TestServer;
