//! Concurrency Integration Tests
//!
//! Runs the harness against every strategy through the public `Inventory`
//! surface and checks the guarantees each one makes.

#[path = "../common/mod.rs"]
mod common;

mod baseline;
mod invariants;
mod lock_release;
mod scenarios;
