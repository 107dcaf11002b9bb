//! Fuzz target: migration package import
//!
//! Feeds arbitrary bytes as a MigrationPackage to a fresh destination.
//! Malformed or tampered packages must be rejected without panicking and
//! without touching the destination.
//!
//! Run: cargo +nightly fuzz run fuzz_migration_package

#![no_main]
use funpad_core::SystemConfig;
use funpad_engine::{CallContext, Engine, MigrationPackage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(package) = serde_json::from_slice::<MigrationPackage>(data) else {
        return;
    };
    let mut destination = Engine::in_memory("fuzz-dest", SystemConfig::with_admin("admin"));
    let before = destination.state().clone();
    let source = package.source.clone();
    match destination.confirm_migration(&CallContext::new("admin", 1), &source, &package) {
        Ok(_) => assert!(destination.audit().is_ok()),
        Err(_) => assert_eq!(destination.state(), &before),
    }
});
