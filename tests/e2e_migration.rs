// ============================================================================
// E2E MIGRATION TEST - FUNPAD
// ============================================================================
//
// Two engine instances, one populated (source) and one fresh (destination):
//
//   1. Full handoff - balances, venues and admins arrive unchanged
//   2. Freeze - the source rejects every mutation afterwards, reads still work
//   3. Idempotency - replaying confirm/finalize changes nothing
//   4. Tamper detection - modified packages are rejected
//   5. Cancel - a proposal can be withdrawn until its package leaves the
//      source; after that only a destination decline reopens it
//   6. Authority - only admins drive any step, finalize included
//
// Run:
//   cargo test --release --test e2e_migration -- --nocapture
//
// ============================================================================

use funpad_core::{EngineError, SystemConfig, DEFAULT_CREATION_FEE, NATIVE_ASSET};
use funpad_engine::{
    hand_off, AssetRegistry, CallContext, Engine, LaunchRequest, MigrationAck, MigrationPackage,
    MigrationPhase,
};

// ============================================================================
// HELPERS
// ============================================================================

/// Source with one promoted asset and one still on its curve.
fn populated_source() -> (Engine, String, String) {
    let mut cfg = SystemConfig::with_admin("admin");
    cfg.fee_recipient = "treasury".to_string();
    let mut e = Engine::in_memory("source", cfg);

    let launch = |e: &mut Engine, symbol: &str, target: u128| {
        let ctx = CallContext::new("maker", 1).with_value(DEFAULT_CREATION_FEE);
        e.launch(&ctx, &LaunchRequest::new(symbol, symbol, target))
            .unwrap()
            .asset_id
    };
    let promoted = launch(&mut e, "POOL", 1_000);
    let curved = launch(&mut e, "CURV", 1_000_000);

    e.buy(&CallContext::new("alice", 2).with_value(1_000), &promoted, 0, Some("bob"))
        .unwrap();
    e.buy(&CallContext::new("carol", 3).with_value(500), &promoted, 0, None)
        .unwrap();
    e.buy(&CallContext::new("alice", 4).with_value(70_000), &curved, 0, None)
        .unwrap();
    (e, promoted, curved)
}

fn destination() -> Engine {
    let mut cfg = SystemConfig::with_admin("admin");
    cfg.admins.insert("ops".to_string());
    Engine::in_memory("destination", cfg)
}

// ============================================================================
// 1-3. HANDOFF, FREEZE, IDEMPOTENCY
// ============================================================================

#[test]
fn test_full_handoff_moves_everything() {
    let (mut src, promoted, curved) = populated_source();
    let mut dst = destination();
    let root = src.ledger().state_root();

    let ack = hand_off(&mut src, &mut dst, "admin", 10).unwrap();
    assert_eq!(ack.state_root, root);
    assert_eq!(ack.destination, dst.instance_id());

    assert_eq!(dst.ledger(), src.ledger());
    assert_eq!(dst.pool(&promoted), src.pool(&promoted));
    assert_eq!(dst.curve(&curved), src.curve(&curved));
    for who in ["alice", "bob", "carol", "maker", "treasury"] {
        assert_eq!(dst.balance_of(NATIVE_ASSET, who), src.balance_of(NATIVE_ASSET, who));
        assert_eq!(dst.balance_of(&promoted, who), src.balance_of(&promoted, who));
        assert_eq!(dst.balance_of(&curved, who), src.balance_of(&curved, who));
    }
    assert!(dst.registry().resolve(&promoted).is_some());
    assert!(dst.registry().resolve(&curved).is_some());
    // Source admins first, then the destination's own
    assert_eq!(dst.config().admins.members(), ["admin", "ops"]);
    assert!(dst.audit().is_ok());
}

#[test]
fn test_source_frozen_after_finalize() {
    let (mut src, promoted, curved) = populated_source();
    let mut dst = destination();
    hand_off(&mut src, &mut dst, "admin", 10).unwrap();
    assert_eq!(src.migration_phase(), MigrationPhase::Migrated);

    let frozen = src.state().clone();
    let err = src
        .buy(&CallContext::new("alice", 11).with_value(10), &curved, 0, None)
        .unwrap_err();
    assert_eq!(err, EngineError::MigrationInProgress);
    assert_eq!(
        src.withdraw(&CallContext::new("treasury", 11), 1).unwrap_err(),
        EngineError::MigrationInProgress
    );
    assert_eq!(
        src.set_paused(&CallContext::new("admin", 11), true).unwrap_err(),
        EngineError::MigrationInProgress
    );
    assert_eq!(
        src.cancel_migration(&CallContext::new("admin", 11)).unwrap_err(),
        EngineError::MigrationInProgress
    );
    assert_eq!(src.state(), &frozen);

    // Reads keep working
    assert!(src.price(&promoted).is_ok());
    assert!(src.audit().is_ok());

    // Trading continues on the destination
    let r = dst
        .buy(&CallContext::new("alice", 12).with_value(1_000), &promoted, 0, None)
        .unwrap();
    assert_eq!(r.venue, "pool");
    assert!(dst.audit().is_ok());
}

#[test]
fn test_confirm_and_finalize_are_idempotent() {
    let (mut src, _, _) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);

    src.propose_migration(&admin, dst.instance_id()).unwrap();
    let package = src.export_migration(&admin).unwrap();
    let ack = dst
        .confirm_migration(&admin, src.instance_id(), &package)
        .unwrap();
    let after_first = dst.state().clone();

    // Replay with a later timestamp: same ack, untouched state
    let replay = dst
        .confirm_migration(&CallContext::new("admin", 99), src.instance_id(), &package)
        .unwrap();
    assert_eq!(replay, ack);
    assert_eq!(dst.state(), &after_first);

    src.finalize_migration(&admin, &ack).unwrap();
    let finalized = src.state().clone();
    src.finalize_migration(&admin, &ack).unwrap();
    assert_eq!(src.state(), &finalized);

    // Driving the whole handoff again re-delivers the same package
    assert_eq!(hand_off(&mut src, &mut dst, "admin", 20).unwrap(), ack);
    assert_eq!(src.state(), &finalized);
    assert_eq!(dst.state(), &after_first);
}

#[test]
fn test_finalize_before_import_recovers() {
    let (mut src, promoted, _) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, dst.instance_id()).unwrap();
    let package = src.export_migration(&admin).unwrap();

    // Ack assembled from public data before the destination saw anything
    let early = MigrationAck {
        source: package.source.clone(),
        destination: package.destination.clone(),
        state_root: package.state_root.clone(),
        checksum: package.checksum.clone(),
        confirmed_at: 10,
    };
    src.finalize_migration(&admin, &early).unwrap();
    assert_eq!(src.migration_phase(), MigrationPhase::Migrated);

    // The frozen source still hands out the same package
    let again = src.export_migration(&admin).unwrap();
    assert_eq!(again, package);
    let ack = dst
        .confirm_migration(&admin, src.instance_id(), &again)
        .unwrap();
    src.finalize_migration(&admin, &ack).unwrap();
    assert_eq!(dst.ledger(), src.ledger());
    assert_eq!(dst.balance_of(&promoted, "alice"), src.balance_of(&promoted, "alice"));
}

// ============================================================================
// 4. TAMPER DETECTION
// ============================================================================

#[test]
fn test_tampered_package_rejected() {
    let (mut src, promoted, _) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, dst.instance_id()).unwrap();
    let package = src.export_migration(&admin).unwrap();
    let pristine = dst.state().clone();

    // Inflate a balance and re-serialise
    let mut json: serde_json::Value = serde_json::to_value(&package).unwrap();
    json["market"]["ledger"]["balances"][&promoted]["alice"] =
        serde_json::Value::String("999999999999".to_string());
    let forged: MigrationPackage = serde_json::from_value(json).unwrap();
    let err = dst
        .confirm_migration(&admin, src.instance_id(), &forged)
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidParameters");

    // Recomputed checksum still fails the state root and audit
    let mut rehashed = forged.clone();
    rehashed.checksum = rehashed.compute_checksum().unwrap();
    assert!(dst
        .confirm_migration(&admin, src.instance_id(), &rehashed)
        .is_err());

    // Wrong claimed source
    assert!(dst.confirm_migration(&admin, "FUNiother", &package).is_err());
    assert_eq!(dst.state(), &pristine);

    // The genuine package still applies
    assert!(dst
        .confirm_migration(&admin, src.instance_id(), &package)
        .is_ok());
}

#[test]
fn test_package_for_other_destination_rejected() {
    let (mut src, _, _) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, "FUNielsewhere").unwrap();
    let package = src.export_migration(&admin).unwrap();
    assert!(dst
        .confirm_migration(&admin, src.instance_id(), &package)
        .is_err());
}

// ============================================================================
// 5-6. CANCEL & AUTHORITY
// ============================================================================

#[test]
fn test_cancel_reopens_trading() {
    let (mut src, _, curved) = populated_source();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, "FUNinext").unwrap();

    let buy = CallContext::new("alice", 11).with_value(1_000);
    assert_eq!(
        src.buy(&buy, &curved, 0, None).unwrap_err(),
        EngineError::MigrationInProgress
    );
    assert_eq!(
        src.propose_migration(&admin, "FUNiother").unwrap_err(),
        EngineError::MigrationInProgress
    );

    src.cancel_migration(&admin).unwrap();
    assert_eq!(src.migration_phase(), MigrationPhase::Active);
    assert!(src.buy(&buy, &curved, 0, None).is_ok());
    assert_eq!(
        src.cancel_migration(&admin).unwrap_err().kind(),
        "InvalidParameters"
    );
}

#[test]
fn test_cancel_refused_after_import() {
    let (mut src, promoted, _) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, dst.instance_id()).unwrap();
    let package = src.export_migration(&admin).unwrap();
    dst.confirm_migration(&admin, src.instance_id(), &package)
        .unwrap();

    let held = src.state().clone();
    assert_eq!(
        src.cancel_migration(&admin).unwrap_err(),
        EngineError::MigrationInProgress
    );
    assert_eq!(src.state(), &held);

    // Balances are live on the destination only
    let tokens = src.balance_of(&promoted, "alice");
    assert_eq!(
        src.sell(&CallContext::new("alice", 11), &promoted, tokens, 0, None)
            .unwrap_err(),
        EngineError::MigrationInProgress
    );
    assert!(dst
        .sell(&CallContext::new("alice", 11), &promoted, tokens, 0, None)
        .is_ok());

    // A destination that already imported cannot decline
    assert!(dst.decline_migration(&admin, &package).is_err());
}

#[test]
fn test_declined_package_reopens_source() {
    let (mut src, _, curved) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, dst.instance_id()).unwrap();
    let package = src.export_migration(&admin).unwrap();
    assert_eq!(
        src.cancel_migration(&admin).unwrap_err(),
        EngineError::MigrationInProgress
    );

    let decline = dst.decline_migration(&admin, &package).unwrap();
    assert_eq!(dst.decline_migration(&admin, &package).unwrap(), decline);
    assert!(dst
        .confirm_migration(&admin, src.instance_id(), &package)
        .is_err());
    assert!(dst.ledger().is_pristine());

    // A decline for some other package does not count
    let mut other = decline.clone();
    other.checksum = "00".repeat(32);
    assert!(src.abandon_migration(&admin, &other).is_err());
    assert!(src
        .abandon_migration(&CallContext::new("alice", 11), &decline)
        .is_err());

    src.abandon_migration(&admin, &decline).unwrap();
    assert_eq!(src.migration_phase(), MigrationPhase::Active);
    assert!(src
        .buy(&CallContext::new("alice", 12).with_value(1_000), &curved, 0, None)
        .is_ok());
}

#[test]
fn test_only_admins_migrate() {
    let (mut src, _, _) = populated_source();
    let mut dst = destination();
    let user = CallContext::new("alice", 10);
    let admin = CallContext::new("admin", 10);

    assert_eq!(
        src.propose_migration(&user, dst.instance_id()).unwrap_err(),
        EngineError::NotAdmin("alice".to_string())
    );
    src.propose_migration(&admin, dst.instance_id()).unwrap();
    assert!(src.export_migration(&user).is_err());
    assert!(src.cancel_migration(&user).is_err());

    let package = src.export_migration(&admin).unwrap();
    assert_eq!(
        dst.confirm_migration(&user, src.instance_id(), &package)
            .unwrap_err(),
        EngineError::NotAdmin("alice".to_string())
    );
    assert!(hand_off(&mut src, &mut dst, "mallory", 11).is_err());
    assert_eq!(src.migration_phase(), MigrationPhase::MigrationProposed);
}

#[test]
fn test_only_admins_finalize() {
    let (mut src, _, _) = populated_source();
    let mut dst = destination();
    let admin = CallContext::new("admin", 10);
    src.propose_migration(&admin, dst.instance_id()).unwrap();

    // No ack is accepted before a package has been exported
    let ack = MigrationAck {
        source: src.instance_id().to_string(),
        destination: dst.instance_id().to_string(),
        state_root: src.ledger().state_root(),
        checksum: "00".repeat(32),
        confirmed_at: 10,
    };
    assert_eq!(
        src.finalize_migration(&admin, &ack).unwrap_err().kind(),
        "InvalidParameters"
    );

    let exported = src.export_migration(&admin).unwrap();
    let ack = dst
        .confirm_migration(&admin, src.instance_id(), &exported)
        .unwrap();
    let before = src.state().clone();
    assert_eq!(
        src.finalize_migration(&CallContext::new("alice", 11), &ack)
            .unwrap_err(),
        EngineError::NotAdmin("alice".to_string())
    );
    assert_eq!(src.state(), &before);
    assert_eq!(src.migration_phase(), MigrationPhase::MigrationProposed);
    src.finalize_migration(&admin, &ack).unwrap();
    assert_eq!(src.migration_phase(), MigrationPhase::Migrated);
}
