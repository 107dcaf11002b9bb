//! # Instance migration
//!
//! Two-phase, message-passing handoff of the whole [`Market`] and admin
//! authority from one engine instance (source) to its successor
//! (destination).
//!
//! ```text
//! source: Active ──propose──▶ MigrationProposed ──finalize(ack)──▶ Migrated
//!                  ◀─cancel──┘        │ export()                     │ export()
//!                  ◀─abandon(decline)─┤                              ▼
//!                                     ▼                         (re-delivery)
//! destination:  confirm(package) ──▶ MigrationAck
//!               decline(package) ──▶ MigrationDecline
//! ```
//!
//! While `MigrationProposed` or `Migrated` every mutating entry point on the
//! source fails with `MigrationInProgress`; reads keep working. Confirm and
//! decline are idempotent per `(source, destination)` pair and exclude each
//! other. Once a package has left the source, only a decline from the
//! destination can reopen it.

use crate::market::Market;
use crate::registry::AssetRegistry;
use crate::transfer::ValueTransfer;
use crate::{CallContext, Engine, EngineState};
use funpad_core::{AdminSet, EngineError, EngineResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Active,
    MigrationProposed,
    Migrated,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Proposed,
    Exported,
    Confirmed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub source: String,
    pub destination: String,
    pub status: MigrationStatus,
    pub proposed_at: u64,
    /// Checksum of the package handed out by the first export
    #[serde(default)]
    pub exported_checksum: Option<String>,
    #[serde(default)]
    pub exported_at: Option<u64>,
    #[serde(default)]
    pub confirmed_at: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub phase: MigrationPhase,
    /// Outbound migration of this instance, if any
    pub outbound: Option<MigrationRecord>,
    /// Imports already applied, keyed by `source->destination`
    pub inbound: BTreeMap<String, MigrationAck>,
    /// Packages this instance refused, same keys
    #[serde(default)]
    pub declined: BTreeMap<String, MigrationDecline>,
}

impl Default for MigrationState {
    fn default() -> Self {
        Self {
            phase: MigrationPhase::Active,
            outbound: None,
            inbound: BTreeMap::new(),
            declined: BTreeMap::new(),
        }
    }
}

impl MigrationState {
    pub fn require_active(&self) -> EngineResult<()> {
        match self.phase {
            MigrationPhase::Active => Ok(()),
            _ => Err(EngineError::MigrationInProgress),
        }
    }
}

/// Snapshot of a source instance, produced by [`export`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationPackage {
    pub source: String,
    pub destination: String,
    pub proposed_at: u64,
    pub admins: Vec<String>,
    pub launch_seq: u64,
    pub market: Market,
    #[serde(with = "funpad_core::u128_map_str")]
    pub totals: BTreeMap<String, u128>,
    pub state_root: String,
    pub checksum: String,
}

#[derive(Serialize)]
struct PackageBody<'a> {
    source: &'a str,
    destination: &'a str,
    proposed_at: u64,
    admins: &'a [String],
    launch_seq: u64,
    market: &'a Market,
    #[serde(with = "funpad_core::u128_map_str")]
    totals: &'a BTreeMap<String, u128>,
    state_root: &'a str,
}

impl MigrationPackage {
    /// SHA3-256 over the canonical JSON of everything except the checksum.
    pub fn compute_checksum(&self) -> EngineResult<String> {
        let body = PackageBody {
            source: &self.source,
            destination: &self.destination,
            proposed_at: self.proposed_at,
            admins: &self.admins,
            launch_seq: self.launch_seq,
            market: &self.market,
            totals: &self.totals,
            state_root: &self.state_root,
        };
        let bytes = serde_json::to_vec(&body)
            .map_err(|e| EngineError::InvalidParameters(format!("package encoding: {}", e)))?;
        Ok(hex::encode(Sha3_256::digest(&bytes)))
    }

    /// Checksum, state root, totals and venue/custody consistency.
    pub fn verify(&self) -> EngineResult<()> {
        if self.compute_checksum()? != self.checksum {
            return Err(EngineError::InvalidParameters(
                "migration package checksum mismatch".to_string(),
            ));
        }
        if self.market.ledger.state_root() != self.state_root {
            return Err(EngineError::InvalidParameters(
                "migration package state root mismatch".to_string(),
            ));
        }
        if self.market.ledger.asset_totals() != self.totals {
            return Err(EngineError::InvalidParameters(
                "migration package totals mismatch".to_string(),
            ));
        }
        self.market
            .audit()
            .map_err(|e| EngineError::InvalidParameters(format!("migration package audit: {}", e)))
    }
}

/// Destination's receipt for an applied package.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationAck {
    pub source: String,
    pub destination: String,
    pub state_root: String,
    pub checksum: String,
    pub confirmed_at: u64,
}

/// Destination's refusal of a package. Lets the source reopen after export.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationDecline {
    pub source: String,
    pub destination: String,
    pub checksum: String,
    pub declined_at: u64,
}

fn pair_key(source: &str, destination: &str) -> String {
    format!("{}->{}", source, destination)
}

// ─────────────────────────────────────────────────────────────
// SOURCE SIDE
// ─────────────────────────────────────────────────────────────

pub fn propose(state: &mut EngineState, ctx: &CallContext, destination: &str) -> EngineResult<()> {
    state.config.require_admin(&ctx.caller)?;
    state.migration.require_active()?;
    if destination.is_empty() || destination == state.instance_id {
        return Err(EngineError::InvalidParameters(format!(
            "invalid migration destination '{}'",
            destination
        )));
    }
    state.migration.phase = MigrationPhase::MigrationProposed;
    state.migration.outbound = Some(MigrationRecord {
        source: state.instance_id.clone(),
        destination: destination.to_string(),
        status: MigrationStatus::Proposed,
        proposed_at: ctx.timestamp,
        exported_checksum: None,
        exported_at: None,
        confirmed_at: None,
    });
    info!(
        "migration proposed: {} -> {} by {}",
        state.instance_id, destination, ctx.caller
    );
    Ok(())
}

/// Withdraw a proposal whose package never left the source.
pub fn cancel(state: &mut EngineState, ctx: &CallContext) -> EngineResult<String> {
    state.config.require_admin(&ctx.caller)?;
    match state.migration.phase {
        MigrationPhase::MigrationProposed => {}
        MigrationPhase::Migrated => return Err(EngineError::MigrationInProgress),
        MigrationPhase::Active => {
            return Err(EngineError::InvalidParameters(
                "no migration to cancel".to_string(),
            ))
        }
    }
    if let Some(record) = &state.migration.outbound {
        if record.exported_checksum.is_some() {
            warn!(
                "cancel of {} -> {} refused: package already exported",
                record.source, record.destination
            );
            return Err(EngineError::MigrationInProgress);
        }
    }
    let record = state
        .migration
        .outbound
        .take()
        .ok_or_else(|| EngineError::InvalidParameters("no migration record".to_string()))?;
    state.migration.phase = MigrationPhase::Active;
    info!(
        "migration {} -> {} cancelled by {}",
        record.source, record.destination, ctx.caller
    );
    Ok(record.destination)
}

/// Reopen an exported migration the destination has declined.
pub fn abandon(state: &mut EngineState, ctx: &CallContext, decline: &MigrationDecline) -> EngineResult<String> {
    state.config.require_admin(&ctx.caller)?;
    let record = proposed_record(state)?;
    let exported = record
        .exported_checksum
        .as_deref()
        .ok_or_else(|| EngineError::InvalidParameters("no package exported".to_string()))?;
    if decline.source != state.instance_id
        || decline.destination != record.destination
        || decline.checksum != exported
    {
        return Err(EngineError::InvalidParameters(format!(
            "decline for {} -> {} does not match the exported package",
            decline.source, decline.destination
        )));
    }
    let destination = record.destination.clone();
    state.migration.outbound = None;
    state.migration.phase = MigrationPhase::Active;
    info!(
        "migration {} -> {} abandoned after decline, by {}",
        decline.source, destination, ctx.caller
    );
    Ok(destination)
}

fn proposed_record(state: &EngineState) -> EngineResult<&MigrationRecord> {
    match (&state.migration.phase, &state.migration.outbound) {
        (MigrationPhase::MigrationProposed, Some(record)) => Ok(record),
        _ => Err(EngineError::InvalidParameters(
            "no migration proposed".to_string(),
        )),
    }
}

fn build_package(state: &EngineState, record: &MigrationRecord) -> EngineResult<MigrationPackage> {
    let mut package = MigrationPackage {
        source: state.instance_id.clone(),
        destination: record.destination.clone(),
        proposed_at: record.proposed_at,
        admins: state.config.admins.members().to_vec(),
        launch_seq: state.launch_seq,
        market: state.market.clone(),
        totals: state.market.ledger.asset_totals(),
        state_root: state.market.ledger.state_root(),
        checksum: String::new(),
    };
    package.checksum = package.compute_checksum()?;
    Ok(package)
}

/// Admin-only snapshot of a source that has proposed a migration. Also
/// allowed once `Migrated`, to re-deliver the same package. The first
/// export is recorded; returns whether this call was it.
pub fn export(state: &mut EngineState, ctx: &CallContext) -> EngineResult<(MigrationPackage, bool)> {
    state.config.require_admin(&ctx.caller)?;
    let record = match (&state.migration.phase, &state.migration.outbound) {
        (MigrationPhase::Active, _) | (_, None) => {
            return Err(EngineError::InvalidParameters(
                "no migration proposed".to_string(),
            ))
        }
        (_, Some(record)) => record,
    };
    let package = build_package(state, record)?;
    match record.exported_checksum.as_deref() {
        Some(prev) if prev == package.checksum => return Ok((package, false)),
        Some(_) => {
            return Err(EngineError::InvalidParameters(
                "frozen state diverged from the exported package".to_string(),
            ))
        }
        None => {}
    }
    if let Some(record) = state.migration.outbound.as_mut() {
        record.status = MigrationStatus::Exported;
        record.exported_checksum = Some(package.checksum.clone());
        record.exported_at = Some(ctx.timestamp);
    }
    info!(
        "migration package {} exported for {}",
        package.checksum, package.destination
    );
    Ok((package, true))
}

/// Admin applies the destination's ack. Returns false when already finalized.
pub fn finalize(state: &mut EngineState, ctx: &CallContext, ack: &MigrationAck) -> EngineResult<bool> {
    state.config.require_admin(&ctx.caller)?;
    if state.migration.phase == MigrationPhase::Migrated {
        let same = state.migration.outbound.as_ref().is_some_and(|r| {
            r.destination == ack.destination
                && ack.source == state.instance_id
                && r.exported_checksum.as_deref() == Some(ack.checksum.as_str())
        });
        if same {
            warn!(
                "migration {} -> {} already finalized",
                ack.source, ack.destination
            );
            return Ok(false);
        }
        return Err(EngineError::MigrationInProgress);
    }
    let record = proposed_record(state)?;
    if ack.source != state.instance_id || ack.destination != record.destination {
        return Err(EngineError::InvalidParameters(format!(
            "ack for {} -> {} does not match this migration",
            ack.source, ack.destination
        )));
    }
    if record.exported_checksum.is_none() {
        return Err(EngineError::InvalidParameters(
            "no package exported for this migration".to_string(),
        ));
    }
    let expected = build_package(state, record)?;
    if record.exported_checksum.as_deref() != Some(ack.checksum.as_str())
        || ack.checksum != expected.checksum
        || ack.state_root != expected.state_root
    {
        return Err(EngineError::InvalidParameters(
            "ack does not match the exported package".to_string(),
        ));
    }

    state.migration.phase = MigrationPhase::Migrated;
    if let Some(record) = state.migration.outbound.as_mut() {
        record.status = MigrationStatus::Confirmed;
        record.confirmed_at = Some(ack.confirmed_at);
    }
    info!(
        "migration finalized by {}: {} frozen, authority with {}",
        ctx.caller, ack.source, ack.destination
    );
    Ok(true)
}

// ─────────────────────────────────────────────────────────────
// DESTINATION SIDE
// ─────────────────────────────────────────────────────────────

/// Import a package. Returns the ack and whether this call applied it
/// (false for a replay of an already imported pair).
pub fn import(
    state: &mut EngineState,
    ctx: &CallContext,
    source: &str,
    package: &MigrationPackage,
) -> EngineResult<(MigrationAck, bool)> {
    state.config.require_admin(&ctx.caller)?;
    let key = pair_key(&package.source, &package.destination);
    if let Some(ack) = state.migration.inbound.get(&key) {
        warn!("migration {} already imported, returning stored ack", key);
        return Ok((ack.clone(), false));
    }
    if state.migration.declined.contains_key(&key) {
        return Err(EngineError::InvalidParameters(format!(
            "migration {} was declined",
            key
        )));
    }
    state.migration.require_active()?;
    if package.source != source || package.destination != state.instance_id {
        return Err(EngineError::InvalidParameters(format!(
            "package {} -> {} is not addressed from {} to {}",
            package.source, package.destination, source, state.instance_id
        )));
    }
    package.verify()?;
    if !state.market.is_pristine() {
        return Err(EngineError::InvalidParameters(
            "destination ledger is not empty".to_string(),
        ));
    }

    state.market = package.market.clone();
    state.launch_seq = state.launch_seq.max(package.launch_seq);
    let merged = AdminSet::new(
        package
            .admins
            .iter()
            .chain(state.config.admins.members().iter())
            .cloned(),
    );
    state.config.admins = merged;

    let ack = MigrationAck {
        source: package.source.clone(),
        destination: package.destination.clone(),
        state_root: package.state_root.clone(),
        checksum: package.checksum.clone(),
        confirmed_at: ctx.timestamp,
    };
    state.migration.inbound.insert(key, ack.clone());
    info!(
        "imported {} assets from {} (root {})",
        state.market.assets.len(),
        source,
        package.state_root
    );
    Ok((ack, true))
}

/// Refuse a package so its source can reopen. Fails once the pair has been
/// imported; a replay returns the stored decline.
pub fn decline(
    state: &mut EngineState,
    ctx: &CallContext,
    package: &MigrationPackage,
) -> EngineResult<(MigrationDecline, bool)> {
    state.config.require_admin(&ctx.caller)?;
    let key = pair_key(&package.source, &package.destination);
    if state.migration.inbound.contains_key(&key) {
        return Err(EngineError::InvalidParameters(format!(
            "migration {} already imported",
            key
        )));
    }
    if let Some(decline) = state.migration.declined.get(&key) {
        warn!("migration {} already declined, returning stored decline", key);
        return Ok((decline.clone(), false));
    }
    if package.destination != state.instance_id {
        return Err(EngineError::InvalidParameters(format!(
            "package is addressed to {}, not {}",
            package.destination, state.instance_id
        )));
    }
    if package.compute_checksum()? != package.checksum {
        return Err(EngineError::InvalidParameters(
            "migration package checksum mismatch".to_string(),
        ));
    }
    let decline = MigrationDecline {
        source: package.source.clone(),
        destination: package.destination.clone(),
        checksum: package.checksum.clone(),
        declined_at: ctx.timestamp,
    };
    state.migration.declined.insert(key, decline.clone());
    info!(
        "migration from {} declined by {}",
        package.source, ctx.caller
    );
    Ok((decline, true))
}

/// Drive a complete migration between two in-process engines. Safe to
/// re-run after a partial failure.
pub fn hand_off<R1, T1, R2, T2>(
    source: &mut Engine<R1, T1>,
    destination: &mut Engine<R2, T2>,
    admin: &str,
    now: u64,
) -> EngineResult<MigrationAck>
where
    R1: AssetRegistry,
    T1: ValueTransfer,
    R2: AssetRegistry,
    T2: ValueTransfer,
{
    let ctx = CallContext::new(admin, now);
    if source.migration_phase() == MigrationPhase::Active {
        let dest_id = destination.instance_id().to_string();
        source.propose_migration(&ctx, &dest_id)?;
    }
    let package = source.export_migration(&ctx)?;
    let ack = destination.confirm_migration(&ctx, source.instance_id(), &package)?;
    source.finalize_migration(&ctx, &ack)?;
    Ok(ack)
}
