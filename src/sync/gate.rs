//! Transfer gate
//!
//! The single idempotence mechanism: a transfer is skipped only when both
//! fingerprints are present and equal.

use crate::hash::Fingerprint;
use crate::storage::{AbsentReason, RemoteProbe};

/// Why a transfer goes ahead
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferReason {
    /// No local copy to compare (download target missing)
    LocalAbsent,
    /// No remote fingerprint
    RemoteAbsent(AbsentReason),
    /// Both present, contents differ
    Changed,
}

/// Gate decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Content unchanged, nothing to do
    Skip,
    /// Perform the transfer
    Transfer(TransferReason),
}

impl GateDecision {
    /// Whether the transfer should run
    pub fn should_transfer(&self) -> bool {
        matches!(self, Self::Transfer(_))
    }
}

/// Decide whether to transfer. A local read error is reported by the caller
/// before the gate is consulted, so `local` is only `None` when the local
/// file does not exist.
pub fn decide(local: Option<&Fingerprint>, remote: &RemoteProbe) -> GateDecision {
    match (local, remote) {
        (_, RemoteProbe::Absent(reason)) => GateDecision::Transfer(TransferReason::RemoteAbsent(reason.clone())),
        (None, RemoteProbe::Present(_)) => GateDecision::Transfer(TransferReason::LocalAbsent),
        (Some(local), RemoteProbe::Present(remote)) if local == remote => GateDecision::Skip,
        (Some(_), RemoteProbe::Present(_)) => GateDecision::Transfer(TransferReason::Changed),
    }
}

/// Boolean form of [`decide`]
pub fn should_transfer(local: Option<&Fingerprint>, remote: &RemoteProbe) -> bool {
    decide(local, remote).should_transfer()
}
