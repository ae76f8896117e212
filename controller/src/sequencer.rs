use crate::error::ControllerError;
use crate::reads::ReadKey;
use crate::state::{ActionKind, PendingTransaction, TxHash};
use crate::MAX_RECENT_TRANSACTIONS;

use log::debug;

use std::collections::VecDeque;

/// Final state of a submitted transaction as reported by the receipt watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed,
    Reverted,
    /// The receipt could not be obtained.
    Dropped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Reverted,
    Dropped,
}

impl From<TxOutcome> for TxStatus {
    fn from(outcome: TxOutcome) -> Self {
        match outcome {
            TxOutcome::Confirmed => TxStatus::Confirmed,
            TxOutcome::Reverted => TxStatus::Reverted,
            TxOutcome::Dropped => TxStatus::Dropped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentTransaction {
    pub hash: TxHash,
    pub description: &'static str,
    pub status: TxStatus,
}

/// Reservation of a slot while the wallet is asked to sign.
#[derive(Debug, PartialEq, Eq)]
pub struct SubmitTicket {
    pub kind: ActionKind,
    id: u64,
}

/// Handle of a transaction awaiting its receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxHandle {
    pub kind: ActionKind,
    pub hash: TxHash,
    id: u64,
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Signing { id: u64 },
    Pending { id: u64, tx: PendingTransaction },
}

/// Reads to refresh once a transaction of `kind` has resolved.
pub fn refetch_set(kind: ActionKind) -> &'static [ReadKey] {
    match kind {
        ActionKind::Approve => &[ReadKey::Allowance],
        ActionKind::Deposit => &[
            ReadKey::Allowance,
            ReadKey::UserInfo,
            ReadKey::ExpectedClaimAmount,
            ReadKey::SaleBalance,
            ReadKey::TotalRaised,
        ],
        ActionKind::Claim => &[ReadKey::UserInfo, ReadKey::ExpectedClaimAmount],
    }
}

/// Holds at most one outstanding transaction per [`ActionKind`].
///
/// A slot is taken by [`begin`](Self::begin) before the wallet signs and is
/// released either by [`abort`](Self::abort) (signature refused) or by
/// [`finish`](Self::finish) once the receipt arrived and the dependent reads
/// were refreshed.
#[derive(Debug, Default)]
pub struct TransactionSequencer {
    slots: [Option<Slot>; 3],
    next_id: u64,
    recent: VecDeque<RecentTransaction>,
}

impl TransactionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, kind: ActionKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Whether any submitted transaction is waiting for its receipt.
    pub fn any_awaiting_confirmation(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| matches!(slot, Some(Slot::Pending { tx, .. }) if !tx.confirmed))
    }

    pub fn pending(&self, kind: ActionKind) -> Option<&PendingTransaction> {
        match &self.slots[kind.index()] {
            Some(Slot::Pending { tx, .. }) => Some(tx),
            _ => None,
        }
    }

    pub fn begin(&mut self, kind: ActionKind) -> Result<SubmitTicket, ControllerError> {
        let slot = &mut self.slots[kind.index()];
        if slot.is_some() {
            return Err(ControllerError::TransactionPending(kind));
        }
        self.next_id += 1;
        *slot = Some(Slot::Signing { id: self.next_id });
        Ok(SubmitTicket {
            kind,
            id: self.next_id,
        })
    }

    /// Records the hash returned by the wallet.
    pub fn submitted(
        &mut self,
        ticket: SubmitTicket,
        hash: TxHash,
    ) -> Result<TxHandle, ControllerError> {
        let slot = &mut self.slots[ticket.kind.index()];
        if !matches!(slot, Some(Slot::Signing { id }) if *id == ticket.id) {
            return Err(ControllerError::UnknownTransaction);
        }
        *slot = Some(Slot::Pending {
            id: ticket.id,
            tx: PendingTransaction {
                kind: ticket.kind,
                hash,
                confirmed: false,
            },
        });
        if self.recent.len() == MAX_RECENT_TRANSACTIONS {
            self.recent.pop_front();
        }
        self.recent.push_back(RecentTransaction {
            hash,
            description: ticket.kind.description(),
            status: TxStatus::Pending,
        });
        Ok(TxHandle {
            kind: ticket.kind,
            hash,
            id: ticket.id,
        })
    }

    /// Releases a slot whose signature was refused.
    pub fn abort(&mut self, ticket: SubmitTicket) {
        let slot = &mut self.slots[ticket.kind.index()];
        if matches!(slot, Some(Slot::Signing { id }) if *id == ticket.id) {
            *slot = None;
            debug!("{} slot released without submission", ticket.kind);
        }
    }

    /// Registers the receipt of a transaction and returns the reads to
    /// refresh before calling [`finish`](Self::finish). The slot stays
    /// occupied in the meantime.
    pub fn resolve(
        &mut self,
        handle: &TxHandle,
        outcome: TxOutcome,
    ) -> Result<&'static [ReadKey], ControllerError> {
        match &mut self.slots[handle.kind.index()] {
            Some(Slot::Pending { id, tx }) if *id == handle.id => {
                tx.confirmed = outcome == TxOutcome::Confirmed;
            }
            _ => return Err(ControllerError::UnknownTransaction),
        }
        if let Some(entry) = self.recent.iter_mut().rev().find(|e| e.hash == handle.hash) {
            entry.status = outcome.into();
        }
        Ok(refetch_set(handle.kind))
    }

    /// Clears the slot of a resolved transaction.
    pub fn finish(&mut self, handle: &TxHandle) -> Result<(), ControllerError> {
        let slot = &mut self.slots[handle.kind.index()];
        if !matches!(slot, Some(Slot::Pending { id, .. }) if *id == handle.id) {
            return Err(ControllerError::UnknownTransaction);
        }
        *slot = None;
        debug!("{} slot released    hash: {}", handle.kind, handle.hash);
        Ok(())
    }

    pub fn recent(&self) -> impl Iterator<Item = &RecentTransaction> {
        self.recent.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hash(n: u8) -> TxHash {
        TxHash([n; 32])
    }

    #[test]
    fn one_pending_transaction_per_kind() {
        let mut sequencer = TransactionSequencer::new();
        let ticket = sequencer.begin(ActionKind::Approve).unwrap();
        assert!(sequencer.is_pending(ActionKind::Approve));
        assert_eq!(
            sequencer.begin(ActionKind::Approve),
            Err(ControllerError::TransactionPending(ActionKind::Approve))
        );
        // other kinds are independent
        let claim = sequencer.begin(ActionKind::Claim).unwrap();
        sequencer.abort(claim);
        assert!(!sequencer.is_pending(ActionKind::Claim));

        let handle = sequencer.submitted(ticket, hash(1)).unwrap();
        assert!(sequencer.any_awaiting_confirmation());
        assert_eq!(
            sequencer.begin(ActionKind::Approve),
            Err(ControllerError::TransactionPending(ActionKind::Approve))
        );

        let refetch = sequencer.resolve(&handle, TxOutcome::Confirmed).unwrap();
        assert_eq!(refetch, &[ReadKey::Allowance]);
        // the slot is held until the refetch has been applied
        assert!(sequencer.is_pending(ActionKind::Approve));
        assert!(!sequencer.any_awaiting_confirmation());
        assert!(sequencer.pending(ActionKind::Approve).unwrap().confirmed);

        sequencer.finish(&handle).unwrap();
        assert!(!sequencer.is_pending(ActionKind::Approve));
        assert!(sequencer.begin(ActionKind::Approve).is_ok());
    }

    #[test]
    fn aborted_signature_frees_slot() {
        let mut sequencer = TransactionSequencer::new();
        let ticket = sequencer.begin(ActionKind::Deposit).unwrap();
        sequencer.abort(ticket);
        assert!(!sequencer.is_pending(ActionKind::Deposit));
        assert_eq!(sequencer.recent().count(), 0);
    }

    #[test]
    fn reverted_transaction_clears_slot() {
        let mut sequencer = TransactionSequencer::new();
        let ticket = sequencer.begin(ActionKind::Deposit).unwrap();
        let handle = sequencer.submitted(ticket, hash(2)).unwrap();
        let refetch = sequencer.resolve(&handle, TxOutcome::Reverted).unwrap();
        assert!(refetch.contains(&ReadKey::UserInfo));
        assert!(!sequencer.pending(ActionKind::Deposit).unwrap().confirmed);
        sequencer.finish(&handle).unwrap();
        assert!(!sequencer.is_pending(ActionKind::Deposit));
        let recent: Vec<_> = sequencer.recent().collect();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].status, TxStatus::Reverted);
        assert_eq!(recent[0].description, "Buy tx");
    }

    #[test]
    fn stale_handles_are_refused() {
        let mut sequencer = TransactionSequencer::new();
        let ticket = sequencer.begin(ActionKind::Claim).unwrap();
        let handle = sequencer.submitted(ticket, hash(3)).unwrap();
        sequencer.resolve(&handle, TxOutcome::Confirmed).unwrap();
        sequencer.finish(&handle).unwrap();
        assert_eq!(
            sequencer.resolve(&handle, TxOutcome::Confirmed),
            Err(ControllerError::UnknownTransaction)
        );
        assert_eq!(
            sequencer.finish(&handle),
            Err(ControllerError::UnknownTransaction)
        );

        // a handle of an earlier transaction does not release a newer one
        let ticket = sequencer.begin(ActionKind::Claim).unwrap();
        let newer = sequencer.submitted(ticket, hash(4)).unwrap();
        assert_eq!(
            sequencer.finish(&handle),
            Err(ControllerError::UnknownTransaction)
        );
        assert_eq!(sequencer.pending(ActionKind::Claim).unwrap().hash, newer.hash);
    }

    #[test]
    fn recent_log_is_bounded() {
        let mut sequencer = TransactionSequencer::new();
        for n in 0..(MAX_RECENT_TRANSACTIONS as u8 + 3) {
            let ticket = sequencer.begin(ActionKind::Approve).unwrap();
            let handle = sequencer.submitted(ticket, hash(n)).unwrap();
            sequencer.resolve(&handle, TxOutcome::Confirmed).unwrap();
            sequencer.finish(&handle).unwrap();
        }
        assert_eq!(sequencer.recent().count(), MAX_RECENT_TRANSACTIONS);
        assert_eq!(sequencer.recent().next().unwrap().hash, hash(3));
        assert!(sequencer
            .recent()
            .all(|tx| tx.status == TxStatus::Confirmed));
    }
}
