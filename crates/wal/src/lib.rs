//! Minimal transaction log.
//!
//! Transactions wrap a single query: the executor begins one, records each
//! operation *after* it has been applied to the graph, and commits on
//! success. The log is a logical redo log without recovery semantics: it
//! lives in memory and commit clears the committed transaction's entries.
//! There is no rollback path; the per-transaction op lists exist so an
//! intention-log refit has somewhere to start.


use common::{EdgeId, KiteError, KiteResult, NodeId, Property, TxnId};
use std::collections::HashMap;
use tracing::debug;

/// A logical change applied to the graph, as observed after the fact.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    AddNode { id: NodeId },
    AddEdge { id: EdgeId },
    UpdateNode { id: NodeId, patch: Vec<Property> },
    UpdateEdge { id: EdgeId, patch: Vec<Property> },
    DeleteNode { id: NodeId },
    DeleteEdge { id: EdgeId },
}

/// Assigns transaction ids and tracks per-transaction operation lists plus
/// a global log.
#[derive(Debug)]
pub struct TxnManager {
    next_txn: u64,
    active: HashMap<TxnId, Vec<Operation>>,
    log: Vec<(TxnId, Operation)>,
}

impl TxnManager {
    pub fn new() -> Self {
        Self {
            next_txn: 1,
            active: HashMap::new(),
            log: Vec::new(),
        }
    }

    /// Start a transaction and return its id. Ids are monotonic from 1.
    pub fn begin(&mut self) -> TxnId {
        let txn = TxnId(self.next_txn);
        self.next_txn += 1;
        self.active.insert(txn, Vec::new());
        debug!(%txn, "begin transaction");
        txn
    }

    /// Record an applied operation against an open transaction.
    pub fn record(&mut self, txn: TxnId, op: Operation) -> KiteResult<()> {
        let ops = self
            .active
            .get_mut(&txn)
            .ok_or(KiteError::UnknownTransaction(txn))?;
        ops.push(op.clone());
        self.log.push((txn, op));
        Ok(())
    }

    /// Commit: drop the transaction's op list and clear its entries from
    /// the global log.
    pub fn commit(&mut self, txn: TxnId) -> KiteResult<()> {
        let ops = self
            .active
            .remove(&txn)
            .ok_or(KiteError::UnknownTransaction(txn))?;
        self.log.retain(|(owner, _)| *owner != txn);
        debug!(%txn, ops = ops.len(), "commit transaction");
        Ok(())
    }

    /// Operations recorded so far by an open transaction.
    pub fn operations(&self, txn: TxnId) -> KiteResult<&[Operation]> {
        self.active
            .get(&txn)
            .map(Vec::as_slice)
            .ok_or(KiteError::UnknownTransaction(txn))
    }

    /// Total entries in the global log across open transactions.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }
}

impl Default for TxnManager {
    fn default() -> Self {
        Self::new()
    }
}
