//! Checkpoint model for resumable publishing
//!
//! A checkpoint describes a fully committed prefix of an upload: it is
//! written only immediately after a batch's write and inline validation
//! succeed, never mid-batch, so resuming from it can never replay a partial
//! batch.

use crate::domain::ids::TargetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable progress record for one publish target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Target this checkpoint belongs to
    pub target_id: TargetId,
    /// Rows confirmed written (a committed prefix of the input)
    pub rows_processed: usize,
    /// Index of the next batch to upload
    pub batch_index: usize,
    /// Batch size in effect when the checkpoint was taken
    pub current_batch_size: usize,
    /// Errors observed so far in the run (retried or fatal)
    pub errors: Vec<String>,
    /// When the checkpoint was persisted
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a checkpoint for a fresh run
    pub fn new(target_id: TargetId, batch_size: usize) -> Self {
        Self {
            target_id,
            rows_processed: 0,
            batch_index: 0,
            current_batch_size: batch_size,
            errors: Vec::new(),
            saved_at: Utc::now(),
        }
    }

    /// Advance past a committed batch
    pub fn advance(&mut self, batch_len: usize, batch_size: usize) {
        self.rows_processed += batch_len;
        self.batch_index += 1;
        self.current_batch_size = batch_size;
        self.saved_at = Utc::now();
    }

    /// Record an error message without losing progress
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetId {
        TargetId::new("roster").unwrap()
    }

    #[test]
    fn test_new_checkpoint_starts_at_zero() {
        let cp = Checkpoint::new(target(), 3000);
        assert_eq!(cp.rows_processed, 0);
        assert_eq!(cp.batch_index, 0);
        assert_eq!(cp.current_batch_size, 3000);
        assert!(cp.errors.is_empty());
    }

    #[test]
    fn test_advance_tracks_committed_prefix() {
        let mut cp = Checkpoint::new(target(), 3000);
        cp.advance(3000, 3000);
        cp.advance(1500, 1500);
        assert_eq!(cp.rows_processed, 4500);
        assert_eq!(cp.batch_index, 2);
        assert_eq!(cp.current_batch_size, 1500);
    }

    #[test]
    fn test_record_error_keeps_progress() {
        let mut cp = Checkpoint::new(target(), 3000);
        cp.advance(3000, 3000);
        cp.record_error("store overloaded at batch 1");
        assert_eq!(cp.rows_processed, 3000);
        assert_eq!(cp.errors.len(), 1);
    }

    #[test]
    fn test_checkpoint_serialization() {
        let mut cp = Checkpoint::new(target(), 1500);
        cp.advance(1500, 1500);
        let json = serde_json::to_string(&cp).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rows_processed, 1500);
        assert_eq!(back.batch_index, 1);
        assert_eq!(back.target_id, cp.target_id);
    }
}
