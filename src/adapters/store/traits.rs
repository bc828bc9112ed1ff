//! Remote store abstraction
//!
//! This module defines the trait that store adapters must implement. It is
//! the contract the publisher consumes: range reads and writes, range
//! clearing, structure listing, and batched structural updates that can
//! combine add/delete/rename in one atomic call.

use crate::domain::ids::TargetId;
use crate::domain::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A contiguous row range: `start` offset and `count` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub count: usize,
}

impl RowRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// Range covering the whole structure
    pub fn all() -> Self {
        Self {
            start: 0,
            count: usize::MAX,
        }
    }
}

/// One remote structure as reported by `list_structures`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub id: String,
    pub name: String,
}

/// A structural operation; multiple ops submitted together execute atomically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum StructuralOp {
    AddStructure { name: String },
    DeleteStructure { name: String },
    RenameStructure { from: String, to: String },
}

/// Result of a range write
///
/// `updated_row_count` must equal the number of rows submitted; the
/// publisher treats any other value as a failed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub updated_row_count: usize,
}

/// Remote tabular store client
///
/// Implementations translate transport failures into the `StoreError`
/// taxonomy so the publisher can choose a retry policy from the error
/// variant alone. The store rejects payloads above ~2 MB and intermittently
/// returns overload errors under sustained large-payload load.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read rows from a range of the target structure.
    ///
    /// A range reaching past the end of the structure returns the available
    /// suffix rather than an error.
    async fn get_range(&self, target: &TargetId, range: RowRange) -> Result<Vec<Vec<String>>>;

    /// Write rows at a range offset, replacing whole rows.
    async fn update_range(
        &self,
        target: &TargetId,
        range: RowRange,
        rows: &[Vec<String>],
    ) -> Result<UpdateOutcome>;

    /// Clear rows in a range of the target structure.
    async fn clear_range(&self, target: &TargetId, range: RowRange) -> Result<()>;

    /// List every structure on the store.
    async fn list_structures(&self) -> Result<Vec<StructureInfo>>;

    /// Execute structural operations in one atomic request.
    ///
    /// Either every operation applies or none does; there is never a window
    /// with zero or two structures under one name.
    async fn batch_structural_update(&self, ops: &[StructuralOp]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_range_all() {
        let range = RowRange::all();
        assert_eq!(range.start, 0);
        assert_eq!(range.count, usize::MAX);
    }

    #[test]
    fn test_structural_op_wire_format() {
        let op = StructuralOp::RenameStructure {
            from: "roster__staging_ab12".to_string(),
            to: "roster".to_string(),
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"op\":\"renameStructure\""));
        assert!(json.contains("\"from\":\"roster__staging_ab12\""));
    }
}
