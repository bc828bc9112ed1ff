//! Domain models and types for tabsync.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TargetId`])
//! - **Record model** ([`Row`], [`SourceFile`], [`MergedRecord`])
//! - **Error types** ([`SyncError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! tabsync uses the newtype pattern for identifiers so target names cannot be
//! confused with arbitrary strings:
//!
//! ```rust
//! use tabsync::domain::TargetId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let target = TargetId::new("roster_2024")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`] with [`SyncError`]:
//!
//! ```rust
//! use tabsync::domain::{Result, SyncError};
//!
//! fn example() -> Result<()> {
//!     Err(SyncError::Validation("row count mismatch".to_string()))
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{StoreError, SyncError};
pub use ids::TargetId;
pub use record::{
    HistoryEntry, MergeStats, MergedRecord, Row, SourceFile, PRIMARY_KEY_FIELD, PROVENANCE_FIELD,
};
pub use result::Result;
