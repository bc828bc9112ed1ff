//! In-memory store adapter
//!
//! Backs the `memory` backend for local runs and tests. Structures live in a
//! mutex-guarded map, and a scripted fault queue lets tests inject the same
//! failures the real store produces: overloads, oversized-payload rejections,
//! timeouts, short writes, and rejected structural batches.

use crate::adapters::store::traits::{
    RemoteStore, RowRange, StructuralOp, StructureInfo, UpdateOutcome,
};
use crate::domain::errors::StoreError;
use crate::domain::ids::TargetId;
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// A scripted outcome consumed by the next matching call
#[derive(Debug, Clone)]
pub enum Fault {
    /// No fault; the call proceeds normally (placeholder in a script)
    Pass,
    /// Store is shedding load; the publisher should shrink and retry
    Overload,
    /// Payload rejected against the hard size limit; shrink and retry
    Oversized,
    /// Request timed out; transient, retry at the same size
    Timeout,
    /// Write "succeeds" but reports this many rows instead of the batch size
    ShortWrite(usize),
    /// Write applies only the first N rows yet reports the full batch count
    TornWrite(usize),
    /// Network-level failure
    Network,
}

impl Fault {
    fn into_error(self) -> StoreError {
        match self {
            Fault::Overload => StoreError::Overloaded("scripted overload".to_string()),
            Fault::Oversized => StoreError::PayloadTooLarge("scripted rejection".to_string()),
            Fault::Timeout => StoreError::Timeout("scripted timeout".to_string()),
            Fault::Network => StoreError::Network("connection reset".to_string()),
            Fault::Pass | Fault::ShortWrite(_) | Fault::TornWrite(_) => {
                unreachable!("not an error outcome")
            }
        }
    }
}

#[derive(Default)]
struct Inner {
    structures: HashMap<String, Vec<Vec<String>>>,
    update_faults: VecDeque<Fault>,
    structural_faults: VecDeque<Fault>,
    update_calls: usize,
    structural_calls: usize,
}

/// Mutex-guarded in-memory implementation of [`RemoteStore`]
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a structure with the given rows, replacing any existing one.
    pub async fn seed(&self, target: &TargetId, rows: Vec<Vec<String>>) {
        let mut inner = self.inner.lock().await;
        inner.structures.insert(target.as_str().to_string(), rows);
    }

    /// Queue faults consumed by subsequent `update_range` calls, in order.
    pub async fn fail_next_updates(&self, faults: Vec<Fault>) {
        let mut inner = self.inner.lock().await;
        inner.update_faults.extend(faults);
    }

    /// Queue faults consumed by subsequent `batch_structural_update` calls.
    pub async fn fail_next_structural(&self, faults: Vec<Fault>) {
        let mut inner = self.inner.lock().await;
        inner.structural_faults.extend(faults);
    }

    /// Full content of a structure, empty if it does not exist.
    pub async fn rows(&self, target: &TargetId) -> Vec<Vec<String>> {
        let inner = self.inner.lock().await;
        inner
            .structures
            .get(target.as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub async fn has_structure(&self, name: &str) -> bool {
        let inner = self.inner.lock().await;
        inner.structures.contains_key(name)
    }

    pub async fn update_call_count(&self) -> usize {
        self.inner.lock().await.update_calls
    }

    pub async fn structural_call_count(&self) -> usize {
        self.inner.lock().await.structural_calls
    }
}

fn clamp_range(len: usize, range: RowRange) -> (usize, usize) {
    let start = range.start.min(len);
    let end = range.start.saturating_add(range.count).min(len);
    (start, end)
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn get_range(&self, target: &TargetId, range: RowRange) -> Result<Vec<Vec<String>>> {
        let inner = self.inner.lock().await;
        let rows = inner
            .structures
            .get(target.as_str())
            .ok_or_else(|| StoreError::StructureNotFound(target.as_str().to_string()))?;
        let (start, end) = clamp_range(rows.len(), range);
        Ok(rows[start..end].to_vec())
    }

    async fn update_range(
        &self,
        target: &TargetId,
        range: RowRange,
        rows: &[Vec<String>],
    ) -> Result<UpdateOutcome> {
        let mut inner = self.inner.lock().await;
        inner.update_calls += 1;

        let mut apply = rows.len();
        let mut report = rows.len();
        match inner.update_faults.pop_front() {
            None | Some(Fault::Pass) => {}
            Some(Fault::ShortWrite(reported)) => report = reported,
            Some(Fault::TornWrite(applied)) => apply = applied.min(rows.len()),
            Some(fault) => return Err(fault.into_error().into()),
        }

        let structure = inner
            .structures
            .get_mut(target.as_str())
            .ok_or_else(|| StoreError::StructureNotFound(target.as_str().to_string()))?;

        let end = range.start + apply;
        if structure.len() < end {
            structure.resize(end, Vec::new());
        }
        structure[range.start..end].clone_from_slice(&rows[..apply]);

        Ok(UpdateOutcome {
            updated_row_count: report,
        })
    }

    async fn clear_range(&self, target: &TargetId, range: RowRange) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let structure = inner
            .structures
            .get_mut(target.as_str())
            .ok_or_else(|| StoreError::StructureNotFound(target.as_str().to_string()))?;
        let (start, end) = clamp_range(structure.len(), range);
        structure.drain(start..end);
        Ok(())
    }

    async fn list_structures(&self) -> Result<Vec<StructureInfo>> {
        let inner = self.inner.lock().await;
        let mut infos: Vec<StructureInfo> = inner
            .structures
            .keys()
            .map(|name| StructureInfo {
                id: name.clone(),
                name: name.clone(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn batch_structural_update(&self, ops: &[StructuralOp]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.structural_calls += 1;

        match inner.structural_faults.pop_front() {
            None | Some(Fault::Pass) => {}
            Some(fault) => return Err(fault.into_error().into()),
        }

        // Validate the whole batch before applying anything
        for op in ops {
            match op {
                StructuralOp::AddStructure { name } => {
                    if inner.structures.contains_key(name) {
                        return Err(StoreError::InvalidRequest(format!(
                            "structure already exists: {name}"
                        ))
                        .into());
                    }
                }
                StructuralOp::DeleteStructure { name }
                | StructuralOp::RenameStructure { from: name, .. } => {
                    if !inner.structures.contains_key(name) {
                        return Err(StoreError::StructureNotFound(name.clone()).into());
                    }
                }
            }
        }

        for op in ops {
            match op {
                StructuralOp::AddStructure { name } => {
                    inner.structures.insert(name.clone(), Vec::new());
                }
                StructuralOp::DeleteStructure { name } => {
                    inner.structures.remove(name);
                }
                StructuralOp::RenameStructure { from, to } => {
                    if let Some(rows) = inner.structures.remove(from) {
                        inner.structures.insert(to.clone(), rows);
                    }
                }
            }
        }
        Ok(())
    }
}
