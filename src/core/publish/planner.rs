//! Batch planner
//!
//! Chooses a batch size that keeps any single publish call under a byte
//! budget. The store hard-rejects payloads around 2 MB, so the default
//! budget of 1.5 MB leaves headroom for request framing.

/// Default payload budget per call (the store's hard limit is ~2 MB)
pub const DEFAULT_BYTE_BUDGET: usize = 1_500_000;

/// Smallest batch the planner will emit or shrink to
pub const MIN_BATCH_SIZE: usize = 100;

/// Largest batch regardless of how small the rows are
pub const MAX_BATCH_SIZE: usize = 3000;

/// A planned batch size, bounded to `[min_batch_size, max_batch_size]`.
///
/// During a run the size only moves by monotonic halving (`shrink`); it
/// never regrows within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    batch_size: usize,
    min_batch_size: usize,
    max_batch_size: usize,
}

impl BatchPlan {
    /// Current batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn min_batch_size(&self) -> usize {
        self.min_batch_size
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Halve the batch size, flooring at the minimum.
    ///
    /// Returns `false` when the size was already at the floor and could not
    /// shrink further.
    pub fn shrink(&mut self) -> bool {
        if self.batch_size <= self.min_batch_size {
            return false;
        }
        self.batch_size = (self.batch_size / 2).max(self.min_batch_size);
        true
    }

    /// Resume with the batch size a previous run checkpointed.
    ///
    /// The resumed value is clamped into this plan's bounds but never raised
    /// above the freshly planned size: if the prior run had shrunk, the
    /// resumed run starts shrunk too.
    pub fn resume_at(&mut self, checkpointed: usize) {
        self.batch_size = checkpointed
            .clamp(self.min_batch_size, self.max_batch_size)
            .min(self.batch_size);
    }
}

/// Computes a `BatchPlan` from a sample of the rows to publish
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    byte_budget: usize,
    min_batch_size: usize,
    max_batch_size: usize,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_BYTE_BUDGET, MIN_BATCH_SIZE, MAX_BATCH_SIZE)
    }
}

impl BatchPlanner {
    pub fn new(byte_budget: usize, min_batch_size: usize, max_batch_size: usize) -> Self {
        Self {
            byte_budget,
            min_batch_size: min_batch_size.max(1),
            max_batch_size: max_batch_size.max(min_batch_size.max(1)),
        }
    }

    /// Plan a batch size for `rows`.
    ///
    /// Samples at least `max(100, 10%)` rows at an even stride across the
    /// full set (not the first N, so size-skewed tails still influence the
    /// average), then divides the budget by the average serialized row size
    /// and clamps into the configured bounds.
    pub fn plan(&self, rows: &[Vec<String>]) -> BatchPlan {
        let batch_size = if rows.is_empty() {
            self.max_batch_size
        } else {
            let sample_target = (rows.len() / 10).max(100).min(rows.len());
            let stride = (rows.len() / sample_target).max(1);

            let mut sampled = 0usize;
            let mut total_bytes = 0usize;
            for row in rows.iter().step_by(stride) {
                total_bytes += serialized_size(row);
                sampled += 1;
            }

            let avg = (total_bytes / sampled.max(1)).max(1);
            (self.byte_budget / avg).clamp(self.min_batch_size, self.max_batch_size)
        };

        tracing::debug!(
            rows = rows.len(),
            batch_size,
            byte_budget = self.byte_budget,
            "Planned batch size"
        );

        BatchPlan {
            batch_size,
            min_batch_size: self.min_batch_size,
            max_batch_size: self.max_batch_size,
        }
    }
}

/// Serialized size of one row as it would travel on the wire
fn serialized_size(row: &[String]) -> usize {
    serde_json::to_string(row).map(|s| s.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_of(count: usize, field_len: usize) -> Vec<Vec<String>> {
        (0..count)
            .map(|i| vec![i.to_string(), "x".repeat(field_len)])
            .collect()
    }

    #[test]
    fn test_scenario_b_clamps_to_max() {
        // 7,500 rows averaging ~220 bytes under a 1.5 MB budget would plan
        // ~6,800 rows per batch; the cap brings it to 3,000 (3 batches).
        let rows = rows_of(7_500, 210);
        let plan = BatchPlanner::default().plan(&rows);
        assert_eq!(plan.batch_size(), MAX_BATCH_SIZE);
        let batches = rows.len().div_ceil(plan.batch_size());
        assert_eq!(batches, 3);
    }

    #[test]
    fn test_large_rows_plan_small_batches() {
        // ~15 KB rows: 1.5 MB budget fits ~100 of them
        let rows = rows_of(500, 15_000);
        let plan = BatchPlanner::default().plan(&rows);
        assert_eq!(plan.batch_size(), MIN_BATCH_SIZE);
    }

    #[test]
    fn test_mid_sized_rows_land_between_bounds() {
        // ~1 KB rows: 1.5 MB / ~1 KB ≈ 1,400-ish
        let rows = rows_of(2_000, 1_000);
        let plan = BatchPlanner::default().plan(&rows);
        assert!(plan.batch_size() > MIN_BATCH_SIZE);
        assert!(plan.batch_size() < MAX_BATCH_SIZE);
    }

    #[test]
    fn test_empty_rows_plan_max() {
        let plan = BatchPlanner::default().plan(&[]);
        assert_eq!(plan.batch_size(), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_stride_sampling_sees_skewed_tail() {
        // First 90% of rows are tiny, last 10% are huge. Sampling only the
        // head would plan max-sized batches; stride sampling must not.
        let mut rows = rows_of(900, 10);
        rows.extend(rows_of(100, 120_000));
        let plan = BatchPlanner::default().plan(&rows);
        assert!(plan.batch_size() < MAX_BATCH_SIZE);
    }

    #[test]
    fn test_shrink_halves_and_floors() {
        let plan0 = BatchPlanner::default().plan(&rows_of(7_500, 210));
        let mut plan = plan0;
        assert!(plan.shrink());
        assert_eq!(plan.batch_size(), 1500);
        assert!(plan.shrink());
        assert_eq!(plan.batch_size(), 750);
        while plan.shrink() {}
        assert_eq!(plan.batch_size(), MIN_BATCH_SIZE);
        assert!(!plan.shrink());
    }

    #[test]
    fn test_shrink_is_monotonic() {
        let mut plan = BatchPlanner::default().plan(&rows_of(2_000, 1_000));
        let mut last = plan.batch_size();
        while plan.shrink() {
            assert!(plan.batch_size() < last);
            last = plan.batch_size();
        }
    }

    #[test]
    fn test_resume_at_clamps_and_never_grows() {
        let mut plan = BatchPlanner::default().plan(&rows_of(7_500, 210));
        assert_eq!(plan.batch_size(), 3000);
        plan.resume_at(750);
        assert_eq!(plan.batch_size(), 750);
        // A checkpoint cannot raise the size above the planned value
        let mut plan2 = BatchPlanner::default().plan(&rows_of(500, 15_000));
        plan2.resume_at(9_999);
        assert_eq!(plan2.batch_size(), MIN_BATCH_SIZE);
    }

    #[test]
    fn test_small_sets_sample_everything() {
        let rows = rows_of(50, 100);
        // sample target is max(100, 10%) capped at the set size
        let plan = BatchPlanner::default().plan(&rows);
        assert!(plan.batch_size() >= MIN_BATCH_SIZE);
    }
}
