use crate::chunks::{ChunkId, ChunkRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub overall_percent: u8,
    pub chunk_percent: u8,
    pub current_chunk: u32,
    pub total_chunks: u32,
}

impl ProgressSnapshot {
    /// Build a snapshot from raw push values, clamping percentages to 0..=100
    /// and the current index to the total.
    pub fn clamped(overall: f64, chunk: f64, current_chunk: u32, total_chunks: u32) -> Self {
        Self {
            overall_percent: clamp_percent(overall),
            chunk_percent: clamp_percent(chunk),
            current_chunk: current_chunk.min(total_chunks),
            total_chunks,
        }
    }
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Done,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressTracker {
    snapshot: ProgressSnapshot,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, snapshot: ProgressSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot
    }

    pub fn reset(&mut self) {
        self.snapshot = ProgressSnapshot::default();
    }

    pub fn partition(&self, registry: &ChunkRegistry) -> Vec<(ChunkId, Highlight)> {
        partition(&self.snapshot, registry)
    }
}

/// Highlight every registered chunk relative to the snapshot's current index.
/// Recomputed from scratch on each call.
pub fn partition(snapshot: &ProgressSnapshot, registry: &ChunkRegistry) -> Vec<(ChunkId, Highlight)> {
    let current = snapshot.current_chunk;
    registry
        .iter()
        .map(|chunk| {
            let highlight = if current == 0 {
                Highlight::Pending
            } else if chunk.id < current {
                Highlight::Done
            } else if chunk.id == current {
                Highlight::Active
            } else {
                Highlight::Pending
            };
            (chunk.id, highlight)
        })
        .collect()
}
