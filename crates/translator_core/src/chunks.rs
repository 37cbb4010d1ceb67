use std::sync::Arc;

use crate::format::format_number;

pub type ChunkId = u32;

const CHAPTER_PREVIEW_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub size: u64,
    pub chapters: Vec<String>,
    pub has_prologue: bool,
    pub has_epilogue: bool,
}

impl Chunk {
    /// First two chapter names, with `...` when more exist.
    pub fn chapter_preview(&self) -> String {
        let shown = self
            .chapters
            .iter()
            .take(CHAPTER_PREVIEW_LIMIT)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if self.chapters.len() > CHAPTER_PREVIEW_LIMIT {
            format!("{shown}...")
        } else {
            shown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Identifiers must run 1..=n without gaps or repeats.
    #[error("chunk at position {position} has id {found}, expected {}", .position + 1)]
    NonContiguous { position: usize, found: ChunkId },
    #[error("chunk {0} is not part of this task")]
    UnknownChunk(ChunkId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRowView {
    pub id: ChunkId,
    pub title: String,
    pub size_label: String,
    pub chapters: String,
    pub prologue: bool,
    pub epilogue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkRegistry {
    chunks: Vec<Arc<Chunk>>,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents in one step. Nothing is stored when the
    /// list is rejected.
    pub fn populate(&mut self, chunks: Vec<Chunk>) -> Result<(), RegistryError> {
        for (position, chunk) in chunks.iter().enumerate() {
            if chunk.id as usize != position + 1 {
                return Err(RegistryError::NonContiguous {
                    position,
                    found: chunk.id,
                });
            }
        }
        self.chunks = chunks.into_iter().map(Arc::new).collect();
        Ok(())
    }

    pub fn get(&self, id: ChunkId) -> Result<Arc<Chunk>, RegistryError> {
        // Ids are contiguous from 1, so the id doubles as an index.
        (id as usize)
            .checked_sub(1)
            .and_then(|idx| self.chunks.get(idx))
            .cloned()
            .ok_or(RegistryError::UnknownChunk(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn rows(&self) -> Vec<ChunkRowView> {
        self.chunks
            .iter()
            .map(|chunk| ChunkRowView {
                id: chunk.id,
                title: format!("Chunk {}", chunk.id),
                size_label: format!("{} chars", format_number(chunk.size)),
                chapters: chunk.chapter_preview(),
                prologue: chunk.has_prologue,
                epilogue: chunk.has_epilogue,
            })
            .collect()
    }
}
