use image::RgbaImage;
use std::collections::VecDeque;

// ============================================================================
// SNAPSHOT - immutable full-buffer copy
// ============================================================================

/// A complete copy of the canvas pixels at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pixels: RgbaImage,
}

impl Snapshot {
    /// Deep-copy `image`.
    pub fn capture(image: &RgbaImage) -> Self {
        Self { pixels: image.clone() }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

// ============================================================================
// HISTORY STACK - bounded undo/redo of full snapshots
// ============================================================================

/// Default number of undo steps kept.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Bounded undo/redo history.
///
/// Both stacks keep the most recent entry at the back. When the undo stack
/// grows past `max_history_size` the oldest entry is discarded. `push` never
/// touches the redo stack; callers performing a new edit call
/// [`clear_redo`](Self::clear_redo) themselves.
#[derive(Debug)]
pub struct HistoryStack {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    max_history_size: usize,
    /// Optional memory cap in bytes.
    max_memory_bytes: Option<usize>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryStack {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            max_memory_bytes: None,
            total_memory: 0,
        }
    }

    /// Cap total snapshot memory. The most recent undo entry is always kept.
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = Some(bytes);
        self.prune();
        self
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Record the state before an edit.
    pub fn push(&mut self, image: &RgbaImage) {
        let snapshot = Snapshot::capture(image);
        self.total_memory += snapshot.memory_size();
        self.undo_stack.push_back(snapshot);
        self.prune();
    }

    /// Discard every redo entry. Called by every new mutating action.
    pub fn clear_redo(&mut self) {
        for snap in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(snap.memory_size());
        }
    }

    /// Step back. `current` is the live buffer; it moves onto the redo stack and
    /// the restored buffer is returned. `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &RgbaImage) -> Option<RgbaImage> {
        let restored = self.undo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(restored.memory_size());
        let saved = Snapshot::capture(current);
        self.total_memory += saved.memory_size();
        self.redo_stack.push_back(saved);
        while self.redo_stack.len() > self.max_history_size {
            if let Some(removed) = self.redo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }
        Some(restored.into_image())
    }

    /// Step forward again, the mirror image of [`undo`](Self::undo).
    pub fn redo(&mut self, current: &RgbaImage) -> Option<RgbaImage> {
        let restored = self.redo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(restored.memory_size());
        let saved = Snapshot::capture(current);
        self.total_memory += saved.memory_size();
        self.undo_stack.push_back(saved);
        self.prune();
        Some(restored.into_image())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo entries, most recent first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.undo_stack.iter().rev()
    }

    /// Redo entries, most recent first.
    pub fn redo_entries(&self) -> impl Iterator<Item = &Snapshot> {
        self.redo_stack.iter().rev()
    }

    /// Get the current memory usage of the history (O(1) via cached total)
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Prune old snapshots to stay within limits
    fn prune(&mut self) {
        while self.undo_stack.len() > self.max_history_size {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
            }
        }

        if let Some(max_bytes) = self.max_memory_bytes {
            while self.total_memory > max_bytes && self.undo_stack.len() > 1 {
                if let Some(removed) = self.undo_stack.pop_front() {
                    self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                }
            }
        }
    }
}
