// ============================================================================
// AUTOSAVE - periodic save of dirty editors, independent of the core
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::editor::Editor;
use crate::error::BitmapIoError;
use crate::io::save_bitmap;

/// Result of one [`AutosaveScheduler::poll`].
#[derive(Debug, PartialEq, Eq)]
pub enum AutosaveStatus {
    Disabled,
    /// Interval has not elapsed yet.
    NotDue,
    /// Due, but nothing changed since the last save.
    Clean,
    Saved(PathBuf),
}

/// Polls [`Editor::is_dirty`] and saves through a caller-supplied sink once
/// per interval. The dirty flag is cleared only when the save succeeds.
#[derive(Debug)]
pub struct AutosaveScheduler {
    interval: Option<Duration>,
    last_check: Instant,
}

impl AutosaveScheduler {
    /// `None` (or a zero interval) disables autosave.
    pub fn new(interval: Option<Duration>, now: Instant) -> Self {
        Self {
            interval: interval.filter(|d| !d.is_zero()),
            last_check: now,
        }
    }

    pub fn from_minutes(minutes: u32, now: Instant) -> Self {
        Self::new(Some(Duration::from_secs(minutes as u64 * 60)), now)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.interval {
            Some(i) => now.saturating_duration_since(self.last_check) >= i,
            None => false,
        }
    }

    /// Save when due and dirty.
    pub fn poll<F>(&mut self, editor: &mut Editor, now: Instant, save: F) -> Result<AutosaveStatus, BitmapIoError>
    where
        F: FnOnce(&Editor) -> Result<PathBuf, BitmapIoError>,
    {
        if self.interval.is_none() {
            return Ok(AutosaveStatus::Disabled);
        }
        if !self.is_due(now) {
            return Ok(AutosaveStatus::NotDue);
        }
        self.last_check = now;
        if !editor.is_dirty() {
            return Ok(AutosaveStatus::Clean);
        }
        match save(editor) {
            Ok(path) => {
                editor.clear_dirty();
                log::info!("autosaved to {}", path.display());
                Ok(AutosaveStatus::Saved(path))
            }
            Err(e) => {
                log::warn!("autosave failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Sink that writes the editor's current bitmap to `path`.
pub fn save_to(path: &Path) -> impl FnOnce(&Editor) -> Result<PathBuf, BitmapIoError> + '_ {
    move |editor| {
        let image = editor.image().ok_or(BitmapIoError::NothingToSave)?;
        save_bitmap(image, path)
    }
}
