// ============================================================================
// SETTINGS - key=value config file in the OS config directory
// ============================================================================

use std::path::{Path, PathBuf};

use crate::components::history::DEFAULT_MAX_HISTORY;
use crate::components::tools::DEFAULT_STROKE_WIDTH;
use crate::editor::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};

/// Persisted user preferences. Unknown keys are ignored and unparsable values
/// fall back to their defaults, so a damaged file never prevents start-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub max_undo_steps: usize,
    /// Minutes between autosave checks; 0 disables autosave.
    pub auto_save_minutes: u32,
    pub default_canvas_width: u32,
    pub default_canvas_height: u32,
    pub default_stroke_width: u32,
    pub export_port: u16,
    /// Font family for the text tool; empty selects the system sans-serif.
    pub font_family: String,
    /// Explicit font file, tried before `font_family`.
    pub font_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_HISTORY,
            auto_save_minutes: 2,
            default_canvas_width: DEFAULT_CANVAS_WIDTH,
            default_canvas_height: DEFAULT_CANVAS_HEIGHT,
            default_stroke_width: DEFAULT_STROKE_WIDTH,
            export_port: 8080,
            font_family: String::new(),
            font_path: String::new(),
        }
    }
}

impl Settings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/rasterpad/rasterpad.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\rasterpad\rasterpad.cfg
    /// On macOS:   ~/Library/Application Support/rasterpad/rasterpad.cfg
    pub fn settings_path() -> Option<PathBuf> {
        let dir = config_dir()?.join("rasterpad");
        let _ = std::fs::create_dir_all(&dir);
        Some(dir.join("rasterpad.cfg"))
    }

    /// Load from the default location (defaults if missing or corrupt).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_config_string())
    }

    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().ok().filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_HISTORY);
                }
                "auto_save_minutes" => {
                    s.auto_save_minutes = val.parse().unwrap_or(2);
                }
                "default_canvas_width" => {
                    s.default_canvas_width = val.parse().ok().filter(|n| *n > 0).unwrap_or(DEFAULT_CANVAS_WIDTH);
                }
                "default_canvas_height" => {
                    s.default_canvas_height = val.parse().ok().filter(|n| *n > 0).unwrap_or(DEFAULT_CANVAS_HEIGHT);
                }
                "default_stroke_width" => {
                    s.default_stroke_width = val.parse().ok().filter(|n| *n > 0).unwrap_or(DEFAULT_STROKE_WIDTH);
                }
                "export_port" => {
                    s.export_port = val.parse().unwrap_or(8080);
                }
                "font_family" => {
                    s.font_family = val.to_string();
                }
                "font_path" => {
                    s.font_path = val.to_string();
                }
                _ => {}
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "max_undo_steps={}\n\
             auto_save_minutes={}\n\
             default_canvas_width={}\n\
             default_canvas_height={}\n\
             default_stroke_width={}\n\
             export_port={}\n\
             font_family={}\n\
             font_path={}\n",
            self.max_undo_steps,
            self.auto_save_minutes,
            self.default_canvas_width,
            self.default_canvas_height,
            self.default_stroke_width,
            self.export_port,
            self.font_family,
            self.font_path,
        )
    }

    pub fn font_path(&self) -> Option<&Path> {
        if self.font_path.trim().is_empty() {
            None
        } else {
            Some(Path::new(self.font_path.trim()))
        }
    }
}

/// Platform config directory (without the app sub-folder).
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library").join("Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg));
        }
        std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_values_fall_back() {
        let s = Settings::parse("max_undo_steps=0\nexport_port=notaport\nfont_family= Serif \n# comment=1\n");
        assert_eq!(s.max_undo_steps, DEFAULT_MAX_HISTORY);
        assert_eq!(s.export_port, 8080);
        assert_eq!(s.font_family, "Serif");
    }
}
