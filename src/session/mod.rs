// ── Settings persistence ──────────────────────────────────────────────────────
//
// Reads and writes `%APPDATA%\Quill\settings.json`.
// No `unsafe` — pure safe Rust + serde_json.  Read once at startup (missing
// or unversioned file ⇒ defaults), written once at normal exit.

use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};

// ── On-disk types ─────────────────────────────────────────────────────────────

/// Root of the JSON settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub(crate) version: u32,

    /// Last main-window placement, screen coordinates.
    pub(crate) window: WindowRect,

    /// `None` = follow the system setting; `Some` = user-pinned mode.
    #[serde(default)]
    pub(crate) dark_mode: Option<bool>,

    #[serde(default = "default_true")]
    pub(crate) status_bar: bool,

    #[serde(default)]
    pub(crate) word_wrap: bool,

    /// Editor font.
    pub(crate) font_face: String,
    pub(crate) font_size: i32,
    #[serde(default = "default_weight")]
    pub(crate) font_weight: i32,
    #[serde(default)]
    pub(crate) font_italic: bool,

    /// Tab behaviour.
    #[serde(default = "default_tab_size")]
    pub(crate) tab_size: u32,
    #[serde(default)]
    pub(crate) use_spaces: bool,

    /// Last search/replace terms and options.
    #[serde(default)]
    pub(crate) search_term: String,
    #[serde(default)]
    pub(crate) replace_with: String,
    #[serde(default)]
    pub(crate) match_case: bool,
    #[serde(default = "default_true")]
    pub(crate) wrap_around: bool,
    #[serde(default)]
    pub(crate) search_up: bool,
}

/// Window placement, `CW_USEDEFAULT`-style sentinel left to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(crate) struct WindowRect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

fn default_true() -> bool {
    true
}

fn default_weight() -> i32 {
    400
}

fn default_tab_size() -> u32 {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            window: WindowRect {
                x: i32::MIN, // sentinel: let the system place the window
                y: i32::MIN,
                width: 800,
                height: 600,
            },
            dark_mode: None,
            status_bar: true,
            word_wrap: false,
            font_face: "Consolas".to_owned(),
            font_size: 11,
            font_weight: 400,
            font_italic: false,
            tab_size: 4,
            use_spaces: false,
            search_term: String::new(),
            replace_with: String::new(),
            match_case: false,
            wrap_around: true,
            search_up: false,
        }
    }
}

// ── Format version ────────────────────────────────────────────────────────────

const SETTINGS_VERSION: u32 = 1;

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the path to the settings file: `%APPDATA%\Quill\settings.json`.
///
/// Returns `None` if the `APPDATA` environment variable is not set.
pub(crate) fn settings_path() -> Option<PathBuf> {
    let appdata = std::env::var_os("APPDATA")?;
    let mut p = PathBuf::from(appdata);
    p.push("Quill");
    p.push("settings.json");
    Some(p)
}

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write the settings to `%APPDATA%\Quill\settings.json`.
///
/// Creates the `Quill` directory if it does not exist.
/// The caller (`app::run`) logs and discards any returned error.
pub(crate) fn save(settings: &Settings) -> io::Result<()> {
    let path = settings_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "APPDATA not set"))?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, settings).map_err(io::Error::other)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read and parse the settings file.
///
/// Returns `None` on any error: file missing, JSON parse failure, or an
/// unrecognised version number.  The app continues with defaults.
pub(crate) fn load() -> Option<Settings> {
    let path = settings_path()?;
    let data = fs::read(&path).ok()?;
    let s: Settings = serde_json::from_slice(&data).ok()?;
    if s.version != SETTINGS_VERSION {
        return None;
    }
    Some(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_preserves_every_field() {
        let mut s = Settings::default();
        s.window = WindowRect {
            x: 10,
            y: 20,
            width: 640,
            height: 480,
        };
        s.dark_mode = Some(true);
        s.word_wrap = true;
        s.font_face = "Cascadia Mono".to_owned();
        s.font_size = 14;
        s.tab_size = 8;
        s.use_spaces = true;
        s.search_term = "needle".to_owned();
        s.replace_with = "thread".to_owned();
        s.match_case = true;
        s.search_up = true;

        let json = serde_json::to_string(&s).expect("serialize");
        let s2: Settings = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(s2.window.x, 10);
        assert_eq!(s2.window.height, 480);
        assert_eq!(s2.dark_mode, Some(true));
        assert!(s2.word_wrap);
        assert_eq!(s2.font_face, "Cascadia Mono");
        assert_eq!(s2.font_size, 14);
        assert_eq!(s2.tab_size, 8);
        assert!(s2.use_spaces);
        assert_eq!(s2.search_term, "needle");
        assert_eq!(s2.replace_with, "thread");
        assert!(s2.match_case);
        assert!(s2.wrap_around);
        assert!(s2.search_up);
    }

    /// Files written before the tri-state dark mode have no `dark_mode`
    /// field; `#[serde(default)]` must make them parse as follow-system.
    #[test]
    fn missing_dark_mode_means_follow_system() {
        let json = r#"{
            "version": 1,
            "window": {"x": 0, "y": 0, "width": 800, "height": 600},
            "font_face": "Consolas",
            "font_size": 11
        }"#;
        let s: Settings = serde_json::from_str(json).expect("deserialize sparse file");
        assert_eq!(s.dark_mode, None);
        assert!(s.status_bar, "status bar defaults on");
        assert!(s.wrap_around, "wrap-around defaults on");
        assert_eq!(s.tab_size, 4);
    }

    /// A settings file with an unrecognised version number must be rejected
    /// by `load()`.  Test the parse-and-check logic directly.
    #[test]
    fn wrong_version_is_rejected() {
        let mut s = Settings::default();
        s.version = 99;
        let json = serde_json::to_string(&s).expect("serialize");
        let parsed: Settings = serde_json::from_str(&json).expect("deserialize");
        // load() would return None for this version; assert the condition directly.
        assert_ne!(parsed.version, SETTINGS_VERSION);
    }
}
