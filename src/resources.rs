// ── Resource bundles ──────────────────────────────────────────────────────────
//
// Per-language UI resources: string table, menu description, and the three
// purpose-built dialog descriptions (find / replace / go-to).  All of it is
// plain data — JSON embedded at compile time and deserialized with serde —
// never code.  Language selection picks the user's UI language when a bundle
// for it exists and falls back to en-US otherwise.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Result;

// ── Commands ──────────────────────────────────────────────────────────────────

/// Every menu/accelerator command in the application.
///
/// Menu descriptions reference commands by their kebab-case serde name; the
/// numeric ids below are what travels in `WM_COMMAND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u16)]
pub(crate) enum Command {
    New = 101,
    NewWindow = 102,
    Open = 103,
    Save = 104,
    SaveAs = 105,
    Exit = 106,

    Undo = 201,
    Cut = 202,
    Copy = 203,
    Paste = 204,
    Delete = 205,
    Find = 206,
    FindNext = 207,
    FindPrev = 208,
    Replace = 209,
    GoTo = 210,
    SelectAll = 211,
    TimeDate = 212,

    WordWrap = 301,
    Font = 302,
    TabSize2 = 303,
    TabSize4 = 304,
    TabSize8 = 305,
    UseSpaces = 306,

    EncAnsi = 401,
    EncUtf8 = 402,
    EncUtf8Bom = 403,
    EncUtf16Le = 404,
    EncUtf16Be = 405,
    EolCrlf = 411,
    EolLf = 412,
    EolCr = 413,

    ZoomIn = 501,
    ZoomOut = 502,
    ZoomReset = 503,
    StatusBar = 504,
    DarkMode = 505,

    About = 601,
}

impl Command {
    /// The numeric id carried in `WM_COMMAND` / accelerator entries.
    pub(crate) fn id(self) -> u16 {
        self as u16
    }

    /// Reverse of [`Command::id`]; `None` for foreign ids (dialog buttons,
    /// edit notifications).
    pub(crate) fn from_id(id: u16) -> Option<Self> {
        use Command::*;
        Some(match id {
            101 => New,
            102 => NewWindow,
            103 => Open,
            104 => Save,
            105 => SaveAs,
            106 => Exit,
            201 => Undo,
            202 => Cut,
            203 => Copy,
            204 => Paste,
            205 => Delete,
            206 => Find,
            207 => FindNext,
            208 => FindPrev,
            209 => Replace,
            210 => GoTo,
            211 => SelectAll,
            212 => TimeDate,
            301 => WordWrap,
            302 => Font,
            303 => TabSize2,
            304 => TabSize4,
            305 => TabSize8,
            306 => UseSpaces,
            401 => EncAnsi,
            402 => EncUtf8,
            403 => EncUtf8Bom,
            404 => EncUtf16Le,
            405 => EncUtf16Be,
            411 => EolCrlf,
            412 => EolLf,
            413 => EolCr,
            501 => ZoomIn,
            502 => ZoomOut,
            503 => ZoomReset,
            504 => StatusBar,
            505 => DarkMode,
            601 => About,
            _ => return None,
        })
    }
}

// ── Menu description ──────────────────────────────────────────────────────────

/// One node of the declarative menu tree.
///
/// Exactly one of `command`, `items`, or `separator` is meaningful per node;
/// a node with `items` is a popup, one with `separator: true` is a divider,
/// anything else is a plain command item.  Captions may carry a
/// `"\tCtrl+X"` suffix, which the menu builder also parses into an
/// accelerator-table entry.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MenuNode {
    #[serde(default)]
    pub(crate) caption: String,
    #[serde(default)]
    pub(crate) command: Option<Command>,
    #[serde(default)]
    pub(crate) items: Vec<MenuNode>,
    #[serde(default)]
    pub(crate) separator: bool,
}

// ── Dialog descriptions ───────────────────────────────────────────────────────

/// Native control class used in a dialog description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum CtrlClass {
    Button,
    Edit,
    Static,
    ListBox,
    ScrollBar,
    ComboBox,
}

/// One control in a dialog description.  Rectangle is in dialog units.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ControlDesc {
    pub(crate) class: CtrlClass,
    #[serde(default)]
    pub(crate) caption: String,
    pub(crate) rect: [i32; 4],
    pub(crate) id: i32,
    #[serde(default)]
    pub(crate) styles: Vec<String>,
    #[serde(default)]
    pub(crate) exstyles: Vec<String>,
}

/// A complete dialog description: frame plus control list.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DialogDesc {
    pub(crate) title: String,
    pub(crate) width: i32,
    pub(crate) height: i32,
    #[serde(default = "default_dialog_font")]
    pub(crate) font_face: String,
    #[serde(default = "default_dialog_size")]
    pub(crate) font_size: i32,
    pub(crate) controls: Vec<ControlDesc>,
}

fn default_dialog_font() -> String {
    "Segoe UI".to_owned()
}

fn default_dialog_size() -> i32 {
    9
}

/// The three application dialogs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Dialogs {
    pub(crate) find: DialogDesc,
    pub(crate) replace: DialogDesc,
    #[serde(rename = "goto")]
    pub(crate) go_to: DialogDesc,
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// All UI resources for one language.
#[derive(Debug, Clone)]
pub(crate) struct Bundle {
    pub(crate) strings: HashMap<String, String>,
    pub(crate) menu: Vec<MenuNode>,
    pub(crate) dialogs: Dialogs,
}

impl Bundle {
    /// Look up a UI string; the key itself is returned for missing entries
    /// so a hole in a translation is visible instead of fatal.
    pub(crate) fn s<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map_or(key, String::as_str)
    }
}

// Bundles are embedded so the binary has no loose files to lose.
const EN_US: (&str, &str, &str) = (
    include_str!("../resources/en-US/strings.json"),
    include_str!("../resources/en-US/menu.json"),
    include_str!("../resources/en-US/dialogs.json"),
);
const DE_DE: (&str, &str, &str) = (
    include_str!("../resources/de-DE/strings.json"),
    include_str!("../resources/de-DE/menu.json"),
    include_str!("../resources/de-DE/dialogs.json"),
);

/// The fallback language.
pub(crate) const FALLBACK_LANG: &str = "en-US";

/// Load the bundle for `lang_tag` (a BCP-47 tag like `"de-DE"`), falling
/// back to en-US when no bundle matches the tag's primary subtag.
pub(crate) fn load(lang_tag: &str) -> Result<Bundle> {
    let primary = lang_tag.split(['-', '_']).next().unwrap_or("");
    let (strings, menu, dialogs) = match primary {
        "de" => DE_DE,
        _ => EN_US,
    };
    Ok(Bundle {
        strings: serde_json::from_str(strings)?,
        menu: serde_json::from_str(menu)?,
        dialogs: serde_json::from_str(dialogs)?,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_bundle_parses() {
        let b = load("en-US").expect("en-US bundle");
        assert_eq!(b.s("app-title"), "Quill");
        assert!(!b.menu.is_empty());
        assert!(!b.dialogs.find.controls.is_empty());
        assert!(!b.dialogs.replace.controls.is_empty());
        assert!(!b.dialogs.go_to.controls.is_empty());
    }

    #[test]
    fn german_bundle_parses() {
        let b = load("de-DE").expect("de-DE bundle");
        assert_ne!(b.dialogs.find.title, "Find");
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let b = load("fr-FR").expect("fallback bundle");
        assert_eq!(b.dialogs.find.title, "Find");
    }

    #[test]
    fn missing_string_returns_key() {
        let b = load(FALLBACK_LANG).expect("bundle");
        assert_eq!(b.s("no-such-key"), "no-such-key");
    }

    #[test]
    fn command_ids_round_trip() {
        for cmd in [
            Command::New,
            Command::Exit,
            Command::FindPrev,
            Command::EncUtf16Be,
            Command::EolCr,
            Command::DarkMode,
            Command::About,
        ] {
            assert_eq!(Command::from_id(cmd.id()), Some(cmd));
        }
        assert_eq!(Command::from_id(9999), None);
    }

    /// Every command referenced by the menu must resolve back from its id;
    /// a typo in menu.json would otherwise surface as a dead menu item.
    #[test]
    fn every_menu_command_round_trips() {
        fn walk(nodes: &[MenuNode]) {
            for n in nodes {
                if let Some(cmd) = n.command {
                    assert_eq!(Command::from_id(cmd.id()), Some(cmd), "{:?}", n.caption);
                }
                walk(&n.items);
            }
        }
        let b = load("en-US").expect("bundle");
        walk(&b.menu);
        let b = load("de-DE").expect("bundle");
        walk(&b.menu);
    }
}
