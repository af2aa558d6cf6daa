// ── Document model ────────────────────────────────────────────────────────────
//
// Pure-Rust document state: encoding/EOL detection, disk round-tripping,
// dirty tracking against a saved snapshot, and the indentation text
// transforms used by the Tab/Backspace handlers.  No Win32 imports; the
// in-memory representation always uses CRLF line endings because that is
// the only convention the native Edit control understands.

use std::path::PathBuf;

/// Hard ceiling on file size.  The native Edit control degrades badly above
/// this; larger files are rejected at open time.
pub(crate) const MAX_TEXT_BYTES: u64 = 0x8_0000; // 512 KiB

// ── Encoding ──────────────────────────────────────────────────────────────────

/// The character encoding of the document on disk.
///
/// Quill always keeps the in-memory representation as UTF-8 (Rust `String`).
/// This field records what encoding should be used when writing back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    /// System ANSI code page, treated as Latin-1: bytes map 1:1 to U+0000–U+00FF.
    Ansi,
    /// UTF-8 without BOM.
    Utf8,
    /// UTF-8 with BOM (`EF BB BF`).
    Utf8Bom,
    /// UTF-16 Little-Endian with BOM.
    Utf16Le,
    /// UTF-16 Big-Endian with BOM.
    Utf16Be,
}

impl Encoding {
    /// Short display string shown in the status bar.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Ansi => "ANSI",
            Self::Utf8 => "UTF-8",
            Self::Utf8Bom => "UTF-8 BOM",
            Self::Utf16Le => "UTF-16 LE",
            Self::Utf16Be => "UTF-16 BE",
        }
    }
}

// ── EOL mode ──────────────────────────────────────────────────────────────────

/// The end-of-line convention used by the document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EolMode {
    /// Windows-style `\r\n`.
    Crlf,
    /// Unix-style `\n`.
    Lf,
    /// Old Mac-style `\r`.
    Cr,
}

impl EolMode {
    /// Short display string shown in the status bar.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Crlf => "Windows (CRLF)",
            Self::Lf => "Unix (LF)",
            Self::Cr => "Macintosh (CR)",
        }
    }

    /// The byte sequence written between lines on save.
    pub(crate) fn separator(self) -> &'static str {
        match self {
            Self::Crlf => "\r\n",
            Self::Lf => "\n",
            Self::Cr => "\r",
        }
    }
}

// ── Font ──────────────────────────────────────────────────────────────────────

/// The editor font, persisted across sessions and edited via the font dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FontDesc {
    pub(crate) face: String,
    /// Point size at 100 % zoom.
    pub(crate) size: i32,
    /// Win32 weight scale (400 = normal, 700 = bold).
    pub(crate) weight: i32,
    pub(crate) italic: bool,
}

impl Default for FontDesc {
    fn default() -> Self {
        Self {
            face: "Consolas".to_owned(),
            size: 11,
            weight: 400,
            italic: false,
        }
    }
}

// ── DocumentState ─────────────────────────────────────────────────────────────

/// Per-document state for the currently open file.
#[derive(Debug)]
pub(crate) struct DocumentState {
    /// Absolute path to the file on disk, or `None` for an untitled buffer.
    pub(crate) path: Option<PathBuf>,
    /// The encoding used to read (and that will be used to write) the file.
    pub(crate) encoding: Encoding,
    /// The EOL convention detected in (or selected for) the file.
    pub(crate) eol: EolMode,
    /// `true` when the buffer contains changes not yet saved to disk.
    pub(crate) dirty: bool,
    /// Snapshot of the text at the last load/save, CRLF-normalised.
    /// Exact-comparison source for `update_dirty`.
    saved_text: String,
}

impl DocumentState {
    /// A fresh, untitled document with sensible defaults.
    pub(crate) fn new_untitled() -> Self {
        Self {
            path: None,
            encoding: Encoding::Utf8,
            eol: EolMode::Crlf,
            dirty: false,
            saved_text: String::new(),
        }
    }

    /// The bare filename component, or `"Untitled"` if no path is set.
    pub(crate) fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_owned())
    }

    /// Compute the title string for the main window.
    ///
    /// | State | Title |
    /// |---|---|
    /// | No path, clean | `"Quill"` |
    /// | Path set, clean | `"filename — Quill"` |
    /// | Path set, dirty | `"*filename — Quill"` |
    /// | No path, dirty | `"*Untitled — Quill"` |
    pub(crate) fn window_title(&self) -> String {
        if self.path.is_none() && !self.dirty {
            return "Quill".to_owned();
        }
        let dirty = if self.dirty { "*" } else { "" };
        format!("{dirty}{} \u{2014} Quill", self.display_name()) // — is U+2014 EM DASH
    }

    /// Recompute the dirty flag by exact comparison against the saved
    /// snapshot.  Length is checked first so typical keystrokes never pay
    /// for a full string compare.
    ///
    /// Returns `true` when the flag changed (the caller refreshes the title).
    pub(crate) fn update_dirty(&mut self, current_text: &str) -> bool {
        let dirty =
            current_text.len() != self.saved_text.len() || current_text != self.saved_text;
        let changed = dirty != self.dirty;
        self.dirty = dirty;
        changed
    }

    /// Record `text` as the on-disk state (after a load or successful save).
    pub(crate) fn set_saved(&mut self, text: &str) {
        self.saved_text = text.to_owned();
        self.dirty = false;
    }

    // ── Load ──────────────────────────────────────────────────────────────────

    /// Update document state from raw file bytes after a successful read.
    ///
    /// Detects encoding and EOL convention, normalises line endings to CRLF
    /// (the Edit control's native convention), records the saved snapshot,
    /// and returns the text to put in the editor.
    pub(crate) fn load(&mut self, path: PathBuf, bytes: &[u8]) -> String {
        let (encoding, text) = detect_and_decode(bytes);
        self.encoding = encoding;
        self.eol = detect_eol(bytes);
        let text = normalize_to_crlf(&text);
        self.set_saved(&text);
        self.path = Some(path);
        text
    }

    // ── Save ──────────────────────────────────────────────────────────────────

    /// Convert CRLF editor text to on-disk bytes: apply the document's EOL
    /// convention, then its encoding (with BOM where the encoding carries one).
    pub(crate) fn encode_for_disk(&self, crlf_text: &str) -> Vec<u8> {
        let text = apply_eol(crlf_text, self.eol);
        match self.encoding {
            Encoding::Utf8 => text.into_bytes(),
            Encoding::Utf8Bom => {
                let mut out = vec![0xEF_u8, 0xBB, 0xBF];
                out.extend_from_slice(text.as_bytes());
                out
            }
            Encoding::Utf16Le => {
                let mut out = vec![0xFF_u8, 0xFE]; // LE BOM
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
                out
            }
            Encoding::Utf16Be => {
                let mut out = vec![0xFE_u8, 0xFF]; // BE BOM
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                out
            }
            // ANSI = Latin-1: chars above U+00FF are replaced with '?'.
            Encoding::Ansi => text
                .chars()
                .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

// ── Encoding detection ────────────────────────────────────────────────────────

/// Detect the encoding of `bytes` and decode to a Rust string.
///
/// Detection order:
/// 1. Empty file → UTF-8
/// 2. BOM: `EF BB BF` → UTF-8 BOM, `FF FE` → UTF-16 LE, `FE FF` → UTF-16 BE
/// 3. BOM-less UTF-16 by NUL position: a leading NUL means big-endian text,
///    a NUL in the second byte means little-endian (ASCII-heavy heuristic)
/// 4. Strict UTF-8 validation
/// 5. Fallback: ANSI (Latin-1 pass-through)
pub(crate) fn detect_and_decode(bytes: &[u8]) -> (Encoding, String) {
    if bytes.is_empty() {
        return (Encoding::Utf8, String::new());
    }

    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return (
            Encoding::Utf8Bom,
            String::from_utf8_lossy(&bytes[3..]).into_owned(),
        );
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return (Encoding::Utf16Le, decode_utf16le(&bytes[2..]));
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return (Encoding::Utf16Be, decode_utf16be(&bytes[2..]));
    }

    // BOM-less UTF-16: ASCII text encoded as UTF-16 has a NUL in every even
    // (BE) or odd (LE) position; the first two bytes are enough in practice.
    if bytes[0] == 0 {
        return (Encoding::Utf16Be, decode_utf16be(bytes));
    }
    if bytes.len() >= 2 && bytes[1] == 0 {
        return (Encoding::Utf16Le, decode_utf16le(bytes));
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return (Encoding::Utf8, s.to_owned());
    }

    // Latin-1 pass-through: every byte maps to the same code point.
    (Encoding::Ansi, bytes.iter().map(|&b| b as char).collect())
}

fn decode_utf16le(payload: &[u8]) -> String {
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_utf16be(payload: &[u8]) -> String {
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

// ── EOL detection ─────────────────────────────────────────────────────────────

/// Detect the EOL convention by presence/absence of CR and LF bytes:
/// LF when `\n` occurs without any `\r`, CR when `\r` occurs without any
/// `\n`, CRLF otherwise (including files with no line endings at all).
///
/// Operates on the raw bytes so UTF-16 input is handled too: `\r`/`\n`
/// code units contain the ASCII byte either way.
pub(crate) fn detect_eol(bytes: &[u8]) -> EolMode {
    let has_cr = bytes.contains(&b'\r');
    let has_lf = bytes.contains(&b'\n');
    match (has_cr, has_lf) {
        (false, true) => EolMode::Lf,
        (true, false) => EolMode::Cr,
        _ => EolMode::Crlf,
    }
}

// ── EOL conversion ────────────────────────────────────────────────────────────

/// Normalise any mix of CRLF / LF / CR to CRLF.
pub(crate) fn normalize_to_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\r\n");
            }
            '\n' => out.push_str("\r\n"),
            c => out.push(c),
        }
    }
    out
}

/// Convert CRLF text to the given EOL convention.
pub(crate) fn apply_eol(crlf_text: &str, eol: EolMode) -> String {
    match eol {
        EolMode::Crlf => crlf_text.to_owned(),
        EolMode::Lf | EolMode::Cr => crlf_text.replace("\r\n", eol.separator()),
    }
}

// ── Indentation transforms ────────────────────────────────────────────────────
//
// Pure text halves of the Tab / Shift+Tab / Backspace handlers.  The caller
// passes the selected text (for block operations) or the current line prefix
// (for caret operations) and splices the result back into the Edit control.

/// One indent unit: a tab, or `tab_size` spaces.
fn indent_unit(use_spaces: bool, tab_size: usize) -> String {
    if use_spaces {
        " ".repeat(tab_size)
    } else {
        "\t".to_owned()
    }
}

/// Indent every line of a CRLF block selection by one unit.
pub(crate) fn indent_lines(text: &str, use_spaces: bool, tab_size: usize) -> String {
    let unit = indent_unit(use_spaces, tab_size);
    let mut out = String::with_capacity(text.len() + unit.len() * 4);
    out.push_str(&unit);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '\n' && chars.peek().is_some() {
            out.push_str(&unit);
        }
    }
    out
}

/// Remove one leading indent unit (a tab, or up to `tab_size` spaces) from
/// every line of a CRLF block selection.
pub(crate) fn unindent_lines(text: &str, tab_size: usize) -> String {
    let strip = |line: &str| -> String {
        if let Some(rest) = line.strip_prefix('\t') {
            return rest.to_owned();
        }
        let spaces = line.chars().take_while(|&c| c == ' ').count().min(tab_size);
        line[spaces..].to_owned()
    };
    text.split("\r\n").map(strip).collect::<Vec<_>>().join("\r\n")
}

/// Convert leading whitespace on every line between tab and space indentation.
pub(crate) fn convert_indentation(text: &str, to_spaces: bool, tab_size: usize) -> String {
    let convert = |line: &str| -> String {
        let body_start = line
            .find(|c| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        let (lead, body) = line.split_at(body_start);
        // Measure the leading whitespace in columns.
        let mut cols = 0usize;
        for c in lead.chars() {
            cols = match c {
                '\t' => (cols / tab_size + 1) * tab_size,
                _ => cols + 1,
            };
        }
        let new_lead = if to_spaces {
            " ".repeat(cols)
        } else {
            "\t".repeat(cols / tab_size) + &" ".repeat(cols % tab_size)
        };
        new_lead + body
    };
    text.split("\r\n").map(convert).collect::<Vec<_>>().join("\r\n")
}

/// Number of spaces to insert to advance from column `col` (0-based) to the
/// next tab stop.
pub(crate) fn spaces_to_next_stop(col: usize, tab_size: usize) -> usize {
    tab_size - (col % tab_size)
}

/// For a Backspace at the end of `line_prefix`: when the prefix is non-empty
/// and all spaces, the number of characters to delete to reach the previous
/// tab stop; otherwise `None` (normal single-character backspace).
pub(crate) fn backspace_span(line_prefix: &str, tab_size: usize) -> Option<usize> {
    if line_prefix.is_empty() || !line_prefix.chars().all(|c| c == ' ') {
        return None;
    }
    let len = line_prefix.len();
    Some(((len - 1) % tab_size) + 1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentState {
        DocumentState::new_untitled()
    }

    // ── Title ─────────────────────────────────────────────────────────────────

    #[test]
    fn title_clean_untitled() {
        assert_eq!(doc().window_title(), "Quill");
    }

    #[test]
    fn title_dirty_with_path() {
        let mut d = doc();
        d.path = Some(PathBuf::from(r"C:\notes\todo.txt"));
        d.dirty = true;
        assert_eq!(d.window_title(), "*todo.txt \u{2014} Quill");
    }

    #[test]
    fn title_dirty_untitled() {
        let mut d = doc();
        d.dirty = true;
        assert_eq!(d.window_title(), "*Untitled \u{2014} Quill");
    }

    // ── Dirty tracking ────────────────────────────────────────────────────────

    #[test]
    fn dirty_follows_snapshot_comparison() {
        let mut d = doc();
        d.set_saved("hello\r\n");
        assert!(!d.update_dirty("hello\r\n") && !d.dirty);
        assert!(d.update_dirty("hello!\r\n") && d.dirty);
        // Typing back the original text un-dirties the buffer.
        assert!(d.update_dirty("hello\r\n") && !d.dirty);
    }

    // ── Encoding detection ────────────────────────────────────────────────────

    #[test]
    fn detect_empty_is_utf8() {
        let (enc, text) = detect_and_decode(b"");
        assert_eq!(enc, Encoding::Utf8);
        assert!(text.is_empty());
    }

    #[test]
    fn detect_utf8_bom() {
        let (enc, text) = detect_and_decode(b"\xEF\xBB\xBFhello");
        assert_eq!(enc, Encoding::Utf8Bom);
        assert_eq!(text, "hello");
    }

    #[test]
    fn detect_utf16le_bom() {
        let (enc, text) = detect_and_decode(b"\xFF\xFEh\x00i\x00");
        assert_eq!(enc, Encoding::Utf16Le);
        assert_eq!(text, "hi");
    }

    #[test]
    fn detect_utf16be_bom() {
        let (enc, text) = detect_and_decode(b"\xFE\xFF\x00h\x00i");
        assert_eq!(enc, Encoding::Utf16Be);
        assert_eq!(text, "hi");
    }

    #[test]
    fn detect_bomless_utf16le_by_nul_position() {
        let (enc, text) = detect_and_decode(b"h\x00i\x00");
        assert_eq!(enc, Encoding::Utf16Le);
        assert_eq!(text, "hi");
    }

    #[test]
    fn detect_bomless_utf16be_by_leading_nul() {
        let (enc, text) = detect_and_decode(b"\x00h\x00i");
        assert_eq!(enc, Encoding::Utf16Be);
        assert_eq!(text, "hi");
    }

    #[test]
    fn detect_plain_utf8() {
        let (enc, text) = detect_and_decode("héllo".as_bytes());
        assert_eq!(enc, Encoding::Utf8);
        assert_eq!(text, "héllo");
    }

    #[test]
    fn detect_ansi_fallback_is_latin1() {
        // 0xE9 alone is invalid UTF-8 but is 'é' in Latin-1.
        let (enc, text) = detect_and_decode(b"caf\xE9");
        assert_eq!(enc, Encoding::Ansi);
        assert_eq!(text, "café");
    }

    // ── EOL detection ─────────────────────────────────────────────────────────

    #[test]
    fn detect_eol_lf_only() {
        assert_eq!(detect_eol(b"line1\nline2\n"), EolMode::Lf);
    }

    #[test]
    fn detect_eol_cr_only() {
        assert_eq!(detect_eol(b"line1\rline2\r"), EolMode::Cr);
    }

    #[test]
    fn detect_eol_mixed_or_crlf() {
        assert_eq!(detect_eol(b"a\r\nb"), EolMode::Crlf);
        assert_eq!(detect_eol(b"a\rb\nc"), EolMode::Crlf);
    }

    #[test]
    fn detect_eol_none_defaults_crlf() {
        assert_eq!(detect_eol(b"no newlines"), EolMode::Crlf);
    }

    // ── Round trips ───────────────────────────────────────────────────────────

    #[test]
    fn lf_document_saves_byte_identical() {
        let original = b"line1\nline2\n";
        let mut d = doc();
        let text = d.load(PathBuf::from("a.txt"), original);
        assert_eq!(d.encoding, Encoding::Utf8);
        assert_eq!(d.eol, EolMode::Lf);
        assert_eq!(text, "line1\r\nline2\r\n"); // CRLF inside the editor
        assert_eq!(d.encode_for_disk(&text), original); // byte-identical, no BOM
    }

    #[test]
    fn eol_round_trips() {
        for (eol, bytes) in [
            (EolMode::Crlf, b"a\r\nb".to_vec()),
            (EolMode::Lf, b"a\nb".to_vec()),
            (EolMode::Cr, b"a\rb".to_vec()),
        ] {
            let mut d = doc();
            let text = d.load(PathBuf::from("x"), &bytes);
            assert_eq!(d.eol, eol);
            assert_eq!(d.encode_for_disk(&text), bytes);
        }
    }

    #[test]
    fn encoding_round_trips_with_bom() {
        let cases: &[&[u8]] = &[
            b"\xEF\xBB\xBFbom utf8",
            b"\xFF\xFEa\x00b\x00",
            b"\xFE\xFF\x00a\x00b",
        ];
        for &bytes in cases {
            let mut d = doc();
            let text = d.load(PathBuf::from("x"), bytes);
            let enc = d.encoding;
            let out = d.encode_for_disk(&text);
            assert_eq!(out, bytes, "{enc:?} did not round-trip");
            // Re-detection sees the same encoding.
            assert_eq!(detect_and_decode(&out).0, enc);
        }
    }

    #[test]
    fn ansi_round_trips_latin1() {
        let bytes = b"caf\xE9";
        let mut d = doc();
        let text = d.load(PathBuf::from("x"), bytes);
        assert_eq!(d.encoding, Encoding::Ansi);
        assert_eq!(d.encode_for_disk(&text), bytes);
    }

    #[test]
    fn normalize_mixed_line_endings() {
        assert_eq!(normalize_to_crlf("a\nb\rc\r\nd"), "a\r\nb\r\nc\r\nd");
    }

    // ── Indentation ───────────────────────────────────────────────────────────

    #[test]
    fn indent_block_with_tabs() {
        assert_eq!(indent_lines("a\r\nb", false, 4), "\ta\r\n\tb");
    }

    #[test]
    fn indent_block_with_spaces() {
        assert_eq!(indent_lines("a\r\nb", true, 2), "  a\r\n  b");
    }

    #[test]
    fn unindent_block_strips_tab_or_spaces() {
        assert_eq!(unindent_lines("\ta\r\n    b\r\nc", 4), "a\r\nb\r\nc");
        // Fewer than tab_size spaces: strips what is there.
        assert_eq!(unindent_lines("  a", 4), "a");
    }

    #[test]
    fn convert_indentation_both_ways() {
        assert_eq!(convert_indentation("\ta\r\n\t\tb", true, 4), "    a\r\n        b");
        assert_eq!(convert_indentation("    a\r\n      b", false, 4), "\ta\r\n\t  b");
    }

    #[test]
    fn tab_stop_arithmetic() {
        assert_eq!(spaces_to_next_stop(0, 4), 4);
        assert_eq!(spaces_to_next_stop(3, 4), 1);
        assert_eq!(spaces_to_next_stop(4, 4), 4);
    }

    #[test]
    fn backspace_span_over_spaces() {
        assert_eq!(backspace_span("        ", 4), Some(4));
        assert_eq!(backspace_span("      ", 4), Some(2));
        assert_eq!(backspace_span(" ", 4), Some(1));
        assert_eq!(backspace_span("x   ", 4), None);
        assert_eq!(backspace_span("", 4), None);
    }
}
