// ── Find / replace engine ─────────────────────────────────────────────────────
//
// Pure-Rust search over UTF-16 code units — the index space the native Edit
// control uses for selections (`EM_GETSEL` / `EM_SETSEL`).  No Win32 imports;
// usable and testable from any module.

// ── Options & state ───────────────────────────────────────────────────────────

/// Parameters for a single search operation.
///
/// Populated from the Find / Replace dialog checkboxes and stored so that
/// F3 / Shift+F3 can repeat the last search without re-opening the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SearchOptions {
    pub(crate) match_case: bool,
    pub(crate) wrap_around: bool,
    pub(crate) search_up: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            match_case: false,
            wrap_around: true,
            search_up: false,
        }
    }
}

/// The last search/replace terms plus options, persisted across sessions.
#[derive(Debug, Clone, Default)]
pub(crate) struct SearchState {
    pub(crate) term: String,
    pub(crate) replace_with: String,
    pub(crate) options: SearchOptions,
}

// ── Find ──────────────────────────────────────────────────────────────────────

/// Result of a find operation, in UTF-16 code-unit indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FindOutcome {
    /// Match found; `wrapped` is set when the search continued from the
    /// top (or bottom, searching up) after passing the end of the document.
    Found {
        start: usize,
        end: usize,
        wrapped: bool,
    },
    NotFound,
}

/// Find the next occurrence of `needle` in `haystack` relative to the
/// current selection `(sel_start, sel_end)`.
///
/// Searching down starts at `sel_end`; searching up ends before `sel_start`.
/// With `wrap_around`, a failed pass retries from the opposite end.
pub(crate) fn find(
    haystack: &[u16],
    needle: &[u16],
    sel_start: usize,
    sel_end: usize,
    options: SearchOptions,
) -> FindOutcome {
    if needle.is_empty() || needle.len() > haystack.len() {
        return FindOutcome::NotFound;
    }

    let found = |start: usize, wrapped: bool| FindOutcome::Found {
        start,
        end: start + needle.len(),
        wrapped,
    };

    if options.search_up {
        if let Some(pos) = rfind_at(haystack, needle, sel_start, options.match_case) {
            return found(pos, false);
        }
        if options.wrap_around {
            if let Some(pos) = rfind_at(haystack, needle, haystack.len(), options.match_case) {
                return found(pos, true);
            }
        }
    } else {
        if let Some(pos) = find_at(haystack, needle, sel_end, options.match_case) {
            return found(pos, false);
        }
        if options.wrap_around {
            if let Some(pos) = find_at(haystack, needle, 0, options.match_case) {
                return found(pos, true);
            }
        }
    }
    FindOutcome::NotFound
}

/// First occurrence at index ≥ `from`.
fn find_at(haystack: &[u16], needle: &[u16], from: usize, match_case: bool) -> Option<usize> {
    if from + needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| matches_at(haystack, needle, i, match_case))
}

/// Last occurrence entirely before index `end`.
fn rfind_at(haystack: &[u16], needle: &[u16], end: usize, match_case: bool) -> Option<usize> {
    let end = end.min(haystack.len());
    if needle.len() > end {
        return None;
    }
    (0..=end - needle.len())
        .rev()
        .find(|&i| matches_at(haystack, needle, i, match_case))
}

fn matches_at(haystack: &[u16], needle: &[u16], at: usize, match_case: bool) -> bool {
    haystack[at..at + needle.len()]
        .iter()
        .zip(needle)
        .all(|(&h, &n)| {
            if match_case {
                h == n
            } else {
                fold(h) == fold(n)
            }
        })
}

/// Case-fold one UTF-16 code unit.  Only single-unit (BMP) simple lowercase
/// mappings apply; surrogates and expanding mappings pass through unchanged.
fn fold(u: u16) -> u16 {
    match char::from_u32(u as u32) {
        Some(c) => {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) if (l as u32) <= 0xFFFF => l as u32 as u16,
                _ => u,
            }
        }
        None => u,
    }
}

// ── Replace all ───────────────────────────────────────────────────────────────

/// Replace every occurrence of `term` in `text` (CRLF editor text).
///
/// Returns the new text and the number of replacements, or `None` when
/// nothing matched.  Non-overlapping, left to right.
pub(crate) fn replace_all(
    text: &str,
    term: &str,
    replacement: &str,
    match_case: bool,
) -> Option<(String, usize)> {
    let hay: Vec<u16> = text.encode_utf16().collect();
    let needle: Vec<u16> = term.encode_utf16().collect();
    let repl: Vec<u16> = replacement.encode_utf16().collect();
    if needle.is_empty() {
        return None;
    }

    let mut out: Vec<u16> = Vec::with_capacity(hay.len());
    let mut count = 0usize;
    let mut i = 0usize;
    while i < hay.len() {
        if i + needle.len() <= hay.len() && matches_at(&hay, &needle, i, match_case) {
            out.extend_from_slice(&repl);
            i += needle.len();
            count += 1;
        } else {
            out.push(hay[i]);
            i += 1;
        }
    }

    if count == 0 {
        None
    } else {
        Some((String::from_utf16_lossy(&out), count))
    }
}

// ── Go to line ────────────────────────────────────────────────────────────────

/// Resolve a go-to-line dialog input against the document's line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GotoTarget {
    /// Jump to this 1-based line.
    Line(usize),
    /// Target past the last line; the caret stays put and a warning is shown.
    BeyondEnd,
    /// Not a number at all.
    Invalid,
}

/// Parse `input` and clamp against `line_count`.  A target of 0 means line 1.
pub(crate) fn resolve_goto(input: &str, line_count: usize) -> GotoTarget {
    let Ok(n) = input.trim().parse::<u64>() else {
        return GotoTarget::Invalid;
    };
    let n = if n == 0 { 1 } else { n as usize };
    if n > line_count.max(1) {
        GotoTarget::BeyondEnd
    } else {
        GotoTarget::Line(n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn down() -> SearchOptions {
        SearchOptions {
            match_case: false,
            wrap_around: false,
            search_up: false,
        }
    }

    #[test]
    fn finds_forward_from_selection_end() {
        let hay = w("abc abc abc");
        let out = find(&hay, &w("abc"), 0, 1, down());
        assert_eq!(
            out,
            FindOutcome::Found {
                start: 4,
                end: 7,
                wrapped: false
            }
        );
    }

    #[test]
    fn case_insensitive_by_default() {
        let hay = w("Hello World");
        let out = find(&hay, &w("world"), 0, 0, down());
        assert!(matches!(out, FindOutcome::Found { start: 6, .. }));
    }

    #[test]
    fn match_case_rejects_wrong_case() {
        let hay = w("Hello World");
        let opts = SearchOptions {
            match_case: true,
            ..down()
        };
        assert_eq!(find(&hay, &w("world"), 0, 0, opts), FindOutcome::NotFound);
    }

    #[test]
    fn wrap_around_reports_wrapped() {
        let hay = w("abc def");
        let opts = SearchOptions {
            wrap_around: true,
            ..down()
        };
        let out = find(&hay, &w("abc"), 5, 5, opts);
        assert_eq!(
            out,
            FindOutcome::Found {
                start: 0,
                end: 3,
                wrapped: true
            }
        );
    }

    #[test]
    fn no_wrap_stops_at_end() {
        let hay = w("abc def");
        assert_eq!(find(&hay, &w("abc"), 5, 5, down()), FindOutcome::NotFound);
    }

    #[test]
    fn searches_up_before_selection() {
        let hay = w("abc abc abc");
        let opts = SearchOptions {
            search_up: true,
            ..down()
        };
        // Selection on the last occurrence; the previous one starts at 4.
        let out = find(&hay, &w("abc"), 8, 11, opts);
        assert!(matches!(
            out,
            FindOutcome::Found {
                start: 4,
                wrapped: false,
                ..
            }
        ));
    }

    #[test]
    fn searches_up_wraps_to_bottom() {
        let hay = w("abc def abc");
        let opts = SearchOptions {
            search_up: true,
            wrap_around: true,
            ..down()
        };
        let out = find(&hay, &w("abc"), 0, 0, opts);
        assert!(matches!(
            out,
            FindOutcome::Found {
                start: 8,
                wrapped: true,
                ..
            }
        ));
    }

    #[test]
    fn empty_needle_never_matches() {
        assert_eq!(find(&w("abc"), &w(""), 0, 0, down()), FindOutcome::NotFound);
    }

    #[test]
    fn replace_all_counts_and_splices() {
        let (out, n) = replace_all("one two one", "one", "1", false).expect("matches");
        assert_eq!(out, "1 two 1");
        assert_eq!(n, 2);
    }

    #[test]
    fn replace_all_none_when_absent() {
        assert!(replace_all("abc", "xyz", "q", false).is_none());
    }

    #[test]
    fn replace_all_respects_case_flag() {
        let (out, n) = replace_all("One one", "one", "x", true).expect("matches");
        assert_eq!(out, "One x");
        assert_eq!(n, 1);
    }

    #[test]
    fn goto_zero_is_line_one() {
        assert_eq!(resolve_goto("0", 10), GotoTarget::Line(1));
    }

    #[test]
    fn goto_beyond_count_is_flagged() {
        assert_eq!(resolve_goto("11", 10), GotoTarget::BeyondEnd);
    }

    #[test]
    fn goto_in_range() {
        assert_eq!(resolve_goto(" 7 ", 10), GotoTarget::Line(7));
    }

    #[test]
    fn goto_garbage_is_invalid() {
        assert_eq!(resolve_goto("7a", 10), GotoTarget::Invalid);
    }
}
