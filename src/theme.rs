// ── Dual light/dark theme ─────────────────────────────────────────────────────
//
// The colour palette plus the pure style computations behind every themed
// control: the Edit frame swap, the status-bar part layout, and the menu-bar
// paint colours.  Keeping the computations here (no Win32 types) makes the
// "toggling dark mode twice restores the original state" guarantee testable
// on any host.
//
// Colour convention: Win32 COLORREF, i.e. 0x00BBGGRR.

// ── Palette ───────────────────────────────────────────────────────────────────

/// Main dark background (top-level window, dialogs).
pub(crate) const DARK_BG: u32 = 0x0020_2020;
/// Darker panel used behind the large-font message text.
pub(crate) const DARK_BG_DARKER: u32 = 0x0017_1717;
/// Background of input controls (Edit, ComboBox) in dark mode.
pub(crate) const DARK_CONTROL_BG: u32 = 0x002B_2B2B;
/// Foreground text in dark mode.
pub(crate) const DARK_TEXT: u32 = 0x00E0_E0E0;
/// Hot / selected menu-bar item background.
pub(crate) const DARK_MENU_HOT: u32 = 0x003E_3E3E;
/// Status-bar part separator line.
pub(crate) const DARK_SEPARATOR: u32 = 0x0064_6464;
/// Accent text in the large-font message box (dark mode).
pub(crate) const DARK_ACCENT_TEXT: u32 = 0x00DA_A026;
/// Accent text in the large-font message box (light mode).
pub(crate) const LIGHT_ACCENT_TEXT: u32 = 0x0099_3300;
/// The 1-px divider above the button strip of the large-font box, light mode.
pub(crate) const LIGHT_DIVIDER: u32 = 0x00DF_DFDF;

// ── Edit frame swap ───────────────────────────────────────────────────────────
//
// The themed 3-D client edge stays light even in dark mode, so dark Edit
// controls trade `WS_EX_CLIENTEDGE` for a flat `WS_BORDER`, and back.
// Mirrors the Win32 constants; the platform layer feeds raw style words in.

const WS_BORDER_BIT: u32 = 0x0080_0000;
const WS_EX_CLIENTEDGE_BIT: u32 = 0x0000_0200;

/// Compute the `(style, exstyle)` pair for an Edit control in the given mode.
pub(crate) fn edit_frame(dark: bool, style: u32, exstyle: u32) -> (u32, u32) {
    if dark {
        (style | WS_BORDER_BIT, exstyle & !WS_EX_CLIENTEDGE_BIT)
    } else {
        (style & !WS_BORDER_BIT, exstyle | WS_EX_CLIENTEDGE_BIT)
    }
}

// ── Status-bar layout ─────────────────────────────────────────────────────────

/// Widths of the fixed status-bar parts, right to left of the stretchy
/// message area: caret position, zoom, EOL name, encoding name.
pub(crate) const STATUS_PART_WIDTHS: [i32; 4] = [140, 50, 120, 120];

/// Compute right-aligned part edges for `SB_SETPARTS`.
///
/// The first part (free-form message area) absorbs the slack; the last edge
/// is `-1`, which the control reads as "extend to the right edge".
pub(crate) fn status_part_edges(total_width: i32, part_widths: &[i32]) -> Vec<i32> {
    let fixed: i32 = part_widths.iter().sum();
    let mut edges = Vec::with_capacity(part_widths.len() + 1);
    let mut x = (total_width - fixed).max(0);
    edges.push(x);
    for w in &part_widths[..part_widths.len().saturating_sub(1)] {
        x += w;
        edges.push(x);
    }
    edges.push(-1);
    edges
}

// ── Menu bar paint colours ────────────────────────────────────────────────────

/// Background colour for one menu-bar item in dark mode.
/// `highlighted` covers both the hot-tracked and the pushed state.
pub(crate) fn menu_item_bg(highlighted: bool) -> u32 {
    if highlighted {
        DARK_MENU_HOT
    } else {
        DARK_BG
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_frame_toggle_twice_is_identity() {
        // Typical Edit control as created: client edge on, no WS_BORDER.
        let style = 0x50B1_0044_u32 & !WS_BORDER_BIT;
        let exstyle = WS_EX_CLIENTEDGE_BIT;

        let (s1, x1) = edit_frame(true, style, exstyle);
        assert_ne!((s1, x1), (style, exstyle));
        let (s2, x2) = edit_frame(false, s1, x1);
        assert_eq!((s2, x2), (style, exstyle), "round trip must be bit-exact");
    }

    #[test]
    fn edit_frame_dark_swaps_border_bits() {
        let (s, x) = edit_frame(true, 0, WS_EX_CLIENTEDGE_BIT);
        assert_ne!(s & WS_BORDER_BIT, 0);
        assert_eq!(x & WS_EX_CLIENTEDGE_BIT, 0);
    }

    #[test]
    fn status_edges_right_align_fixed_parts() {
        let edges = status_part_edges(800, &STATUS_PART_WIDTHS);
        assert_eq!(edges, vec![370, 510, 560, 680, -1]);
    }

    #[test]
    fn status_edges_clamp_on_narrow_window() {
        let edges = status_part_edges(100, &STATUS_PART_WIDTHS);
        assert_eq!(edges[0], 0);
        assert_eq!(*edges.last().expect("edges"), -1);
    }

    #[test]
    fn menu_bg_distinguishes_highlight() {
        assert_ne!(menu_item_bg(true), menu_item_bg(false));
    }
}
