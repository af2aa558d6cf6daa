// ── Edit control ───────────────────────────────────────────────────────────────
//
// Wrapper over the stock multiline EDIT control.  Selection offsets are
// UTF-16 code-unit indices into the control text, the same index space the
// search module operates on.
//
// Word wrap cannot be toggled on a live edit control (ES_AUTOHSCROLL and
// WS_HSCROLL are creation-time styles), so the owner recreates the control
// and moves text and selection across; `create` exists separately from the
// wrapper for that reason.

#![allow(unsafe_code)]

use windows::{
    core::w,
    Win32::{
        Foundation::{HINSTANCE, HWND},
        UI::WindowsAndMessaging::{
            SetWindowPos, EM_CANUNDO, EM_GETLINECOUNT, EM_GETSEL, EM_LINEFROMCHAR,
            EM_LINEINDEX, EM_REPLACESEL, EM_SCROLLCARET, EM_SETLIMITTEXT, EM_SETMODIFY, EM_SETSEL,
            EM_SETTABSTOPS, EM_UNDO, ES_AUTOHSCROLL, ES_AUTOVSCROLL, ES_MULTILINE, ES_NOHIDESEL,
            HMENU, SWP_FRAMECHANGED, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, WINDOW_STYLE, WM_CLEAR,
            WM_COPY, WM_CUT, WM_PASTE, WS_CHILD, WS_HSCROLL, WS_VISIBLE, WS_VSCROLL,
        },
    },
};

use super::super::window::Window;
use crate::error::Result;
use crate::theme;

/// Child-window id of the editor control; WM_COMMAND notifications carry it.
pub(crate) const EDIT_ID: u16 = 100;

/// Average-char-width multiple used by EM_SETTABSTOPS (dialog units).
const TAB_DIALOG_UNITS: usize = 4;

/// EM_SETMARGINS and its EC_LEFTMARGIN | EC_RIGHTMARGIN selector.
const EM_SETMARGINS: u32 = 0x00D3;
const EC_LEFT_AND_RIGHT: usize = 0x0003;

/// Inner text margin, px.
const TEXT_MARGIN: isize = 3;

#[derive(Clone)]
pub(crate) struct Edit {
    pub(crate) win: Window,
}

impl Edit {
    /// Create the editor child control.  `word_wrap` decides the horizontal
    /// scrolling styles, which are fixed for the control's lifetime.
    pub(crate) fn create(parent: HWND, hinstance: HINSTANCE, word_wrap: bool) -> Result<Edit> {
        let mut style = WS_CHILD
            | WS_VISIBLE
            | WS_VSCROLL
            | WINDOW_STYLE((ES_MULTILINE | ES_AUTOVSCROLL | ES_NOHIDESEL) as u32);
        if !word_wrap {
            style |= WS_HSCROLL | WINDOW_STYLE(ES_AUTOHSCROLL as u32);
        }

        let win = Window::create(
            hinstance,
            w!("EDIT"),
            "",
            style,
            Default::default(),
            (0, 0, 0, 0),
            Some(parent),
            Some(HMENU(EDIT_ID as usize as *mut core::ffi::c_void)),
        )?;

        let edit = Edit { win };
        // The document layer enforces the real byte ceiling; the control
        // limit only has to stop unbounded typing.
        edit.win.send(EM_SETLIMITTEXT, 0, 0);
        Ok(edit)
    }

    // ── Text ───────────────────────────────────────────────────────────────────

    pub(crate) fn text(&self) -> String {
        self.win.text()
    }

    pub(crate) fn text_utf16(&self) -> Vec<u16> {
        self.win.text_utf16()
    }

    pub(crate) fn set_text(&self, text: &str) -> Result<()> {
        self.win.set_text(text)
    }

    /// Replace the current selection, participating in the control's undo
    /// chain (unlike WM_SETTEXT).
    pub(crate) fn replace_selection(&self, text: &str) {
        let text_w = super::super::wide(text);
        self.win.send(EM_REPLACESEL, 1, text_w.as_ptr() as isize);
    }

    // ── Selection ──────────────────────────────────────────────────────────────

    /// Current selection as (start, end) UTF-16 code-unit offsets.
    pub(crate) fn selection(&self) -> (u32, u32) {
        let mut start = 0u32;
        let mut end = 0u32;
        self.win.send(
            EM_GETSEL,
            &mut start as *mut u32 as usize,
            &mut end as *mut u32 as isize,
        );
        (start, end)
    }

    pub(crate) fn set_selection(&self, start: i32, end: i32) {
        self.win.send(EM_SETSEL, start as usize, end as isize);
    }

    pub(crate) fn select_all(&self) {
        self.set_selection(0, -1);
    }

    pub(crate) fn scroll_to_caret(&self) {
        self.win.send(EM_SCROLLCARET, 0, 0);
    }

    // ── Lines ──────────────────────────────────────────────────────────────────

    /// Zero-based line index containing the given character offset
    /// (-1 means the line containing the caret).
    pub(crate) fn line_from_char(&self, char_index: i32) -> i32 {
        self.win.send(EM_LINEFROMCHAR, char_index as usize, 0) as i32
    }

    /// Character offset of the first character of the given line.
    pub(crate) fn line_index(&self, line: i32) -> i32 {
        self.win.send(EM_LINEINDEX, line as usize, 0) as i32
    }

    pub(crate) fn line_count(&self) -> i32 {
        self.win.send(EM_GETLINECOUNT, 0, 0) as i32
    }

    // ── Editing state ──────────────────────────────────────────────────────────

    pub(crate) fn set_modified(&self, modified: bool) {
        self.win.send(EM_SETMODIFY, usize::from(modified), 0);
    }

    pub(crate) fn can_undo(&self) -> bool {
        self.win.send(EM_CANUNDO, 0, 0) != 0
    }

    pub(crate) fn undo(&self) {
        self.win.send(EM_UNDO, 0, 0);
    }

    pub(crate) fn cut(&self) {
        self.win.send(WM_CUT, 0, 0);
    }

    pub(crate) fn copy(&self) {
        self.win.send(WM_COPY, 0, 0);
    }

    pub(crate) fn paste(&self) {
        self.win.send(WM_PASTE, 0, 0);
    }

    pub(crate) fn delete_selection(&self) {
        self.win.send(WM_CLEAR, 0, 0);
    }

    /// Set uniform tab stops; `tab_size` is in characters.
    pub(crate) fn set_tab_size(&self, tab_size: u32) {
        let stops = [(tab_size as usize * TAB_DIALOG_UNITS) as u32];
        self.win
            .send(EM_SETTABSTOPS, stops.len(), stops.as_ptr() as isize);
    }

    // ── Theme ──────────────────────────────────────────────────────────────────

    /// Swap the frame between the themed client edge (light) and a flat
    /// border (dark), re-theme the scrollbars, and nudge the frame so the
    /// change takes effect.  Text colours come from the parent answering
    /// WM_CTLCOLOREDIT.
    pub(crate) fn apply_theme(&self, dark: bool) {
        let (style, exstyle) = theme::edit_frame(dark, self.win.style(), self.win.exstyle());
        self.win.set_styles(style, exstyle);
        self.win.apply_explorer_theme(dark);
        self.win.send(
            EM_SETMARGINS,
            EC_LEFT_AND_RIGHT,
            (TEXT_MARGIN << 16) | TEXT_MARGIN,
        );
        // SAFETY: hwnd is live; the no-op move/size flags make this purely a
        // frame recalculation.
        unsafe {
            let _ = SetWindowPos(
                self.win.hwnd(),
                None,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_FRAMECHANGED,
            );
        }
    }
}
