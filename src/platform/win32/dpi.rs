// ── DPI helpers ────────────────────────────────────────────────────────────────
//
// Per-Monitor v2 awareness plus the small amount of math the rest of the
// code needs.  Fonts are the main consumer: the editor font is recreated
// whenever WM_DPICHANGED arrives or the zoom factor changes.

#![allow(unsafe_code)]

use windows::Win32::{
    Foundation::{HWND, RECT},
    UI::HiDpi::{
        GetDpiForWindow, SetProcessDpiAwarenessContext,
        DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    },
};

pub(crate) const BASE_DPI: u32 = 96;

/// Opt into Per-Monitor v2 DPI awareness.
/// MUST be called before any window is created on the calling thread.
pub(crate) fn init() {
    // SAFETY: must precede all window creation; single call at process start.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}

/// DPI for `hwnd`, falling back to [`BASE_DPI`] on failure.
pub(crate) fn get_for_window(hwnd: HWND) -> u32 {
    // SAFETY: hwnd is a valid window handle provided by the caller.
    let v = unsafe { GetDpiForWindow(hwnd) };
    if v == 0 {
        BASE_DPI
    } else {
        v
    }
}

/// Unpack WM_DPICHANGED: the new DPI (X and Y are always equal) and the
/// suggested window rectangle the window should move itself into.
pub(crate) fn unpack_dpi_changed(wparam: usize, lparam: isize) -> (u32, RECT) {
    let dpi = (wparam & 0xFFFF) as u32;
    // SAFETY: for WM_DPICHANGED the system guarantees lparam points at a RECT
    // valid for the duration of the message.
    let rect = unsafe { *(lparam as *const RECT) };
    (dpi, rect)
}
