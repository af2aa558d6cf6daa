// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Thin wrappers around the Win32 common-dialog APIs.  Each function returns
// `Some(value)` on user confirmation and `None` on cancel or error.
//
// Filter strings arrive from the string bundle as `|`-separated pairs
// ("Text Documents (*.txt)|*.txt|All Files|*.*") and are converted to the
// null-separated form the API expects.

#![allow(unsafe_code)]

use std::path::PathBuf;

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::HWND,
        Graphics::Gdi::LOGFONTW,
        UI::Controls::Dialogs::{
            ChooseFontW, GetOpenFileNameW, GetSaveFileNameW, CF_INITTOLOGFONTSTRUCT,
            CF_NOSCRIPTSEL, CF_SCREENFONTS, CHOOSEFONTW, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY,
            OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
        },
        UI::Shell::{DragFinish, DragQueryFileW, HDROP},
    },
};

use super::{from_wide, wide};
use crate::document::FontDesc;

// ── Buffer size ───────────────────────────────────────────────────────────────

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths; use 32 768 which
/// is the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

// ── Open dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Open File" dialog.
///
/// Returns the chosen path, or `None` if the user cancelled.
pub(crate) fn show_open_dialog(owner: HWND, title: &str, filter: &str) -> Option<PathBuf> {
    let mut buf = vec![0u16; PATH_BUF_LEN];
    let filter_w = filter_to_wide(filter);
    let title_w = wide(title);

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: owner,
        lpstrFilter: PCWSTR(filter_w.as_ptr()),
        lpstrFile: windows::core::PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        lpstrTitle: PCWSTR(title_w.as_ptr()),
        lpstrDefExt: w!("txt"),
        Flags: OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
        ..Default::default()
    };

    // SAFETY: `ofn` is fully initialised; `buf`, `filter_w` and `title_w`
    // outlive this call.  GetOpenFileNameW reads and writes only within the
    // buffers we provided.  The function is called on the UI thread (required
    // for modal dialogs).
    let ok = unsafe { GetOpenFileNameW(&mut ofn) };

    if ok.as_bool() {
        Some(path_from_buf(&buf))
    } else {
        None
    }
}

// ── Save dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Save As" dialog.
///
/// `default_name` pre-populates the filename field (pass an empty string or
/// the current filename).  Returns the chosen path, or `None` if cancelled.
pub(crate) fn show_save_dialog(
    owner: HWND,
    title: &str,
    filter: &str,
    default_name: &str,
) -> Option<PathBuf> {
    let mut buf: Vec<u16> = default_name
        .encode_utf16()
        .chain(std::iter::repeat(0))
        .take(PATH_BUF_LEN)
        .collect();

    let filter_w = filter_to_wide(filter);
    let title_w = wide(title);

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: owner,
        lpstrFilter: PCWSTR(filter_w.as_ptr()),
        lpstrFile: windows::core::PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        lpstrTitle: PCWSTR(title_w.as_ptr()),
        lpstrDefExt: w!("txt"),
        Flags: OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST,
        ..Default::default()
    };

    // SAFETY: same invariants as show_open_dialog above.
    let ok = unsafe { GetSaveFileNameW(&mut ofn) };

    if ok.as_bool() {
        Some(path_from_buf(&buf))
    } else {
        None
    }
}

// ── Font dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Font" dialog, pre-selecting the current editor font.
///
/// Returns the chosen font description, or `None` if cancelled.
pub(crate) fn show_font_dialog(owner: HWND, current: &FontDesc, dpi: u32) -> Option<FontDesc> {
    let mut lf = LOGFONTW {
        lfHeight: -((current.size * dpi) as i32 / 72),
        lfWeight: current.weight as i32,
        lfItalic: u8::from(current.italic),
        ..Default::default()
    };
    for (dst, src) in lf.lfFaceName.iter_mut().zip(current.face.encode_utf16()) {
        *dst = src;
    }

    let mut cf = CHOOSEFONTW {
        lStructSize: std::mem::size_of::<CHOOSEFONTW>() as u32,
        hwndOwner: owner,
        lpLogFont: &mut lf,
        Flags: CF_INITTOLOGFONTSTRUCT | CF_NOSCRIPTSEL | CF_SCREENFONTS,
        ..Default::default()
    };

    // SAFETY: `cf` points at `lf`, which stays alive for the whole call; the
    // dialog fills both structures in place before returning.
    let ok = unsafe { ChooseFontW(&mut cf) };
    if !ok.as_bool() {
        return None;
    }

    let face_len = lf
        .lfFaceName
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(lf.lfFaceName.len());
    Some(FontDesc {
        face: String::from_utf16_lossy(&lf.lfFaceName[..face_len]),
        // iPointSize reports tenths of a point.
        size: (cf.iPointSize as u32 / 10).max(1),
        weight: lf.lfWeight.max(0) as u32,
        italic: lf.lfItalic != 0,
    })
}

// ── Drag and drop ─────────────────────────────────────────────────────────────

/// Extract the first dropped file from a WM_DROPFILES message and release
/// the drop handle.
pub(crate) fn dropped_file(wparam: usize) -> Option<PathBuf> {
    let hdrop = HDROP(wparam as *mut std::ffi::c_void);
    let mut buf = vec![0u16; PATH_BUF_LEN];
    // SAFETY: wparam is the HDROP of the message being handled; the handle
    // is released exactly once via DragFinish.
    let len = unsafe {
        let len = DragQueryFileW(hdrop, 0, Some(&mut buf));
        DragFinish(hdrop);
        len
    };
    if len == 0 {
        return None;
    }
    Some(PathBuf::from(from_wide(&buf)))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Convert a null-terminated UTF-16 buffer to a `PathBuf`.
fn path_from_buf(buf: &[u16]) -> PathBuf {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    PathBuf::from(String::from_utf16_lossy(&buf[..len]).as_ref())
}

/// Convert a `|`-separated filter description to the double-null-terminated
/// form `OPENFILENAMEW` expects.
fn filter_to_wide(filter: &str) -> Vec<u16> {
    let mut out: Vec<u16> = filter
        .split('|')
        .flat_map(|part| part.encode_utf16().chain(std::iter::once(0)))
        .collect();
    out.push(0);
    out
}
