// ── Win32 platform implementation ─────────────────────────────────────────────
//
// This is the only module in the codebase where `unsafe` code is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

use windows::Win32::{
    Foundation::{GetLastError, HGLOBAL, HWND},
    Globalization::GetUserDefaultLocaleName,
    System::DataExchange::{CloseClipboard, GetClipboardData, OpenClipboard},
    System::Memory::{GlobalLock, GlobalUnlock},
    System::SystemInformation::GetLocalTime,
    UI::Input::KeyboardAndMouse::GetKeyState,
};

use crate::error::QuillError;

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub(crate) mod controls; // edit and status-bar wrappers
pub(crate) mod dialog; // modal/modeless dialog controller
pub(crate) mod dialogs; // common open/save/font dialogs
pub(crate) mod dpi; // per-monitor DPI helpers
pub(crate) mod mainwin; // top-level window and message loop
pub(crate) mod menu; // menu bar and accelerator table
pub(crate) mod window; // window wrapper with message subclassing

// ── Shared helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `QuillError`.
///
/// Call immediately after a Win32 function that signals failure — `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
pub(crate) fn last_error(function: &'static str) -> QuillError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    QuillError::Win32 {
        function,
        code: code.0,
    }
}

/// Convert a Rust string to a null-terminated UTF-16 buffer.
///
/// The buffer must stay alive for the duration of any Win32 call that
/// receives a pointer into it.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Decode a null-terminated UTF-16 buffer, stopping at the first NUL.
pub(crate) fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Decode the null-terminated UTF-16 string an `LPARAM` points at.
///
/// Some broadcast messages (`WM_SETTINGCHANGE`) carry a string this way; a
/// null `LPARAM` decodes to the empty string. Reads are capped so a missing
/// terminator cannot run away.
pub(crate) fn lparam_wide_string(lparam: isize) -> String {
    if lparam == 0 {
        return String::new();
    }
    let ptr = lparam as *const u16;
    let mut len = 0usize;
    // SAFETY: the sender guarantees a null-terminated UTF-16 string for the
    // lifetime of the message; 256 units bounds the scan.
    while len < 256 && unsafe { *ptr.add(len) } != 0 {
        len += 1;
    }
    // SAFETY: len code units were just verified readable.
    String::from_utf16_lossy(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// True while the given virtual key is held down.
pub(crate) fn key_down(vk: i32) -> bool {
    // SAFETY: GetKeyState reads the calling thread's input state and has no
    // failure mode.
    unsafe { (GetKeyState(vk) as u16 & 0x8000) != 0 }
}

/// Read `CF_UNICODETEXT` from the clipboard, or `None` when it holds no text.
pub(crate) fn clipboard_text(owner: HWND) -> Option<String> {
    const CF_UNICODETEXT: u32 = 13;
    // SAFETY: the clipboard is opened and closed on the same thread, and the
    // global handle returned by GetClipboardData stays owned by the clipboard;
    // we only lock it long enough to copy the text out.
    unsafe {
        OpenClipboard(Some(owner)).ok()?;
        let text = GetClipboardData(CF_UNICODETEXT).ok().and_then(|handle| {
            let hglobal = HGLOBAL(handle.0);
            let ptr = GlobalLock(hglobal) as *const u16;
            if ptr.is_null() {
                return None;
            }
            let mut len = 0usize;
            while *ptr.add(len) != 0 {
                len += 1;
            }
            let copied = String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len));
            let _ = GlobalUnlock(hglobal);
            Some(copied)
        });
        let _ = CloseClipboard();
        text
    }
}

/// The user's default locale as a BCP-47 tag, falling back to `en-US`.
pub(crate) fn user_locale() -> String {
    // LOCALE_NAME_MAX_LENGTH
    let mut buf = [0u16; 85];
    // SAFETY: the buffer is sized per the documented maximum locale name.
    let len = unsafe { GetUserDefaultLocaleName(&mut buf) };
    if len <= 0 {
        return crate::resources::FALLBACK_LANG.to_owned();
    }
    from_wide(&buf)
}

/// Local wall-clock time formatted for the time/date insertion command.
pub(crate) fn local_timestamp() -> String {
    // SAFETY: GetLocalTime fills and returns a SYSTEMTIME; it cannot fail.
    let st = unsafe { GetLocalTime() };
    format!(
        "{:02}:{:02} {:02}.{:02}.{}",
        st.wHour, st.wMinute, st.wDay, st.wMonth, st.wYear
    )
}
