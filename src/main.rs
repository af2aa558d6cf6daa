// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 FFI).
// Each unsafe block there MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]
// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that tracing output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(target_os = "windows")]
mod app;
mod document;
mod error;
mod logging;
mod platform;
mod resources;
mod search;
mod session;
mod theme;

fn main() {
    logging::init();

    #[cfg(target_os = "windows")]
    if let Err(e) = app::run() {
        tracing::error!(error = %e, "fatal");
        // Startup failed before or during the message loop.
        // A modal error dialog is the only reliable output path in a GUI app.
        platform::win32::mainwin::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }

    #[cfg(not(target_os = "windows"))]
    {
        eprintln!("quill: the editor UI requires Windows; only the library tests run elsewhere");
        std::process::exit(1);
    }
}
