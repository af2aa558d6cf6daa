// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Quill return `error::Result<T>`.  No panics
// in production paths; errors surface either as user-facing dialogs (see
// `app::run`) or as transient status-bar messages (failed save).

/// Every error that Quill can produce.
#[derive(Debug)]
pub enum QuillError {
    /// A Win32 API call returned a failure code.
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (file open, read, write, …).
    Io(std::io::Error),

    /// A resource bundle or settings file failed to parse.
    Json(serde_json::Error),
}

impl std::fmt::Display for QuillError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win32 { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for QuillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Win32 { .. } => None,
        }
    }
}

impl From<std::io::Error> for QuillError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

// Convert a windows-crate error (HRESULT) directly into a QuillError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for QuillError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        // Win32 errors appear as 0x8007xxxx HRESULTs.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QuillError>;
