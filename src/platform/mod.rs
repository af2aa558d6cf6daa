// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module defines the interface that the rest of the codebase uses to
// talk to the OS.  No `unsafe` lives at this level; all Win32 FFI is confined
// to the `win32` sub-module and never leaks outward.
//
// `router`, `template`, and `registry` are pure: they model the message
// dispatch chain, the binary dialog-template format, and the modeless-dialog
// set without touching any handle type, so their invariants are unit-tested
// on every host.  `win32` is the only target-gated module.

pub(crate) mod registry;
pub(crate) mod router;
pub(crate) mod template;

#[cfg(target_os = "windows")]
pub mod win32;
