// ── Stock control wrappers ─────────────────────────────────────────────────────
//
// Typed wrappers over the two child controls the main window hosts: the
// multiline edit control and the status bar.  Both are built on `Window`, so
// theming and message interception go through the same router mechanism as
// the top-level window.

pub(crate) mod edit;
pub(crate) mod statusbar;
