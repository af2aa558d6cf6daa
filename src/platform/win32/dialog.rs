// ── Dialog controller ──────────────────────────────────────────────────────────
//
// Drives modal and modeless dialogs created from in-memory templates.  One
// shared dialog procedure recovers per-dialog state from GWLP_USERDATA and
// routes messages to caller-supplied callbacks:
//
//   on_message  — raw hook, first chance at every message (optional)
//   on_command  — WM_COMMAND (control id, notification code)
//   on_destroyed — runs at WM_NCDESTROY; modeless dialogs use it to remove
//                  themselves from the owner's open-dialog set and give
//                  focus back to the editor
//
// When dark mode is active the controller answers the WM_CTLCOLOR family
// from the palette and re-themes child controls, so individual dialogs never
// carry their own theming code.

#![allow(unsafe_code)]

use std::cell::Cell;
use std::rc::Rc;

use windows::{
    core::w,
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, WPARAM},
        Graphics::Gdi::{
            CreateSolidBrush, DeleteObject, InvalidateRect, SetBkColor, SetTextColor, HDC, HGDIOBJ,
        },
        UI::Controls::SetWindowTheme,
        UI::Input::KeyboardAndMouse::SetFocus,
        UI::WindowsAndMessaging::{
            CreateDialogIndirectParamW, DestroyWindow, DialogBoxIndirectParamW, EndDialog,
            GetDlgItem, GetWindowLongPtrW, GetWindowTextLengthW, GetWindowTextW, SendMessageW,
            SetWindowLongPtrW, SetWindowTextW, ShowWindow, BM_GETCHECK, BM_SETCHECK,
            DLGTEMPLATE, GWLP_USERDATA, SW_SHOW, WM_CLOSE, WM_COMMAND, WM_CTLCOLORBTN,
            WM_CTLCOLORDLG, WM_CTLCOLOREDIT, WM_CTLCOLORLISTBOX, WM_CTLCOLORSTATIC, WM_INITDIALOG,
            WM_NCDESTROY,
        },
    },
};

use super::{mainwin, wide};
use crate::error::Result;
use crate::platform::template::{ControlRole, DialogTemplate};
use crate::theme;

// ── Callbacks ──────────────────────────────────────────────────────────────────

/// WM_COMMAND callback: `(dialog, control id, notification code) -> handled`.
pub(crate) type CommandFn = Box<dyn Fn(HWND, u16, u16) -> bool>;

/// Raw message hook: returning `Some` short-circuits default handling.
pub(crate) type MessageFn = Box<dyn Fn(HWND, u32, usize, isize) -> Option<isize>>;

/// Teardown notification for modeless dialogs.
pub(crate) type DestroyedFn = Box<dyn Fn(HWND)>;

// ── Dialog description ─────────────────────────────────────────────────────────

/// Everything needed to run one dialog.  Consumed by `show_modal` /
/// `show_modeless`.
pub(crate) struct DialogConfig {
    pub(crate) template: DialogTemplate,
    pub(crate) dark: bool,
    pub(crate) on_command: CommandFn,
    pub(crate) on_message: Option<MessageFn>,
    pub(crate) on_destroyed: Option<DestroyedFn>,
}

struct DialogState {
    dark: Cell<bool>,
    modal: bool,
    roles: Vec<(i32, ControlRole)>,
    on_command: CommandFn,
    on_message: Option<MessageFn>,
    on_destroyed: Option<DestroyedFn>,
    // Raw HBRUSH values; created lazily for dark painting, deleted at
    // WM_NCDESTROY.
    bg_brush: Cell<isize>,
    control_brush: Cell<isize>,
}

/// Handle to a live modeless dialog.
pub(crate) struct Dialog {
    hwnd: HWND,
    state: Rc<DialogState>,
}

impl Dialog {
    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Re-theme a dialog that is open while the application theme flips.
    pub(crate) fn set_dark(&self, dark: bool) {
        self.state.dark.set(dark);
        apply_dark_fixups(self.hwnd, &self.state);
        // SAFETY: hwnd is live while this handle exists; full invalidation
        // repaints every control with the new palette.
        unsafe {
            let _ = InvalidateRect(Some(self.hwnd), None, true);
        }
    }
}

// ── Entry points ───────────────────────────────────────────────────────────────

/// Run a modal dialog to completion.  Returns the `EndDialog` result code.
pub(crate) fn show_modal(hinstance: HINSTANCE, owner: HWND, config: DialogConfig) -> isize {
    let (state, bytes) = make_state(config, true);
    let raw = Rc::into_raw(state);

    // SAFETY: bytes holds a well-formed DLGTEMPLATEEX blob that outlives the
    // call; raw is reclaimed by dlg_proc at WM_NCDESTROY, which is guaranteed
    // to run before DialogBoxIndirectParamW returns.
    unsafe {
        DialogBoxIndirectParamW(
            Some(hinstance),
            bytes.as_ptr() as *const DLGTEMPLATE,
            Some(owner),
            Some(dlg_proc),
            LPARAM(raw as isize),
        )
    }
}

/// Create and show a modeless dialog.  The caller keeps the returned handle
/// to route keyboard messages and re-theme; the dialog cleans its own state
/// up when it is destroyed.
pub(crate) fn show_modeless(
    hinstance: HINSTANCE,
    owner: HWND,
    config: DialogConfig,
) -> Result<Dialog> {
    let (state, bytes) = make_state(config, false);
    let raw = Rc::into_raw(Rc::clone(&state));

    // SAFETY: as in show_modal; for the modeless path WM_NCDESTROY arrives
    // whenever the dialog is closed or its owner is destroyed, reclaiming raw.
    let hwnd = unsafe {
        CreateDialogIndirectParamW(
            Some(hinstance),
            bytes.as_ptr() as *const DLGTEMPLATE,
            Some(owner),
            Some(dlg_proc),
            LPARAM(raw as isize),
        )
    }?;

    // SAFETY: hwnd was just created on this thread.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
    }
    Ok(Dialog { hwnd, state })
}

fn make_state(config: DialogConfig, modal: bool) -> (Rc<DialogState>, Vec<u8>) {
    let state = Rc::new(DialogState {
        dark: Cell::new(config.dark),
        modal,
        roles: config.template.roles.clone(),
        on_command: config.on_command,
        on_message: config.on_message,
        on_destroyed: config.on_destroyed,
        bg_brush: Cell::new(0),
        control_brush: Cell::new(0),
    });
    (state, config.template.bytes)
}

// ── Item helpers ───────────────────────────────────────────────────────────────

pub(crate) fn item_text(dialog: HWND, id: i32) -> String {
    // SAFETY: a missing item yields Err, mapped to the empty string; the
    // buffer is sized from GetWindowTextLengthW plus the terminator.
    unsafe {
        let Ok(item) = GetDlgItem(Some(dialog), id) else {
            return String::new();
        };
        let len = GetWindowTextLengthW(item);
        if len <= 0 {
            return String::new();
        }
        let mut buf = vec![0u16; len as usize + 1];
        let copied = GetWindowTextW(item, &mut buf);
        String::from_utf16_lossy(&buf[..copied.max(0) as usize])
    }
}

pub(crate) fn set_item_text(dialog: HWND, id: i32, text: &str) {
    let text_w = wide(text);
    // SAFETY: text_w outlives the call; failures on a missing item are moot.
    unsafe {
        if let Ok(item) = GetDlgItem(Some(dialog), id) {
            let _ = SetWindowTextW(item, windows::core::PCWSTR(text_w.as_ptr()));
        }
    }
}

pub(crate) fn is_checked(dialog: HWND, id: i32) -> bool {
    // SAFETY: BM_GETCHECK is side-effect free; missing items return 0.
    unsafe {
        GetDlgItem(Some(dialog), id)
            .map(|item| SendMessageW(item, BM_GETCHECK, None, None).0 == 1)
            .unwrap_or(false)
    }
}

pub(crate) fn set_checked(dialog: HWND, id: i32, checked: bool) {
    // SAFETY: BM_SETCHECK with 0/1 is always valid for button controls.
    unsafe {
        if let Ok(item) = GetDlgItem(Some(dialog), id) {
            SendMessageW(
                item,
                BM_SETCHECK,
                Some(WPARAM(usize::from(checked))),
                Some(LPARAM(0)),
            );
        }
    }
}

pub(crate) fn focus_item(dialog: HWND, id: i32) {
    // SAFETY: SetFocus with a valid child handle; failure is benign.
    unsafe {
        if let Ok(item) = GetDlgItem(Some(dialog), id) {
            let _ = SetFocus(Some(item));
        }
    }
}

/// End a modal dialog with the given result code.
pub(crate) fn end(dialog: HWND, code: isize) {
    // SAFETY: EndDialog on a non-dialog window fails harmlessly.
    unsafe {
        let _ = EndDialog(dialog, code);
    }
}

/// Close a modeless dialog programmatically (same path as its close button).
pub(crate) fn close(dialog: HWND) {
    // SAFETY: posting WM_CLOSE synchronously runs the controller's own close
    // handling for this dialog.
    unsafe {
        SendMessageW(dialog, WM_CLOSE, None, None);
    }
}

// ── Dark-mode fixups ───────────────────────────────────────────────────────────

/// Apply or remove per-control theming.  Runs at WM_INITDIALOG and again
/// whenever the theme flips while the dialog is open.
fn apply_dark_fixups(dialog: HWND, state: &DialogState) {
    let dark = state.dark.get();
    mainwin::apply_frame_dark_mode(dialog, dark);

    for &(id, role) in &state.roles {
        // SAFETY: ids come from the template this dialog was created from;
        // GetDlgItem fails only if a control was externally destroyed.
        unsafe {
            let Ok(item) = GetDlgItem(Some(dialog), id) else {
                continue;
            };
            match role {
                ControlRole::Edit | ControlRole::ListBox | ControlRole::ComboBox => {
                    let _ = if dark {
                        SetWindowTheme(item, w!("DarkMode_Explorer"), None)
                    } else {
                        SetWindowTheme(item, w!("Explorer"), None)
                    };
                }
                // Check boxes and group boxes only honor WM_CTLCOLOR colors
                // under classic rendering, so dark mode strips their theme.
                ControlRole::CheckBox | ControlRole::GroupBox => {
                    let _ = if dark {
                        SetWindowTheme(item, w!(""), w!(""))
                    } else {
                        SetWindowTheme(item, w!("Explorer"), None)
                    };
                }
                ControlRole::PushButton => {
                    let _ = if dark {
                        SetWindowTheme(item, w!("DarkMode_Explorer"), None)
                    } else {
                        SetWindowTheme(item, w!("Explorer"), None)
                    };
                }
                ControlRole::Label | ControlRole::Icon | ControlRole::ScrollBar => {}
            }
        }
    }
}

fn dark_brushes(state: &DialogState) -> (isize, isize) {
    if state.bg_brush.get() == 0 {
        // SAFETY: CreateSolidBrush only fails under GDI exhaustion, in which
        // case the zero value stands for "no brush" and default painting wins.
        unsafe {
            state
                .bg_brush
                .set(CreateSolidBrush(super::window::colorref(theme::DARK_BG)).0 as isize);
            state.control_brush.set(
                CreateSolidBrush(super::window::colorref(theme::DARK_CONTROL_BG)).0 as isize,
            );
        }
    }
    (state.bg_brush.get(), state.control_brush.get())
}

fn delete_brushes(state: &DialogState) {
    for cell in [&state.bg_brush, &state.control_brush] {
        let raw = cell.replace(0);
        if raw != 0 {
            // SAFETY: raw was produced by CreateSolidBrush in dark_brushes
            // and is deleted exactly once.
            unsafe {
                let _ = DeleteObject(HGDIOBJ(raw as *mut core::ffi::c_void));
            }
        }
    }
}

// ── Dialog procedure ───────────────────────────────────────────────────────────

// SAFETY: registered as the DLGPROC for dialogs created by this module.
// GWLP_USERDATA holds the raw Rc<DialogState> pointer from WM_INITDIALOG
// until WM_NCDESTROY reclaims it.
unsafe extern "system" fn dlg_proc(dialog: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> isize {
    if msg == WM_INITDIALOG {
        // SAFETY: lparam carries the Rc::into_raw pointer passed by
        // show_modal / show_modeless.
        unsafe {
            SetWindowLongPtrW(dialog, GWLP_USERDATA, lparam.0);
            let state = &*(lparam.0 as *const DialogState);
            apply_dark_fixups(dialog, state);
            if let Some(hook) = &state.on_message {
                let _ = hook(dialog, msg, wparam.0, lparam.0 as isize);
            }
        }
        return 1;
    }

    // SAFETY: the slot is either null (messages before WM_INITDIALOG or
    // after WM_NCDESTROY) or the pointer installed above.
    let raw = unsafe { GetWindowLongPtrW(dialog, GWLP_USERDATA) } as *const DialogState;
    if raw.is_null() {
        return 0;
    }
    // SAFETY: raw is valid per the invariant above; the reference does not
    // outlive this call (the Rc is reclaimed only in the WM_NCDESTROY arm,
    // after its last use).
    let state = unsafe { &*raw };

    if let Some(hook) = &state.on_message {
        if let Some(result) = hook(dialog, msg, wparam.0, lparam.0 as isize) {
            return result;
        }
    }

    match msg {
        WM_COMMAND => {
            let control = (wparam.0 & 0xFFFF) as u16;
            let code = (wparam.0 >> 16) as u16;
            isize::from((state.on_command)(dialog, control, code))
        }

        WM_CLOSE => {
            if state.modal {
                // SAFETY: dialog is the modal dialog being closed.
                unsafe {
                    let _ = EndDialog(dialog, 0);
                }
            } else {
                // SAFETY: destroying a modeless dialog triggers WM_NCDESTROY
                // below, which performs all cleanup.
                unsafe {
                    let _ = DestroyWindow(dialog);
                }
            }
            1
        }

        WM_CTLCOLORDLG | WM_CTLCOLORSTATIC | WM_CTLCOLORBTN if state.dark.get() => {
            let hdc = HDC(wparam.0 as *mut core::ffi::c_void);
            let (bg, _) = dark_brushes(state);
            // SAFETY: hdc is the control's paint DC supplied by the message.
            unsafe {
                SetTextColor(hdc, super::window::colorref(theme::DARK_TEXT));
                SetBkColor(hdc, super::window::colorref(theme::DARK_BG));
            }
            bg
        }

        WM_CTLCOLOREDIT | WM_CTLCOLORLISTBOX if state.dark.get() => {
            let hdc = HDC(wparam.0 as *mut core::ffi::c_void);
            let (_, control) = dark_brushes(state);
            // SAFETY: as above.
            unsafe {
                SetTextColor(hdc, super::window::colorref(theme::DARK_TEXT));
                SetBkColor(hdc, super::window::colorref(theme::DARK_CONTROL_BG));
            }
            control
        }

        WM_NCDESTROY => {
            delete_brushes(state);
            if let Some(on_destroyed) = &state.on_destroyed {
                on_destroyed(dialog);
            }
            // SAFETY: reclaim the Rc reference minted at creation; the slot
            // is zeroed first so no later message can reach the freed state.
            unsafe {
                SetWindowLongPtrW(dialog, GWLP_USERDATA, 0);
                drop(Rc::from_raw(raw));
            }
            1
        }

        _ => 0,
    }
}
