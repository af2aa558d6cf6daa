// ── Window wrapper ─────────────────────────────────────────────────────────────
//
// Wraps an HWND together with a message router.  The first callback
// registration installs a subclass procedure (via GWLP_WNDPROC) that consults
// the router for every message; messages no callback claims fall through to
// the window's original procedure, so wrapped stock controls keep their
// native behavior.
//
// Per-window subclass state lives in a heap box referenced from
// GWLP_USERDATA.  `destroy()` restores the original procedure before tearing
// the window down; if the window is destroyed externally instead, the
// subclass procedure performs the same cleanup when WM_NCDESTROY arrives.

#![allow(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{
            CreateFontW, CreateSolidBrush, DeleteObject, FillRect, SetBkColor, SetTextColor,
            CLIP_DEFAULT_PRECIS, CLEARTYPE_QUALITY, DEFAULT_CHARSET, FF_DONTCARE, HDC, HFONT,
            HGDIOBJ, OUT_DEFAULT_PRECIS,
        },
        UI::Controls::SetWindowTheme,
        UI::Input::KeyboardAndMouse::{SetActiveWindow, SetFocus},
        UI::WindowsAndMessaging::{
            CallWindowProcW, CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect,
            GetWindowLongPtrW, GetWindowTextLengthW, GetWindowTextW, LoadCursorW, LoadIconW,
            MoveWindow, RegisterClassExW, SendMessageW, SetWindowLongPtrW, SetWindowTextW,
            ShowWindow,
            CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, GWLP_WNDPROC, GWL_EXSTYLE, GWL_STYLE, HMENU,
            IDC_ARROW, IDI_APPLICATION, SW_HIDE, SW_SHOW, WINDOW_EX_STYLE, WINDOW_STYLE,
            WM_NCDESTROY, WM_SETFONT, WNDCLASSEXW, WNDPROC,
        },
    },
};

use super::{last_error, wide};
use crate::error::Result;
use crate::platform::router::{Handler, MessageRouter, MsgArgs, Token};

// ── Subclass state ─────────────────────────────────────────────────────────────

/// Heap state referenced from GWLP_USERDATA while a window is subclassed.
struct SubclassState {
    /// Raw pointer value of the window procedure replaced by the subclass.
    old_proc: isize,
    router: Rc<RefCell<MessageRouter>>,
}

// ── Window ─────────────────────────────────────────────────────────────────────

/// A wrapped HWND with an ordered per-message callback chain.
///
/// Cloning shares the router and subclass bookkeeping; all clones refer to
/// the same underlying window.
#[derive(Clone)]
pub(crate) struct Window {
    hwnd: HWND,
    router: Rc<RefCell<MessageRouter>>,
    subclassed: Rc<Cell<bool>>,
}

impl Window {
    /// Register a window class with a pass-through procedure.
    ///
    /// All application behavior is attached afterwards through `register`,
    /// so the class procedure only needs default handling.
    pub(crate) fn register_class(hinstance: HINSTANCE, class_name: PCWSTR) -> Result<()> {
        // SAFETY: IDI_APPLICATION and IDC_ARROW are built-in resources that
        // exist on every Windows version; the loads cannot dangle.
        let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }?;
        let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;

        let wndclass = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(pass_through_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: hinstance,
            hIcon: icon,
            hCursor: cursor,
            hbrBackground: Default::default(),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: class_name,
            hIconSm: icon,
        };

        // SAFETY: wndclass is fully initialised with valid handles and the
        // class name is a null-terminated UTF-16 literal.
        let atom = unsafe { RegisterClassExW(&wndclass) };
        if atom == 0 {
            return Err(last_error("RegisterClassExW"));
        }
        Ok(())
    }

    /// Create a window of a previously registered class and wrap it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create(
        hinstance: HINSTANCE,
        class_name: PCWSTR,
        title: &str,
        style: WINDOW_STYLE,
        exstyle: WINDOW_EX_STYLE,
        rect: (i32, i32, i32, i32),
        parent: Option<HWND>,
        hmenu: Option<HMENU>,
    ) -> Result<Window> {
        let title_w = wide(title);
        // SAFETY: class_name was registered (or names a stock control class);
        // title_w outlives the call; parent/menu handles are valid or None.
        let hwnd = unsafe {
            CreateWindowExW(
                exstyle,
                class_name,
                PCWSTR(title_w.as_ptr()),
                style,
                rect.0,
                rect.1,
                rect.2,
                rect.3,
                parent,
                hmenu,
                Some(hinstance),
                None,
            )
        }?;

        Ok(Self::wrap(hwnd))
    }

    /// Wrap an existing HWND without taking ownership of its lifetime.
    pub(crate) fn wrap(hwnd: HWND) -> Window {
        Window {
            hwnd,
            router: Rc::new(RefCell::new(MessageRouter::new())),
            subclassed: Rc::new(Cell::new(false)),
        }
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Append a callback to the chain for `msg`.  The first registration
    /// installs the subclass procedure; later ones only extend the chain.
    pub(crate) fn register(&self, msg: u32, handler: Handler) -> Token {
        self.ensure_subclassed();
        self.router.borrow_mut().register(msg, handler)
    }

    /// Remove one callback (`Some(token)`) or the whole chain (`None`).
    /// Unknown tokens and messages are ignored.
    pub(crate) fn unregister(&self, msg: u32, token: Option<Token>) {
        self.router.borrow_mut().unregister(msg, token);
    }

    fn ensure_subclassed(&self) {
        if self.subclassed.get() {
            return;
        }
        let state = Box::new(SubclassState {
            old_proc: 0,
            router: Rc::clone(&self.router),
        });
        let ptr = Box::into_raw(state);

        // SAFETY: hwnd is a live window owned by this thread.  The boxed
        // state is parked in GWLP_USERDATA before the procedure swap so the
        // subclass procedure never observes a null state; ownership of the
        // box transfers to the window and is reclaimed at WM_NCDESTROY or in
        // `destroy()`.
        unsafe {
            SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, ptr as isize);
            let prev = SetWindowLongPtrW(self.hwnd, GWLP_WNDPROC, subclass_proc as usize as isize);
            (*ptr).old_proc = prev;
        }
        self.subclassed.set(true);
    }

    /// Restore the original window procedure (if subclassed) and destroy the
    /// window.  Safe to call on an already-destroyed window only if the
    /// subclass cleanup already ran.
    pub(crate) fn destroy(&self) -> Result<()> {
        // SAFETY: the GWLP_USERDATA box was installed by `ensure_subclassed`
        // on this same window and has not been freed: WM_NCDESTROY (the only
        // other free site) zeroes the slot first, and we re-check for null.
        unsafe {
            if self.subclassed.get() {
                let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *mut SubclassState;
                if !ptr.is_null() {
                    SetWindowLongPtrW(self.hwnd, GWLP_WNDPROC, (*ptr).old_proc);
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                    drop(Box::from_raw(ptr));
                }
                self.subclassed.set(false);
            }
            DestroyWindow(self.hwnd)?;
        }
        Ok(())
    }

    // ── Small message helpers ──────────────────────────────────────────────────

    pub(crate) fn send(&self, msg: u32, wparam: usize, lparam: isize) -> isize {
        // SAFETY: SendMessageW on a window owned by the calling thread is a
        // plain synchronous call; the handle may be stale after destruction,
        // in which case the call is a no-op returning 0.
        unsafe { SendMessageW(self.hwnd, msg, Some(WPARAM(wparam)), Some(LPARAM(lparam))) }.0
    }

    pub(crate) fn show(&self) {
        // SAFETY: valid handle; previous visibility state is irrelevant.
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
        }
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        // SAFETY: as in show.
        unsafe {
            let _ = ShowWindow(self.hwnd, if visible { SW_SHOW } else { SW_HIDE });
        }
    }

    pub(crate) fn set_text(&self, text: &str) -> Result<()> {
        let text_w = wide(text);
        // SAFETY: text_w outlives the call.
        unsafe { SetWindowTextW(self.hwnd, PCWSTR(text_w.as_ptr())) }?;
        Ok(())
    }

    pub(crate) fn text(&self) -> String {
        // SAFETY: the buffer is sized from GetWindowTextLengthW plus the
        // terminator; GetWindowTextW never writes past it.
        unsafe {
            let len = GetWindowTextLengthW(self.hwnd);
            if len <= 0 {
                return String::new();
            }
            let mut buf = vec![0u16; len as usize + 1];
            let copied = GetWindowTextW(self.hwnd, &mut buf);
            String::from_utf16_lossy(&buf[..copied.max(0) as usize])
        }
    }

    /// UTF-16 code units of the window text, without a terminator.  The
    /// search module operates on this representation because it shares the
    /// edit control's selection index space.
    pub(crate) fn text_utf16(&self) -> Vec<u16> {
        self.text().encode_utf16().collect()
    }

    /// Move and resize in one call (child-window layout).
    pub(crate) fn set_bounds(&self, x: i32, y: i32, w: i32, h: i32) {
        // SAFETY: MoveWindow on a live window; repaint requested.
        unsafe {
            let _ = MoveWindow(self.hwnd, x, y, w, h, true);
        }
    }

    pub(crate) fn client_rect(&self) -> RECT {
        let mut rc = RECT::default();
        // SAFETY: &mut rc is a valid out-pointer; failure leaves the zeroed
        // default, which callers treat as an empty rectangle.
        unsafe {
            let _ = GetClientRect(self.hwnd, &mut rc);
        }
        rc
    }

    pub(crate) fn style(&self) -> u32 {
        // SAFETY: GWL_STYLE is always a valid index on a live window.
        unsafe { GetWindowLongPtrW(self.hwnd, GWL_STYLE) as u32 }
    }

    pub(crate) fn exstyle(&self) -> u32 {
        // SAFETY: as above for GWL_EXSTYLE.
        unsafe { GetWindowLongPtrW(self.hwnd, GWL_EXSTYLE) as u32 }
    }

    pub(crate) fn set_styles(&self, style: u32, exstyle: u32) {
        // SAFETY: frame changes only take effect after the caller issues
        // SetWindowPos with SWP_FRAMECHANGED; writing the words is safe.
        unsafe {
            SetWindowLongPtrW(self.hwnd, GWL_STYLE, style as isize);
            SetWindowLongPtrW(self.hwnd, GWL_EXSTYLE, exstyle as isize);
        }
    }

    /// Switch the visual-styles theme of the window between the light and
    /// dark Explorer variants.
    pub(crate) fn apply_explorer_theme(&self, dark: bool) {
        // SAFETY: hwnd is live; the theme names are static literals.
        unsafe {
            let _ = if dark {
                SetWindowTheme(self.hwnd, w!("DarkMode_Explorer"), None)
            } else {
                SetWindowTheme(self.hwnd, w!("Explorer"), None)
            };
        }
    }

    pub(crate) fn set_font(&self, font: HFONT) {
        // SAFETY: font is a valid HFONT owned by the caller, who must keep
        // it alive while the window uses it.
        unsafe {
            SendMessageW(
                self.hwnd,
                WM_SETFONT,
                Some(WPARAM(font.0 as usize)),
                Some(LPARAM(1)),
            );
        }
    }

    pub(crate) fn focus(&self) {
        // SAFETY: SetFocus tolerates a destroyed window (it fails and we
        // discard the result).
        unsafe {
            let _ = SetFocus(Some(self.hwnd));
        }
    }

    pub(crate) fn activate(&self) {
        // SAFETY: as for focus().
        unsafe {
            let _ = SetActiveWindow(self.hwnd);
        }
    }

    /// Fill the client area with a solid color. `hdc_raw` is the WPARAM of a
    /// WM_ERASEBKGND message.
    pub(crate) fn erase_background(&self, hdc_raw: usize, rgb: u32) {
        let hdc = HDC(hdc_raw as *mut std::ffi::c_void);
        let rc = self.client_rect();
        // SAFETY: the DC is valid for the duration of WM_ERASEBKGND; the
        // brush is created and destroyed within the call.
        unsafe {
            let brush = CreateSolidBrush(colorref(rgb));
            FillRect(hdc, &rc, brush);
            let _ = DeleteObject(brush.into());
        }
    }
}

// ── Font creation ──────────────────────────────────────────────────────────────

/// Create a GDI font scaled for the given DPI and zoom percentage.
///
/// The caller owns the returned handle and must `DeleteObject` it once no
/// window references it anymore.
pub(crate) fn create_font(
    face: &str,
    point_size: u32,
    weight: u32,
    italic: bool,
    dpi: u32,
    zoom_pct: u32,
) -> Result<HFONT> {
    let face_w = wide(face);
    let height = -((point_size * zoom_pct * dpi) as i32 / (72 * 100));

    // SAFETY: face_w outlives the call; CreateFontW copies all inputs.
    let font = unsafe {
        CreateFontW(
            height,
            0,
            0,
            0,
            weight as i32,
            u32::from(italic),
            0,
            0,
            DEFAULT_CHARSET,
            OUT_DEFAULT_PRECIS,
            CLIP_DEFAULT_PRECIS,
            CLEARTYPE_QUALITY,
            FF_DONTCARE.0 as u32,
            PCWSTR(face_w.as_ptr()),
        )
    };
    if font.is_invalid() {
        return Err(last_error("CreateFontW"));
    }
    Ok(font)
}

/// Pack a COLORREF from the theme palette.
pub(crate) fn colorref(rgb: u32) -> COLORREF {
    COLORREF(rgb)
}

/// Create a solid brush, returned as a raw handle value so non-platform code
/// can hold it without touching GDI types. Pair with [`delete_brush`].
pub(crate) fn create_brush(rgb: u32) -> isize {
    // SAFETY: CreateSolidBrush has no preconditions; a null return maps to 0.
    unsafe { CreateSolidBrush(colorref(rgb)).0 as isize }
}

pub(crate) fn delete_brush(raw: isize) {
    if raw == 0 {
        return;
    }
    // SAFETY: raw came from create_brush and is deleted exactly once.
    unsafe {
        let _ = DeleteObject(HGDIOBJ(raw as *mut std::ffi::c_void));
    }
}

pub(crate) fn delete_font(font: HFONT) {
    // SAFETY: the caller owns the font and no window is using it anymore.
    unsafe {
        let _ = DeleteObject(font.into());
    }
}

/// Answer a WM_CTLCOLOR* message: set the text and background colors on the
/// control's DC and return the background brush for the frame fill.
pub(crate) fn answer_ctl_color(hdc_raw: usize, text: u32, background: u32, brush: isize) -> isize {
    let hdc = HDC(hdc_raw as *mut std::ffi::c_void);
    // SAFETY: the DC in WPARAM is valid while the message is being handled.
    unsafe {
        SetTextColor(hdc, colorref(text));
        SetBkColor(hdc, colorref(background));
    }
    brush
}

// ── Procedures ─────────────────────────────────────────────────────────────────

// SAFETY: registered as lpfnWndProc; Windows guarantees valid parameters for
// the duration of the call.
unsafe extern "system" fn pass_through_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    // SAFETY: forwarding the exact parameters Windows handed us.
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

// SAFETY: installed via GWLP_WNDPROC by `ensure_subclassed`, which parks the
// SubclassState box in GWLP_USERDATA first.  Windows guarantees the message
// parameters are valid for the duration of the call.
unsafe extern "system" fn subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    // SAFETY: GWLP_USERDATA holds either null or the SubclassState pointer
    // installed for this window; both free sites zero the slot first.
    let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *mut SubclassState;
    if ptr.is_null() {
        // SAFETY: plain default handling for a window whose state is gone.
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }
    // SAFETY: ptr is valid per the invariant above and the reference does not
    // outlive this call.
    let state = unsafe { &*ptr };

    let args = MsgArgs {
        hwnd: hwnd.0 as isize,
        msg,
        wparam: wparam.0,
        lparam: lparam.0,
    };

    // Snapshot the chain so callbacks may register or unregister during
    // dispatch; a failed borrow means we are re-entered mid-mutation and
    // must fall through to the original procedure.
    let chain = match state.router.try_borrow() {
        Ok(router) => router.chain(msg),
        Err(_) => Vec::new(),
    };

    let mut claimed = None;
    for handler in &chain {
        if let Some(result) = handler(&args) {
            claimed = Some(result);
            break;
        }
    }

    let old_proc = state.old_proc;

    if msg == WM_NCDESTROY {
        // Final message: restore the original procedure and reclaim the
        // state box, covering windows destroyed without `destroy()`.
        // SAFETY: this is the only remaining owner of ptr; the slot is
        // zeroed so no later message can observe the freed box.
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_WNDPROC, old_proc);
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            drop(Box::from_raw(ptr));
        }
    }

    if let Some(result) = claimed {
        if msg != WM_NCDESTROY {
            return LRESULT(result);
        }
        // WM_NCDESTROY always reaches the original procedure so the native
        // class can run its own teardown.
    }

    // SAFETY: old_proc is the procedure this subclass replaced; transmuting
    // the stored pointer value back to WNDPROC (null becomes None) matches
    // how Windows itself round-trips procedure pointers.
    let prev: WNDPROC = unsafe { std::mem::transmute::<isize, WNDPROC>(old_proc) };
    // SAFETY: CallWindowProcW handles a None procedure by using default
    // processing; parameters are forwarded untouched.
    unsafe { CallWindowProcW(prev, hwnd, msg, wparam, lparam) }
}
