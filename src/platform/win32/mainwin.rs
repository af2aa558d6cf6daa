// ── Main window ────────────────────────────────────────────────────────────────
//
// Owns the top-level window, the menu bar and accelerator table, the open
// modeless dialogs, and the message loop.  The loop gives each modeless
// dialog first pick of keyboard messages (IsDialogMessageW), then runs
// accelerator translation, then regular dispatch; a cooperative `die` flag
// ends the loop without relying on WM_QUIT ordering.
//
// Dark-mode support has three layers:
//   • DWM title-bar attribute plus the per-window uxtheme ordinal calls,
//   • undocumented UAH messages for painting the menu bar strip,
//   • a 1-px non-client repaint below the bar after WM_NCPAINT/WM_NCACTIVATE.

#![allow(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::OnceLock;

use tracing::debug;
use windows::{
    core::{w, PCSTR, PCWSTR},
    Win32::{
        Foundation::{HINSTANCE, HMODULE, HWND, LPARAM, POINT, RECT, WPARAM},
        Graphics::Dwm::{DwmSetWindowAttribute, DWMWINDOWATTRIBUTE},
        Graphics::Gdi::{
            CreateFontW, CreateSolidBrush, DeleteObject, DrawTextW, FillRect, GetWindowDC,
            MapWindowPoints, OffsetRect, ReleaseDC, SetBkMode, SetTextColor, CLIP_DEFAULT_PRECIS,
            CLEARTYPE_QUALITY, DEFAULT_CHARSET, DT_CENTER, DT_HIDEPREFIX, DT_SINGLELINE,
            DT_VCENTER, FF_DONTCARE, HDC, OUT_DEFAULT_PRECIS, TRANSPARENT,
        },
        System::LibraryLoader::{GetModuleHandleW, GetProcAddress, LoadLibraryW},
        UI::Controls::{InitCommonControlsEx, ICC_BAR_CLASSES, INITCOMMONCONTROLSEX},
        UI::Shell::{
            DragAcceptFiles, SHGetStockIconInfo, SHGSI_ICON, SHSTOCKICONID, SHSTOCKICONINFO,
            SIID_ERROR, SIID_HELP, SIID_INFO, SIID_WARNING,
        },
        UI::WindowsAndMessaging::{
            DestroyIcon, DispatchMessageW, DrawMenuBar, GetClientRect, GetMenuBarInfo,
            GetMenuItemInfoW, GetMessageW, GetWindowRect, IsDialogMessageW, KillTimer,
            MessageBoxW, PostMessageW, SendMessageW, SetMenu, SetTimer, TranslateAcceleratorW,
            TranslateMessage, CW_USEDEFAULT, DRAWITEMSTRUCT, HACCEL, HMENU, MB_ICONERROR, MB_OK,
            MENUBARINFO, MENUITEMINFOW, MIIM_STRING, MSG, OBJECT_IDENTIFIER, ODS_HOTLIGHT,
            ODS_NOACCEL, ODS_SELECTED, WM_CTLCOLORSTATIC, WM_ERASEBKGND, WM_INITDIALOG,
            WM_NCACTIVATE, WM_NCPAINT, WM_NULL, WM_SETFONT, WM_TIMER, WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::dialog::{self, DialogConfig};
use super::menu;
use super::window::{colorref, Window};
use super::{last_error, wide};
use crate::error::Result;
use crate::platform::registry::DialogSet;
use crate::platform::router::Token;
use crate::platform::template::{Caption, TemplateBuilder, DIALOG_EXSTYLE, DIALOG_STYLE};
use crate::resources::{CtrlClass, MenuNode};
use crate::theme;

// ── Identity ───────────────────────────────────────────────────────────────────

const CLASS_NAME: PCWSTR = w!("QuillMainWindow");

const DEFAULT_WIDTH: i32 = 900;
const DEFAULT_HEIGHT: i32 = 620;

// ── Undocumented menu-bar painting messages ────────────────────────────────────

const WM_UAHDRAWMENU: u32 = 0x0091;
const WM_UAHDRAWMENUITEM: u32 = 0x0092;

/// Win32 `OBJID_MENU` (avoids pulling in `Win32_UI_Accessibility`).
const OBJID_MENU_BAR: i32 = -3;

/// Mirrors the undocumented `UAHMENU` structure Windows passes via `lParam`.
#[repr(C)]
struct UahMenu {
    hmenu: HMENU,
    hdc: HDC,
    _dw_flags: u32,
}

/// Mirrors the undocumented `UAHMENUITEM` that follows the `UAHMENU` inside
/// the `UAHDRAWMENUITEM` blob.
#[repr(C)]
struct UahMenuItem {
    i_position: i32,
    _dw_flags: u32,
}

/// Full `lParam` payload for `WM_UAHDRAWMENUITEM`.
#[repr(C)]
struct UahDrawMenuItem {
    dis: DRAWITEMSTRUCT,
    um: UahMenu,
    umi: UahMenuItem,
}

// ── uxtheme ordinals ───────────────────────────────────────────────────────────

const UXTHEME_ORD_REFRESH_IMMERSIVE_COLOR_POLICY_STATE: usize = 104;
const UXTHEME_ORD_SHOULD_APPS_USE_DARK_MODE: usize = 132;
const UXTHEME_ORD_ALLOW_DARK_MODE_FOR_WINDOW: usize = 133;
const UXTHEME_ORD_SET_PREFERRED_APP_MODE: usize = 135;
const UXTHEME_ORD_FLUSH_MENU_THEMES: usize = 136;

#[repr(i32)]
#[derive(Clone, Copy)]
enum PreferredAppMode {
    AllowDark = 1,
}

type SetPreferredAppModeFn = unsafe extern "system" fn(PreferredAppMode) -> PreferredAppMode;
type ShouldAppsUseDarkModeFn = unsafe extern "system" fn() -> bool;
type FlushMenuThemesFn = unsafe extern "system" fn();
type RefreshImmersiveColorPolicyStateFn = unsafe extern "system" fn();
type AllowDarkModeForWindowFn =
    unsafe extern "system" fn(HWND, windows::core::BOOL) -> windows::core::BOOL;

fn uxtheme_proc(module: HMODULE, ordinal: usize) -> Option<*const c_void> {
    // SAFETY: loading by ordinal is how these unexported entry points are
    // documented to be reached; a missing ordinal yields None.
    unsafe { GetProcAddress(module, PCSTR(ordinal as *const u8)) }.map(|f| f as *const c_void)
}

/// Process-level dark-mode opt-in.  Must run before any window is created so
/// Windows renders dark title bars, menus, and scrollbars for this process.
pub(crate) fn init_app_dark_mode() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        // SAFETY: uxtheme.dll ships with every supported Windows version;
        // each transmute matches the documented unofficial signature for
        // that ordinal, and missing ordinals are skipped.
        unsafe {
            let Ok(module) = LoadLibraryW(w!("uxtheme.dll")) else {
                debug!("uxtheme.dll unavailable; dark mode will be partial");
                return;
            };
            if let Some(ptr) = uxtheme_proc(module, UXTHEME_ORD_SET_PREFERRED_APP_MODE) {
                let set_preferred: SetPreferredAppModeFn = std::mem::transmute(ptr);
                let _ = set_preferred(PreferredAppMode::AllowDark);
            }
            if let Some(ptr) =
                uxtheme_proc(module, UXTHEME_ORD_REFRESH_IMMERSIVE_COLOR_POLICY_STATE)
            {
                let refresh: RefreshImmersiveColorPolicyStateFn = std::mem::transmute(ptr);
                refresh();
            }
            if let Some(ptr) = uxtheme_proc(module, UXTHEME_ORD_FLUSH_MENU_THEMES) {
                let flush: FlushMenuThemesFn = std::mem::transmute(ptr);
                flush();
            }
        }
    });
}

/// Whether the user's Windows theme prefers dark apps. Falls back to light
/// when the ordinal is unavailable.
pub(crate) fn system_prefers_dark() -> bool {
    static SHOULD: OnceLock<Option<ShouldAppsUseDarkModeFn>> = OnceLock::new();
    let should = SHOULD.get_or_init(|| {
        // SAFETY: as in init_app_dark_mode.
        unsafe {
            let module = LoadLibraryW(w!("uxtheme.dll")).ok()?;
            uxtheme_proc(module, UXTHEME_ORD_SHOULD_APPS_USE_DARK_MODE)
                .map(|ptr| std::mem::transmute::<*const c_void, ShouldAppsUseDarkModeFn>(ptr))
        }
    });
    match should {
        // SAFETY: resolved pointer stays valid for process lifetime.
        Some(should) => unsafe { should() },
        None => false,
    }
}

fn flush_menu_themes() {
    static FLUSH: OnceLock<Option<FlushMenuThemesFn>> = OnceLock::new();
    let flush = FLUSH.get_or_init(|| {
        // SAFETY: as in init_app_dark_mode.
        unsafe {
            let module = LoadLibraryW(w!("uxtheme.dll")).ok()?;
            uxtheme_proc(module, UXTHEME_ORD_FLUSH_MENU_THEMES)
                .map(|ptr| std::mem::transmute::<*const c_void, FlushMenuThemesFn>(ptr))
        }
    });
    if let Some(flush) = flush {
        // SAFETY: resolved pointer stays valid for process lifetime.
        unsafe { flush() };
    }
}

/// Per-window frame theming: DWM immersive attribute (both known ids) plus
/// the AllowDarkModeForWindow ordinal.  Used by the main window and by every
/// dialog the controller creates.
pub(crate) fn apply_frame_dark_mode(hwnd: HWND, dark: bool) {
    let enable: i32 = i32::from(dark);
    // SAFETY: the attribute payload is a 4-byte BOOL as documented; failures
    // on older builds are ignored and the 19 fallback covers pre-20H1.
    unsafe {
        let _ = DwmSetWindowAttribute(
            hwnd,
            DWMWINDOWATTRIBUTE(20),
            &enable as *const _ as *const c_void,
            std::mem::size_of_val(&enable) as u32,
        );
        let _ = DwmSetWindowAttribute(
            hwnd,
            DWMWINDOWATTRIBUTE(19),
            &enable as *const _ as *const c_void,
            std::mem::size_of_val(&enable) as u32,
        );
    }

    static ALLOW: OnceLock<Option<AllowDarkModeForWindowFn>> = OnceLock::new();
    let allow = ALLOW.get_or_init(|| {
        // SAFETY: as in init_app_dark_mode.
        unsafe {
            let module = LoadLibraryW(w!("uxtheme.dll")).ok()?;
            uxtheme_proc(module, UXTHEME_ORD_ALLOW_DARK_MODE_FOR_WINDOW)
                .map(|ptr| std::mem::transmute::<*const c_void, AllowDarkModeForWindowFn>(ptr))
        }
    });
    if let Some(allow) = allow {
        // SAFETY: hwnd is live; the call toggles per-window dark rendering.
        unsafe {
            let _ = allow(hwnd, dark.into());
        }
        flush_menu_themes();
    }
}

// ── Timers ─────────────────────────────────────────────────────────────────────

struct TimerEntry {
    callback: Rc<dyn Fn()>,
    single_shot: bool,
}

// ── MainWin ────────────────────────────────────────────────────────────────────

pub(crate) struct MainWin {
    window: Window,
    hinstance: HINSTANCE,
    menu: HMENU,
    accel: Option<HACCEL>,
    dialogs: Rc<RefCell<DialogSet>>,
    timers: Rc<RefCell<HashMap<usize, TimerEntry>>>,
    die: Rc<Cell<bool>>,
    uah_tokens: RefCell<Vec<(u32, Token)>>,
}

impl MainWin {
    /// Register the class, create the window, attach menu and accelerators.
    ///
    /// `rect` restores a saved placement; `None` lets the system place the
    /// window.
    pub(crate) fn new(
        title: &str,
        menu_items: &[MenuNode],
        rect: Option<(i32, i32, i32, i32)>,
    ) -> Result<MainWin> {
        // SAFETY: GetModuleHandleW(None) returns the exe's own module, valid
        // for the process lifetime.
        let hmodule = unsafe { GetModuleHandleW(None) }?;
        let hinstance = HINSTANCE(hmodule.0);

        let icc = INITCOMMONCONTROLSEX {
            dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
            dwICC: ICC_BAR_CLASSES,
        };
        // SAFETY: icc is fully initialised; the call is idempotent.
        unsafe {
            let _ = InitCommonControlsEx(&icc);
        }

        Window::register_class(hinstance, CLASS_NAME)?;

        let rect = rect.unwrap_or((CW_USEDEFAULT, CW_USEDEFAULT, DEFAULT_WIDTH, DEFAULT_HEIGHT));
        let window = Window::create(
            hinstance,
            CLASS_NAME,
            title,
            WS_OVERLAPPEDWINDOW,
            Default::default(),
            rect,
            None,
            None,
        )?;

        let (menu_bar, accel_entries) = menu::build_menu_bar(menu_items)?;
        // SAFETY: both handles were just created and are valid.
        unsafe { SetMenu(window.hwnd(), Some(menu_bar)) }?;
        let accel = menu::build_accelerators(&accel_entries)?;

        // SAFETY: opt this window into WM_DROPFILES delivery.
        unsafe { DragAcceptFiles(window.hwnd(), true) };

        let this = MainWin {
            window,
            hinstance,
            menu: menu_bar,
            accel,
            dialogs: Rc::new(RefCell::new(DialogSet::new())),
            timers: Rc::new(RefCell::new(HashMap::new())),
            die: Rc::new(Cell::new(false)),
            uah_tokens: RefCell::new(Vec::new()),
        };
        this.install_timer_routing();
        Ok(this)
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.window.hwnd()
    }

    pub(crate) fn hinstance(&self) -> HINSTANCE {
        self.hinstance
    }

    pub(crate) fn menu(&self) -> HMENU {
        self.menu
    }

    pub(crate) fn dialogs(&self) -> Rc<RefCell<DialogSet>> {
        Rc::clone(&self.dialogs)
    }

    /// Screen rectangle of the window, for placement persistence.
    pub(crate) fn window_rect(&self) -> (i32, i32, i32, i32) {
        let mut rc = RECT::default();
        // SAFETY: valid out-pointer; failure leaves the zeroed default.
        unsafe {
            let _ = GetWindowRect(self.window.hwnd(), &mut rc);
        }
        (rc.left, rc.top, rc.right - rc.left, rc.bottom - rc.top)
    }

    // ── Message loop ───────────────────────────────────────────────────────────

    /// Drive the message loop until `quit` is called or WM_QUIT arrives.
    pub(crate) fn run_loop(&self) -> Result<()> {
        let mut msg = MSG::default();
        loop {
            // SAFETY: &mut msg is a valid out-pointer; None retrieves
            // messages for all windows on this thread.
            let ret = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            match ret.0 {
                -1 => return Err(last_error("GetMessageW")),
                0 => break,
                _ => {
                    if self.die.get() {
                        break;
                    }

                    // Modeless dialogs get keyboard handling (tab order,
                    // default button, Esc) before anything else sees the
                    // message.
                    let snapshot = self.dialogs.borrow().snapshot();
                    // SAFETY: handles in the set are live dialogs; a stale
                    // handle makes IsDialogMessageW return false.
                    let claimed = snapshot.iter().any(|&raw| unsafe {
                        IsDialogMessageW(HWND(raw as *mut c_void), &msg).as_bool()
                    });
                    if claimed {
                        continue;
                    }

                    if let Some(accel) = self.accel {
                        // SAFETY: accel is the live table built in `new`.
                        if unsafe { TranslateAcceleratorW(self.window.hwnd(), accel, &msg) } != 0 {
                            continue;
                        }
                    }

                    // SAFETY: msg was populated by a successful GetMessageW.
                    unsafe {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }
        }
        Ok(())
    }

    /// Ask the loop to exit.  The posted no-op message wakes GetMessageW so
    /// the `die` flag is observed promptly.
    pub(crate) fn quit(&self) {
        self.die.set(true);
        // SAFETY: posting WM_NULL to our own live window.
        unsafe {
            let _ = PostMessageW(Some(self.window.hwnd()), WM_NULL, WPARAM(0), LPARAM(0));
        }
    }

    /// Tear native resources down in reverse acquisition order.
    pub(crate) fn shutdown(&self) {
        for (id, _) in self.timers.borrow().iter() {
            // SAFETY: killing a timer we created; unknown ids fail benignly.
            unsafe {
                let _ = KillTimer(Some(self.window.hwnd()), *id);
            }
        }
        self.timers.borrow_mut().clear();
        if let Some(accel) = self.accel {
            menu::destroy_accelerators(accel);
        }
        if let Err(err) = self.window.destroy() {
            debug!("window teardown: {err}");
        }
    }

    // ── Timers ─────────────────────────────────────────────────────────────────

    /// Start (or restart) a timer.  `single_shot` timers kill themselves the
    /// first time they fire.
    pub(crate) fn set_timer(&self, id: usize, interval_ms: u32, single_shot: bool, callback: Rc<dyn Fn()>) {
        self.timers
            .borrow_mut()
            .insert(id, TimerEntry { callback, single_shot });
        // SAFETY: hwnd-owned timer with no TIMERPROC routes through WM_TIMER.
        unsafe {
            SetTimer(Some(self.window.hwnd()), id, interval_ms, None);
        }
    }

    fn install_timer_routing(&self) {
        let timers = Rc::clone(&self.timers);
        let hwnd_raw = self.window.hwnd().0 as isize;
        self.window.register(
            WM_TIMER,
            Rc::new(move |args| {
                let id = args.wparam;
                // Pull the callback out of the borrow before invoking it so
                // the handler may start or kill timers itself.
                let entry = {
                    let mut map = timers.borrow_mut();
                    match map.get(&id).map(|e| e.single_shot) {
                        Some(true) => {
                            // SAFETY: single-shot timers die on first fire.
                            unsafe {
                                let _ = KillTimer(Some(HWND(hwnd_raw as *mut c_void)), id);
                            }
                            map.remove(&id).map(|e| e.callback)
                        }
                        Some(false) => map.get(&id).map(|e| Rc::clone(&e.callback)),
                        None => None,
                    }
                };
                entry.map(|cb| {
                    cb();
                    0
                })
            }),
        );
    }

    // ── Menu-bar theming ───────────────────────────────────────────────────────

    /// Install or remove the dark menu-bar painters and re-theme the frame.
    pub(crate) fn apply_theme(&self, dark: bool) {
        apply_frame_dark_mode(self.window.hwnd(), dark);

        for (msg, token) in self.uah_tokens.borrow_mut().drain(..) {
            self.window.unregister(msg, Some(token));
        }

        if dark {
            let mut tokens = self.uah_tokens.borrow_mut();

            tokens.push((
                WM_UAHDRAWMENU,
                self.window.register(
                    WM_UAHDRAWMENU,
                    Rc::new(|args| {
                        let uah = args.lparam as *const UahMenu;
                        // SAFETY: Windows guarantees lparam points at a
                        // UAHMENU for the duration of this message.
                        unsafe {
                            paint_dark_menu_bar(HWND(args.hwnd as *mut c_void), (*uah).hdc);
                        }
                        Some(0)
                    }),
                ),
            ));

            tokens.push((
                WM_UAHDRAWMENUITEM,
                self.window.register(
                    WM_UAHDRAWMENUITEM,
                    Rc::new(|args| {
                        // SAFETY: as above, for the UAHDRAWMENUITEM blob.
                        let udmi = unsafe { &*(args.lparam as *const UahDrawMenuItem) };
                        paint_dark_menu_bar_item(udmi);
                        Some(0)
                    }),
                ),
            ));

            for msg in [WM_NCPAINT, WM_NCACTIVATE] {
                tokens.push((
                    msg,
                    self.window.register(
                        msg,
                        Rc::new(move |args| {
                            let hwnd = HWND(args.hwnd as *mut c_void);
                            // SAFETY: default processing first, then repaint
                            // the stray line Windows leaves under the bar.
                            let def = unsafe {
                                windows::Win32::UI::WindowsAndMessaging::DefWindowProcW(
                                    hwnd,
                                    args.msg,
                                    WPARAM(args.wparam),
                                    LPARAM(args.lparam),
                                )
                            };
                            draw_dark_menu_nc_bottom_line(hwnd);
                            Some(def.0)
                        }),
                    ),
                ));
            }
        }

        // SAFETY: forces the bar to repaint with the new painter set.
        unsafe {
            let _ = DrawMenuBar(self.window.hwnd());
        }
    }
}

// ── Dark menu-bar painters ─────────────────────────────────────────────────────

/// Fill the entire menu bar background (`WM_UAHDRAWMENU`).
unsafe fn paint_dark_menu_bar(hwnd: HWND, hdc: HDC) {
    // SAFETY: all handles come from the message being processed; the brush
    // is deleted before return.
    unsafe {
        let mut mbi = MENUBARINFO {
            cbSize: std::mem::size_of::<MENUBARINFO>() as u32,
            ..Default::default()
        };
        if GetMenuBarInfo(hwnd, OBJECT_IDENTIFIER(OBJID_MENU_BAR), 0, &mut mbi).is_err() {
            return;
        }
        let mut rc_window = RECT::default();
        let _ = GetWindowRect(hwnd, &mut rc_window);
        let mut rc_bar = mbi.rcBar;
        let _ = OffsetRect(&mut rc_bar, -rc_window.left, -rc_window.top);
        rc_bar.top -= 1;
        let brush = CreateSolidBrush(colorref(theme::DARK_BG));
        FillRect(hdc, &rc_bar, brush);
        let _ = DeleteObject(brush.into());
    }
}

/// Draw a single menu bar item (`WM_UAHDRAWMENUITEM`).
fn paint_dark_menu_bar_item(udmi: &UahDrawMenuItem) {
    // SAFETY: the DRAWITEMSTRUCT, HDC and HMENU inside udmi are valid for
    // this message; buf outlives all uses.
    unsafe {
        let mut buf = [0u16; 256];
        let mut mii = MENUITEMINFOW {
            cbSize: std::mem::size_of::<MENUITEMINFOW>() as u32,
            fMask: MIIM_STRING,
            dwTypeData: windows::core::PWSTR(buf.as_mut_ptr()),
            cch: (buf.len() - 1) as u32,
            ..Default::default()
        };
        let _ = GetMenuItemInfoW(udmi.um.hmenu, udmi.umi.i_position as u32, true, &mut mii);

        let item_state = udmi.dis.itemState;
        let highlighted = (item_state.0 & (ODS_SELECTED.0 | ODS_HOTLIGHT.0)) != 0;
        let brush = CreateSolidBrush(colorref(theme::menu_item_bg(highlighted)));
        FillRect(udmi.um.hdc, &udmi.dis.rcItem, brush);
        let _ = DeleteObject(brush.into());

        SetBkMode(udmi.um.hdc, TRANSPARENT);
        SetTextColor(udmi.um.hdc, colorref(theme::DARK_TEXT));

        let mut dt_flags = DT_CENTER | DT_SINGLELINE | DT_VCENTER;
        if (item_state.0 & ODS_NOACCEL.0) != 0 {
            dt_flags |= DT_HIDEPREFIX;
        }
        let mut rc = udmi.dis.rcItem;
        DrawTextW(udmi.um.hdc, &mut buf[..mii.cch as usize], &mut rc, dt_flags);
    }
}

/// Paint over the 1-px bright line Windows leaves between menu bar and client.
fn draw_dark_menu_nc_bottom_line(hwnd: HWND) {
    // SAFETY: window DC acquired and released in this scope; coordinate
    // mapping mirrors the documented client-to-window conversion.
    unsafe {
        let mut mbi = MENUBARINFO {
            cbSize: std::mem::size_of::<MENUBARINFO>() as u32,
            ..Default::default()
        };
        if GetMenuBarInfo(hwnd, OBJECT_IDENTIFIER(OBJID_MENU_BAR), 0, &mut mbi).is_err() {
            return;
        }
        let mut rc_client = RECT::default();
        let _ = GetClientRect(hwnd, &mut rc_client);
        let points =
            std::slice::from_raw_parts_mut(&mut rc_client as *mut RECT as *mut POINT, 2);
        MapWindowPoints(Some(hwnd), None, points);
        let mut rc_window = RECT::default();
        let _ = GetWindowRect(hwnd, &mut rc_window);
        let _ = OffsetRect(&mut rc_client, -rc_window.left, -rc_window.top);
        let rc_line = RECT {
            left: rc_client.left,
            top: rc_client.top - 1,
            right: rc_client.right,
            bottom: rc_client.top,
        };
        let hdc = GetWindowDC(Some(hwnd));
        let brush = CreateSolidBrush(colorref(theme::DARK_BG));
        FillRect(hdc, &rc_line, brush);
        let _ = DeleteObject(brush.into());
        ReleaseDC(Some(hwnd), hdc);
    }
}

// ── Message boxes ──────────────────────────────────────────────────────────────

/// Stock icon shown beside message-box text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoxIcon {
    Info,
    Warning,
    Error,
    Question,
}

impl BoxIcon {
    fn stock_id(self) -> SHSTOCKICONID {
        match self {
            BoxIcon::Info => SIID_INFO,
            BoxIcon::Warning => SIID_WARNING,
            BoxIcon::Error => SIID_ERROR,
            BoxIcon::Question => SIID_HELP,
        }
    }
}

const ICON_CTRL_ID: i32 = 100;
const TEXT_CTRL_ID: i32 = 101;
/// STM_SETICON.
const STM_SETICON: u32 = 0x0170;

const BTN_W: i32 = 53;
const BTN_H: i32 = 14;
const BTN_DIST: i32 = 5;
const MARGIN_RIGHT: i32 = 10;
const MARGIN_BOTTOM: i32 = 20;

/// Lay the buttons right-aligned along the bottom edge.  The first button is
/// the default.
fn add_button_row(builder: &mut TemplateBuilder, buttons: &[(u16, &str)], width: i32, height: i32) {
    let total_btn_w = buttons.len() as i32 * BTN_W + (buttons.len() as i32 - 1) * BTN_DIST;
    let mut x = width - MARGIN_RIGHT - total_btn_w;
    for (i, (id, label)) in buttons.iter().enumerate() {
        let mut style = crate::platform::template::WS_TABSTOP;
        if i == 0 {
            style |= crate::platform::template::BS_DEFPUSHBUTTON;
        }
        builder.add_control(
            CtrlClass::Button,
            Caption::Text((*label).to_owned()),
            x,
            height - MARGIN_BOTTOM,
            BTN_W,
            BTN_H,
            *id as i32,
            style,
            0,
        );
        x += BTN_W + BTN_DIST;
    }
}

/// A themed replacement for `MessageBoxW`: caller-supplied buttons ending
/// the dialog with their control id, optional stock icon, palette-aware
/// painting.  Returns the id of the chosen button (0 if dismissed).
pub(crate) fn show_message_box(
    hinstance: HINSTANCE,
    owner: HWND,
    dark: bool,
    caption: &str,
    text: &str,
    buttons: &[(u16, &str)],
    icon: Option<BoxIcon>,
) -> isize {
    let width = if icon.is_some() {
        260
    } else if buttons.len() > 2 {
        240
    } else {
        190
    };
    let min_height = if icon.is_some() { 74 } else { 62 };
    let text_x = if icon.is_some() { 41 } else { 7 };
    let text_lines = text.lines().count().max(1) as i32;
    let height = min_height.max(14 + text_lines * 10 + 14 + MARGIN_BOTTOM);

    let mut builder = TemplateBuilder::new();
    if icon.is_some() {
        builder.add_control(
            CtrlClass::Static,
            Caption::Text(String::new()),
            14,
            14,
            21,
            20,
            ICON_CTRL_ID,
            crate::platform::template::SS_ICON,
            0,
        );
    }
    builder.add_control(
        CtrlClass::Static,
        Caption::Text(text.to_owned()),
        text_x,
        14,
        width - text_x - 10,
        height - 14 - BTN_H - MARGIN_BOTTOM,
        TEXT_CTRL_ID,
        crate::platform::template::SS_NOPREFIX,
        0,
    );

    add_button_row(&mut builder, buttons, width, height);

    let template = builder.build(
        0,
        0,
        width,
        height,
        caption,
        "Segoe UI",
        8,
        DIALOG_STYLE,
        DIALOG_EXSTYLE,
    );

    // Icon handle set at WM_INITDIALOG and released after the dialog ends.
    let hicon = icon.and_then(|kind| {
        let mut info = SHSTOCKICONINFO {
            cbSize: std::mem::size_of::<SHSTOCKICONINFO>() as u32,
            ..Default::default()
        };
        // SAFETY: info is sized correctly; on success hIcon is owned by us.
        unsafe { SHGetStockIconInfo(kind.stock_id(), SHGSI_ICON, &mut info) }
            .ok()
            .map(|()| info.hIcon)
    });

    let hicon_raw = hicon.map(|h| h.0 as isize);
    let config = DialogConfig {
        template,
        dark,
        on_command: Box::new(|dlg, control, _code| {
            dialog::end(dlg, control as isize);
            true
        }),
        on_message: Some(Box::new(move |dlg, msg, _wparam, _lparam| {
            if msg == WM_INITDIALOG {
                if let Some(raw) = hicon_raw {
                    // SAFETY: the Static control exists in the template and
                    // the icon handle stays alive past the modal call.
                    unsafe {
                        if let Ok(item) =
                            windows::Win32::UI::WindowsAndMessaging::GetDlgItem(
                                Some(dlg),
                                ICON_CTRL_ID,
                            )
                        {
                            SendMessageW(
                                item,
                                STM_SETICON,
                                Some(WPARAM(raw as usize)),
                                Some(LPARAM(0)),
                            );
                        }
                    }
                }
            }
            None
        })),
        on_destroyed: None,
    };

    let result = dialog::show_modal(hinstance, owner, config);

    if let Some(hicon) = hicon {
        // SAFETY: we own the stock icon copy; the dialog is gone.
        unsafe {
            let _ = DestroyIcon(hicon);
        }
    }
    result
}

/// The accented save prompt: large message line, tinted lower band with a
/// divider, caller-labeled buttons.  Returns the chosen button id.
pub(crate) fn show_save_prompt(
    hinstance: HINSTANCE,
    owner: HWND,
    dark: bool,
    caption: &str,
    text: &str,
    buttons: &[(u16, &str)],
) -> isize {
    let width = if buttons.len() > 2 { 240 } else { 190 };
    let height = 62;

    let mut builder = TemplateBuilder::new();
    builder.add_control(
        CtrlClass::Static,
        Caption::Text(text.to_owned()),
        7,
        10,
        width - 14,
        22,
        TEXT_CTRL_ID,
        crate::platform::template::SS_NOPREFIX,
        0,
    );
    add_button_row(&mut builder, buttons, width, height);

    let template = builder.build(
        0,
        0,
        width,
        height,
        caption,
        "Segoe UI",
        8,
        DIALOG_STYLE,
        DIALOG_EXSTYLE,
    );

    // Enlarged font for the message line, deleted after the modal call.
    // SAFETY: CreateFontW copies its inputs; the handle is checked below.
    let big_font = unsafe {
        CreateFontW(
            22,
            0,
            0,
            0,
            400,
            0,
            0,
            0,
            DEFAULT_CHARSET,
            OUT_DEFAULT_PRECIS,
            CLIP_DEFAULT_PRECIS,
            CLEARTYPE_QUALITY,
            FF_DONTCARE.0 as u32,
            w!("Segoe UI"),
        )
    };
    let big_font_raw = if big_font.is_invalid() {
        None
    } else {
        Some(big_font.0 as isize)
    };

    let config = DialogConfig {
        template,
        dark,
        on_command: Box::new(|dlg, control, _code| {
            dialog::end(dlg, control as isize);
            true
        }),
        on_message: Some(Box::new(move |dlg, msg, wparam, lparam| {
            match msg {
                WM_INITDIALOG => {
                    if let Some(raw) = big_font_raw {
                        // SAFETY: font handle outlives the modal dialog.
                        unsafe {
                            if let Ok(item) =
                                windows::Win32::UI::WindowsAndMessaging::GetDlgItem(
                                    Some(dlg),
                                    TEXT_CTRL_ID,
                                )
                            {
                                SendMessageW(
                                    item,
                                    WM_SETFONT,
                                    Some(WPARAM(raw as usize)),
                                    Some(LPARAM(1)),
                                );
                            }
                        }
                    }
                    None
                }
                WM_CTLCOLORSTATIC => {
                    // Accent the message line; everything else keeps the
                    // controller's standard coloring.
                    let is_text_ctrl = unsafe {
                        windows::Win32::UI::WindowsAndMessaging::GetDlgItem(
                            Some(dlg),
                            TEXT_CTRL_ID,
                        )
                        .map(|item| item.0 as isize == lparam)
                        .unwrap_or(false)
                    };
                    if !is_text_ctrl {
                        return None;
                    }
                    let hdc = HDC(wparam as *mut c_void);
                    let accent = if dark {
                        theme::DARK_ACCENT_TEXT
                    } else {
                        theme::LIGHT_ACCENT_TEXT
                    };
                    // SAFETY: hdc is the control's paint DC for this message.
                    unsafe {
                        SetTextColor(hdc, colorref(accent));
                        SetBkMode(hdc, TRANSPARENT);
                    }
                    let null_brush = unsafe {
                        windows::Win32::Graphics::Gdi::GetStockObject(
                            windows::Win32::Graphics::Gdi::NULL_BRUSH,
                        )
                    };
                    Some(null_brush.0 as isize)
                }
                WM_ERASEBKGND => {
                    let hdc = HDC(wparam as *mut c_void);
                    paint_prompt_background(dlg, hdc, dark);
                    Some(1)
                }
                _ => None,
            }
        })),
        on_destroyed: None,
    };

    let result = dialog::show_modal(hinstance, owner, config);

    if big_font_raw.is_some() {
        // SAFETY: the dialog no longer references the font.
        unsafe {
            let _ = DeleteObject(big_font.into());
        }
    }
    result
}

/// Two-band prompt background: message area on top, button strip below,
/// separated by a 1-px divider.
fn paint_prompt_background(dlg: HWND, hdc: HDC, dark: bool) {
    // SAFETY: hdc is the erase DC for dlg; brushes are deleted before return.
    unsafe {
        let mut rc = RECT::default();
        let _ = GetClientRect(dlg, &mut rc);

        let (upper, lower, divider) = if dark {
            (theme::DARK_BG, theme::DARK_BG_DARKER, theme::DARK_SEPARATOR)
        } else {
            (0x00FF_FFFF, 0x00F0_F0F0, theme::LIGHT_DIVIDER)
        };

        let brush = CreateSolidBrush(colorref(lower));
        FillRect(hdc, &rc, brush);
        let _ = DeleteObject(brush.into());

        let mut rc_upper = rc;
        rc_upper.bottom -= 40;
        let brush = CreateSolidBrush(colorref(upper));
        FillRect(hdc, &rc_upper, brush);
        let _ = DeleteObject(brush.into());

        let rc_line = RECT {
            left: rc.left,
            top: rc_upper.bottom - 1,
            right: rc.right,
            bottom: rc_upper.bottom,
        };
        let brush = CreateSolidBrush(colorref(divider));
        FillRect(hdc, &rc_line, brush);
        let _ = DeleteObject(brush.into());
    }
}

// ── Fatal-error dialog ─────────────────────────────────────────────────────────

/// Show a modal error dialog with the given message.
///
/// Safe to call from any context, including before the main window exists;
/// used by `main()` when startup fails.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_w = wide(message);
    let title_w = wide("Quill — Fatal Error");

    // SAFETY: both buffers are valid null-terminated UTF-16 strings that
    // outlive the call; a null owner makes the dialog free-floating.
    unsafe {
        let _ = MessageBoxW(
            None,
            PCWSTR(msg_w.as_ptr()),
            PCWSTR(title_w.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}
