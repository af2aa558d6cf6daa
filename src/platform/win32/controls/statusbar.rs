// ── Status bar ─────────────────────────────────────────────────────────────────
//
// Wrapper over msctls_statusbar32 with the right-aligned part layout from
// `theme::status_part_edges`.  The stock control has no dark rendition, so
// in dark mode the wrapper intercepts WM_PAINT / WM_ERASEBKGND through the
// window router and paints the parts itself from a cached copy of each
// part's text.

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use windows::{
    core::w,
    Win32::{
        Foundation::{HINSTANCE, HWND, RECT},
        Graphics::Gdi::{
            BeginPaint, CreatePen, CreateSolidBrush, DeleteObject, DrawTextW, EndPaint, FillRect,
            GetClientRect, LineTo, MoveToEx, SelectObject, SetBkMode, SetTextColor, DT_END_ELLIPSIS,
            DT_SINGLELINE, DT_VCENTER, HFONT, PAINTSTRUCT, PS_SOLID, TRANSPARENT,
        },
        UI::WindowsAndMessaging::{
            GetWindowRect, HMENU, WINDOW_STYLE, WM_ERASEBKGND, WM_GETFONT, WM_PAINT, WM_SIZE,
            WS_CHILD, WS_VISIBLE,
        },
    },
};

use super::super::window::{colorref, Window};
use crate::error::Result;
use crate::platform::router::Token;
use crate::theme;

/// Child-window id of the status bar.
pub(crate) const STATUS_ID: u16 = 101;

/// SBARS_SIZEGRIP — show the resize grip in the corner.
const SBARS_SIZEGRIP: u32 = 0x0100;
/// SB_SETPARTS / SB_SETTEXTW (WM_USER + 4 / + 11).
const SB_SETPARTS: u32 = 0x0404;
const SB_SETTEXTW: u32 = 0x040B;

/// Horizontal text inset inside each part, in pixels.
const PART_PADDING: i32 = 6;

pub(crate) struct StatusBar {
    win: Window,
    texts: Rc<RefCell<Vec<String>>>,
    dark_tokens: RefCell<Vec<(u32, Token)>>,
}

impl StatusBar {
    pub(crate) fn create(parent: HWND, hinstance: HINSTANCE) -> Result<StatusBar> {
        let win = Window::create(
            hinstance,
            w!("msctls_statusbar32"),
            "",
            WS_CHILD | WS_VISIBLE | WINDOW_STYLE(SBARS_SIZEGRIP),
            Default::default(),
            (0, 0, 0, 0),
            Some(parent),
            Some(HMENU(STATUS_ID as usize as *mut core::ffi::c_void)),
        )?;
        Ok(StatusBar {
            win,
            texts: Rc::new(RefCell::new(vec![
                String::new();
                theme::STATUS_PART_WIDTHS.len() + 1
            ])),
            dark_tokens: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.win.set_visible(visible);
    }

    /// Height of the bar in pixels, 0 while hidden.
    pub(crate) fn height(&self) -> i32 {
        let mut rc = RECT::default();
        // SAFETY: valid handle; failure leaves the zeroed rect.
        unsafe {
            let _ = GetWindowRect(self.win.hwnd(), &mut rc);
        }
        rc.bottom - rc.top
    }

    /// Reposition after the parent resized and lay the parts out again.
    pub(crate) fn on_parent_resize(&self, client_width: i32) {
        self.win.send(WM_SIZE, 0, 0);
        let edges = theme::status_part_edges(client_width, &theme::STATUS_PART_WIDTHS);
        self.win
            .send(SB_SETPARTS, edges.len(), edges.as_ptr() as isize);
    }

    /// Set the text of one part; parts are indexed left to right.
    pub(crate) fn set_text(&self, part: usize, text: &str) {
        {
            let mut texts = self.texts.borrow_mut();
            if part < texts.len() {
                texts[part] = text.to_owned();
            }
        }
        let text_w = super::super::wide(text);
        self.win
            .send(SB_SETTEXTW, part, text_w.as_ptr() as isize);
    }

    /// Switch between stock rendering (light) and the custom dark painter.
    pub(crate) fn apply_theme(&self, dark: bool) {
        for (msg, token) in self.dark_tokens.borrow_mut().drain(..) {
            self.win.unregister(msg, Some(token));
        }

        if dark {
            let erase = self
                .win
                .register(WM_ERASEBKGND, Rc::new(|_args| Some(1)));
            let texts = Rc::clone(&self.texts);
            let paint = self.win.register(
                WM_PAINT,
                Rc::new(move |args| {
                    paint_dark(HWND(args.hwnd as *mut core::ffi::c_void), &texts.borrow());
                    Some(0)
                }),
            );
            let mut tokens = self.dark_tokens.borrow_mut();
            tokens.push((WM_ERASEBKGND, erase));
            tokens.push((WM_PAINT, paint));
        }

        self.win.apply_explorer_theme(dark);
        // SAFETY: repaint with whichever painter is now active.
        unsafe {
            let _ = windows::Win32::Graphics::Gdi::InvalidateRect(
                Some(self.win.hwnd()),
                None,
                true,
            );
        }
    }
}

/// Dark WM_PAINT: background fill, separator lines at part boundaries, then
/// each cached part text with the bar's own font.
fn paint_dark(hwnd: HWND, texts: &[String]) {
    // SAFETY: called from the WM_PAINT handler of hwnd on the UI thread; all
    // GDI objects created here are deleted before return and the DC is closed
    // by EndPaint.
    unsafe {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);
        if hdc.is_invalid() {
            return;
        }

        let mut rc = RECT::default();
        let _ = GetClientRect(hwnd, &mut rc);

        let bg = CreateSolidBrush(colorref(theme::DARK_BG));
        FillRect(hdc, &rc, bg);
        let _ = DeleteObject(bg.into());

        let font = HFONT(
            windows::Win32::UI::WindowsAndMessaging::SendMessageW(hwnd, WM_GETFONT, None, None).0
                as *mut core::ffi::c_void,
        );
        let old_font = if font.is_invalid() {
            None
        } else {
            Some(SelectObject(hdc, font.into()))
        };

        SetBkMode(hdc, TRANSPARENT);
        SetTextColor(hdc, colorref(theme::DARK_TEXT));
        let pen = CreatePen(PS_SOLID, 1, colorref(theme::DARK_SEPARATOR));
        let old_pen = SelectObject(hdc, pen.into());

        let edges = theme::status_part_edges(rc.right, &theme::STATUS_PART_WIDTHS);
        let mut left = rc.left;
        for (i, &edge) in edges.iter().enumerate() {
            let right = if edge < 0 { rc.right } else { edge };

            if i > 0 {
                let _ = MoveToEx(hdc, left, rc.top + 2, None);
                let _ = LineTo(hdc, left, rc.bottom - 2);
            }

            if let Some(text) = texts.get(i) {
                if !text.is_empty() {
                    let mut text_w: Vec<u16> = text.encode_utf16().collect();
                    let mut part_rc = RECT {
                        left: left + PART_PADDING,
                        top: rc.top,
                        right: right - PART_PADDING,
                        bottom: rc.bottom,
                    };
                    DrawTextW(
                        hdc,
                        &mut text_w,
                        &mut part_rc,
                        DT_SINGLELINE | DT_VCENTER | DT_END_ELLIPSIS,
                    );
                }
            }
            left = right;
        }

        SelectObject(hdc, old_pen);
        let _ = DeleteObject(pen.into());
        if let Some(old) = old_font {
            SelectObject(hdc, old);
        }
        let _ = EndPaint(hwnd, &ps);
    }
}
