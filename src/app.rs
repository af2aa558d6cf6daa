// ── Application composition ────────────────────────────────────────────────────
//
// Wires the document model, search engine, settings, and resource bundle to
// the Win32 layer: one main window, one multiline edit control, one status
// bar, the find/replace/go-to dialogs, and the command dispatcher behind the
// menu and accelerator table.
//
// `App` lives in an `Rc<RefCell<_>>`; every message callback upgrades a
// `Weak` and borrows with `try_borrow_mut`.  A failed borrow means the app
// is already inside another callback (a modal dialog is pumping messages),
// and the callback answers "not handled" so the default procedure runs.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};
use windows::Win32::Graphics::Gdi::HFONT;
use windows::Win32::UI::Input::KeyboardAndMouse::{VK_BACK, VK_SHIFT, VK_TAB};
use windows::Win32::UI::WindowsAndMessaging::{
    EN_CHANGE, WM_CLOSE, WM_COMMAND, WM_CTLCOLOREDIT, WM_DPICHANGED, WM_DROPFILES, WM_ERASEBKGND,
    WM_INITDIALOG, WM_INITMENUPOPUP, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONUP, WM_PASTE,
    WM_SETTINGCHANGE, WM_SIZE,
};

use crate::document::{self, DocumentState, Encoding, EolMode, FontDesc, MAX_TEXT_BYTES};
use crate::error::Result;
use crate::platform::template;
use crate::platform::win32::{
    self,
    controls::edit::{Edit, EDIT_ID},
    controls::statusbar::StatusBar,
    dialog::{self, Dialog, DialogConfig},
    dialogs, dpi,
    mainwin::{self, BoxIcon, MainWin},
    menu, window,
};
use crate::resources::{Bundle, Command, DialogDesc};
use crate::search::{self, FindOutcome, GotoTarget, SearchOptions, SearchState};
use crate::session::{self, Settings, WindowRect};
use crate::theme;

// ── Control and timer ids ──────────────────────────────────────────────────────

// Dialog buttons.  IDOK/IDCANCEL are fixed by the dialog manager (Enter and
// Esc route to them); the rest are ours.
const ID_OK: i32 = 1;
const ID_CANCEL: i32 = 2;
const BTN_SAVE: u16 = 6;
const BTN_DISCARD: u16 = 7;
const BTN_CANCEL: u16 = 2;

// Control ids shared with the dialog resources.
const ID_FIND_TERM: i32 = 1001;
const ID_MATCH_CASE: i32 = 1002;
const ID_WRAP_AROUND: i32 = 1003;
const ID_SEARCH_UP: i32 = 1004;
const ID_REPLACE_WITH: i32 = 1005;
const ID_REPLACE_ONE: i32 = 1006;
const ID_REPLACE_ALL: i32 = 1007;
const ID_GOTO_LINE: i32 = 1008;

const TIMER_STATUS_CLEAR: usize = 1;
const STATUS_FLASH_MS: u32 = 4000;

// Status-bar parts: message, caret position, zoom, line endings, encoding.
const PART_MESSAGE: usize = 0;
const PART_CARET: usize = 1;
const PART_ZOOM: usize = 2;
const PART_EOL: usize = 3;
const PART_ENCODING: usize = 4;

// ── Shared paint state ─────────────────────────────────────────────────────────

/// The few values paint-time callbacks need.  Kept outside `App` so
/// WM_CTLCOLOREDIT and WM_ERASEBKGND never contend for the app borrow —
/// they fire while modal dialogs pump messages.
struct Palette {
    dark: Cell<bool>,
    edit_brush: Cell<isize>,
}

// ── App ────────────────────────────────────────────────────────────────────────

pub(crate) struct App {
    main: Rc<MainWin>,
    edit: Edit,
    status: StatusBar,
    bundle: Bundle,
    doc: DocumentState,
    search: SearchState,
    settings: Settings,
    font: FontDesc,
    hfont: Option<HFONT>,
    zoom_pct: u32,
    dark: bool,
    palette: Rc<Palette>,
    find_dialog: Option<Dialog>,
    replace_dialog: Option<Dialog>,
    self_weak: Weak<RefCell<App>>,
}

/// Build the window, enter the message loop, persist settings on the way out.
pub(crate) fn run() -> Result<()> {
    dpi::init();
    mainwin::init_app_dark_mode();

    let settings = session::load().unwrap_or_default();
    let bundle = crate::resources::load(&win32::user_locale())?;

    let placement = saved_placement(&settings);
    let main = Rc::new(MainWin::new(bundle.s("app-title"), &bundle.menu, placement)?);
    let edit = Edit::create(main.hwnd(), main.hinstance(), settings.word_wrap)?;
    let status = StatusBar::create(main.hwnd(), main.hinstance())?;

    let dark = settings
        .dark_mode
        .unwrap_or_else(mainwin::system_prefers_dark);
    let palette = Rc::new(Palette {
        dark: Cell::new(dark),
        edit_brush: Cell::new(0),
    });

    let font = FontDesc {
        face: settings.font_face.clone(),
        size: settings.font_size,
        weight: settings.font_weight,
        italic: settings.font_italic,
    };
    let search_state = SearchState {
        term: settings.search_term.clone(),
        replace_with: settings.replace_with.clone(),
        options: SearchOptions {
            match_case: settings.match_case,
            wrap_around: settings.wrap_around,
            search_up: settings.search_up,
        },
    };

    let app = Rc::new(RefCell::new(App {
        main: Rc::clone(&main),
        edit,
        status,
        bundle,
        doc: DocumentState::new_untitled(),
        search: search_state,
        settings,
        font,
        hfont: None,
        zoom_pct: 100,
        dark,
        palette,
        find_dialog: None,
        replace_dialog: None,
        self_weak: Weak::new(),
    }));
    app.borrow_mut().self_weak = Rc::downgrade(&app);

    install_main_handlers(&app);
    let edit_clone = app.borrow().edit.clone();
    install_edit_handlers(&app, &edit_clone);

    {
        let mut a = app.borrow_mut();
        a.apply_theme();
        a.apply_font()?;
        a.edit.set_tab_size(a.settings.tab_size);
        a.status.set_visible(a.settings.status_bar);
        a.sync_menu();
        a.refresh_title();
        a.update_status_doc();
        a.update_caret_status();
        a.layout();

        if let Some(arg) = std::env::args_os().nth(1) {
            a.open_path(PathBuf::from(arg));
        }

        a.main.window().show();
        a.edit.win.focus();
    }

    info!("entering message loop");
    let outcome = main.run_loop();

    let snapshot = app.borrow().snapshot_settings();
    if let Err(err) = session::save(&snapshot) {
        warn!(error = %err, "could not persist settings");
    }
    app.borrow_mut().teardown();
    main.shutdown();
    outcome
}

/// Saved window placement, or `None` when the sentinel asks for a system
/// default position.
fn saved_placement(settings: &Settings) -> Option<(i32, i32, i32, i32)> {
    let w = &settings.window;
    if w.x == i32::MIN || w.y == i32::MIN || w.width <= 0 || w.height <= 0 {
        return None;
    }
    Some((w.x, w.y, w.width, w.height))
}

// ── Message routing ────────────────────────────────────────────────────────────

fn install_main_handlers(app_rc: &Rc<RefCell<App>>) {
    let (main, palette) = {
        let a = app_rc.borrow();
        (Rc::clone(&a.main), Rc::clone(&a.palette))
    };
    let win = main.window();

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_COMMAND,
        Rc::new(move |args| {
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return None;
            };
            let id = (args.wparam & 0xFFFF) as u16;
            let code = ((args.wparam >> 16) & 0xFFFF) as u16;
            if args.lparam != 0 {
                // Control notification.
                if id == EDIT_ID && u32::from(code) == EN_CHANGE {
                    app.sync_dirty();
                    app.update_caret_status();
                    return Some(0);
                }
                return None;
            }
            let cmd = Command::from_id(id)?;
            app.command(cmd);
            app.sync_dirty();
            Some(0)
        }),
    );

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_CLOSE,
        Rc::new(move |_| {
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return Some(0);
            };
            if app.confirm_discard() {
                app.main.quit();
            }
            Some(0)
        }),
    );

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_SIZE,
        Rc::new(move |_| {
            let app = weak.upgrade()?;
            let Ok(app) = app.try_borrow() else {
                return None;
            };
            app.layout();
            Some(0)
        }),
    );

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_DROPFILES,
        Rc::new(move |args| {
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return None;
            };
            if let Some(path) = dialogs::dropped_file(args.wparam) {
                if app.confirm_discard() {
                    app.open_path(path);
                }
            }
            Some(0)
        }),
    );

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_SETTINGCHANGE,
        Rc::new(move |args| {
            if win32::lparam_wide_string(args.lparam) != "ImmersiveColorSet" {
                return None;
            }
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return None;
            };
            // Follow the system theme only while no explicit choice is saved.
            if app.settings.dark_mode.is_none() {
                let dark = mainwin::system_prefers_dark();
                if dark != app.dark {
                    app.dark = dark;
                    app.apply_theme();
                }
            }
            Some(0)
        }),
    );

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_DPICHANGED,
        Rc::new(move |args| {
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return None;
            };
            let (new_dpi, rc) = dpi::unpack_dpi_changed(args.wparam, args.lparam);
            debug!(dpi = new_dpi, "monitor DPI changed");
            app.main
                .window()
                .set_bounds(rc.left, rc.top, rc.right - rc.left, rc.bottom - rc.top);
            if let Err(err) = app.apply_font() {
                warn!(error = %err, "font rebuild after DPI change failed");
            }
            Some(0)
        }),
    );

    let weak = Rc::downgrade(app_rc);
    win.register(
        WM_INITMENUPOPUP,
        Rc::new(move |_| {
            let app = weak.upgrade()?;
            let Ok(app) = app.try_borrow() else {
                return None;
            };
            menu::set_enabled(app.main.menu(), Command::Undo.id(), app.edit.can_undo());
            None
        }),
    );

    let pal = Rc::clone(&palette);
    win.register(
        WM_CTLCOLOREDIT,
        Rc::new(move |args| {
            if !pal.dark.get() {
                return None;
            }
            Some(window::answer_ctl_color(
                args.wparam,
                theme::DARK_TEXT,
                theme::DARK_CONTROL_BG,
                pal.edit_brush.get(),
            ))
        }),
    );

    let pal = Rc::clone(&palette);
    let bg_win = win.clone();
    win.register(
        WM_ERASEBKGND,
        Rc::new(move |args| {
            if !pal.dark.get() {
                return None;
            }
            bg_win.erase_background(args.wparam, theme::DARK_BG);
            Some(1)
        }),
    );
}

/// Handlers on the edit control itself.  Re-run whenever the control is
/// recreated (word-wrap toggle).
fn install_edit_handlers(app_rc: &Rc<RefCell<App>>, edit: &Edit) {
    let weak = Rc::downgrade(app_rc);
    edit.win.register(
        WM_KEYDOWN,
        Rc::new(move |args| {
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return None;
            };
            let handled = match args.wparam as u16 {
                vk if vk == VK_TAB.0 => app.on_tab_key(win32::key_down(VK_SHIFT.0 as i32)),
                vk if vk == VK_BACK.0 => app.on_backspace_key(),
                _ => None,
            };
            if handled.is_some() {
                app.sync_dirty();
                app.update_caret_status();
            }
            handled
        }),
    );

    for msg in [WM_KEYUP, WM_LBUTTONUP] {
        let weak = Rc::downgrade(app_rc);
        edit.win.register(
            msg,
            Rc::new(move |_| {
                if let Some(app) = weak.upgrade() {
                    if let Ok(app) = app.try_borrow() {
                        app.update_caret_status();
                    }
                }
                None
            }),
        );
    }

    let weak = Rc::downgrade(app_rc);
    edit.win.register(
        WM_PASTE,
        Rc::new(move |_| {
            let app = weak.upgrade()?;
            let Ok(mut app) = app.try_borrow_mut() else {
                return None;
            };
            if app.paste_clipboard() {
                app.sync_dirty();
                app.update_caret_status();
                Some(0)
            } else {
                None
            }
        }),
    );
}

// ── Command dispatch ───────────────────────────────────────────────────────────

impl App {
    fn command(&mut self, cmd: Command) {
        match cmd {
            Command::New => {
                if self.confirm_discard() {
                    self.new_document();
                }
            }
            Command::NewWindow => self.spawn_new_window(),
            Command::Open => {
                if self.confirm_discard() {
                    let title = self.bundle.s("open-title").to_owned();
                    let filter = self.bundle.s("file-filter").to_owned();
                    if let Some(path) = dialogs::show_open_dialog(self.main.hwnd(), &title, &filter)
                    {
                        self.open_path(path);
                    }
                }
            }
            Command::Save => {
                self.save(false);
            }
            Command::SaveAs => {
                self.save(true);
            }
            Command::Exit => {
                if self.confirm_discard() {
                    self.main.quit();
                }
            }

            Command::Undo => self.edit.undo(),
            Command::Cut => self.edit.cut(),
            Command::Copy => self.edit.copy(),
            Command::Paste => {
                if !self.paste_clipboard() {
                    self.edit.paste();
                }
            }
            Command::Delete => self.edit.delete_selection(),
            Command::Find => self.open_find_dialog(),
            Command::FindNext => self.find_next(false),
            Command::FindPrev => self.find_next(true),
            Command::Replace => self.open_replace_dialog(),
            Command::GoTo => self.open_goto_dialog(),
            Command::SelectAll => self.edit.select_all(),
            Command::TimeDate => {
                self.edit.replace_selection(&win32::local_timestamp());
                self.edit.scroll_to_caret();
            }

            Command::WordWrap => {
                self.settings.word_wrap = !self.settings.word_wrap;
                if let Err(err) = self.recreate_edit() {
                    warn!(error = %err, "word-wrap toggle failed");
                }
                menu::set_checked(
                    self.main.menu(),
                    Command::WordWrap.id(),
                    self.settings.word_wrap,
                );
            }
            Command::Font => {
                let dpi = dpi::get_for_window(self.main.hwnd());
                if let Some(chosen) = dialogs::show_font_dialog(self.main.hwnd(), &self.font, dpi) {
                    self.font = chosen;
                    if let Err(err) = self.apply_font() {
                        warn!(error = %err, "font change failed");
                    }
                }
            }
            Command::TabSize2 => self.set_tab_size(2),
            Command::TabSize4 => self.set_tab_size(4),
            Command::TabSize8 => self.set_tab_size(8),
            Command::UseSpaces => self.toggle_use_spaces(),

            Command::EncAnsi => self.set_encoding(Encoding::Ansi),
            Command::EncUtf8 => self.set_encoding(Encoding::Utf8),
            Command::EncUtf8Bom => self.set_encoding(Encoding::Utf8Bom),
            Command::EncUtf16Le => self.set_encoding(Encoding::Utf16Le),
            Command::EncUtf16Be => self.set_encoding(Encoding::Utf16Be),
            Command::EolCrlf => self.set_eol(EolMode::Crlf),
            Command::EolLf => self.set_eol(EolMode::Lf),
            Command::EolCr => self.set_eol(EolMode::Cr),

            Command::ZoomIn => self.set_zoom(self.zoom_pct + 10),
            Command::ZoomOut => self.set_zoom(self.zoom_pct.saturating_sub(10).max(10)),
            Command::ZoomReset => self.set_zoom(100),
            Command::StatusBar => {
                self.settings.status_bar = !self.settings.status_bar;
                self.status.set_visible(self.settings.status_bar);
                self.layout();
                menu::set_checked(
                    self.main.menu(),
                    Command::StatusBar.id(),
                    self.settings.status_bar,
                );
            }
            Command::DarkMode => {
                self.dark = !self.dark;
                self.settings.dark_mode = Some(self.dark);
                self.apply_theme();
            }

            Command::About => {
                let title = self.bundle.s("about-title").to_owned();
                let text = self.bundle.s("about-text").to_owned();
                self.message_box(&title, &text, BoxIcon::Info);
            }
        }
    }

    // ── Document lifecycle ─────────────────────────────────────────────────

    fn new_document(&mut self) {
        self.doc = DocumentState::new_untitled();
        let _ = self.edit.set_text("");
        self.edit.set_modified(false);
        self.refresh_title();
        self.update_status_doc();
        self.sync_doc_menu();
        self.update_caret_status();
    }

    fn spawn_new_window(&self) {
        match std::env::current_exe() {
            Ok(exe) => {
                if let Err(err) = std::process::Command::new(exe).spawn() {
                    warn!(error = %err, "could not spawn new window");
                }
            }
            Err(err) => warn!(error = %err, "current_exe unavailable"),
        }
    }

    fn open_path(&mut self, path: PathBuf) {
        match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > MAX_TEXT_BYTES => {
                let text = self
                    .bundle
                    .s("file-too-large")
                    .replace("{size}", &(meta.len() / 1024).to_string());
                let title = self.bundle.s("app-title").to_owned();
                self.message_box(&title, &text, BoxIcon::Warning);
                return;
            }
            Ok(_) => {}
            Err(err) => {
                self.flash_status(&format!("{err}: {}", path.display()));
                return;
            }
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                info!(path = %path.display(), bytes = bytes.len(), "opening file");
                let text = self.doc.load(path, &bytes);
                let _ = self.edit.set_text(&text);
                self.edit.set_selection(0, 0);
                self.edit.set_modified(false);
                self.refresh_title();
                self.update_status_doc();
                self.sync_doc_menu();
                self.update_caret_status();
            }
            Err(err) => self.flash_status(&format!("{err}: {}", path.display())),
        }
    }

    /// Save the document; `force_dialog` turns it into Save As.  Returns
    /// false when the user cancels or the write fails.
    fn save(&mut self, force_dialog: bool) -> bool {
        let path = match (&self.doc.path, force_dialog) {
            (Some(p), false) => p.clone(),
            _ => {
                let title = self.bundle.s("save-title").to_owned();
                let filter = self.bundle.s("file-filter").to_owned();
                let default_name = self.doc.display_name();
                match dialogs::show_save_dialog(self.main.hwnd(), &title, &filter, &default_name) {
                    Some(p) => p,
                    None => return false,
                }
            }
        };

        let text = self.edit.text();
        let bytes = self.doc.encode_for_disk(&text);
        match std::fs::write(&path, bytes) {
            Ok(()) => {
                info!(path = %path.display(), "saved");
                self.doc.path = Some(path);
                self.doc.set_saved(&text);
                self.refresh_title();
                true
            }
            Err(err) => {
                // Keep the dirty flag: the text on disk does not match.
                self.flash_status(&format!("{err}: {}", path.display()));
                self.doc.dirty = true;
                false
            }
        }
    }

    /// Prompt for unsaved changes.  Returns true when the caller may proceed
    /// (document clean, user saved, or user chose to discard).
    fn confirm_discard(&mut self) -> bool {
        self.sync_dirty();
        if !self.doc.dirty {
            return true;
        }
        let caption = self.bundle.s("app-title").to_owned();
        let text = self
            .bundle
            .s("save-changes")
            .replace("{name}", &self.doc.display_name());
        let save_label = self.bundle.s("btn-save").to_owned();
        let discard_label = self.bundle.s("btn-dont-save").to_owned();
        let cancel_label = self.bundle.s("btn-cancel").to_owned();
        let buttons = [
            (BTN_SAVE, save_label.as_str()),
            (BTN_DISCARD, discard_label.as_str()),
            (BTN_CANCEL, cancel_label.as_str()),
        ];
        let choice = mainwin::show_save_prompt(
            self.main.hinstance(),
            self.main.hwnd(),
            self.dark,
            &caption,
            &text,
            &buttons,
        );
        match choice {
            c if c == BTN_SAVE as isize => self.save(false),
            c if c == BTN_DISCARD as isize => true,
            _ => false,
        }
    }

    /// Re-derive the dirty flag from the current text and refresh the title
    /// when it flips.  Called after every change the edit control reports
    /// and again after command dispatch, because notifications that arrive
    /// while the app is already borrowed are skipped.
    fn sync_dirty(&mut self) {
        let text = self.edit.text();
        if self.doc.update_dirty(&text) {
            self.refresh_title();
        }
    }

    fn refresh_title(&self) {
        if let Err(err) = self.main.window().set_text(&self.doc.window_title()) {
            warn!(error = %err, "title update failed");
        }
    }

    // ── Clipboard ──────────────────────────────────────────────────────────

    /// Paste with line endings normalized to CRLF so a LF-only clipboard
    /// does not collapse into one visual line.  Returns false when the
    /// clipboard holds no text.
    fn paste_clipboard(&self) -> bool {
        match win32::clipboard_text(self.main.hwnd()) {
            Some(text) => {
                self.edit
                    .replace_selection(&document::normalize_to_crlf(&text));
                self.edit.scroll_to_caret();
                true
            }
            None => false,
        }
    }

    // ── Indentation keys ───────────────────────────────────────────────────

    /// Tab / Shift+Tab.  Multi-line selections indent or unindent as a
    /// block; otherwise soft tabs insert spaces up to the next stop.
    /// `None` falls through to the control's native tab insertion.
    fn on_tab_key(&mut self, shift: bool) -> Option<isize> {
        let (start, end) = self.edit.selection();
        let (start, end) = (start as usize, end as usize);
        let text = self.edit.text_utf16();
        let selected = utf16_slice(&text, start, end);
        let tab = self.settings.tab_size as usize;

        if selected.contains('\n') {
            let first_line = self.edit.line_from_char(start as i32);
            let block_start = self.edit.line_index(first_line).max(0) as usize;
            let block = utf16_slice(&text, block_start, end);
            let replaced = if shift {
                document::unindent_lines(&block, tab)
            } else {
                document::indent_lines(&block, self.settings.use_spaces, tab)
            };
            self.edit.set_selection(block_start as i32, end as i32);
            self.edit.replace_selection(&replaced);
            let new_end = block_start + replaced.encode_utf16().count();
            self.edit.set_selection(block_start as i32, new_end as i32);
            Some(0)
        } else if shift {
            // Nothing to unindent; swallow so the keypress does not insert.
            Some(0)
        } else if self.settings.use_spaces {
            let line = self.edit.line_from_char(start as i32);
            let line_start = self.edit.line_index(line).max(0) as usize;
            let col = start.saturating_sub(line_start);
            let count = document::spaces_to_next_stop(col, tab);
            self.edit.replace_selection(&" ".repeat(count));
            Some(0)
        } else {
            None
        }
    }

    /// Backspace over a run of indentation spaces removes a whole stop.
    fn on_backspace_key(&mut self) -> Option<isize> {
        if !self.settings.use_spaces {
            return None;
        }
        let (start, end) = self.edit.selection();
        if start != end {
            return None;
        }
        let caret = start as usize;
        let line = self.edit.line_from_char(caret as i32);
        let line_start = self.edit.line_index(line).max(0) as usize;
        let text = self.edit.text_utf16();
        let prefix = utf16_slice(&text, line_start, caret);
        let span = document::backspace_span(&prefix, self.settings.tab_size as usize)?;
        self.edit.set_selection((caret - span) as i32, caret as i32);
        self.edit.replace_selection("");
        Some(0)
    }

    fn toggle_use_spaces(&mut self) {
        self.settings.use_spaces = !self.settings.use_spaces;
        let text = self.edit.text();
        let converted = document::convert_indentation(
            &text,
            self.settings.use_spaces,
            self.settings.tab_size as usize,
        );
        if converted != text {
            let _ = self.edit.set_text(&converted);
        }
        menu::set_checked(
            self.main.menu(),
            Command::UseSpaces.id(),
            self.settings.use_spaces,
        );
    }

    fn set_tab_size(&mut self, tab_size: u32) {
        self.settings.tab_size = tab_size;
        self.edit.set_tab_size(tab_size);
        let selected = match tab_size {
            2 => Command::TabSize2,
            8 => Command::TabSize8,
            _ => Command::TabSize4,
        };
        menu::set_radio(
            self.main.menu(),
            Command::TabSize2.id(),
            Command::TabSize8.id(),
            selected.id(),
        );
    }

    // ── Encoding and line endings ─────────────────────────────────────────

    fn set_encoding(&mut self, encoding: Encoding) {
        self.doc.encoding = encoding;
        self.update_status_doc();
        self.sync_doc_menu();
    }

    fn set_eol(&mut self, eol: EolMode) {
        self.doc.eol = eol;
        self.update_status_doc();
        self.sync_doc_menu();
    }

    // ── Find / replace / go-to ────────────────────────────────────────────

    /// F3 / Shift+F3.  `reverse` flips the stored direction for one search.
    fn find_next(&mut self, reverse: bool) {
        if self.search.term.is_empty() {
            self.open_find_dialog();
            return;
        }
        let mut options = self.search.options;
        if reverse {
            options.search_up = !options.search_up;
        }
        let haystack = self.edit.text_utf16();
        let needle: Vec<u16> = self.search.term.encode_utf16().collect();
        let (sel_start, sel_end) = self.edit.selection();
        match search::find(
            &haystack,
            &needle,
            sel_start as usize,
            sel_end as usize,
            options,
        ) {
            FindOutcome::Found {
                start,
                end,
                wrapped,
            } => {
                self.edit.set_selection(start as i32, end as i32);
                self.edit.scroll_to_caret();
                if wrapped {
                    let key = if options.search_up {
                        "found-bottom"
                    } else {
                        "found-top"
                    };
                    let text = self.bundle.s(key).to_owned();
                    self.flash_status(&text);
                } else {
                    self.status.set_text(PART_MESSAGE, "");
                }
                self.update_caret_status();
            }
            FindOutcome::NotFound => {
                let title = self.bundle.s("app-title").to_owned();
                let text = self
                    .bundle
                    .s("cannot-find")
                    .replace("{term}", &self.search.term);
                self.message_box(&title, &text, BoxIcon::Info);
            }
        }
    }

    /// Replace the current match (if the selection is one) and move on.
    fn replace_one(&mut self) {
        if self.search.term.is_empty() {
            return;
        }
        let (sel_start, sel_end) = self.edit.selection();
        let text = self.edit.text_utf16();
        let selected = utf16_slice(&text, sel_start as usize, sel_end as usize);
        let matches = if self.search.options.match_case {
            selected == self.search.term
        } else {
            selected.to_lowercase() == self.search.term.to_lowercase()
        };
        if matches {
            let replacement = self.search.replace_with.clone();
            self.edit.replace_selection(&replacement);
        }
        self.find_next(false);
    }

    fn replace_all(&mut self) {
        if self.search.term.is_empty() {
            return;
        }
        let text = self.edit.text();
        match search::replace_all(
            &text,
            &self.search.term,
            &self.search.replace_with,
            self.search.options.match_case,
        ) {
            Some((replaced, count)) => {
                let _ = self.edit.set_text(&replaced);
                self.edit.set_selection(0, 0);
                self.sync_dirty();
                let message = self
                    .bundle
                    .s("replaced")
                    .replace("{count}", &count.to_string());
                self.flash_status(&message);
                self.update_caret_status();
            }
            None => {
                let title = self.bundle.s("app-title").to_owned();
                let text = self
                    .bundle
                    .s("cannot-find")
                    .replace("{term}", &self.search.term);
                self.message_box(&title, &text, BoxIcon::Info);
            }
        }
    }

    fn open_find_dialog(&mut self) {
        // Find and Replace share state; only one of the pair stays open.
        if let Some(d) = self.replace_dialog.take() {
            dialog::close(d.hwnd());
        }
        if let Some(d) = &self.find_dialog {
            window::Window::wrap(d.hwnd()).activate();
            dialog::focus_item(d.hwnd(), ID_FIND_TERM);
            return;
        }

        let weak = self.self_weak.clone();
        let on_command: dialog::CommandFn = Box::new(move |dlg, control, _code| {
            let Some(app) = weak.upgrade() else {
                return false;
            };
            let Ok(mut app) = app.try_borrow_mut() else {
                return false;
            };
            match i32::from(control) {
                ID_OK => {
                    app.read_find_fields(dlg, false);
                    app.find_next(false);
                    true
                }
                ID_CANCEL => {
                    app.close_find_dialogs();
                    true
                }
                _ => false,
            }
        });

        let desc = self.bundle.dialogs.find.clone();
        match self.show_search_dialog(&desc, on_command) {
            Ok(d) => {
                dialog::set_checked(d.hwnd(), ID_SEARCH_UP, self.search.options.search_up);
                self.find_dialog = Some(d);
            }
            Err(err) => warn!(error = %err, "find dialog failed"),
        }
    }

    fn open_replace_dialog(&mut self) {
        if let Some(d) = self.find_dialog.take() {
            dialog::close(d.hwnd());
        }
        if let Some(d) = &self.replace_dialog {
            window::Window::wrap(d.hwnd()).activate();
            dialog::focus_item(d.hwnd(), ID_FIND_TERM);
            return;
        }

        let weak = self.self_weak.clone();
        let on_command: dialog::CommandFn = Box::new(move |dlg, control, _code| {
            let Some(app) = weak.upgrade() else {
                return false;
            };
            let Ok(mut app) = app.try_borrow_mut() else {
                return false;
            };
            match i32::from(control) {
                ID_OK => {
                    app.read_find_fields(dlg, true);
                    app.find_next(false);
                    true
                }
                ID_REPLACE_ONE => {
                    app.read_find_fields(dlg, true);
                    app.replace_one();
                    true
                }
                ID_REPLACE_ALL => {
                    app.read_find_fields(dlg, true);
                    app.replace_all();
                    true
                }
                ID_CANCEL => {
                    app.close_find_dialogs();
                    true
                }
                _ => false,
            }
        });

        let desc = self.bundle.dialogs.replace.clone();
        match self.show_search_dialog(&desc, on_command) {
            Ok(d) => {
                dialog::set_item_text(d.hwnd(), ID_REPLACE_WITH, &self.search.replace_with);
                self.replace_dialog = Some(d);
            }
            Err(err) => warn!(error = %err, "replace dialog failed"),
        }
    }

    /// Shared modeless plumbing for find and replace: compile, show, seed
    /// the common fields, register with the dialog set.
    fn show_search_dialog(
        &self,
        desc: &DialogDesc,
        on_command: dialog::CommandFn,
    ) -> Result<Dialog> {
        let weak = self.self_weak.clone();
        let dialog_set = self.main.dialogs();
        let edit = self.edit.clone();
        let on_destroyed: dialog::DestroyedFn = Box::new(move |hwnd| {
            dialog_set.borrow_mut().remove(hwnd.0 as isize);
            if let Some(app) = weak.upgrade() {
                if let Ok(mut app) = app.try_borrow_mut() {
                    if app.find_dialog.as_ref().map(|d| d.hwnd().0) == Some(hwnd.0) {
                        app.find_dialog = None;
                    }
                    if app.replace_dialog.as_ref().map(|d| d.hwnd().0) == Some(hwnd.0) {
                        app.replace_dialog = None;
                    }
                }
            }
            edit.win.focus();
        });

        let config = DialogConfig {
            template: template::compile(desc),
            dark: self.dark,
            on_command,
            on_message: None,
            on_destroyed: Some(on_destroyed),
        };
        let d = dialog::show_modeless(self.main.hinstance(), self.main.hwnd(), config)?;
        dialog::set_item_text(d.hwnd(), ID_FIND_TERM, &self.search.term);
        dialog::set_checked(d.hwnd(), ID_MATCH_CASE, self.search.options.match_case);
        dialog::set_checked(d.hwnd(), ID_WRAP_AROUND, self.search.options.wrap_around);
        dialog::focus_item(d.hwnd(), ID_FIND_TERM);
        self.main.dialogs().borrow_mut().insert(d.hwnd().0 as isize);
        Ok(d)
    }

    /// Pull the search fields out of an open find/replace dialog.  The
    /// direction checkbox only exists on the find dialog and the
    /// replace-with field only on the replace dialog.
    fn read_find_fields(&mut self, dlg: windows::Win32::Foundation::HWND, replace: bool) {
        self.search.term = dialog::item_text(dlg, ID_FIND_TERM);
        self.search.options.match_case = dialog::is_checked(dlg, ID_MATCH_CASE);
        self.search.options.wrap_around = dialog::is_checked(dlg, ID_WRAP_AROUND);
        if replace {
            self.search.replace_with = dialog::item_text(dlg, ID_REPLACE_WITH);
        } else {
            self.search.options.search_up = dialog::is_checked(dlg, ID_SEARCH_UP);
        }
    }

    fn close_find_dialogs(&mut self) {
        if let Some(d) = self.find_dialog.take() {
            dialog::close(d.hwnd());
        }
        if let Some(d) = self.replace_dialog.take() {
            dialog::close(d.hwnd());
        }
        self.edit.win.focus();
    }

    fn open_goto_dialog(&mut self) {
        let line_count = self.edit.line_count().max(1) as usize;
        let current_line = self
            .edit
            .line_from_char(self.edit.selection().1 as i32)
            .max(0)
            + 1;
        let target = Rc::new(Cell::new(None::<usize>));

        let hinstance = self.main.hinstance();
        let dark = self.dark;
        let caption = self.bundle.s("app-title").to_owned();
        let beyond_text = self.bundle.s("goto-beyond").to_owned();
        let ok_label = self.bundle.s("btn-ok").to_owned();

        let chosen = Rc::clone(&target);
        let on_command: dialog::CommandFn = Box::new(move |dlg, control, _code| {
            match i32::from(control) {
                ID_OK => {
                    let input = dialog::item_text(dlg, ID_GOTO_LINE);
                    match search::resolve_goto(&input, line_count) {
                        GotoTarget::Line(line) => {
                            chosen.set(Some(line));
                            dialog::end(dlg, 1);
                        }
                        GotoTarget::BeyondEnd => {
                            mainwin::show_message_box(
                                hinstance,
                                dlg,
                                dark,
                                &caption,
                                &beyond_text,
                                &[(ID_OK as u16, ok_label.as_str())],
                                Some(BoxIcon::Warning),
                            );
                            dialog::focus_item(dlg, ID_GOTO_LINE);
                        }
                        GotoTarget::Invalid => dialog::end(dlg, 0),
                    }
                    true
                }
                ID_CANCEL => {
                    dialog::end(dlg, 0);
                    true
                }
                _ => false,
            }
        });

        let seed = current_line;
        let config = DialogConfig {
            template: template::compile(&self.bundle.dialogs.go_to),
            dark: self.dark,
            on_command,
            on_message: Some(Box::new(move |dlg, msg, _wparam, _lparam| {
                if msg == WM_INITDIALOG {
                    dialog::set_item_text(dlg, ID_GOTO_LINE, &seed.to_string());
                }
                None
            })),
            on_destroyed: None,
        };
        dialog::show_modal(self.main.hinstance(), self.main.hwnd(), config);

        if let Some(line) = target.get() {
            let pos = self.edit.line_index((line - 1) as i32);
            if pos >= 0 {
                self.edit.set_selection(pos, pos);
                self.edit.scroll_to_caret();
                self.update_caret_status();
            }
        }
        self.edit.win.focus();
    }

    // ── Appearance ────────────────────────────────────────────────────────

    fn apply_theme(&mut self) {
        let dark = self.dark;
        self.palette.dark.set(dark);
        let old = self.palette.edit_brush.replace(if dark {
            window::create_brush(theme::DARK_CONTROL_BG)
        } else {
            0
        });
        window::delete_brush(old);

        self.main.apply_theme(dark);
        self.edit.apply_theme(dark);
        self.status.apply_theme(dark);
        if let Some(d) = &self.find_dialog {
            d.set_dark(dark);
        }
        if let Some(d) = &self.replace_dialog {
            d.set_dark(dark);
        }
        menu::set_checked(self.main.menu(), Command::DarkMode.id(), dark);
        self.layout();
    }

    fn apply_font(&mut self) -> Result<()> {
        let dpi = dpi::get_for_window(self.main.hwnd());
        let font = window::create_font(
            &self.font.face,
            self.font.size.max(1) as u32,
            self.font.weight.max(1) as u32,
            self.font.italic,
            dpi,
            self.zoom_pct,
        )?;
        self.edit.win.set_font(font);
        if let Some(old) = self.hfont.replace(font) {
            window::delete_font(old);
        }
        self.status
            .set_text(PART_ZOOM, &format!("{}%", self.zoom_pct));
        Ok(())
    }

    fn set_zoom(&mut self, pct: u32) {
        if pct == self.zoom_pct {
            return;
        }
        self.zoom_pct = pct;
        if let Err(err) = self.apply_font() {
            warn!(error = %err, "zoom change failed");
        }
    }

    /// The word-wrap style bit cannot be flipped on a live edit control, so
    /// the control is torn down and rebuilt with text and selection carried
    /// over.
    fn recreate_edit(&mut self) -> Result<()> {
        let text = self.edit.text();
        let (sel_start, sel_end) = self.edit.selection();

        let replacement = Edit::create(
            self.main.hwnd(),
            self.main.hinstance(),
            self.settings.word_wrap,
        )?;
        let old = std::mem::replace(&mut self.edit, replacement);
        if let Err(err) = old.win.destroy() {
            debug!(error = %err, "old edit control teardown");
        }

        if let Some(font) = self.hfont {
            self.edit.win.set_font(font);
        }
        self.edit.set_tab_size(self.settings.tab_size);
        self.edit.apply_theme(self.dark);
        self.edit.set_text(&text)?;
        self.edit.set_selection(sel_start as i32, sel_end as i32);
        self.edit.set_modified(false);

        if let Some(app) = self.self_weak.upgrade() {
            install_edit_handlers(&app, &self.edit);
        }
        self.layout();
        self.edit.win.focus();
        Ok(())
    }

    fn layout(&self) {
        let rc = self.main.window().client_rect();
        let width = rc.right - rc.left;
        let height = rc.bottom - rc.top;
        let status_height = if self.settings.status_bar {
            self.status.on_parent_resize(width);
            self.status.height()
        } else {
            0
        };
        self.edit.win.set_bounds(0, 0, width, height - status_height);
    }

    // ── Status bar ────────────────────────────────────────────────────────

    fn update_caret_status(&self) {
        let (_, caret) = self.edit.selection();
        let line = self.edit.line_from_char(caret as i32).max(0);
        let col = caret as i32 - self.edit.line_index(line) + 1;
        let text = self
            .bundle
            .s("ln-col")
            .replace("{line}", &(line + 1).to_string())
            .replace("{col}", &col.max(1).to_string());
        self.status.set_text(PART_CARET, &text);
    }

    fn update_status_doc(&self) {
        self.status.set_text(PART_EOL, self.doc.eol.as_str());
        self.status
            .set_text(PART_ENCODING, self.doc.encoding.as_str());
    }

    /// Show a transient message in the leftmost status part.
    fn flash_status(&self, text: &str) {
        self.status.set_text(PART_MESSAGE, text);
        let weak = self.self_weak.clone();
        self.main.set_timer(
            TIMER_STATUS_CLEAR,
            STATUS_FLASH_MS,
            true,
            Rc::new(move || {
                if let Some(app) = weak.upgrade() {
                    if let Ok(app) = app.try_borrow() {
                        app.status.set_text(PART_MESSAGE, "");
                    }
                }
            }),
        );
    }

    // ── Menu state ────────────────────────────────────────────────────────

    fn sync_menu(&self) {
        let m = self.main.menu();
        menu::set_checked(m, Command::WordWrap.id(), self.settings.word_wrap);
        menu::set_checked(m, Command::UseSpaces.id(), self.settings.use_spaces);
        menu::set_checked(m, Command::StatusBar.id(), self.settings.status_bar);
        menu::set_checked(m, Command::DarkMode.id(), self.dark);
        let tab = match self.settings.tab_size {
            2 => Command::TabSize2,
            8 => Command::TabSize8,
            _ => Command::TabSize4,
        };
        menu::set_radio(m, Command::TabSize2.id(), Command::TabSize8.id(), tab.id());
        self.sync_doc_menu();
    }

    fn sync_doc_menu(&self) {
        let m = self.main.menu();
        let enc = match self.doc.encoding {
            Encoding::Ansi => Command::EncAnsi,
            Encoding::Utf8 => Command::EncUtf8,
            Encoding::Utf8Bom => Command::EncUtf8Bom,
            Encoding::Utf16Le => Command::EncUtf16Le,
            Encoding::Utf16Be => Command::EncUtf16Be,
        };
        menu::set_radio(m, Command::EncAnsi.id(), Command::EncUtf16Be.id(), enc.id());
        let eol = match self.doc.eol {
            EolMode::Crlf => Command::EolCrlf,
            EolMode::Lf => Command::EolLf,
            EolMode::Cr => Command::EolCr,
        };
        menu::set_radio(m, Command::EolCrlf.id(), Command::EolCr.id(), eol.id());
    }

    // ── Message boxes ─────────────────────────────────────────────────────

    fn message_box(&self, caption: &str, text: &str, icon: BoxIcon) {
        let ok_label = self.bundle.s("btn-ok").to_owned();
        mainwin::show_message_box(
            self.main.hinstance(),
            self.main.hwnd(),
            self.dark,
            caption,
            text,
            &[(ID_OK as u16, ok_label.as_str())],
            Some(icon),
        );
    }

    // ── Shutdown ──────────────────────────────────────────────────────────

    fn snapshot_settings(&self) -> Settings {
        let mut settings = self.settings.clone();
        let (x, y, width, height) = self.main.window_rect();
        settings.window = WindowRect {
            x,
            y,
            width,
            height,
        };
        settings.font_face = self.font.face.clone();
        settings.font_size = self.font.size;
        settings.font_weight = self.font.weight;
        settings.font_italic = self.font.italic;
        settings.search_term = self.search.term.clone();
        settings.replace_with = self.search.replace_with.clone();
        settings.match_case = self.search.options.match_case;
        settings.wrap_around = self.search.options.wrap_around;
        settings.search_up = self.search.options.search_up;
        settings
    }

    fn teardown(&mut self) {
        self.close_find_dialogs();
        if let Some(font) = self.hfont.take() {
            window::delete_font(font);
        }
        window::delete_brush(self.palette.edit_brush.replace(0));
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────────

/// Lossy substring of a UTF-16 buffer by code-unit offsets, clamped to the
/// buffer end.
fn utf16_slice(text: &[u16], start: usize, end: usize) -> String {
    let start = start.min(text.len());
    let end = end.clamp(start, text.len());
    String::from_utf16_lossy(&text[start..end])
}
