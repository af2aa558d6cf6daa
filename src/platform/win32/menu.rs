// ── Menu bar and accelerators ──────────────────────────────────────────────────
//
// Builds the native menu bar from the declarative menu description and
// derives the accelerator table from the `\t`-suffixed shortcut text of each
// item, so a shortcut can never drift out of sync with its caption.

#![allow(unsafe_code)]

use windows::{
    core::PCWSTR,
    Win32::UI::{
        Input::KeyboardAndMouse::{
            VK_DELETE, VK_ESCAPE, VK_F1, VK_OEM_MINUS, VK_OEM_PLUS, VK_RETURN, VK_TAB,
        },
        WindowsAndMessaging::{
            AppendMenuW, CheckMenuItem, CheckMenuRadioItem, CreateAcceleratorTableW, CreateMenu,
            CreatePopupMenu, DestroyAcceleratorTable, EnableMenuItem, ACCEL, ACCEL_VIRT_FLAGS,
            HACCEL, HMENU, MF_BYCOMMAND, MF_CHECKED, MF_ENABLED, MF_GRAYED, MF_POPUP,
            MF_SEPARATOR, MF_STRING, MF_UNCHECKED,
        },
    },
};

use super::wide;
use crate::error::Result;
use crate::resources::MenuNode;

// ── Virtual-key accelerator flags ──────────────────────────────────────────────

const FVIRTKEY: u8 = 0x01;
const FSHIFT: u8 = 0x04;
const FCONTROL: u8 = 0x08;
const FALT: u8 = 0x10;

// ── Building ───────────────────────────────────────────────────────────────────

/// Build the menu bar and collect the accelerator entries found in item
/// captions.  The returned HMENU is owned by the caller until attached to a
/// window via `SetMenu`, after which the window owns it.
pub(crate) fn build_menu_bar(items: &[MenuNode]) -> Result<(HMENU, Vec<ACCEL>)> {
    // SAFETY: CreateMenu has no preconditions; failures propagate via `?`.
    let bar = unsafe { CreateMenu() }?;
    let mut accels = Vec::new();
    for node in items {
        append_node(bar, node, &mut accels)?;
    }
    Ok((bar, accels))
}

fn append_node(parent: HMENU, node: &MenuNode, accels: &mut Vec<ACCEL>) -> Result<()> {
    if node.separator {
        // SAFETY: parent is a live menu handle created in this module.
        unsafe { AppendMenuW(parent, MF_SEPARATOR, 0, PCWSTR::null()) }?;
        return Ok(());
    }

    let caption = wide(&node.caption);

    if !node.items.is_empty() {
        // SAFETY: popup creation and attachment use handles created here;
        // MF_POPUP passes the child HMENU through the id parameter.
        let popup = unsafe { CreatePopupMenu() }?;
        for child in &node.items {
            append_node(popup, child, accels)?;
        }
        unsafe { AppendMenuW(parent, MF_POPUP, popup.0 as usize, PCWSTR(caption.as_ptr())) }?;
        return Ok(());
    }

    if let Some(command) = node.command {
        if let Some((flags, key)) = node
            .caption
            .split_once('\t')
            .and_then(|(_, shortcut)| parse_shortcut(shortcut))
        {
            accels.push(ACCEL {
                fVirt: ACCEL_VIRT_FLAGS(flags),
                key,
                cmd: command.id(),
            });
        }
        // SAFETY: caption outlives the call; command ids fit in the id word.
        unsafe {
            AppendMenuW(
                parent,
                MF_STRING,
                command.id() as usize,
                PCWSTR(caption.as_ptr()),
            )
        }?;
    }
    Ok(())
}

/// Build the accelerator table.  An empty list yields `None` rather than an
/// empty table.
pub(crate) fn build_accelerators(accels: &[ACCEL]) -> Result<Option<HACCEL>> {
    if accels.is_empty() {
        return Ok(None);
    }
    // SAFETY: the slice is non-empty and fully initialised.
    let table = unsafe { CreateAcceleratorTableW(accels) }?;
    Ok(Some(table))
}

pub(crate) fn destroy_accelerators(table: HACCEL) {
    // SAFETY: table came from CreateAcceleratorTableW and is destroyed once.
    unsafe {
        let _ = DestroyAcceleratorTable(table);
    }
}

// ── Check / enable state ───────────────────────────────────────────────────────

pub(crate) fn set_checked(menu: HMENU, command_id: u16, checked: bool) {
    let flag = if checked { MF_CHECKED } else { MF_UNCHECKED };
    // SAFETY: unknown ids are ignored by CheckMenuItem (returns -1).
    unsafe {
        let _ = CheckMenuItem(menu, command_id as u32, (MF_BYCOMMAND | flag).0);
    }
}

/// Place the radio checkmark on `selected` within the `first..=last` id run.
pub(crate) fn set_radio(menu: HMENU, first: u16, last: u16, selected: u16) {
    // SAFETY: ids outside the menu make the call fail, which is ignored.
    unsafe {
        let _ = CheckMenuRadioItem(
            menu,
            first as u32,
            last as u32,
            selected as u32,
            MF_BYCOMMAND.0,
        );
    }
}

pub(crate) fn set_enabled(menu: HMENU, command_id: u16, enabled: bool) {
    let flag = if enabled { MF_ENABLED } else { MF_GRAYED };
    // SAFETY: same tolerance for unknown ids as set_checked.
    unsafe {
        let _ = EnableMenuItem(menu, command_id as u32, MF_BYCOMMAND | flag);
    }
}

// ── Shortcut parsing ───────────────────────────────────────────────────────────

/// Parse shortcut text like `Ctrl+Shift+S` or `F3` into accelerator flags
/// and a virtual-key code.  Returns `None` for text that is not a valid
/// shortcut, which simply leaves the item without an accelerator.
pub(crate) fn parse_shortcut(text: &str) -> Option<(u8, u16)> {
    let mut flags = FVIRTKEY;
    let mut key = None;

    for part in text.split('+') {
        match part {
            "Ctrl" => flags |= FCONTROL,
            "Shift" => flags |= FSHIFT,
            "Alt" => flags |= FALT,
            other => {
                if key.is_some() {
                    return None;
                }
                key = Some(parse_key(other)?);
            }
        }
    }
    key.map(|k| (flags, k))
}

fn parse_key(name: &str) -> Option<u16> {
    if name.len() == 1 {
        let ch = name.chars().next()?;
        if ch.is_ascii_alphanumeric() {
            return Some(ch.to_ascii_uppercase() as u16);
        }
        return None;
    }
    match name {
        "Del" | "Delete" => Some(VK_DELETE.0),
        "Plus" => Some(VK_OEM_PLUS.0),
        "Minus" => Some(VK_OEM_MINUS.0),
        "Enter" => Some(VK_RETURN.0),
        "Esc" => Some(VK_ESCAPE.0),
        "Tab" => Some(VK_TAB.0),
        _ => {
            let n: u16 = name.strip_prefix('F')?.parse().ok()?;
            if (1..=24).contains(&n) {
                Some(VK_F1.0 + n - 1)
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_combinations() {
        assert_eq!(parse_shortcut("Ctrl+N"), Some((FVIRTKEY | FCONTROL, b'N' as u16)));
        assert_eq!(
            parse_shortcut("Ctrl+Shift+S"),
            Some((FVIRTKEY | FCONTROL | FSHIFT, b'S' as u16))
        );
        assert_eq!(parse_shortcut("Ctrl+0"), Some((FVIRTKEY | FCONTROL, b'0' as u16)));
    }

    #[test]
    fn parses_named_and_function_keys() {
        assert_eq!(parse_shortcut("F3"), Some((FVIRTKEY, VK_F1.0 + 2)));
        assert_eq!(parse_shortcut("Shift+F3"), Some((FVIRTKEY | FSHIFT, VK_F1.0 + 2)));
        assert_eq!(parse_shortcut("Del"), Some((FVIRTKEY, VK_DELETE.0)));
        assert_eq!(
            parse_shortcut("Ctrl+Plus"),
            Some((FVIRTKEY | FCONTROL, VK_OEM_PLUS.0))
        );
    }

    #[test]
    fn rejects_malformed_shortcuts() {
        assert_eq!(parse_shortcut("Ctrl+"), None);
        assert_eq!(parse_shortcut("Ctrl"), None);
        assert_eq!(parse_shortcut("Ctrl+A+B"), None);
        assert_eq!(parse_shortcut("F99"), None);
        assert_eq!(parse_shortcut(""), None);
    }
}
