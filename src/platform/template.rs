// ── Dialog-template compiler ──────────────────────────────────────────────────
//
// Builds an in-memory DLGTEMPLATEEX binary blob — header plus one record per
// control — so dialogs are created from declarative descriptions without a
// compiled resource file.  The format is parsed by the OS at fixed offsets
// plus walked string lengths, so the zero-padding of every variable-length
// section to a 4-byte boundary is a hard correctness requirement.
//
// Pure bytes in, pure bytes out: the Win32 style words are mirrored as local
// constants so the layout invariants are testable on any host.  Append order
// of controls is creation order is tab order.

use crate::resources::{CtrlClass, DialogDesc};

// ── Style words ───────────────────────────────────────────────────────────────
//
// Mirrors of the Win32 constants the descriptions may reference.  Numeric
// fields are caller-supplied verbatim; nothing here validates combinations —
// a malformed style surfaces when the OS later refuses to create the dialog.

pub(crate) const WS_POPUP: u32 = 0x8000_0000;
pub(crate) const WS_CHILD: u32 = 0x4000_0000;
pub(crate) const WS_VISIBLE: u32 = 0x1000_0000;
pub(crate) const WS_CLIPSIBLINGS: u32 = 0x0400_0000;
pub(crate) const WS_CAPTION: u32 = 0x00C0_0000;
pub(crate) const WS_BORDER: u32 = 0x0080_0000;
pub(crate) const WS_SYSMENU: u32 = 0x0008_0000;
pub(crate) const WS_GROUP: u32 = 0x0002_0000;
pub(crate) const WS_TABSTOP: u32 = 0x0001_0000;

pub(crate) const DS_SETFONT: u32 = 0x0040;
pub(crate) const DS_MODALFRAME: u32 = 0x0080;
pub(crate) const DS_CENTER: u32 = 0x0800;

pub(crate) const BS_DEFPUSHBUTTON: u32 = 0x0001;
pub(crate) const BS_AUTOCHECKBOX: u32 = 0x0003;
pub(crate) const BS_GROUPBOX: u32 = 0x0007;

pub(crate) const ES_AUTOHSCROLL: u32 = 0x0080;
pub(crate) const ES_NUMBER: u32 = 0x2000;

pub(crate) const SS_ICON: u32 = 0x0003;
pub(crate) const SS_NOPREFIX: u32 = 0x0080;

pub(crate) const WS_EX_DLGMODALFRAME: u32 = 0x0001;
pub(crate) const WS_EX_NOPARENTNOTIFY: u32 = 0x0004;
pub(crate) const WS_EX_WINDOWEDGE: u32 = 0x0100;
pub(crate) const WS_EX_CLIENTEDGE: u32 = 0x0200;
pub(crate) const WS_EX_CONTROLPARENT: u32 = 0x0001_0000;

/// The frame style shared by every application dialog.
pub(crate) const DIALOG_STYLE: u32 =
    WS_CAPTION | WS_POPUP | WS_VISIBLE | WS_CLIPSIBLINGS | WS_SYSMENU | DS_MODALFRAME | DS_CENTER;

/// The extended frame style shared by every application dialog.
pub(crate) const DIALOG_EXSTYLE: u32 =
    WS_EX_CONTROLPARENT | WS_EX_DLGMODALFRAME | WS_EX_WINDOWEDGE;

/// Resolve a style name from a dialog description to its bit value.
pub(crate) fn style_bits(name: &str) -> Option<u32> {
    Some(match name {
        "tabstop" => WS_TABSTOP,
        "group" => WS_GROUP,
        "border" => WS_BORDER,
        "pushbutton" => 0, // BS_PUSHBUTTON is zero; listed for readability
        "defpushbutton" => BS_DEFPUSHBUTTON,
        "autocheckbox" => BS_AUTOCHECKBOX,
        "groupbox" => BS_GROUPBOX,
        "autohscroll" => ES_AUTOHSCROLL,
        "number" => ES_NUMBER,
        "icon" => SS_ICON,
        "noprefix" => SS_NOPREFIX,
        _ => return None,
    })
}

/// Resolve an extended-style name from a dialog description.
pub(crate) fn exstyle_bits(name: &str) -> Option<u32> {
    Some(match name {
        "clientedge" => WS_EX_CLIENTEDGE,
        "noparentnotify" => WS_EX_NOPARENTNOTIFY,
        _ => return None,
    })
}

// ── Control roles ─────────────────────────────────────────────────────────────

/// Semantic role of a control, derived from class + style bits.  The dialog
/// controller walks this side list after creation to apply the dark-mode
/// fix-ups each kind of control needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlRole {
    PushButton,
    CheckBox,
    GroupBox,
    Edit,
    Label,
    Icon,
    ListBox,
    ScrollBar,
    ComboBox,
}

fn role_for(class: CtrlClass, style: u32) -> ControlRole {
    match class {
        CtrlClass::Button => match style & 0xF {
            BS_AUTOCHECKBOX | 0x0002 /* BS_CHECKBOX */ => ControlRole::CheckBox,
            BS_GROUPBOX => ControlRole::GroupBox,
            _ => ControlRole::PushButton,
        },
        CtrlClass::Edit => ControlRole::Edit,
        CtrlClass::Static => {
            if style & 0xF == SS_ICON {
                ControlRole::Icon
            } else {
                ControlRole::Label
            }
        }
        CtrlClass::ListBox => ControlRole::ListBox,
        CtrlClass::ScrollBar => ControlRole::ScrollBar,
        CtrlClass::ComboBox => ControlRole::ComboBox,
    }
}

/// The registered window-class atom for each stock control class.
fn class_atom(class: CtrlClass) -> u16 {
    match class {
        CtrlClass::Button => 0x0080,
        CtrlClass::Edit => 0x0081,
        CtrlClass::Static => 0x0082,
        CtrlClass::ListBox => 0x0083,
        CtrlClass::ScrollBar => 0x0084,
        CtrlClass::ComboBox => 0x0085,
    }
}

// ── Captions ──────────────────────────────────────────────────────────────────

/// A control caption: literal text, or an ordinal referencing a resource.
/// The two are distinguished by this type, not a separate flag, mirroring
/// the wire format (a 0xFFFF marker word introduces an ordinal).
#[derive(Debug, Clone)]
pub(crate) enum Caption {
    Text(String),
    Ordinal(u16),
}

impl From<&str> for Caption {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

struct ItemDesc {
    class: CtrlClass,
    caption: Caption,
    rect: [i32; 4],
    id: i32,
    style: u32,
    exstyle: u32,
}

/// Collects control records, then emits the final template blob.
pub(crate) struct TemplateBuilder {
    items: Vec<ItemDesc>,
    next_auto_id: i32,
}

/// First id handed out when a control is added with `id = -1`.
const AUTO_ID_BASE: i32 = 2000;

impl TemplateBuilder {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            next_auto_id: AUTO_ID_BASE,
        }
    }

    /// Append one control record.  `id = -1` assigns the next internal id;
    /// the assigned id is returned either way.  Append order is tab order.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add_control(
        &mut self,
        class: CtrlClass,
        caption: Caption,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        id: i32,
        style: u32,
        exstyle: u32,
    ) -> i32 {
        let id = if id < 0 {
            let assigned = self.next_auto_id;
            self.next_auto_id += 1;
            assigned
        } else {
            id
        };
        self.items.push(ItemDesc {
            class,
            caption,
            rect: [x, y, w, h],
            id,
            style,
            exstyle,
        });
        id
    }

    /// Emit the DLGTEMPLATEEX blob.
    ///
    /// `style` receives `DS_SETFONT` implicitly because a font record is
    /// always written; each item receives `WS_CHILD | WS_VISIBLE`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        title: &str,
        font_face: &str,
        font_size: i32,
        style: u32,
        exstyle: u32,
    ) -> DialogTemplate {
        let mut buf = Vec::with_capacity(256);

        // ── Header ────────────────────────────────────────────────────────────
        push_u16(&mut buf, 1); // dlgVer
        push_u16(&mut buf, 0xFFFF); // signature: extended template
        push_u32(&mut buf, 0); // helpID
        push_u32(&mut buf, exstyle);
        push_u32(&mut buf, style | DS_SETFONT);
        push_u16(&mut buf, self.items.len() as u16);
        push_i16(&mut buf, x);
        push_i16(&mut buf, y);
        push_i16(&mut buf, w);
        push_i16(&mut buf, h);
        push_u16(&mut buf, 0); // menu: none
        push_u16(&mut buf, 0); // window class: default dialog class
        push_wsz(&mut buf, title);

        // Font record (present because of DS_SETFONT).
        push_u16(&mut buf, font_size as u16); // point size
        push_u16(&mut buf, 400); // weight: FW_NORMAL
        buf.push(0); // italic
        buf.push(1); // charset: DEFAULT_CHARSET
        push_wsz(&mut buf, font_face);

        // ── Items ─────────────────────────────────────────────────────────────
        let mut roles = Vec::with_capacity(self.items.len());
        let mut item_offsets = Vec::with_capacity(self.items.len());

        for item in &self.items {
            pad4(&mut buf); // each item starts DWORD-aligned
            item_offsets.push(buf.len());

            push_u32(&mut buf, 0); // helpID
            push_u32(&mut buf, item.exstyle);
            push_u32(&mut buf, item.style | WS_CHILD | WS_VISIBLE);
            push_i16(&mut buf, item.rect[0]);
            push_i16(&mut buf, item.rect[1]);
            push_i16(&mut buf, item.rect[2]);
            push_i16(&mut buf, item.rect[3]);
            push_u32(&mut buf, item.id as u32);

            // Class: 0xFFFF marker + atom.
            push_u16(&mut buf, 0xFFFF);
            push_u16(&mut buf, class_atom(item.class));

            // Caption: literal text, or 0xFFFF marker + ordinal.
            match &item.caption {
                Caption::Text(s) => push_wsz(&mut buf, s),
                Caption::Ordinal(ord) => {
                    push_u16(&mut buf, 0xFFFF);
                    push_u16(&mut buf, *ord);
                }
            }

            push_u16(&mut buf, 0); // no creation data

            roles.push((item.id, role_for(item.class, item.style)));
        }

        pad4(&mut buf); // total length must be a DWORD multiple

        DialogTemplate {
            bytes: buf,
            roles,
            item_offsets,
        }
    }
}

/// The finished template: an immutable, relocatable blob plus the side data
/// the dialog controller needs after creation.
#[derive(Debug, Clone)]
pub(crate) struct DialogTemplate {
    /// The DLGTEMPLATEEX bytes, DWORD-aligned throughout.
    pub(crate) bytes: Vec<u8>,
    /// (control id, semantic role) in creation order.
    pub(crate) roles: Vec<(i32, ControlRole)>,
    /// Byte offset of each item record, in creation order.
    pub(crate) item_offsets: Vec<usize>,
}

// ── Description compiler ──────────────────────────────────────────────────────

/// Compile a declarative dialog description (from a resource bundle) into a
/// template blob. Unknown style names are logged and skipped so an edited
/// resource file degrades instead of failing outright.
pub(crate) fn compile(desc: &DialogDesc) -> DialogTemplate {
    let mut builder = TemplateBuilder::new();
    for control in &desc.controls {
        let mut style = 0u32;
        for name in &control.styles {
            match style_bits(name) {
                Some(bits) => style |= bits,
                None => tracing::warn!(style = %name, "unknown control style in dialog resource"),
            }
        }
        let mut exstyle = 0u32;
        for name in &control.exstyles {
            match exstyle_bits(name) {
                Some(bits) => exstyle |= bits,
                None => tracing::warn!(style = %name, "unknown extended style in dialog resource"),
            }
        }
        builder.add_control(
            control.class,
            Caption::from(control.caption.as_str()),
            control.rect[0],
            control.rect[1],
            control.rect[2],
            control.rect[3],
            control.id,
            style,
            exstyle,
        );
    }
    builder.build(
        0,
        0,
        desc.width,
        desc.height,
        &desc.title,
        &desc.font_face,
        desc.font_size,
        DIALOG_STYLE,
        DIALOG_EXSTYLE,
    )
}

// ── Byte writers ──────────────────────────────────────────────────────────────

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_i16(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&(v as i16).to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Null-terminated UTF-16LE string.
fn push_wsz(buf: &mut Vec<u8>, s: &str) {
    for unit in s.encode_utf16() {
        push_u16(buf, unit);
    }
    push_u16(buf, 0);
}

/// Zero-pad to the next DWORD boundary.
fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest fixed part of an item record: 3 DWORDs + 4 WORDs + DWORD +
    /// class marker/atom + empty caption + creation-data word.
    const ITEM_FIXED_MIN: usize = 4 + 4 + 4 + 8 + 4 + 4 + 2 + 2;

    fn sample(captions: &[&str]) -> DialogTemplate {
        let mut b = TemplateBuilder::new();
        for (i, cap) in captions.iter().enumerate() {
            b.add_control(
                CtrlClass::Button,
                Caption::from(*cap),
                7,
                7 + 16 * i as i32,
                50,
                14,
                -1,
                WS_TABSTOP,
                0,
            );
        }
        b.build(0, 0, 200, 100, "Sample", "Segoe UI", 9, DIALOG_STYLE, DIALOG_EXSTYLE)
    }

    #[test]
    fn total_length_is_dword_multiple() {
        // Odd- and even-length captions push the writer through every
        // padding case.
        for caps in [
            &["a"][..],
            &["ab"][..],
            &["abc", "x"][..],
            &["", "odd1", "even"][..],
        ] {
            let t = sample(caps);
            assert_eq!(t.bytes.len() % 4, 0, "captions {caps:?}");
        }
    }

    #[test]
    fn item_offsets_are_monotonic_and_aligned() {
        let t = sample(&["Find Next", "Cancel", "Match case"]);
        assert_eq!(t.item_offsets.len(), 3);
        for pair in t.item_offsets.windows(2) {
            assert!(pair[1] > pair[0], "offsets must increase");
            assert!(
                pair[1] - pair[0] >= ITEM_FIXED_MIN,
                "records must not overlap"
            );
        }
        for off in &t.item_offsets {
            assert_eq!(off % 4, 0, "each record starts DWORD-aligned");
            assert!(off + ITEM_FIXED_MIN <= t.bytes.len());
        }
    }

    #[test]
    fn header_marks_extended_template() {
        let t = sample(&["x"]);
        assert_eq!(&t.bytes[0..2], &1u16.to_le_bytes(), "dlgVer");
        assert_eq!(&t.bytes[2..4], &0xFFFFu16.to_le_bytes(), "signature");
        // cDlgItems sits after dlgVer/signature/helpID/exStyle/style.
        assert_eq!(&t.bytes[16..18], &1u16.to_le_bytes());
    }

    #[test]
    fn item_count_matches() {
        let t = sample(&["a", "b", "c", "d"]);
        assert_eq!(&t.bytes[16..18], &4u16.to_le_bytes());
        assert_eq!(t.item_offsets.len(), 4);
        assert_eq!(t.roles.len(), 4);
    }

    #[test]
    fn auto_ids_are_monotonic_and_explicit_ids_kept() {
        let mut b = TemplateBuilder::new();
        let a = b.add_control(CtrlClass::Edit, "".into(), 0, 0, 10, 10, -1, 0, 0);
        let kept = b.add_control(CtrlClass::Button, "OK".into(), 0, 0, 10, 10, 1, 0, 0);
        let c = b.add_control(CtrlClass::Static, "t".into(), 0, 0, 10, 10, -1, 0, 0);
        assert_eq!(kept, 1);
        assert!(c > a, "auto ids increase");
        assert!(a >= AUTO_ID_BASE);
    }

    #[test]
    fn roles_follow_class_and_style() {
        let mut b = TemplateBuilder::new();
        b.add_control(CtrlClass::Button, "chk".into(), 0, 0, 10, 10, 10, BS_AUTOCHECKBOX, 0);
        b.add_control(CtrlClass::Button, "ok".into(), 0, 0, 10, 10, 11, BS_DEFPUSHBUTTON, 0);
        b.add_control(CtrlClass::Button, "grp".into(), 0, 0, 10, 10, 12, BS_GROUPBOX, 0);
        b.add_control(CtrlClass::Static, "lbl".into(), 0, 0, 10, 10, 13, 0, 0);
        b.add_control(CtrlClass::Static, "".into(), 0, 0, 10, 10, 14, SS_ICON, 0);
        b.add_control(CtrlClass::Edit, "".into(), 0, 0, 10, 10, 15, ES_AUTOHSCROLL, 0);
        let t = b.build(0, 0, 100, 100, "", "Segoe UI", 9, DIALOG_STYLE, 0);

        let expect = [
            (10, ControlRole::CheckBox),
            (11, ControlRole::PushButton),
            (12, ControlRole::GroupBox),
            (13, ControlRole::Label),
            (14, ControlRole::Icon),
            (15, ControlRole::Edit),
        ];
        assert_eq!(t.roles, expect);
    }

    #[test]
    fn ordinal_caption_writes_marker_word() {
        let mut b = TemplateBuilder::new();
        b.add_control(CtrlClass::Static, Caption::Ordinal(77), 0, 0, 10, 10, 1, 0, 0);
        let t = b.build(0, 0, 100, 100, "", "Segoe UI", 9, DIALOG_STYLE, 0);

        // The caption follows the class marker/atom inside the record:
        // fixed fields (24 bytes) + class marker (4 bytes) = caption start.
        let rec = t.item_offsets[0];
        let cap = rec + 24 + 4;
        assert_eq!(&t.bytes[cap..cap + 2], &0xFFFFu16.to_le_bytes());
        assert_eq!(&t.bytes[cap + 2..cap + 4], &77u16.to_le_bytes());
    }

    #[test]
    fn style_names_resolve() {
        assert_eq!(style_bits("tabstop"), Some(WS_TABSTOP));
        assert_eq!(style_bits("autocheckbox"), Some(BS_AUTOCHECKBOX));
        assert_eq!(style_bits("number"), Some(ES_NUMBER));
        assert_eq!(style_bits("no-such-style"), None);
        assert_eq!(exstyle_bits("clientedge"), Some(WS_EX_CLIENTEDGE));
        assert_eq!(exstyle_bits("tabstop"), None);
    }

    #[test]
    fn items_carry_child_and_visible() {
        let t = sample(&["x"]);
        let rec = t.item_offsets[0];
        // style is the third DWORD of the record.
        let style = u32::from_le_bytes(t.bytes[rec + 8..rec + 12].try_into().expect("style"));
        assert_ne!(style & WS_CHILD, 0);
        assert_ne!(style & WS_VISIBLE, 0);
    }

    #[test]
    fn bundled_dialogs_compile() {
        let bundle = crate::resources::load("en-US").expect("bundle");

        let find = compile(&bundle.dialogs.find);
        assert!(find.bytes.len() % 4 == 0);
        assert!(find.roles.contains(&(1001, ControlRole::Edit)));
        assert!(find.roles.contains(&(1002, ControlRole::CheckBox)));
        assert!(find.roles.contains(&(1, ControlRole::PushButton)));

        let replace = compile(&bundle.dialogs.replace);
        assert!(replace.roles.contains(&(1005, ControlRole::Edit)));
        assert!(replace.roles.contains(&(1007, ControlRole::PushButton)));

        let goto = compile(&bundle.dialogs.go_to);
        assert!(goto.roles.contains(&(1008, ControlRole::Edit)));
    }
}
