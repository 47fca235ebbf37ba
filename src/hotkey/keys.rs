//! Key name resolution and normalization
//!
//! Captured keys and presets are stored as plain lowercase names
//! ("space", "f6", "a"). Preset files written by older builds may
//! contain pynput-style names ("Key.space"), so every name read from
//! disk or from the hook goes through [`normalize`] first.

use rdev::Key;

/// Prefix found on special-key names in legacy preset files.
const LEGACY_PREFIX: &str = "Key.";

/// Strip the legacy `Key.` prefix from a key name.
///
/// Names without the prefix are returned unchanged.
pub fn normalize(raw: &str) -> &str {
    raw.strip_prefix(LEGACY_PREFIX).unwrap_or(raw)
}

/// Two-way table of physical keys and their stored names.
const KEY_NAMES: &[(Key, &str)] = &[
    (Key::KeyA, "a"),
    (Key::KeyB, "b"),
    (Key::KeyC, "c"),
    (Key::KeyD, "d"),
    (Key::KeyE, "e"),
    (Key::KeyF, "f"),
    (Key::KeyG, "g"),
    (Key::KeyH, "h"),
    (Key::KeyI, "i"),
    (Key::KeyJ, "j"),
    (Key::KeyK, "k"),
    (Key::KeyL, "l"),
    (Key::KeyM, "m"),
    (Key::KeyN, "n"),
    (Key::KeyO, "o"),
    (Key::KeyP, "p"),
    (Key::KeyQ, "q"),
    (Key::KeyR, "r"),
    (Key::KeyS, "s"),
    (Key::KeyT, "t"),
    (Key::KeyU, "u"),
    (Key::KeyV, "v"),
    (Key::KeyW, "w"),
    (Key::KeyX, "x"),
    (Key::KeyY, "y"),
    (Key::KeyZ, "z"),
    (Key::Num0, "0"),
    (Key::Num1, "1"),
    (Key::Num2, "2"),
    (Key::Num3, "3"),
    (Key::Num4, "4"),
    (Key::Num5, "5"),
    (Key::Num6, "6"),
    (Key::Num7, "7"),
    (Key::Num8, "8"),
    (Key::Num9, "9"),
    (Key::F1, "f1"),
    (Key::F2, "f2"),
    (Key::F3, "f3"),
    (Key::F4, "f4"),
    (Key::F5, "f5"),
    (Key::F6, "f6"),
    (Key::F7, "f7"),
    (Key::F8, "f8"),
    (Key::F9, "f9"),
    (Key::F10, "f10"),
    (Key::F11, "f11"),
    (Key::F12, "f12"),
    (Key::Space, "space"),
    (Key::Return, "enter"),
    (Key::Tab, "tab"),
    (Key::Escape, "esc"),
    (Key::Backspace, "backspace"),
    (Key::Delete, "delete"),
    (Key::Insert, "insert"),
    (Key::Home, "home"),
    (Key::End, "end"),
    (Key::PageUp, "page_up"),
    (Key::PageDown, "page_down"),
    (Key::UpArrow, "up"),
    (Key::DownArrow, "down"),
    (Key::LeftArrow, "left"),
    (Key::RightArrow, "right"),
    (Key::ShiftLeft, "shift"),
    (Key::ShiftRight, "shift_r"),
    (Key::ControlLeft, "ctrl"),
    (Key::ControlRight, "ctrl_r"),
    (Key::Alt, "alt"),
    (Key::AltGr, "alt_gr"),
    (Key::MetaLeft, "cmd"),
    (Key::MetaRight, "cmd_r"),
    (Key::CapsLock, "caps_lock"),
    (Key::NumLock, "num_lock"),
    (Key::ScrollLock, "scroll_lock"),
    (Key::PrintScreen, "print_screen"),
    (Key::Pause, "pause"),
    (Key::BackQuote, "`"),
    (Key::Minus, "-"),
    (Key::Equal, "="),
    (Key::LeftBracket, "["),
    (Key::RightBracket, "]"),
    (Key::SemiColon, ";"),
    (Key::Quote, "'"),
    (Key::BackSlash, "\\"),
    (Key::Comma, ","),
    (Key::Dot, "."),
    (Key::Slash, "/"),
];

/// Name for a physical key, or `None` for keys without a stable name.
///
/// Events for unnamed keys (raw scancodes, vendor keys) are silently
/// dropped by the listener.
pub fn name_for(key: Key) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

/// Physical key for a stored name, applying [`normalize`] first.
pub fn key_for(name: &str) -> Option<Key> {
    let name = normalize(name);
    KEY_NAMES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(k, _)| *k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_legacy_prefix() {
        assert_eq!(normalize("Key.space"), "space");
        assert_eq!(normalize("Key.f6"), "f6");
    }

    #[test]
    fn test_normalize_leaves_plain_names() {
        assert_eq!(normalize("a"), "a");
        assert_eq!(normalize("space"), "space");
    }

    #[test]
    fn test_normalize_strips_only_one_prefix() {
        assert_eq!(normalize("Key.Key.a"), "Key.a");
    }

    #[test]
    fn test_name_for_named_keys() {
        assert_eq!(name_for(Key::Space), Some("space"));
        assert_eq!(name_for(Key::F6), Some("f6"));
        assert_eq!(name_for(Key::KeyA), Some("a"));
    }

    #[test]
    fn test_name_for_unknown_key() {
        assert_eq!(name_for(Key::Unknown(0xDEAD)), None);
    }

    #[test]
    fn test_key_for_accepts_legacy_names() {
        assert_eq!(key_for("Key.space"), Some(Key::Space));
        assert_eq!(key_for("f6"), Some(Key::F6));
        assert_eq!(key_for("no_such_key"), None);
    }

    #[test]
    fn test_table_round_trip() {
        for (key, name) in KEY_NAMES {
            assert_eq!(key_for(name), Some(*key));
            assert_eq!(name_for(*key), Some(*name));
        }
    }
}
