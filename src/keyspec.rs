//! Key spec parsing and platform key resolution.
//!
//! A spec such as `"Ctrl+Shift+A"` or `"cmd space"` splits on `+` or
//! whitespace into ordered tokens. Every token maps through a fixed alias
//! table to a canonical name and then to a platform virtual key code; order is
//! significant because it determines press order. The last token is the
//! "primary" key (pressed then released); every preceding token is held as a
//! modifier regardless of its semantic class, mirroring how real accelerators
//! work.

use crate::error::EngineError;
use crate::platform::Platform;

/// A resolved key: canonical display name plus platform virtual key code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyToken {
    pub name: String,
    pub code: u16,
}

/// A fully resolved shortcut: held modifiers plus the primary key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: Vec<KeyToken>,
    pub primary: KeyToken,
}

impl KeyChord {
    /// Parse and resolve a spec for the given platform. Fails with
    /// `MissingParameter` on an empty spec and `KeyMapping` on any
    /// unrecognized token, before any key event is issued.
    pub fn parse(spec: &str, platform: Platform) -> Result<Self, EngineError> {
        let tokens = tokenize(spec);
        if tokens.is_empty() {
            return Err(EngineError::MissingParameter { field: "keys" });
        }

        let mut resolved = Vec::with_capacity(tokens.len());
        for token in &tokens {
            resolved.push(resolve(token, platform)?);
        }

        let primary = resolved.pop().expect("at least one token");
        Ok(Self {
            modifiers: resolved,
            primary,
        })
    }
}

/// Split a spec on `+` or whitespace into trimmed, lowercased tokens,
/// preserving order.
pub fn tokenize(spec: &str) -> Vec<String> {
    spec.split(|c: char| c == '+' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Resolve one raw (lowercased) token to a `KeyToken`. Unmapped multi-character
/// tokens are an error; the resolver never guesses.
pub fn resolve(token: &str, platform: Platform) -> Result<KeyToken, EngineError> {
    let canonical = canonicalize(token);

    // Single printable characters are uppercased and used verbatim.
    let display = if canonical.chars().count() == 1 {
        canonical.to_uppercase()
    } else {
        canonical.to_string()
    };

    let code = match platform {
        Platform::MacOS => mac_code(canonical),
        Platform::Windows | Platform::Linux => win_code(canonical),
    };

    match code {
        Some(code) => Ok(KeyToken {
            name: display,
            code,
        }),
        None => Err(EngineError::KeyMapping {
            token: token.to_string(),
        }),
    }
}

/// Collapse aliases to the canonical key name.
fn canonicalize(token: &str) -> &str {
    match token {
        "ctrl" | "control" | "ctl" => "ctrl",
        "alt" | "opt" | "option" => "alt",
        "shift" | "shft" => "shift",
        // Platform accelerator family: Command on macOS, Windows key elsewhere.
        "cmd" | "command" | "meta" | "super" | "win" | "windows" => "super",
        "enter" | "return" => "enter",
        "escape" | "esc" => "escape",
        "backspace" | "back" => "backspace",
        "delete" | "del" => "delete",
        "up" | "arrowup" | "uparrow" => "up",
        "down" | "arrowdown" | "downarrow" => "down",
        "left" | "arrowleft" | "leftarrow" => "left",
        "right" | "arrowright" | "rightarrow" => "right",
        "pageup" | "pgup" => "pageup",
        "pagedown" | "pgdn" | "pgdown" => "pagedown",
        other => other,
    }
}

/// macOS virtual key codes (Carbon `kVK_*` values).
fn mac_code(key: &str) -> Option<u16> {
    let code = match key {
        "ctrl" => 59,
        "alt" => 58,
        "shift" => 56,
        "super" => 55,
        "enter" => 36,
        "escape" => 53,
        "tab" => 48,
        "space" => 49,
        "backspace" => 51,
        "delete" => 117,
        "up" => 126,
        "down" => 125,
        "left" => 123,
        "right" => 124,
        "home" => 115,
        "end" => 119,
        "pageup" => 116,
        "pagedown" => 121,
        "f1" => 122,
        "f2" => 120,
        "f3" => 99,
        "f4" => 118,
        "f5" => 96,
        "f6" => 97,
        "f7" => 98,
        "f8" => 100,
        "f9" => 101,
        "f10" => 109,
        "f11" => 103,
        "f12" => 111,
        "a" => 0,
        "b" => 11,
        "c" => 8,
        "d" => 2,
        "e" => 14,
        "f" => 3,
        "g" => 5,
        "h" => 4,
        "i" => 34,
        "j" => 38,
        "k" => 40,
        "l" => 37,
        "m" => 46,
        "n" => 45,
        "o" => 31,
        "p" => 35,
        "q" => 12,
        "r" => 15,
        "s" => 1,
        "t" => 17,
        "u" => 32,
        "v" => 9,
        "w" => 13,
        "x" => 7,
        "y" => 16,
        "z" => 6,
        "0" => 29,
        "1" => 18,
        "2" => 19,
        "3" => 20,
        "4" => 21,
        "5" => 23,
        "6" => 22,
        "7" => 26,
        "8" => 28,
        "9" => 25,
        ";" => 41,
        "'" => 39,
        "," => 43,
        "." => 47,
        "/" => 44,
        "\\" => 42,
        "[" => 33,
        "]" => 30,
        "-" => 27,
        "=" => 24,
        "`" => 50,
        _ => return None,
    };
    Some(code)
}

/// Windows virtual key codes (`VK_*` values), also used for Linux hosts.
fn win_code(key: &str) -> Option<u16> {
    let code = match key {
        "ctrl" => 0x11,
        "alt" => 0x12,
        "shift" => 0x10,
        "super" => 0x5B,
        "enter" => 0x0D,
        "escape" => 0x1B,
        "tab" => 0x09,
        "space" => 0x20,
        "backspace" => 0x08,
        "delete" => 0x2E,
        "up" => 0x26,
        "down" => 0x28,
        "left" => 0x25,
        "right" => 0x27,
        "home" => 0x24,
        "end" => 0x23,
        "pageup" => 0x21,
        "pagedown" => 0x22,
        "f1" => 0x70,
        "f2" => 0x71,
        "f3" => 0x72,
        "f4" => 0x73,
        "f5" => 0x74,
        "f6" => 0x75,
        "f7" => 0x76,
        "f8" => 0x77,
        "f9" => 0x78,
        "f10" => 0x79,
        "f11" => 0x7A,
        "f12" => 0x7B,
        ";" => 0xBA,
        "=" => 0xBB,
        "," => 0xBC,
        "-" => 0xBD,
        "." => 0xBE,
        "/" => 0xBF,
        "`" => 0xC0,
        "[" => 0xDB,
        "\\" => 0xDC,
        "]" => 0xDD,
        "'" => 0xDE,
        _ => {
            // Letters and digits map to their ASCII uppercase values.
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => {
                    return Some(c.to_ascii_uppercase() as u16)
                }
                _ => return None,
            }
        }
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_plus_and_whitespace() {
        assert_eq!(tokenize("Ctrl+Shift+A"), vec!["ctrl", "shift", "a"]);
        assert_eq!(tokenize("cmd space"), vec!["cmd", "space"]);
        assert_eq!(tokenize("  Ctrl +  C "), vec!["ctrl", "c"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("  + ").is_empty());
    }

    #[test]
    fn chord_preserves_order_and_designates_primary() {
        let chord = KeyChord::parse("Ctrl+Shift+A", Platform::Linux).expect("parse");
        let names: Vec<&str> = chord.modifiers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ctrl", "shift"]);
        assert_eq!(chord.primary.name, "A");
    }

    #[test]
    fn last_token_is_primary_regardless_of_class() {
        // A spec ending in a modifier name still treats it as the primary key.
        let chord = KeyChord::parse("ctrl+shift", Platform::Linux).expect("parse");
        assert_eq!(chord.modifiers.len(), 1);
        assert_eq!(chord.modifiers[0].name, "ctrl");
        assert_eq!(chord.primary.name, "shift");
    }

    #[test]
    fn meta_family_resolves_per_platform() {
        for alias in ["cmd", "command", "meta", "win", "windows", "super"] {
            let mac = resolve(alias, Platform::MacOS).expect("mac");
            assert_eq!(mac.code, 55, "alias {}", alias);
            let win = resolve(alias, Platform::Windows).expect("win");
            assert_eq!(win.code, 0x5B, "alias {}", alias);
            let linux = resolve(alias, Platform::Linux).expect("linux");
            assert_eq!(linux.code, 0x5B, "alias {}", alias);
        }
    }

    #[test]
    fn single_characters_uppercase_verbatim() {
        let token = resolve("a", Platform::MacOS).expect("resolve");
        assert_eq!(token.name, "A");
        assert_eq!(token.code, 0);
        let token = resolve("c", Platform::Windows).expect("resolve");
        assert_eq!(token.name, "C");
        assert_eq!(token.code, b'C' as u16);
    }

    #[test]
    fn navigation_editing_and_function_keys_resolve() {
        for key in [
            "up", "down", "left", "right", "home", "end", "pageup", "pagedown", "enter",
            "escape", "tab", "space", "backspace", "delete", "f1", "f12",
        ] {
            assert!(resolve(key, Platform::MacOS).is_ok(), "mac {}", key);
            assert!(resolve(key, Platform::Linux).is_ok(), "linux {}", key);
        }
    }

    #[test]
    fn aliases_collapse_to_canonical_names() {
        assert_eq!(
            resolve("return", Platform::Linux).expect("resolve").name,
            "enter"
        );
        assert_eq!(
            resolve("esc", Platform::Linux).expect("resolve").name,
            "escape"
        );
        assert_eq!(
            resolve("option", Platform::MacOS).expect("resolve").code,
            58
        );
        assert_eq!(
            resolve("pgdn", Platform::Linux).expect("resolve").name,
            "pagedown"
        );
    }

    #[test]
    fn unmapped_multichar_token_is_an_error() {
        let err = resolve("foobar", Platform::Linux).expect_err("must fail");
        match err {
            EngineError::KeyMapping { token } => assert_eq!(token, "foobar"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_spec_is_missing_parameter() {
        let err = KeyChord::parse("", Platform::Linux).expect_err("must fail");
        assert!(matches!(
            err,
            EngineError::MissingParameter { field: "keys" }
        ));
    }

    #[test]
    fn single_token_spec_has_no_modifiers() {
        let chord = KeyChord::parse("escape", Platform::MacOS).expect("parse");
        assert!(chord.modifiers.is_empty());
        assert_eq!(chord.primary.name, "escape");
        assert_eq!(chord.primary.code, 53);
    }
}
