//! Amount text sanitising and keypad edits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest amount text the keypad will grow to.
pub const AMOUNT_TEXT_MAX_LEN: usize = 9;

const SEPARATOR: char = '.';

/// One of the twelve widget keypad buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeypadButton {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Decimal,
    Backspace,
}

impl KeypadButton {
    /// Every button, in keypad order.
    pub const ALL: [KeypadButton; 12] = [
        KeypadButton::Digit1,
        KeypadButton::Digit2,
        KeypadButton::Digit3,
        KeypadButton::Digit4,
        KeypadButton::Digit5,
        KeypadButton::Digit6,
        KeypadButton::Digit7,
        KeypadButton::Digit8,
        KeypadButton::Digit9,
        KeypadButton::Decimal,
        KeypadButton::Digit0,
        KeypadButton::Backspace,
    ];

    /// Digit button for `0..=9`.
    pub fn digit(value: u8) -> Option<Self> {
        use KeypadButton::*;
        [Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9]
            .get(usize::from(value))
            .copied()
    }

    /// Face label of the button.
    pub fn symbol(&self) -> &'static str {
        match self {
            KeypadButton::Digit0 => "0",
            KeypadButton::Digit1 => "1",
            KeypadButton::Digit2 => "2",
            KeypadButton::Digit3 => "3",
            KeypadButton::Digit4 => "4",
            KeypadButton::Digit5 => "5",
            KeypadButton::Digit6 => "6",
            KeypadButton::Digit7 => "7",
            KeypadButton::Digit8 => "8",
            KeypadButton::Digit9 => "9",
            KeypadButton::Decimal => ".",
            KeypadButton::Backspace => "⌫",
        }
    }

    fn digit_char(&self) -> Option<char> {
        let symbol = self.symbol();
        symbol.chars().next().filter(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for KeypadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Accepts face labels (`5`, `.`, `⌫`) and identifiers (`digit5`,
/// `decimal`, `backspace`).
impl FromStr for KeypadButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "." | "decimal" => return Ok(KeypadButton::Decimal),
            "⌫" | "backspace" => return Ok(KeypadButton::Backspace),
            _ => {}
        }
        let digits = s.strip_prefix("digit").unwrap_or(s);
        digits
            .parse::<u8>()
            .ok()
            .filter(|_| digits.len() == 1)
            .and_then(KeypadButton::digit)
            .ok_or_else(|| format!("unknown keypad button {s:?}"))
    }
}

/// Canonical amount text: digits and at most one separator, never empty,
/// never starting with the separator.
///
/// Extra separators are dropped. Idempotent.
pub fn sanitize_amount_text(raw: &str) -> String {
    let mut seen_separator = false;
    let mut sanitized: String = raw
        .chars()
        .filter(|c| {
            if c.is_ascii_digit() {
                true
            } else if *c == SEPARATOR && !seen_separator {
                seen_separator = true;
                true
            } else {
                false
            }
        })
        .collect();

    if sanitized.starts_with(SEPARATOR) {
        sanitized.insert(0, '0');
    }
    if sanitized.is_empty() {
        sanitized.push('0');
    }
    sanitized
}

/// Apply one keypad press to `current`, returning sanitised text.
pub fn apply_keypad_edit(current: &str, button: KeypadButton) -> String {
    let mut text = current.to_string();
    let len = text.chars().count();

    match button {
        KeypadButton::Decimal => {
            if !text.contains(SEPARATOR) && len < AMOUNT_TEXT_MAX_LEN {
                text.push(SEPARATOR);
            }
        }
        KeypadButton::Backspace => {
            text.pop();
            if text.is_empty() {
                text.push('0');
            }
        }
        digit => {
            if let Some(c) = digit.digit_char() {
                if text == "0" {
                    text = c.to_string();
                } else if len < AMOUNT_TEXT_MAX_LEN {
                    text.push(c);
                }
            }
        }
    }

    sanitize_amount_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn press(text: &str, buttons: &[KeypadButton]) -> String {
        buttons
            .iter()
            .fold(text.to_string(), |acc, b| apply_keypad_edit(&acc, *b))
    }

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_amount_text(""), "0");
        assert_eq!(sanitize_amount_text(".5"), "0.5");
        assert_eq!(sanitize_amount_text("1.2.3"), "1.23");
        assert_eq!(sanitize_amount_text("12a,4"), "124");
        assert_eq!(sanitize_amount_text("..."), "0.");
    }

    #[test]
    fn test_keypad_scenario() {
        use KeypadButton::*;
        let mut text = "0".to_string();

        text = apply_keypad_edit(&text, Digit5);
        assert_eq!(text, "5");
        text = apply_keypad_edit(&text, Decimal);
        assert_eq!(text, "5.");
        text = apply_keypad_edit(&text, Decimal);
        assert_eq!(text, "5.");
        text = apply_keypad_edit(&text, Digit7);
        assert_eq!(text, "5.7");
        text = apply_keypad_edit(&text, Backspace);
        assert_eq!(text, "5.");
        text = press(&text, &[Backspace, Backspace, Backspace]);
        assert_eq!(text, "0");
    }

    #[test]
    fn test_keypad_length_cap() {
        let full = "123456789";
        assert_eq!(apply_keypad_edit(full, KeypadButton::Digit1), full);
        assert_eq!(apply_keypad_edit(full, KeypadButton::Decimal), full);
        assert_eq!(apply_keypad_edit("12345678", KeypadButton::Decimal), "12345678.");
    }

    #[test]
    fn test_keypad_zero_replaced_by_digit() {
        assert_eq!(apply_keypad_edit("0", KeypadButton::Digit0), "0");
        assert_eq!(apply_keypad_edit("0", KeypadButton::Digit9), "9");
        assert_eq!(apply_keypad_edit("0", KeypadButton::Decimal), "0.");
    }

    #[test]
    fn test_button_parse() {
        assert_eq!("7".parse::<KeypadButton>().unwrap(), KeypadButton::Digit7);
        assert_eq!("digit0".parse::<KeypadButton>().unwrap(), KeypadButton::Digit0);
        assert_eq!(".".parse::<KeypadButton>().unwrap(), KeypadButton::Decimal);
        assert_eq!("backspace".parse::<KeypadButton>().unwrap(), KeypadButton::Backspace);
        assert!("12".parse::<KeypadButton>().is_err());
        assert!("digit".parse::<KeypadButton>().is_err());
        assert_eq!(KeypadButton::ALL.len(), 12);
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(raw in ".{0,16}") {
            let once = sanitize_amount_text(&raw);
            prop_assert_eq!(sanitize_amount_text(&once), once);
        }

        #[test]
        fn prop_sanitize_single_separator(raw in "[0-9.]{0,6}\\.[0-9]{0,3}\\.[0-9.]{0,4}") {
            let sanitized = sanitize_amount_text(&raw);
            prop_assert_eq!(sanitized.matches('.').count(), 1);
        }

        #[test]
        fn prop_sanitize_never_empty_or_leading_separator(raw in ".{0,16}") {
            let sanitized = sanitize_amount_text(&raw);
            prop_assert!(!sanitized.is_empty());
            prop_assert!(!sanitized.starts_with('.'));
        }

        #[test]
        fn prop_keypad_output_is_canonical(
            start in "[0-9]{1,4}",
            presses in proptest::collection::vec(0usize..12, 0..20),
        ) {
            let mut text = sanitize_amount_text(&start);
            for i in presses {
                text = apply_keypad_edit(&text, KeypadButton::ALL[i]);
                prop_assert_eq!(sanitize_amount_text(&text), text.clone());
                prop_assert!(text.chars().count() <= AMOUNT_TEXT_MAX_LEN.max(start.len()));
            }
        }
    }
}
