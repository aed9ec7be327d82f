// SPDX-FileCopyrightText: 2026 Seatbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure text classification and cleanup helpers.
//!
//! Chat id conventions follow WhatsApp JIDs:
//! `5215551234567@s.whatsapp.net` (person), `1203630@g.us` (group),
//! `status@broadcast` (status updates and broadcast lists).

use std::sync::LazyLock;

use regex::Regex;

const GROUP_SUFFIX: &str = "@g.us";
const BROADCAST_SUFFIX: &str = "@broadcast";

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\n?(.*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^\n]+?)\*\*|(^|[^\w])__([^\n]+?)__").unwrap());
// Opening `*` must not follow a word character ("2*1" is a promo, not emphasis).
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\w*])\*([^*\s](?:[^*\n]*[^*\s])?)\*").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+").unwrap());
static TRAILING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// `true` for group chats (`…@g.us`).
pub fn is_group_chat(chat_id: &str) -> bool {
    chat_id.ends_with(GROUP_SUFFIX)
}

/// `true` for status and broadcast pseudo-chats (`…@broadcast`).
pub fn is_broadcast_chat(chat_id: &str) -> bool {
    chat_id.ends_with(BROADCAST_SUFFIX)
}

/// The user part of a chat id, without server or device suffix.
///
/// `"5215551234567:3@s.whatsapp.net"` → `"5215551234567"`.
pub fn phone_from_chat_id(chat_id: &str) -> &str {
    let user = chat_id.split('@').next().unwrap_or(chat_id);
    user.split(':').next().unwrap_or(user)
}

/// Whether a display name looks like an address-book entry.
///
/// A saved contact has a non-empty name that differs from the raw phone number
/// and is not just digits and phone punctuation.
///
/// ```text
/// ("Ana López", "5215551234")  -> true
/// ("5215551234", "5215551234") -> false
/// ("+52 55 5123-4567", "…")    -> false
/// ("", "5215551234")           -> false
/// ```
pub fn is_saved_contact(display_name: &str, phone: &str) -> bool {
    let name = display_name.trim();
    if name.is_empty() || name == phone {
        return false;
    }
    !name
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
}

/// Removes markdown the channel would show literally.
///
/// Code fences are unwrapped (content kept), bold and italic markers and
/// heading hashes dropped, trailing whitespace trimmed and runs of blank lines
/// collapsed to one.
pub fn strip_markup(text: &str) -> String {
    let text = FENCED_BLOCK.replace_all(text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BOLD.replace_all(&text, "$1$2$3");
    let text = ITALIC.replace_all(&text, "$1$2");
    let text = HEADING.replace_all(&text, "");
    let text = TRAILING_SPACE.replace_all(&text, "");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_chat_ids() {
        assert!(is_group_chat("120363025@g.us"));
        assert!(!is_group_chat("5215551234@s.whatsapp.net"));
        assert!(is_broadcast_chat("status@broadcast"));
        assert!(!is_broadcast_chat("5215551234@s.whatsapp.net"));
    }

    #[test]
    fn extracts_phone_part() {
        assert_eq!(phone_from_chat_id("5215551234@s.whatsapp.net"), "5215551234");
        assert_eq!(phone_from_chat_id("5215551234:7@s.whatsapp.net"), "5215551234");
        assert_eq!(phone_from_chat_id("bare"), "bare");
    }

    #[test]
    fn saved_contact_heuristic() {
        assert!(is_saved_contact("Ana López", "5215551234"));
        assert!(is_saved_contact("Tienda 24", "5215551234"));
        assert!(!is_saved_contact("5215551234", "5215551234"));
        assert!(!is_saved_contact("+52 55 5123-4567", "5215551234567"));
        assert!(!is_saved_contact("   ", "5215551234"));
        assert!(!is_saved_contact("", "5215551234"));
    }

    #[test]
    fn strips_bold_italic_and_headings() {
        let input = "## Precios\n**Netflix**: $50 al *mes*\n__Disney+__ disponible";
        assert_eq!(
            strip_markup(input),
            "Precios\nNetflix: $50 al mes\nDisney+ disponible"
        );
    }

    #[test]
    fn unwraps_code_fences() {
        let input = "Datos:\n```text\nusuario: ana\n```\nListo";
        assert_eq!(strip_markup(input), "Datos:\nusuario: ana\n\nListo");
        assert_eq!(strip_markup("usa `hola`"), "usa hola");
    }

    #[test]
    fn collapses_blank_runs_and_trims() {
        assert_eq!(strip_markup("  hola   \n\n\n\nadiós  "), "hola\n\nadiós");
    }

    #[test]
    fn plain_text_is_untouched() {
        let input = "Hola 👋 tenemos Netflix y Max.\n¿Cuál te interesa?";
        assert_eq!(strip_markup(input), input);
    }

    #[test]
    fn lone_asterisk_survives() {
        assert_eq!(strip_markup("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(strip_markup("3 * 4 = 12 y 5 * 6 = 30"), "3 * 4 = 12 y 5 * 6 = 30");
    }

    #[test]
    fn promo_ratios_survive() {
        let input = "Promo 2*1 en Netflix y 3*2 en Max";
        assert_eq!(strip_markup(input), input);
        assert_eq!(strip_markup("Promo *2x1* en Disney+"), "Promo 2x1 en Disney+");
    }

    #[test]
    fn identifiers_keep_underscores() {
        let input = "usuario: mi__perfil__max";
        assert_eq!(strip_markup(input), input);
        assert_eq!(strip_markup("Plan __Premium__ listo"), "Plan Premium listo");
    }
}
