//! Structural parent inference.
//!
//! Derives a code's parent purely from its text. The scraped source carries
//! its own parent ids, but those are unreliable, so the hierarchy builder
//! treats this module as the primary edge source.

use super::grammar::{self, CodeClass, TOP};

/// Code that every language auxiliary "common" subdivision hangs from.
const LANGUAGE_COMMON: &str = "=...";
/// Head of the place auxiliaries that are themselves language codes.
const PLACE_LANGUAGE: &str = "(=...)";
/// Language codes filed under [`LANGUAGE_COMMON`] despite being numeric.
const LANGUAGE_COMMON_MEMBERS: [&str; 2] = ["00", "030"];
/// Subdivision marker inside `=...` codes, e.g. ``=...`01``.
const SUBDIVISION_MARK: char = '`';

/// Returns the structural parent of `code`, or `None` when no parent can be
/// derived (empty, unrecognized, or a table head with no parent of its own).
///
/// Top-level classes resolve to the virtual root [`TOP`].
pub fn infer_parent(code: &str) -> Option<String> {
    let parsed = grammar::parse(code);
    match parsed.class {
        CodeClass::TopLevelSign => Some(TOP.to_string()),
        CodeClass::MainTable => main_table_parent(parsed.body),
        CodeClass::Language => language_parent(parsed.body),
        CodeClass::Place => place_parent(code, parsed.body),
        CodeClass::Form => form_parent(parsed.body),
        CodeClass::Unrecognized => None,
    }
}

fn main_table_parent(code: &str) -> Option<String> {
    if grammar::is_single_digit(code) {
        return Some(TOP.to_string());
    }
    if let Some(parent) = range_parent(code, "") {
        return Some(parent);
    }
    if let Some((head, _)) = code.rsplit_once('.') {
        return non_empty(head).map(str::to_string);
    }
    if code.len() > 1 {
        return Some(code[..code.len() - 1].to_string());
    }
    None
}

fn language_parent(body: &str) -> Option<String> {
    if let Some(rest) = body.strip_prefix("...") {
        // Anything under `=...` without a subdivision mark is a table head.
        return if rest.contains(SUBDIVISION_MARK) {
            Some(LANGUAGE_COMMON.to_string())
        } else {
            Some(TOP.to_string())
        };
    }
    if LANGUAGE_COMMON_MEMBERS.contains(&body) {
        return Some(LANGUAGE_COMMON.to_string());
    }
    if grammar::is_single_digit(body) {
        return Some(TOP.to_string());
    }
    numeric_parent(body, CodeClass::Language.prefix())
}

/// Place codes hang from the single-digit group named by their first digit.
///
/// `(540)` files under `(5)` rather than `(54)`. This is a best-effort guess at
/// the real scheme and does not hold for every place code.
fn place_parent(code: &str, body: &str) -> Option<String> {
    if body.starts_with('=') {
        return (code != PLACE_LANGUAGE).then(|| PLACE_LANGUAGE.to_string());
    }
    if grammar::is_single_digit(body) {
        return Some(TOP.to_string());
    }
    if body.len() > 1 && grammar::is_numeric(body) {
        let first = body.chars().next().filter(char::is_ascii_digit)?;
        return Some(format!("({first})"));
    }
    None
}

fn form_parent(body: &str) -> Option<String> {
    if body == "0" {
        return Some(TOP.to_string());
    }
    numeric_parent(body, CodeClass::Form.prefix())
}

/// Shared truncation for prefixed numeric bodies: a range resolves to its
/// first segment, otherwise the final character is dropped along with any
/// dot it leaves behind (`058.6` → `058`, `11` → `1`).
pub fn numeric_parent(body: &str, prefix: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if let Some(parent) = range_parent(body, prefix) {
        return Some(parent);
    }
    if body.len() < 2 || !grammar::is_numeric(body) || !body.ends_with(|c: char| c.is_ascii_digit())
    {
        return None;
    }

    let truncated = &body[..body.len() - 1];
    let truncated = truncated.strip_suffix('.').unwrap_or(truncated);
    non_empty(truncated).map(|parent| format!("{prefix}{parent}"))
}

fn range_parent(body: &str, prefix: &str) -> Option<String> {
    let (head, _) = body.split_once('/')?;
    non_empty(head).map(|head| format!("{prefix}{head}"))
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
