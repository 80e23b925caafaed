/// Code of the virtual root every top-level class hangs from.
pub const TOP: &str = "TOP";

/// Literal signs that are top-level entries in their own right.
pub const TOP_LEVEL_SIGNS: [&str; 7] = ["+", "/", ":", "::", "[]", "*", "A/Z"];

/// Heads of the auxiliary tables, roots regardless of what the source says.
pub const AUXILIARY_HEADS: [&str; 3] = ["=...", "(=...)", "-0"];

/// Syntactic class of a single (non-composite) code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeClass {
    /// Digits and dots only, e.g. `001.1`, or a numeric range such as `01/08`.
    MainTable,
    /// Common auxiliary of language, prefix `=`.
    Language,
    /// Common auxiliary of place, wrapped in parentheses.
    Place,
    /// Common auxiliary of form, prefix `-`.
    Form,
    /// One of [`TOP_LEVEL_SIGNS`].
    TopLevelSign,
    Unrecognized,
}

/// A code split into its class and the body left once the class markers are
/// stripped (`=11` → `11`, `(540)` → `540`, `-058.6` → `058.6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCode<'a> {
    pub class: CodeClass,
    pub body: &'a str,
}

impl CodeClass {
    /// Prefix re-attached to a body when deriving a parent code.
    pub fn prefix(self) -> &'static str {
        match self {
            CodeClass::Language => "=",
            CodeClass::Form => "-",
            _ => "",
        }
    }
}

/// True when `s` holds nothing but ASCII digits and dots.
///
/// The empty string counts as numeric; callers check length themselves.
pub fn is_numeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// True for `<numeric>/<numeric>` spans such as `01/08`.
pub fn is_numeric_range(s: &str) -> bool {
    match s.split_once('/') {
        Some((head, tail)) => {
            !head.is_empty() && !tail.is_empty() && is_numeric(head) && is_numeric(tail)
        }
        None => false,
    }
}

/// True for a single main-table digit `0`..=`9`.
pub fn is_single_digit(s: &str) -> bool {
    s.len() == 1 && s.as_bytes()[0].is_ascii_digit()
}

pub fn classify(code: &str) -> CodeClass {
    parse(code).class
}

pub fn parse(code: &str) -> ParsedCode<'_> {
    let unrecognized = ParsedCode {
        class: CodeClass::Unrecognized,
        body: code,
    };

    if code.is_empty() {
        return unrecognized;
    }
    if TOP_LEVEL_SIGNS.contains(&code) {
        return ParsedCode {
            class: CodeClass::TopLevelSign,
            body: code,
        };
    }
    if let Some(body) = code.strip_prefix('=') {
        return ParsedCode {
            class: CodeClass::Language,
            body,
        };
    }
    if let Some(body) = code
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return ParsedCode {
            class: CodeClass::Place,
            body,
        };
    }
    if let Some(body) = code.strip_prefix('-') {
        return ParsedCode {
            class: CodeClass::Form,
            body,
        };
    }
    if is_numeric(code) || is_numeric_range(code) {
        return ParsedCode {
            class: CodeClass::MainTable,
            body: code,
        };
    }

    unrecognized
}

/// Codes that must become roots even when the source supplies a parent id.
pub fn should_be_root(code: &str) -> bool {
    if AUXILIARY_HEADS.contains(&code) {
        return true;
    }

    let parsed = parse(code);
    match parsed.class {
        CodeClass::MainTable | CodeClass::Language | CodeClass::Place => {
            is_single_digit(parsed.body)
        }
        CodeClass::TopLevelSign => true,
        CodeClass::Form | CodeClass::Unrecognized => false,
    }
}
