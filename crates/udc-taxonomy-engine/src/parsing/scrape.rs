use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::RawRecord;

/// Matches one `d.add(id, parentId, 'code', '<fragment>&nbsp;&nbsp;title', ...)`
/// call of the classification page's tree script. String arguments may carry
/// backslash escapes such as `\'`.
fn add_call_regex() -> &'static Regex {
    static ADD_CALL: OnceLock<Regex> = OnceLock::new();
    ADD_CALL.get_or_init(|| {
        Regex::new(
            r"d\.add\(\s*(\d+)\s*,\s*(-?\d+)\s*,\s*'((?:\\.|[^'\\])*)'\s*,\s*'(?:\\.|[^'\\])*?&nbsp;&nbsp;((?:\\.|[^'\\])*)'",
        )
        .expect("Invalid d.add regex")
    })
}

/// Undoes the script's backslash escapes (`\'` → `'`).
fn unescape_js(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(escaped) = chars.next()
        {
            out.push(escaped);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Codes the page emits as visual separators rather than classes.
const PLACEHOLDER_CODES: [&str; 4] = ["-", "--", "---", "----"];

/// Extracts every node record embedded in a classification page.
///
/// Records come back in page order. Placeholder codes are dropped and titles
/// are entity-decoded. `verbose` logs each skipped placeholder.
pub fn parse_records(html: &str, verbose: bool) -> Vec<RawRecord> {
    let mut records = Vec::new();

    for caps in add_call_regex().captures_iter(html) {
        let code = unescape_js(caps[3].trim());
        let code: &str = &code;
        if PLACEHOLDER_CODES.contains(&code) {
            if verbose {
                log::debug!("Skipping placeholder entry {} ({code})", &caps[1]);
            }
            continue;
        }

        let title = unescape_js(caps[4].trim());
        let title = html_escape::decode_html_entities(&title);
        records.push(RawRecord::new(&caps[1], &caps[2], code, title.trim()));
    }

    if verbose {
        log::debug!("Parsed {} records from {} bytes of page", records.len(), html.len());
    }
    records
}
