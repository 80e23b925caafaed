// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use udc_taxonomy_engine::models::RawRecord;

/// Main-table records `d`, `dd`, `ddd` and `ddd.d` for `width` digits per
/// level, listed deepest first so no structural parent precedes its child.
#[allow(dead_code)]
pub fn generate_records(width: usize) -> Vec<RawRecord> {
    let mut codes = vec!["TOP".to_string()];
    for a in 0..width {
        codes.push(format!("{a}"));
        for b in 0..width {
            codes.push(format!("{a}{b}"));
            for c in 0..width {
                codes.push(format!("{a}{b}{c}"));
                for d in 1..=width {
                    codes.push(format!("{a}{b}{c}.{d}"));
                }
            }
        }
    }

    codes
        .into_iter()
        .enumerate()
        .rev()
        .map(|(i, code)| {
            let title = format!("Class {code}");
            RawRecord::new((i + 1).to_string(), "0", code, title)
        })
        .collect()
}

/// A page in the classification site's script format holding `records`.
#[allow(dead_code)]
pub fn generate_page(records: &[RawRecord]) -> String {
    let mut page = String::from("<div id=\"classtree\"><script>\n");
    for r in records {
        page.push_str(&format!(
            "d.add({},{},'{}','<span class=\"nodetag\">{}</span>&nbsp;&nbsp;{}','{}');\n",
            r.external_id, r.external_parent_id, r.code, r.code, r.title, r.code
        ));
    }
    page.push_str("</script></div>\n");
    page
}
