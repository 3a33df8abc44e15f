//! Finding references with regular expressions.
use regex::Regex;

use super::{ReferenceFinder, ReferenceMatch, ReferenceShape};

/// Ascii whitespace, the same set the `matcher` module uses.
const WS: &str = r"[ \t\n\x0B\x0C\r]";

lazy_static! {
    static ref IMG_SRC: Regex = reference_regex("img", "src");
    static ref SCRIPT_SRC: Regex = reference_regex("script", "src");
}

/// Creates `(<tag\s*[^>]*?\s+attr\s*=\s*["'])([^"']+?)(["'])` with ascii case
/// insensitive tag and attribute names.
fn reference_regex(tag: &str, attribute: &str) -> Regex {
    let pattern = format!(
        r#"(<{tag}{ws}*[^>]*?{ws}+{attr}{ws}*={ws}*["'])([^"']+?)(["'])"#,
        tag = ascii_case_insensitive(tag),
        attr = ascii_case_insensitive(attribute),
        ws = WS
    );
    //UNWRAP_SAFE: the pattern is valid for any ascii letter names
    Regex::new(&pattern).unwrap()
}

fn ascii_case_insensitive(name: &str) -> String {
    name.chars()
        .map(|ch| format!("[{}{}]", ch.to_ascii_uppercase(), ch.to_ascii_lowercase()))
        .collect()
}

/// Finds references using one regex per shape.
///
/// The regexes are compiled once on first use.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexFinder;

impl ReferenceFinder for RegexFinder {
    fn find_all(&self, html: &str, shape: ReferenceShape) -> Vec<ReferenceMatch> {
        let regex: &Regex = match shape {
            ReferenceShape::ImgSrc => &IMG_SRC,
            ReferenceShape::ScriptSrc => &SCRIPT_SRC,
        };
        regex
            .captures_iter(html)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let value = caps.get(2)?;
                Some(ReferenceMatch {
                    start: whole.start(),
                    end: whole.end(),
                    value_start: value.start(),
                    value_end: value.end(),
                })
            })
            .collect()
    }
}
