//! A cascade of simple matchers for finding references.
//!
//! This finds the same matches as the regex
//! `(<tag\s*[^>]*?\s+attr\s*=\s*["'])([^"']+?)(["'])` but each tag is
//! scanned in a single pass up to the first `>` instead of backtracking.
//!
//! The cascade is:
//!
//! 1. `TagOpenMatcher` finds the next `<tag`
//! 2. `AttributeSkipper` yields the points where the attribute could start,
//!    in the order the regex would try them
//! 3. `AttributeValueMatcher` checks if `attr="value"` starts at a point
//!
//! The first point accepted by the value matcher is the match, if none is
//! accepted the search continues after the `<` of the tag.
use super::{ReferenceFinder, ReferenceMatch, ReferenceShape};

/// Ascii whitespace as matched by `\s` in a non unicode regex.
fn is_ws(bch: u8) -> bool {
    match bch {
        b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r' => true,
        _ => false,
    }
}

fn is_quote(bch: u8) -> bool {
    bch == b'"' || bch == b'\''
}

fn starts_with_ignore_ascii_case(text: &[u8], at: usize, name: &[u8]) -> bool {
    text.len() >= at + name.len() && text[at..at + name.len()].eq_ignore_ascii_case(name)
}

/// Finds `<` followed by a tag name (ascii case insensitive).
#[derive(Debug, Clone)]
pub struct TagOpenMatcher {
    name: Vec<u8>,
}

impl TagOpenMatcher {
    pub fn new(name: &str) -> Self {
        TagOpenMatcher {
            name: name.as_bytes().to_owned(),
        }
    }

    /// Returns the span of the first `<name` starting at or after `from`.
    pub fn find(&self, text: &[u8], from: usize) -> Option<(usize, usize)> {
        let mut pos = from;
        while pos < text.len() {
            let start = pos + text[pos..].iter().position(|bch| *bch == b'<')?;
            if starts_with_ignore_ascii_case(text, start + 1, &self.name) {
                return Some((start, start + 1 + self.name.len()));
            }
            pos = start + 1;
        }
        None
    }
}

/// Yields the points an attribute can start at, starting at the end of a tag name.
///
/// An attribute starts after whitespace which comes before the first `>`.
/// The ends of the whitespace runs following the run directly after the tag
/// name are yielded first, from left to right, followed by the end of that
/// leading run (if it isn't empty).
#[derive(Debug, Clone)]
pub struct AttributeSkipper<'a> {
    text: &'a [u8],
    pos: usize,
    leading_end: Option<usize>,
    runs_done: bool,
}

impl<'a> AttributeSkipper<'a> {
    pub fn new(text: &'a [u8], tag_end: usize) -> Self {
        let mut leading_end = tag_end;
        while leading_end < text.len() && is_ws(text[leading_end]) {
            leading_end += 1;
        }
        AttributeSkipper {
            text,
            pos: leading_end,
            leading_end: if leading_end > tag_end {
                Some(leading_end)
            } else {
                None
            },
            runs_done: false,
        }
    }

    fn next_run_end(&mut self) -> Option<usize> {
        let text = self.text;
        while self.pos < text.len() && !is_ws(text[self.pos]) {
            if text[self.pos] == b'>' {
                return None;
            }
            self.pos += 1;
        }
        if self.pos >= text.len() {
            return None;
        }
        while self.pos < text.len() && is_ws(text[self.pos]) {
            self.pos += 1;
        }
        Some(self.pos)
    }
}

impl<'a> Iterator for AttributeSkipper<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if !self.runs_done {
            match self.next_run_end() {
                Some(end) => return Some(end),
                None => self.runs_done = true,
            }
        }
        self.leading_end.take()
    }
}

/// The offsets of a matched attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueMatch {
    pub value_start: usize,
    pub value_end: usize,
    /// The end of the closing quote.
    pub end: usize,
}

/// Matches `attr\s*=\s*["']value["']` where value is at last one non quote char.
#[derive(Debug, Clone)]
pub struct AttributeValueMatcher {
    name: Vec<u8>,
}

impl AttributeValueMatcher {
    pub fn new(name: &str) -> Self {
        AttributeValueMatcher {
            name: name.as_bytes().to_owned(),
        }
    }

    /// Matches an attribute starting exactly at `at`.
    pub fn match_at(&self, text: &[u8], at: usize) -> Option<ValueMatch> {
        if !starts_with_ignore_ascii_case(text, at, &self.name) {
            return None;
        }
        let mut pos = self.skip_ws(text, at + self.name.len());
        if text.get(pos) != Some(&b'=') {
            return None;
        }
        pos = self.skip_ws(text, pos + 1);
        if !text.get(pos).map(|bch| is_quote(*bch)).unwrap_or(false) {
            return None;
        }
        let value_start = pos + 1;
        let value_len = text[value_start..].iter().position(|bch| is_quote(*bch))?;
        if value_len == 0 {
            return None;
        }
        let value_end = value_start + value_len;
        Some(ValueMatch {
            value_start,
            value_end,
            end: value_end + 1,
        })
    }

    fn skip_ws(&self, text: &[u8], mut pos: usize) -> usize {
        while pos < text.len() && is_ws(text[pos]) {
            pos += 1;
        }
        pos
    }
}

/// Iterator over the matches of a tag/attribute pair, from left to right.
#[derive(Debug, Clone)]
pub struct Matches<'a> {
    text: &'a [u8],
    tag: TagOpenMatcher,
    value: AttributeValueMatcher,
    pos: usize,
}

impl<'a> Matches<'a> {
    pub fn new(html: &'a str, tag: &str, attribute: &str) -> Self {
        Matches {
            text: html.as_bytes(),
            tag: TagOpenMatcher::new(tag),
            value: AttributeValueMatcher::new(attribute),
            pos: 0,
        }
    }
}

impl<'a> Iterator for Matches<'a> {
    type Item = ReferenceMatch;

    fn next(&mut self) -> Option<ReferenceMatch> {
        loop {
            let (start, tag_end) = self.tag.find(self.text, self.pos)?;
            let text = self.text;
            let value = &self.value;
            let found = AttributeSkipper::new(text, tag_end)
                .filter_map(|candidate| value.match_at(text, candidate))
                .next();
            match found {
                Some(found) => {
                    self.pos = found.end;
                    return Some(ReferenceMatch {
                        start,
                        end: found.end,
                        value_start: found.value_start,
                        value_end: found.value_end,
                    });
                }
                None => self.pos = start + 1,
            }
        }
    }
}

/// Finds references using the matcher cascade.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatcherFinder;

impl ReferenceFinder for MatcherFinder {
    fn find_all(&self, html: &str, shape: ReferenceShape) -> Vec<ReferenceMatch> {
        Matches::new(html, shape.tag(), shape.attribute()).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    mod TagOpenMatcher {
        #![allow(non_snake_case)]
        use super::super::TagOpenMatcher;

        #[test]
        fn finds_case_insensitive() {
            let matcher = TagOpenMatcher::new("img");
            assert_eq!(matcher.find(b"<p><IMG src>", 0), Some((3, 7)));
            assert_eq!(matcher.find(b"<p><img src>", 4), None);
            assert_eq!(matcher.find(b"< img", 0), None);
            assert_eq!(matcher.find(b"<im", 0), None);
        }
    }

    mod AttributeSkipper {
        #![allow(non_snake_case)]
        use super::super::AttributeSkipper;

        fn points(text: &str) -> Vec<usize> {
            AttributeSkipper::new(text.as_bytes(), 4).collect()
        }

        #[test]
        fn later_runs_first_then_leading_run() {
            // 0123456789012345
            // <img  a=1 b=2 >
            assert_eq!(points("<img  a=1 b=2 >"), vec![10, 14, 6]);
        }

        #[test]
        fn stops_at_the_first_gt() {
            assert_eq!(points("<img a> b c"), vec![5]);
        }

        #[test]
        fn no_leading_whitespace() {
            assert_eq!(points("<imgx y"), vec![6]);
            assert_eq!(points("<img"), Vec::<usize>::new());
        }

        #[test]
        fn whitespace_at_the_end() {
            assert_eq!(points("<img a \n"), vec![8, 5]);
        }
    }

    mod AttributeValueMatcher {
        #![allow(non_snake_case)]
        use super::super::{AttributeValueMatcher, ValueMatch};

        #[test]
        fn matches_quoted_values() {
            let matcher = AttributeValueMatcher::new("src");
            assert_eq!(
                matcher.match_at(b"SRC = 'a.gif'>", 0),
                Some(ValueMatch {
                    value_start: 7,
                    value_end: 12,
                    end: 13
                })
            );
            assert_eq!(
                matcher.match_at(b"src=\"a'", 0),
                Some(ValueMatch {
                    value_start: 5,
                    value_end: 6,
                    end: 7
                })
            );
        }

        #[test]
        fn rejects_other_input() {
            let matcher = AttributeValueMatcher::new("src");
            assert_eq!(matcher.match_at(b"src=a.gif", 0), None);
            assert_eq!(matcher.match_at(b"src=''", 0), None);
            assert_eq!(matcher.match_at(b"srcset='a'", 0), None);
            assert_eq!(matcher.match_at(b"src='a.gif", 0), None);
        }
    }

    #[test]
    fn matches_continue_after_previous_match() {
        let html = r#"<img src="a"><img alt="x" src="b"><img>"#;
        let values = MatcherFinder
            .find_all(html, ReferenceShape::ImgSrc)
            .iter()
            .map(|found| found.value(html).to_owned())
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn first_later_attribute_wins() {
        let html = r#"<img src="a" src="b">"#;
        let found = MatcherFinder.find_all(html, ReferenceShape::ImgSrc);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value(html), "b");
    }
}
