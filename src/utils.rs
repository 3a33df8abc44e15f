//! Small helpers used in multiple places of this crate.
use chrono::Local;

/// The current date time in the format used for the `Date` header.
pub fn now_rfc2822() -> String {
    Local::now().to_rfc2822()
}

/// True if the text contains only ascii chars and no line is longer than `max_len`.
///
/// Lines are separated by `\n`, a `\r` before the `\n` is not counted.
pub fn is_short_line_ascii(text: &[u8], max_len: usize) -> bool {
    text.is_ascii()
        && text.split(|bch| *bch == b'\n').all(|line| {
            let len = if line.last() == Some(&b'\r') {
                line.len() - 1
            } else {
                line.len()
            };
            len <= max_len
        })
}

/// Normalizes all line breaks (`\r\n`, lone `\n`, lone `\r`) to `\r\n`.
pub fn normalize_line_breaks(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + text.len() / 16);
    let mut iter = text.iter().peekable();
    while let Some(&bch) = iter.next() {
        match bch {
            b'\r' => {
                if iter.peek() == Some(&&b'\n') {
                    iter.next();
                }
                out.extend_from_slice(b"\r\n");
            }
            b'\n' => out.extend_from_slice(b"\r\n"),
            bch => out.push(bch),
        }
    }
    out
}
