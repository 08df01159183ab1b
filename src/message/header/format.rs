use chrono::{DateTime, TimeZone};

use super::WordEncoder;

/// RFC 1123 with a numeric zone, `Mon, 02 Jan 2006 15:04:05 -0700`
const RFC1123Z: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Whether `text` contains one of the RFC 5322 specials that cannot appear
/// in an unquoted display name.
pub fn has_specials(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c,
            '(' | ')' | '<' | '>' | '[' | ']' | ':' | ';' | '@' | '\\' | ',' | '.' | '"'
        )
    })
}

/// Formats an address and an optional display name as a header value.
///
/// A display name which needs no encoding is quoted. Otherwise it is
/// encoded with `encoder`, or with the "B" encoding when it also contains
/// specials.
///
/// ```
/// use mailer::message::header::{format_address, WordEncoder};
///
/// assert_eq!(
///     format_address(WordEncoder::Q, "UTF-8", "bob@example.com", "Bob"),
///     "\"Bob\" <bob@example.com>"
/// );
/// assert_eq!(
///     format_address(WordEncoder::Q, "UTF-8", "bob@example.com", ""),
///     "bob@example.com"
/// );
/// ```
pub fn format_address(encoder: WordEncoder, charset: &str, address: &str, name: &str) -> String {
    if name.is_empty() {
        return address.to_owned();
    }

    let mut buf = String::with_capacity(name.len() + address.len() + 5);
    let encoded = encoder.encode(charset, name);
    if encoded == name {
        buf.push('"');
        for c in name.chars() {
            if c == '\\' || c == '"' {
                buf.push('\\');
            }
            buf.push(c);
        }
        buf.push('"');
    } else if has_specials(name) {
        buf.push_str(&WordEncoder::B.encode(charset, name));
    } else {
        buf.push_str(&encoded);
    }
    buf.push_str(" <");
    buf.push_str(address);
    buf.push('>');
    buf
}

/// Formats a date as an RFC 5322 `Date` header value.
pub fn format_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    date.format(RFC1123Z).to_string()
}
