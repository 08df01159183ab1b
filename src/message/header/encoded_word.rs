// https://tools.ietf.org/html/rfc2047

use base64::{engine::general_purpose::STANDARD, Engine};

use super::Encoding;

const MAX_ENCODED_WORD_LEN: usize = 75;
const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

/// RFC 2047 encoded-word encoder
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WordEncoder {
    /// "B" encoding, base64
    B,
    /// "Q" encoding, a quoted-printable variant
    Q,
}

impl WordEncoder {
    /// The encoder used for header values of a message with the given body
    /// encoding.
    pub fn for_encoding(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Base64 => WordEncoder::B,
            Encoding::QuotedPrintable | Encoding::Unencoded => WordEncoder::Q,
        }
    }

    /// Encodes `s` as one or more encoded words if it contains characters
    /// that cannot appear raw in a header, otherwise returns it unchanged.
    pub fn encode(self, charset: &str, s: &str) -> String {
        if !needs_encoding(s) {
            return s.to_owned();
        }
        self.encode_word(charset, s)
    }

    fn encode_word(self, charset: &str, s: &str) -> String {
        let mut buf = String::with_capacity(s.len() * 2);
        self.open_word(&mut buf, charset);
        match self {
            WordEncoder::B => b_encode(&mut buf, charset, s),
            WordEncoder::Q => q_encode(&mut buf, charset, s),
        }
        buf.push_str("?=");
        buf
    }

    fn marker(self) -> char {
        match self {
            WordEncoder::B => 'b',
            WordEncoder::Q => 'q',
        }
    }

    fn open_word(self, buf: &mut String, charset: &str) {
        buf.push_str("=?");
        buf.push_str(charset);
        buf.push('?');
        buf.push(self.marker());
        buf.push('?');
    }

    fn split_word(self, buf: &mut String, charset: &str) {
        buf.push_str("?= ");
        self.open_word(buf, charset);
    }
}

/// Whether `s` contains a character outside of printable ASCII, tab
/// excepted.
pub fn needs_encoding(s: &str) -> bool {
    s.chars().any(|c| (c < ' ' || c > '~') && c != '\t')
}

fn max_content_len(charset: &str) -> usize {
    MAX_ENCODED_WORD_LEN - "=?".len() - charset.len() - "?q?".len() - "?=".len()
}

fn is_utf8(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("utf-8")
}

fn b_encode(buf: &mut String, charset: &str, s: &str) {
    let max_content_len = max_content_len(charset);
    let encoded_len = base64::encoded_len(s.len(), true).unwrap_or(usize::MAX);
    if !is_utf8(charset) || encoded_len <= max_content_len {
        STANDARD.encode_string(s, buf);
        return;
    }

    // decoded length of a full word, characters are never split between words
    let max_len = max_content_len / 4 * 3;
    let mut current_len = 0;
    let mut last = 0;
    for (i, c) in s.char_indices() {
        let len = c.len_utf8();
        if current_len + len <= max_len {
            current_len += len;
        } else {
            STANDARD.encode_string(&s[last..i], buf);
            WordEncoder::B.split_word(buf, charset);
            last = i;
            current_len = len;
        }
    }
    STANDARD.encode_string(&s[last..], buf);
}

fn q_encode(buf: &mut String, charset: &str, s: &str) {
    if !is_utf8(charset) {
        write_q_string(buf, s);
        return;
    }

    let max_content_len = max_content_len(charset);
    let mut current_len = 0;
    for (i, c) in s.char_indices() {
        let end = i + c.len_utf8();
        let encoded_len = if c.is_ascii() && is_q_literal(c as u8) {
            1
        } else {
            3 * c.len_utf8()
        };
        if current_len + encoded_len > max_content_len {
            WordEncoder::Q.split_word(buf, charset);
            current_len = 0;
        }
        write_q_string(buf, &s[i..end]);
        current_len += encoded_len;
    }
}

#[inline]
fn is_q_literal(b: u8) -> bool {
    (b' '..=b'~').contains(&b) && !matches!(b, b'=' | b'?' | b'_')
}

fn write_q_string(buf: &mut String, s: &str) {
    for b in s.bytes() {
        match b {
            b' ' => buf.push('_'),
            b if is_q_literal(b) => buf.push(char::from(b)),
            b => {
                buf.push('=');
                buf.push(char::from(UPPER_HEX[usize::from(b >> 4)]));
                buf.push(char::from(UPPER_HEX[usize::from(b & 0x0f)]));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const UTF8: &str = "UTF-8";

    #[test]
    fn ascii_is_unchanged() {
        for encoder in [WordEncoder::B, WordEncoder::Q] {
            assert_eq!(encoder.encode(UTF8, "Hello, world!"), "Hello, world!");
            assert_eq!(encoder.encode(UTF8, "tab\tallowed"), "tab\tallowed");
        }
    }

    #[test]
    fn q_encoding() {
        assert_eq!(
            WordEncoder::Q.encode(UTF8, "¡Hola, señor!"),
            "=?UTF-8?q?=C2=A1Hola,_se=C3=B1or!?="
        );
    }

    #[test]
    fn q_encoding_escapes_specials() {
        assert_eq!(
            WordEncoder::Q.encode(UTF8, "a=b?c_d é"),
            "=?UTF-8?q?a=3Db=3Fc=5Fd_=C3=A9?="
        );
    }

    #[test]
    fn b_encoding() {
        assert_eq!(
            WordEncoder::B.encode(UTF8, "Привет, мир!"),
            "=?UTF-8?b?0J/RgNC40LLQtdGCLCDQvNC40YAh?="
        );
    }

    #[test]
    fn long_b_encoding_is_split() {
        let s = "é".repeat(40);
        let encoded = WordEncoder::B.encode(UTF8, &s);
        let words: Vec<&str> = encoded.split(' ').collect();
        assert_eq!(words.len(), 2);

        let mut decoded = Vec::new();
        for word in words {
            assert!(word.len() <= MAX_ENCODED_WORD_LEN);
            let content = word
                .strip_prefix("=?UTF-8?b?")
                .and_then(|w| w.strip_suffix("?="))
                .unwrap();
            // every word holds whole characters
            String::from_utf8(STANDARD.decode(content).unwrap()).unwrap();
            decoded.extend(STANDARD.decode(content).unwrap());
        }
        assert_eq!(String::from_utf8(decoded).unwrap(), s);
    }

    #[test]
    fn long_q_encoding_is_split() {
        let s = "ü".repeat(30);
        let encoded = WordEncoder::Q.encode(UTF8, &s);
        for word in encoded.split(' ') {
            assert!(word.len() <= MAX_ENCODED_WORD_LEN, "{word}");
            assert!(word.starts_with("=?UTF-8?q?") && word.ends_with("?="));
        }
        // 10 characters of 6 encoded bytes fill a 63 byte word
        assert_eq!(encoded.matches("=?UTF-8?q?").count(), 3);
    }

    #[test]
    fn header_encoder_follows_body_encoding() {
        assert_eq!(WordEncoder::for_encoding(Encoding::Base64), WordEncoder::B);
        assert_eq!(
            WordEncoder::for_encoding(Encoding::QuotedPrintable),
            WordEncoder::Q
        );
        assert_eq!(WordEncoder::for_encoding(Encoding::Unencoded), WordEncoder::Q);
    }
}
