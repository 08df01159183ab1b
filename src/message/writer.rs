//! Streaming MIME serializer
//!
//! Everything, multipart boundaries included, is written to one flat
//! stream. The innermost open multipart decides which boundary starts the
//! next part.

use std::{
    io::{self, Write},
    iter,
};

use chrono::Local;

use super::{
    encoder::{BodyWriter, MAX_LINE_LEN},
    header::{format_date, Encoding, Headers},
    part::{Copier, File, Part},
    Message,
};

/// mixed, related and alternative
const MAX_DEPTH: usize = 3;

/// Create a random MIME boundary.
fn make_boundary() -> String {
    iter::repeat_with(fastrand::alphanumeric).take(40).collect()
}

/// Output stream counting written bytes. Once a write failed, every
/// following write is rejected.
struct Sink<'a, W: ?Sized> {
    inner: &'a mut W,
    written: u64,
    failed: bool,
}

impl<W: Write + ?Sized> Write for Sink<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "cannot write as writer is in error",
            ));
        }

        match self.inner.write(buf) {
            Ok(n) => {
                self.written += n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct Multipart {
    boundary: String,
    has_parts: bool,
}

pub(super) struct MessageWriter<'a, W: ?Sized> {
    sink: Sink<'a, W>,
    multiparts: Vec<Multipart>,
}

impl<'a, W: Write + ?Sized> MessageWriter<'a, W> {
    pub(super) fn new(inner: &'a mut W) -> Self {
        MessageWriter {
            sink: Sink {
                inner,
                written: 0,
                failed: false,
            },
            multiparts: Vec::with_capacity(MAX_DEPTH),
        }
    }

    /// Writes the whole message and returns the number of bytes written.
    /// The first error aborts the rest of the message.
    pub(super) fn write_message(mut self, message: &Message) -> io::Result<u64> {
        let headers = message.headers();
        if !headers.contains("Mime-Version") {
            self.write_str("Mime-Version: 1.0\r\n")?;
        }
        if !headers.contains("Date") {
            self.write_header("Date", &[format_date(&Local::now())])?;
        }
        self.write_headers(headers)?;

        let parts = message.parts();
        let embedded = message.embedded();
        let attachments = message.attachments();

        let mixed = ((!parts.is_empty() || !embedded.is_empty()) && !attachments.is_empty())
            || attachments.len() > 1;
        let related = (!parts.is_empty() && !embedded.is_empty()) || embedded.len() > 1;
        let alternative = parts.len() > 1;

        if mixed {
            self.open_multipart("mixed")?;
        }
        if related {
            self.open_multipart("related")?;
        }
        if alternative {
            self.open_multipart("alternative")?;
        }
        for part in parts {
            self.write_part(part, message.charset())?;
        }
        if alternative {
            self.close_multipart()?;
        }

        self.add_files(embedded, false)?;
        if related {
            self.close_multipart()?;
        }

        self.add_files(attachments, true)?;
        if mixed {
            self.close_multipart()?;
        }

        self.sink.flush()?;
        Ok(self.sink.written)
    }

    fn depth(&self) -> usize {
        self.multiparts.len()
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.sink.write_all(s.as_bytes())
    }

    fn open_multipart(&mut self, kind: &str) -> io::Result<()> {
        if self.depth() == MAX_DEPTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("multipart nesting deeper than {MAX_DEPTH}"),
            ));
        }

        let boundary = make_boundary();
        let content_type = format!("multipart/{kind};\r\n boundary={boundary}");
        if self.depth() == 0 {
            self.write_header("Content-Type", &[content_type])?;
            self.write_str("\r\n")?;
        } else {
            let mut headers = Headers::new();
            headers.set("Content-Type", vec![content_type]);
            self.create_part(&headers)?;
        }

        self.multiparts.push(Multipart {
            boundary,
            has_parts: false,
        });
        Ok(())
    }

    fn close_multipart(&mut self) -> io::Result<()> {
        if let Some(multipart) = self.multiparts.pop() {
            if multipart.has_parts {
                self.write_str("\r\n")?;
            }
            self.write_str("--")?;
            self.write_str(&multipart.boundary)?;
            self.write_str("--\r\n")?;
        }
        Ok(())
    }

    /// Starts a new part of the innermost multipart.
    fn create_part(&mut self, headers: &Headers) -> io::Result<()> {
        let Some(multipart) = self.multiparts.last_mut() else {
            return Ok(());
        };
        let delimiter = if multipart.has_parts {
            format!("\r\n--{}\r\n", multipart.boundary)
        } else {
            format!("--{}\r\n", multipart.boundary)
        };
        multipart.has_parts = true;

        self.write_str(&delimiter)?;
        for (name, values) in headers.iter() {
            self.write_header(name, values)?;
        }
        self.write_str("\r\n")
    }

    /// At the top level `Bcc` is skipped. Inside a multipart the headers
    /// start a new part.
    fn write_headers(&mut self, headers: &Headers) -> io::Result<()> {
        if self.depth() > 0 {
            return self.create_part(headers);
        }

        for (name, values) in headers.iter() {
            if name != "Bcc" {
                self.write_header(name, values)?;
            }
        }
        Ok(())
    }

    fn write_part(&mut self, part: &Part, charset: &str) -> io::Result<()> {
        let mut headers = Headers::new();
        headers.set(
            "Content-Type",
            vec![format!("{}; charset={charset}", part.content_type)],
        );
        headers.set(
            "Content-Transfer-Encoding",
            vec![part.encoding.as_str().to_owned()],
        );

        self.write_headers(&headers)?;
        self.write_body(&part.copier, part.encoding)
    }

    fn add_files(&mut self, files: &[File], is_attachment: bool) -> io::Result<()> {
        for file in files {
            let name = file.name();
            let mut headers = file.headers().clone();

            if !headers.contains("Content-Type") {
                let media_type = mime_guess::from_path(name)
                    .first_raw()
                    .unwrap_or("application/octet-stream");
                headers.set_default("Content-Type", format!("{media_type}; name=\"{name}\""));
            }
            headers.set_default(
                "Content-Transfer-Encoding",
                Encoding::Base64.as_str().to_owned(),
            );
            let disposition = if is_attachment { "attachment" } else { "inline" };
            headers.set_default(
                "Content-Disposition",
                format!("{disposition}; filename=\"{name}\""),
            );
            if !is_attachment {
                headers.set_default("Content-ID", format!("<{name}>"));
            }

            let encoding = headers
                .get_first("Content-Transfer-Encoding")
                .and_then(|value| value.parse().ok())
                .unwrap_or(Encoding::Base64);

            self.write_headers(&headers)?;
            self.write_body(file.copier(), encoding)?;
        }
        Ok(())
    }

    fn write_body(&mut self, copier: &Copier, encoding: Encoding) -> io::Result<()> {
        if self.depth() == 0 {
            self.write_str("\r\n")?;
        }

        let mut body = BodyWriter::new(&mut self.sink, encoding);
        copier(&mut body)?;
        body.finish()?;
        Ok(())
    }

    /// Writes a header field, folding lines longer than 76 characters.
    fn write_header(&mut self, name: &str, values: &[String]) -> io::Result<()> {
        self.write_str(name)?;
        if values.is_empty() {
            return self.write_str(":\r\n");
        }
        self.write_str(":")?;

        let mut chars_left = MAX_LINE_LEN as isize - name.len() as isize - 1;
        for (i, value) in values.iter().enumerate() {
            if i != 0 {
                self.write_str(",")?;
                chars_left -= 1;
            }

            // a first word that fits on a line of its own starts one
            let word = value
                .bytes()
                .position(|b| b == b' ' || b == b'\n')
                .unwrap_or(value.len());
            if chars_left < 1 || (word as isize >= chars_left && word < MAX_LINE_LEN) {
                self.write_str("\r\n ")?;
                chars_left = MAX_LINE_LEN as isize - 1;
            } else {
                self.write_str(" ")?;
                chars_left -= 1;
            }

            let mut rest = value.as_bytes();
            while rest.len() as isize > chars_left {
                rest = self.write_line(rest, chars_left.max(0) as usize)?;
                chars_left = MAX_LINE_LEN as isize - 1;
            }
            self.sink.write_all(rest)?;
            chars_left = match rest.iter().rposition(|b| *b == b'\n') {
                Some(i) => (MAX_LINE_LEN - 1 - (rest.len() - i - 1)) as isize,
                None => chars_left - rest.len() as isize,
            };
        }
        self.write_str("\r\n")
    }

    /// Writes the first line of a header value that does not fit in
    /// `chars_left` and returns what remains.
    fn write_line<'s>(&mut self, s: &'s [u8], chars_left: usize) -> io::Result<&'s [u8]> {
        // an existing line break before the limit
        if let Some(i) = s.iter().position(|b| *b == b'\n') {
            if i < chars_left {
                self.sink.write_all(&s[..=i])?;
                return Ok(&s[i + 1..]);
            }
        }

        if let Some(i) = s[..chars_left].iter().rposition(|b| *b == b' ') {
            self.sink.write_all(&s[..i])?;
            self.write_str("\r\n ")?;
            return Ok(&s[i + 1..]);
        }

        // no clean break, the first word runs past the limit
        for (i, b) in s.iter().enumerate().skip(chars_left) {
            match b {
                b' ' => {
                    self.sink.write_all(&s[..i])?;
                    self.write_str("\r\n ")?;
                    return Ok(&s[i + 1..]);
                }
                b'\n' => {
                    self.sink.write_all(&s[..=i])?;
                    return Ok(&s[i + 1..]);
                }
                _ => {}
            }
        }

        self.sink.write_all(s)?;
        Ok(&[])
    }
}
