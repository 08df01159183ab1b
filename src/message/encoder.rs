//! Content-Transfer-Encoding writers
//!
//! Each writer wraps an output sink and encodes the bytes written to it.
//! They keep their state between calls to `write`, so the encoded output
//! does not depend on how the body is chunked. Call `finish` to flush the
//! trailing bytes.

use std::io::{self, Write};

use base64::{
    engine::{general_purpose::STANDARD, GeneralPurpose},
    write::EncoderWriter,
};

use super::header::Encoding;

/// Maximum length of an encoded line, CRLF excluded
pub const MAX_LINE_LEN: usize = 76;

/// Hard wraps its input every [`MAX_LINE_LEN`] bytes with CRLF.
///
/// No line break is written after the last line.
#[derive(Debug)]
pub struct Base64LineWriter<W> {
    inner: W,
    line_len: usize,
}

impl<W: Write> Base64LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, line_len: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Base64LineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while rest.len() + self.line_len > MAX_LINE_LEN {
            let (line, tail) = rest.split_at(MAX_LINE_LEN - self.line_len);
            self.inner.write_all(line)?;
            self.inner.write_all(b"\r\n")?;
            rest = tail;
            self.line_len = 0;
        }
        self.inner.write_all(rest)?;
        self.line_len += rest.len();

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Quoted-printable encoder with soft line breaks.
///
/// Input is buffered up to the next line feed. `\r\n` and lone `\n` are both
/// written as a CRLF hard line break.
#[derive(Debug)]
pub struct QuotedPrintableWriter<W> {
    inner: W,
    line: Vec<u8>,
}

impl<W: Write> QuotedPrintableWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line: Vec::new(),
        }
    }

    /// Encodes the pending partial line and returns the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_line(false)?;
        Ok(self.inner)
    }

    fn write_line(&mut self, hard_break: bool) -> io::Result<()> {
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        if !self.line.is_empty() {
            self.inner
                .write_all(&quoted_printable::encode(&self.line))?;
            self.line.clear();
        }
        if hard_break {
            self.inner.write_all(b"\r\n")?;
        }
        Ok(())
    }
}

impl<W: Write> Write for QuotedPrintableWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            self.line.extend_from_slice(&rest[..pos]);
            self.write_line(true)?;
            rest = &rest[pos + 1..];
        }
        self.line.extend_from_slice(rest);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Body writer for one of the supported transfer encodings
pub enum BodyWriter<W: Write> {
    QuotedPrintable(QuotedPrintableWriter<W>),
    Base64(EncoderWriter<'static, GeneralPurpose, Base64LineWriter<W>>),
    Unencoded(W),
}

impl<W: Write> BodyWriter<W> {
    pub fn new(inner: W, encoding: Encoding) -> Self {
        match encoding {
            Encoding::QuotedPrintable => Self::QuotedPrintable(QuotedPrintableWriter::new(inner)),
            Encoding::Base64 => {
                Self::Base64(EncoderWriter::new(Base64LineWriter::new(inner), &STANDARD))
            }
            Encoding::Unencoded => Self::Unencoded(inner),
        }
    }

    /// Flushes buffered bytes and padding, and returns the sink.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::QuotedPrintable(w) => w.finish(),
            Self::Base64(mut w) => w.finish().map(Base64LineWriter::into_inner),
            Self::Unencoded(w) => Ok(w),
        }
    }
}

impl<W: Write> Write for BodyWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::QuotedPrintable(w) => w.write(buf),
            Self::Base64(w) => w.write(buf),
            Self::Unencoded(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::QuotedPrintable(w) => w.flush(),
            Self::Base64(w) => w.flush(),
            Self::Unencoded(w) => w.flush(),
        }
    }
}
