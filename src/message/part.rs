use std::{
    fmt::{self, Debug, Formatter},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use super::header::{Encoding, Headers};

/// Writes the raw content of a body part or file to a sink.
///
/// It runs while the message is serialized, each time the message is
/// written.
pub type Copier = Arc<dyn Fn(&mut dyn Write) -> io::Result<()> + Send + Sync>;

pub(crate) fn copier_from_bytes(bytes: impl Into<Vec<u8>>) -> Copier {
    let bytes = bytes.into();
    Arc::new(move |w: &mut dyn Write| w.write_all(&bytes))
}

/// One body representation of a message
#[derive(Clone)]
pub struct Part {
    pub(crate) content_type: String,
    pub(crate) encoding: Encoding,
    pub(crate) copier: Copier,
}

impl Part {
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Overrides the message encoding for this part
    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }
}

impl Debug for Part {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("content_type", &self.content_type)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// An attached or embedded file
///
/// Mandatory headers are filled in when the message is written if they
/// were not set.
///
/// ```no_run
/// use mailer::{message::File, Message};
///
/// let mut message = Message::new();
/// message.attach(File::from_path("/tmp/report.pdf").rename("report-2024.pdf"));
/// ```
#[derive(Clone)]
pub struct File {
    name: String,
    headers: Headers,
    copier: Copier,
}

impl File {
    /// A file read from storage when the message is written. It is named
    /// after the last component of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path: PathBuf = path.as_ref().to_owned();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        File {
            name,
            headers: Headers::new(),
            copier: Arc::new(move |w: &mut dyn Write| {
                let mut file = fs::File::open(&path)?;
                io::copy(&mut file, w).map(|_| ())
            }),
        }
    }

    /// An in-memory file
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        File {
            name: name.into(),
            headers: Headers::new(),
            copier: copier_from_bytes(bytes),
        }
    }

    /// Sets the name used in the default headers
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a MIME header of the part holding the file
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, vec![value.into()]);
        self
    }

    /// Replaces the function producing the file content
    pub fn copy_fn<F>(mut self, copier: F) -> Self
    where
        F: Fn(&mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
    {
        self.copier = Arc::new(copier);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub(crate) fn copier(&self) -> &Copier {
        &self.copier
    }
}

impl Debug for File {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn content(file: &File) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        (file.copier())(&mut out)?;
        Ok(out)
    }

    #[test]
    fn from_path_reads_at_write_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let file = File::from_path(&path);
        assert_eq!(file.name(), "notes.txt");

        fs::write(&path, b"written later").unwrap();
        assert_eq!(content(&file).unwrap(), b"written later");
    }

    #[test]
    fn missing_file_fails_on_copy() {
        let file = File::from_path("/nonexistent/mailer/file.bin");
        let err = content(&file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn settings() {
        let file = File::from_bytes("a.bin", vec![1, 2, 3])
            .rename("b.bin")
            .header("Content-ID", "<logo>")
            .copy_fn(|w| w.write_all(b"replaced"));

        assert_eq!(file.name(), "b.bin");
        assert_eq!(file.headers().get_first("Content-ID"), Some("<logo>"));
        assert_eq!(content(&file).unwrap(), b"replaced");
    }
}
