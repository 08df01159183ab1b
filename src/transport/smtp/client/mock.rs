//! In-memory stream replaying scripted server replies

use std::{
    io::{self, Cursor, Read, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A duplex stream for driving a connection without a server
///
/// Reads are served from the scripted replies and return end of stream
/// once they are exhausted. Clones share both buffers, so a test can keep a
/// clone to inspect what the client wrote.
#[derive(Clone, Debug, Default)]
pub struct MockStream {
    replies: Arc<Mutex<Cursor<Vec<u8>>>>,
    written: Arc<Mutex<Vec<u8>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockStream {
    /// A stream answering with the given bytes
    pub fn new(replies: impl Into<Vec<u8>>) -> MockStream {
        MockStream {
            replies: Arc::new(Mutex::new(Cursor::new(replies.into()))),
            written: Arc::default(),
        }
    }

    /// Appends replies to the unread ones
    pub fn push_reply(&self, reply: &str) {
        lock(&self.replies).get_mut().extend_from_slice(reply.as_bytes());
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        lock(&self.written).clone()
    }

    /// Everything written so far, lossily decoded
    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&lock(&self.written)).into_owned()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        lock(&self.replies).read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.written).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
