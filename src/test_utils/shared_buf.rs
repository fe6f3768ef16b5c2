use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

/// Thread-safe byte buffer used to capture diagnostic output in tests.
///
/// The inner `Arc<Mutex<Vec<u8>>>` is kept private so tests can't bypass
/// the `Write` implementation or mutate the buffer without locking.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured bytes as text.
    pub fn text(&self) -> String {
        String::from_utf8(self.buffer.lock().expect("SharedBuf mutex poisoned").clone())
            .expect("SharedBuf contains invalid UTF-8")
    }

    /// Captured output split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(ToOwned::to_owned).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .flush()
    }
}
