//! Collaborators supplied by the front-end

use log::{info, warn};
use std::io;
use std::path::{Path, PathBuf};

/// Where the bytes of a file come from
pub trait ByteSource {
    /// Human readable name used in log and error messages
    fn describe(&self) -> String;

    /// # Errors
    ///
    /// Any I/O failure reading the source.
    fn read_bytes(&self) -> io::Result<Vec<u8>>;
}

impl ByteSource for Path {
    fn describe(&self) -> String {
        self.display().to_string()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self)
    }
}

impl ByteSource for PathBuf {
    fn describe(&self) -> String {
        self.as_path().describe()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        self.as_path().read_bytes()
    }
}

/// A buffer already in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MemorySource {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl ByteSource for MemorySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Yes/no question asked before destructive actions
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Answers every question the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmPrompt for FixedAnswer {
    fn confirm(&self, message: &str) -> bool {
        info!("{message} -> {}", if self.0 { "yes" } else { "no" });
        self.0
    }
}

/// Sink for recoverable problems the user should see
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Sends notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!("{message}");
    }
}
