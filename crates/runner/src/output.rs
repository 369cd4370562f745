//! The result stream: one block per entry, flushed as soon as it is written.
//!
//! A successful entry contributes its generated text followed by a blank line.
//! An exhausted entry contributes
//!
//! ```text
//! ID: <id>
//! ERROR: <message>
//!
//! ```
//!
//! Because every block is flushed immediately, a run killed part-way leaves a
//! file holding a valid prefix of completed entries.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use pipeline::{EntryId, ProviderError};

use crate::error::{Result, RunError};

/// Formats the block written for a successful entry.
pub fn success_block(text: &str) -> String {
    format!("{text}\n\n")
}

/// Formats the block written for an entry whose attempts were exhausted.
pub fn failure_block(entry_id: &EntryId, error: &ProviderError) -> String {
    format!("ID: {entry_id}\nERROR: {error}\n\n")
}

/// Sequential block writer over any byte sink.
pub struct OutputWriter<W: Write> {
    inner: W,
    blocks: usize,
}

impl OutputWriter<BufWriter<File>> {
    /// Opens `path` for the run, creating parent directories and discarding
    /// any previous contents.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RunError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Output file opened (truncated)");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, blocks: 0 }
    }

    /// Appends a success block and flushes.
    pub fn write_success(&mut self, text: &str) -> Result<()> {
        self.write_block(&success_block(text))
    }

    /// Appends an error-marker block and flushes.
    pub fn write_failure(&mut self, entry_id: &EntryId, error: &ProviderError) -> Result<()> {
        self.write_block(&failure_block(entry_id, error))
    }

    /// Number of blocks written so far.
    pub fn blocks_written(&self) -> usize {
        self.blocks
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_block(&mut self, block: &str) -> Result<()> {
        let index = self.blocks + 1;
        self.inner
            .write_all(block.as_bytes())
            .and_then(|()| self.inner.flush())
            .map_err(|source| RunError::Output {
                block: index,
                source,
            })?;
        self.blocks = index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_block_names_entry_and_error() {
        let error = ProviderError::Transport {
            provider: "openai".to_string(),
            message: "connection reset".to_string(),
        };
        assert_eq!(
            failure_block(&EntryId::new("A3"), &error),
            "ID: A3\nERROR: openai transport error: connection reset\n\n"
        );
    }

    #[test]
    fn blocks_are_appended_in_order() {
        let mut writer = OutputWriter::new(Vec::new());
        writer.write_success("first").unwrap();
        writer
            .write_failure(
                &EntryId::unknown(),
                &ProviderError::MalformedResponse {
                    provider: "gemini".to_string(),
                    message: "eof".to_string(),
                },
            )
            .unwrap();
        writer.write_success("").unwrap();

        assert_eq!(writer.blocks_written(), 3);
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "first\n\nID: UNKNOWN_ID\nERROR: gemini returned a malformed response: eof\n\n\n\n"
        );
    }

    #[test]
    fn create_truncates_existing_file_and_makes_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("openai").join("result.ttl");

        let mut first = OutputWriter::create(&path).unwrap();
        first.write_success("old run").unwrap();
        drop(first);

        let mut second = OutputWriter::create(&path).unwrap();
        second.write_success("new").unwrap();
        drop(second);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n\n");
    }

    #[test]
    fn each_block_is_visible_on_disk_before_the_writer_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");

        let mut writer = OutputWriter::create(&path).unwrap();
        writer.write_success("one").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\n\n");
    }
}
