//! Output sinks that do not need a messaging platform
//!
//! `RecordingSink` keeps deliveries in memory; `DirectorySink` writes them
//! under `user/` and `channel/` folders with a caption log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bot::{Destination, OutputSink};
use crate::engine::ExportedFile;
use crate::error::{PitchPageError, Result};
use crate::render::RenderedPage;

/// Caption log written next to delivered files
pub const CAPTION_LOG: &str = "captions.txt";

/// What a single delivery carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPayload {
    Audio { filename: String, bytes: Vec<u8> },
    Pages(Vec<Vec<u8>>),
    Message,
}

/// A recorded delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub destination: Destination,
    pub payload: DeliveryPayload,
    /// Caption, or the message text for plain messages
    pub caption: String,
}

// ============================================================================
// RecordingSink
// ============================================================================

/// Keeps every delivery in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub deliveries: Vec<Delivery>,
    fail_at: Option<usize>,
}

impl RecordingSink {
    /// A sink whose `n`-th media delivery (zero-based) fails
    pub fn failing_at(n: usize) -> Self {
        RecordingSink {
            deliveries: Vec::new(),
            fail_at: Some(n),
        }
    }

    /// Deliveries that carried media (audio or pages)
    pub fn media(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries
            .iter()
            .filter(|d| !matches!(d.payload, DeliveryPayload::Message))
    }

    /// Plain messages sent to `destination`
    pub fn messages_to<'a>(&'a self, destination: &'a Destination) -> impl Iterator<Item = &'a str> + 'a {
        self.deliveries
            .iter()
            .filter(move |d| &d.destination == destination && matches!(d.payload, DeliveryPayload::Message))
            .map(|d| d.caption.as_str())
    }

    fn record_media(&mut self, destination: &Destination, payload: DeliveryPayload, caption: &str) -> Result<()> {
        if self.fail_at == Some(self.media().count()) {
            return Err(PitchPageError::Delivery {
                destination: destination.to_string(),
                reason: "simulated delivery failure".to_string(),
            });
        }
        self.deliveries.push(Delivery {
            destination: destination.clone(),
            payload,
            caption: caption.to_string(),
        });
        Ok(())
    }
}

impl OutputSink for RecordingSink {
    fn send_audio(&mut self, destination: &Destination, file: &ExportedFile, caption: &str) -> Result<()> {
        let payload = DeliveryPayload::Audio {
            filename: file.filename.clone(),
            bytes: file.bytes.clone(),
        };
        self.record_media(destination, payload, caption)
    }

    fn send_pages(&mut self, destination: &Destination, pages: &[RenderedPage], caption: &str) -> Result<()> {
        let payload = DeliveryPayload::Pages(pages.iter().map(|p| p.bytes.clone()).collect());
        self.record_media(destination, payload, caption)
    }

    fn send_message(&mut self, destination: &Destination, text: &str) -> Result<()> {
        self.deliveries.push(Delivery {
            destination: destination.clone(),
            payload: DeliveryPayload::Message,
            caption: text.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// DirectorySink
// ============================================================================

/// Writes deliveries to `<root>/user/` and `<root>/channel/`
///
/// Every media delivery gets a sequence prefix so repeated requests do not
/// overwrite each other.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    sequence: usize,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(DirectorySink { root, sequence: 0 })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder for a destination, created on demand
    pub fn folder(&self, destination: &Destination) -> Result<PathBuf> {
        let dir = match destination {
            Destination::Requester => self.root.join("user"),
            Destination::Channel(_) => self.root.join("channel"),
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn next_prefix(&mut self) -> String {
        self.sequence += 1;
        format!("{:03}_", self.sequence)
    }

    fn write_file(&self, dir: &Path, name: &str, bytes: &[u8], destination: &Destination) -> Result<()> {
        fs::write(dir.join(name), bytes).map_err(|e| PitchPageError::Delivery {
            destination: destination.to_string(),
            reason: format!("{}: {}", name, e),
        })
    }

    fn log_caption(&self, dir: &Path, entry: &str, caption: &str) -> Result<()> {
        let mut log = OpenOptions::new().create(true).append(true).open(dir.join(CAPTION_LOG))?;
        writeln!(log, "{}: {}", entry, caption.replace('\n', " | "))?;
        Ok(())
    }
}

impl OutputSink for DirectorySink {
    fn send_audio(&mut self, destination: &Destination, file: &ExportedFile, caption: &str) -> Result<()> {
        let dir = self.folder(destination)?;
        let name = format!("{}{}", self.next_prefix(), file.filename);
        self.write_file(&dir, &name, &file.bytes, destination)?;
        self.log_caption(&dir, &name, caption)
    }

    fn send_pages(&mut self, destination: &Destination, pages: &[RenderedPage], caption: &str) -> Result<()> {
        let dir = self.folder(destination)?;
        let prefix = self.next_prefix();
        for page in pages {
            let name = format!("{}{}", prefix, page.filename());
            self.write_file(&dir, &name, &page.bytes, destination)?;
        }
        self.log_caption(&dir, &format!("{}pages ({})", prefix, pages.len()), caption)
    }

    fn send_message(&mut self, destination: &Destination, text: &str) -> Result<()> {
        let dir = self.folder(destination)?;
        self.log_caption(&dir, "message", text)
    }
}
