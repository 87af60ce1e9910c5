//! Request dispatcher
//!
//! Turns one inbound request (an audio clip or a `/write` command) into
//! deliveries on an [`OutputSink`]: first to the requester, then to the
//! broadcast channel. Every artifact is produced before the first delivery,
//! and any per-request error becomes one generic notice to the requester.

mod sink;

pub use sink::{Delivery, DeliveryPayload, DirectorySink, RecordingSink};

use std::time::Instant;

use crate::config::BotConfig;
use crate::dsp::ChorusEffect;
use crate::engine::{base_filename, decode_audio, export_wav, filtered_filename, ExportedFile};
use crate::error::{PitchPageError, Result};
use crate::render::{PageRenderer, RenderedPage};

/// Notice sent when an audio request fails
pub const AUDIO_FAILURE_NOTICE: &str = "Processing failed.";
/// Notice sent when a page request fails
pub const WRITE_FAILURE_NOTICE: &str = "Failed.";
/// Reply to `/write` without any text
pub const MISSING_TEXT_NOTICE: &str = "Provide text.";

// ============================================================================
// Request and delivery types
// ============================================================================

/// Who sent the request; only used for captions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub first_name: String,
    pub username: Option<String>,
}

impl UserIdentity {
    pub fn new(first_name: impl Into<String>, username: Option<String>) -> Self {
        UserIdentity {
            first_name: first_name.into(),
            username,
        }
    }

    /// Username, or `unknown` when the user has none
    pub fn handle(&self) -> &str {
        self.username.as_deref().filter(|u| !u.is_empty()).unwrap_or("unknown")
    }

    /// `"{first_name} - @{handle}"`, used on channel posts
    pub fn attribution(&self) -> String {
        format!("{} - @{}", self.first_name, self.handle())
    }
}

/// Where a delivery goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The chat the request came from
    Requester,
    /// The broadcast channel with the given id
    Channel(String),
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Requester => write!(f, "requester"),
            Destination::Channel(id) => write!(f, "channel {}", id),
        }
    }
}

/// Delivery mechanism supplied by the messaging integration
///
/// Payloads are borrowed, so the same bytes can be sent to several
/// destinations.
pub trait OutputSink {
    fn send_audio(&mut self, destination: &Destination, file: &ExportedFile, caption: &str) -> Result<()>;

    /// Send pages as one album; `caption` goes on the first page
    fn send_pages(&mut self, destination: &Destination, pages: &[RenderedPage], caption: &str) -> Result<()>;

    fn send_message(&mut self, destination: &Destination, text: &str) -> Result<()>;
}

/// The two kinds of inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Audio,
    Write,
}

impl RequestKind {
    /// The single notice a requester sees when the request fails
    pub fn failure_notice(self) -> &'static str {
        match self {
            RequestKind::Audio => AUDIO_FAILURE_NOTICE,
            RequestKind::Write => WRITE_FAILURE_NOTICE,
        }
    }
}

/// What happened to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All outputs were delivered
    Delivered { deliveries: usize },
    /// Nothing to do; the requester got a hint
    Ignored,
    /// The request failed and the requester got the generic notice
    Failed { code: &'static str },
}

/// Extract the text after the command word of `/write ...`
///
/// Returns `None` when nothing but whitespace follows the command.
pub fn parse_write_command(message: &str) -> Option<&str> {
    let trimmed = message.trim_start();
    let split = trimmed.find(char::is_whitespace)?;
    let rest = trimmed[split..].trim_start();
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Runs both engines for inbound requests
#[derive(Debug)]
pub struct Dispatcher {
    config: BotConfig,
    effect: ChorusEffect,
    renderer: PageRenderer,
}

impl Dispatcher {
    /// Load all resources named by `config`
    ///
    /// # Errors
    /// Font, template and configuration errors are fatal and returned here,
    /// never per request.
    pub fn new(config: BotConfig) -> Result<Self> {
        config.validate()?;
        let renderer = PageRenderer::from_settings(&config.render)?;
        Ok(Dispatcher::with_renderer(config, renderer))
    }

    /// Use an already-built renderer
    pub fn with_renderer(config: BotConfig, renderer: PageRenderer) -> Self {
        let effect = ChorusEffect::new(config.pitch_steps.clone(), config.mix_policy);
        Dispatcher {
            config,
            effect,
            renderer,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    fn channel(&self) -> Option<Destination> {
        self.config.channel_id.clone().map(Destination::Channel)
    }

    /// Decode, apply the voice effect and export as WAV
    pub fn process_audio(&self, bytes: &[u8], original_name: &str) -> Result<ExportedFile> {
        let waveform = decode_audio(bytes)?;
        let mixed = self.effect.process(&waveform)?;
        export_wav(&mixed, filtered_filename(original_name), self.config.wav_format)
    }

    /// Render `text` into pages
    ///
    /// # Errors
    /// * `EmptyText` - If the text has no visible content (a no-op)
    pub fn render_text(&self, text: &str) -> Result<Vec<RenderedPage>> {
        if text.trim().is_empty() {
            return Err(PitchPageError::EmptyText);
        }
        self.renderer.render(text)
    }

    /// Handle an uploaded voice note or audio file
    pub fn handle_audio<S: OutputSink>(
        &self,
        sink: &mut S,
        bytes: &[u8],
        original_name: &str,
        user: &UserIdentity,
    ) -> Outcome {
        let started = Instant::now();
        log::info!("Audio request from {} ({} bytes, {})", user.attribution(), bytes.len(), original_name);

        let result = self.process_audio(bytes, original_name).and_then(|processed| {
            let timing = format!("\nTime took: {:.2} seconds", started.elapsed().as_secs_f64());
            let original = ExportedFile::new(bytes.to_vec(), base_filename(original_name));
            self.deliver_audio(sink, &processed, &original, user, &timing)
        });

        self.finish(sink, result, RequestKind::Audio, started)
    }

    /// Handle a `/write <text>` command
    pub fn handle_write<S: OutputSink>(&self, sink: &mut S, message: &str, user: &UserIdentity) -> Outcome {
        let started = Instant::now();
        let Some(text) = parse_write_command(message) else {
            log::debug!("Empty /write from {}", user.attribution());
            return self.ignore(sink);
        };
        log::info!("Write request from {} ({} chars)", user.attribution(), text.chars().count());

        let result = self
            .render_text(text)
            .and_then(|pages| self.deliver_pages(sink, &pages, user));

        match result {
            Err(err) if err.is_noop() => self.ignore(sink),
            other => self.finish(sink, other, RequestKind::Write, started),
        }
    }

    fn deliver_audio<S: OutputSink>(
        &self,
        sink: &mut S,
        processed: &ExportedFile,
        original: &ExportedFile,
        user: &UserIdentity,
        timing: &str,
    ) -> Result<usize> {
        let mut deliveries = 0;
        sink.send_audio(
            &Destination::Requester,
            processed,
            &format!("Thanks {}.{}", user.first_name, timing),
        )?;
        deliveries += 1;

        if let Some(channel) = self.channel() {
            sink.send_audio(&channel, processed, &format!("{}{}", user.attribution(), timing))?;
            sink.send_audio(&channel, original, &user.attribution())?;
            deliveries += 2;
        }
        Ok(deliveries)
    }

    fn deliver_pages<S: OutputSink>(&self, sink: &mut S, pages: &[RenderedPage], user: &UserIdentity) -> Result<usize> {
        let mut deliveries = 0;
        sink.send_pages(&Destination::Requester, pages, &format!("Thanks {}", user.first_name))?;
        deliveries += 1;

        if let Some(channel) = self.channel() {
            sink.send_pages(&channel, pages, &user.attribution())?;
            deliveries += 1;
        }
        Ok(deliveries)
    }

    fn ignore<S: OutputSink>(&self, sink: &mut S) -> Outcome {
        if let Err(err) = sink.send_message(&Destination::Requester, MISSING_TEXT_NOTICE) {
            log::warn!("Could not send hint: {}", err);
        }
        Outcome::Ignored
    }

    fn finish<S: OutputSink>(&self, sink: &mut S, result: Result<usize>, kind: RequestKind, started: Instant) -> Outcome {
        match result {
            Ok(deliveries) => {
                log::info!(
                    "Request done in {:.2}s ({} deliveries)",
                    started.elapsed().as_secs_f64(),
                    deliveries
                );
                Outcome::Delivered { deliveries }
            }
            Err(err) => {
                log::error!("Request failed [{}]: {}", err.error_code(), err);
                if let Err(notice_err) = sink.send_message(&Destination::Requester, kind.failure_notice()) {
                    log::warn!("Could not send failure notice: {}", notice_err);
                }
                Outcome::Failed {
                    code: err.error_code(),
                }
            }
        }
    }
}
