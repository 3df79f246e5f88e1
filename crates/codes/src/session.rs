use fcstamp_core::{HostDocument, TextStyle};
use rand::rngs::ThreadRng;
use tracing::{error, info, warn};

use crate::code::Code;
use crate::controls::{Controls, Phase};
use crate::error::CodeError;
use crate::generator::{generate_unique, CodeSource, GeneratorPolicy, RngSource};
use crate::inserter::{code_style, insert_pending};
use crate::pending::PendingCode;
use crate::scanner::scan_codes;

/// Policy and formatting a [`Stamper`] runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct StampConfig {
    pub policy: GeneratorPolicy,
    pub style: TextStyle,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            policy: GeneratorPolicy::default(),
            style: code_style(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Message destined for the status area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Code),
    /// The host rejected the write as an invalid argument; the code stays pending.
    Suppressed,
}

/// Generate/insert session bound to one document host.
pub struct Stamper<H, S = RngSource<ThreadRng>> {
    host: H,
    source: S,
    config: StampConfig,
    pending: PendingCode,
    controls: Controls,
    status: Option<StatusMessage>,
}

impl<H: HostDocument> Stamper<H> {
    /// Session drawing from the thread-local RNG.
    pub fn with_thread_rng(host: H, config: StampConfig) -> Self {
        Self::new(host, RngSource::thread(), config)
    }
}

impl<H, S> Stamper<H, S>
where
    H: HostDocument,
    S: CodeSource,
{
    pub fn new(host: H, source: S, config: StampConfig) -> Self {
        Self {
            host,
            source,
            config,
            pending: PendingCode::default(),
            controls: Controls::default(),
            status: None,
        }
    }

    /// Reports trigger state through `controls`, e.g. a handle the UI already holds.
    pub fn with_controls(mut self, controls: Controls) -> Self {
        controls.set(self.idle_phase());
        self.controls = controls;
        self
    }

    /// Scans the document and stores a fresh unique code as pending.
    ///
    /// Failures leave the previous pending code in place.
    pub async fn generate(&mut self) -> Result<Code, CodeError> {
        let busy = self.controls.enter_busy();
        let result = match scan_codes(&mut self.host).await {
            Ok(existing) => generate_unique(&existing, &mut self.source, &self.config.policy),
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(code) => {
                self.pending.replace(code);
                self.status = None;
                busy.finish(Phase::CodeReady);
                info!(%code, "generated code");
                Ok(code)
            }
            Err(err) => {
                error!(error = %err, "code generation failed");
                self.status = Some(StatusMessage::error(format!("Error: {err}")));
                Err(err)
            }
        }
    }

    /// Inserts the pending code at the cursor.
    pub async fn insert(&mut self) -> Result<InsertOutcome, CodeError> {
        if self.pending.is_empty() {
            let err = CodeError::NoPendingCode;
            self.status = Some(StatusMessage::error(err.to_string()));
            return Err(err);
        }

        let busy = self.controls.enter_busy();
        match insert_pending(&mut self.host, &mut self.pending, &self.config.style).await {
            Ok(code) => {
                self.status = None;
                busy.finish(Phase::NoCode);
                Ok(InsertOutcome::Inserted(code))
            }
            Err(CodeError::IgnorableInsertion(err)) => {
                warn!(error = %err, "host rejected insertion; ignoring");
                Ok(InsertOutcome::Suppressed)
            }
            Err(err) => {
                error!(error = %err, "code insertion failed");
                self.status = Some(StatusMessage::error(format!(
                    "Error inserting code: {err}"
                )));
                Err(err)
            }
        }
    }

    pub fn pending(&self) -> Option<Code> {
        self.pending.get()
    }

    /// Drives the insert trigger's enabled state.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn display_text(&self) -> String {
        self.pending.display_text()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn config(&self) -> &StampConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    fn idle_phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::CodeReady
        } else {
            Phase::NoCode
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcstamp_core::{Document, MemoryHost};
    use futures::executor::block_on;

    #[test]
    fn thread_rng_session_generates_fresh_codes() {
        let host = MemoryHost::new(Document::from_text("fc-100-100"));
        let mut session = Stamper::with_thread_rng(host, StampConfig::default());
        let code = block_on(session.generate()).unwrap();
        assert_ne!(code.to_string(), "fc-100-100");
        assert_eq!(session.display_text(), code.to_string());
        assert!(session.controls().insert_enabled());
        assert!(session.status().is_none());
    }

    #[test]
    fn with_controls_reflects_existing_state() {
        let controls = Controls::default();
        let session = Stamper::with_thread_rng(
            MemoryHost::new(Document::new()),
            StampConfig::default(),
        )
        .with_controls(controls.clone());
        assert_eq!(controls.phase(), Phase::NoCode);
        assert!(controls.generate_enabled());
        assert!(!session.controls().insert_enabled());
    }
}
