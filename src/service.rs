//! OS-facing text-to-speech service.
//!
//! [`TtsService`] is what the platform's TTS framework talks to: it tracks
//! the selected language, answers availability queries and runs one
//! synthesis request at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Settings, SettingsProvider};
use crate::core::engine::SynthesisEngine;
use crate::core::language::{Language, LanguageAvailability, match_locale, sample_text};
use crate::core::orchestrator::{
    Orchestrator, SynthesisOptions, SynthesisOutcome, SynthesisResult, TtsRequest,
};
use crate::core::session::SessionContext;
use crate::core::sink::SynthesisCallback;

pub struct TtsService<E: SynthesisEngine> {
    engine: tokio::sync::Mutex<E>,
    settings: Arc<dyn SettingsProvider>,
    orchestrator: Orchestrator,
    language: RwLock<Language>,
    /// Interrupt handles of every request not yet finished, including
    /// those still waiting for the engine.
    in_flight: Mutex<Vec<(u64, CancellationToken)>>,
    next_request: AtomicU64,
}

/// Removes a request's interrupt handle when the request ends or is dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<Vec<(u64, CancellationToken)>>,
    id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().retain(|(id, _)| *id != self.id);
    }
}

impl<E: SynthesisEngine> TtsService<E> {
    pub fn new(engine: E, settings: Arc<dyn SettingsProvider>, options: SynthesisOptions) -> Self {
        Self {
            engine: tokio::sync::Mutex::new(engine),
            settings,
            orchestrator: Orchestrator::new(options),
            language: RwLock::new(Language::default()),
            in_flight: Mutex::new(Vec::new()),
            next_request: AtomicU64::new(0),
        }
    }

    /// Currently loaded language.
    pub fn get_language(&self) -> Language {
        self.language.read().clone()
    }

    pub fn is_language_available(
        &self,
        language: &str,
        country: &str,
        variant: &str,
    ) -> LanguageAvailability {
        match_locale(language, country, variant)
    }

    /// Switch to a language if it is available at any tier.
    pub fn load_language(
        &self,
        language: &str,
        country: &str,
        variant: &str,
    ) -> LanguageAvailability {
        let availability = match_locale(language, country, variant);
        if availability.is_available() {
            *self.language.write() = Language::new(language, country, variant);
            debug!(language, country, variant, ?availability, "Language loaded");
        }
        availability
    }

    pub fn sample_text(&self, language: Option<&str>, country: Option<&str>) -> &'static str {
        sample_text(language, country)
    }

    /// Synthesize one request into `sink`. Concurrent calls run one after
    /// another.
    pub async fn synthesize(
        &self,
        request: &TtsRequest,
        sink: &mut dyn SynthesisCallback,
    ) -> SynthesisResult<SynthesisOutcome> {
        let ctx = SessionContext::new();
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        self.in_flight.lock().push((id, ctx.interrupt_handle()));
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            id,
        };

        let started = Instant::now();
        let settings = self.load_settings().await;
        let mut engine = self.engine.lock().await;

        let result = self
            .orchestrator
            .synthesize(&mut *engine, settings.as_ref(), request, &ctx, sink)
            .await;
        ctx.close();

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Synthesis request finished"
        );
        result
    }

    /// Providers may touch the filesystem, so loading runs off the runtime.
    async fn load_settings(&self) -> Option<Settings> {
        let provider = self.settings.clone();
        match tokio::task::spawn_blocking(move || provider.load()).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings provider failed: {}", e);
                None
            }
        }
    }

    /// Interrupt every request that has not finished yet, including ones
    /// still loading settings or waiting for the engine. Returns whether
    /// any was found.
    pub fn stop(&self) -> bool {
        let in_flight = self.in_flight.lock();
        for (_, token) in in_flight.iter() {
            token.cancel();
        }
        if !in_flight.is_empty() {
            info!(requests = in_flight.len(), "Stopping in-flight synthesis");
        }
        !in_flight.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.lock().is_empty()
    }
}
