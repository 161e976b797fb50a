/// Headless listening session
///
/// Runs the playback core against the simulated engine, a file-backed state
/// store and a reporter that records every flush (and optionally posts it to
/// the backend).
use crate::catalog::find_track;
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::script::Action;
use orpheon_core::{Track, TrackId};
use orpheon_playback::{
    FileStore, HttpStatsReporter, ListeningReport, MemoryReporter, PlaybackController,
    PlaybackEvent, PlaybackState, SimulatedEngine, SimulationHandle, StatsReporter,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Engine clock resolution used while listening
pub const DEFAULT_STEP_SECS: f64 = 0.25;

/// Records every report and forwards it to the backend when configured
#[derive(Debug, Clone, Default)]
pub struct SessionReporter {
    recorded: MemoryReporter,
    http: Option<HttpStatsReporter>,
}

impl SessionReporter {
    pub fn new(http: Option<HttpStatsReporter>) -> Self {
        Self {
            recorded: MemoryReporter::new(),
            http,
        }
    }

    /// Build from configuration; needs a running tokio runtime when
    /// reporting is enabled
    pub fn from_config(config: &PlayerConfig) -> Result<Self> {
        if !config.server.report_stats {
            return Ok(Self::new(None));
        }

        let mut http =
            HttpStatsReporter::new(&config.server.base_url, tokio::runtime::Handle::current())?;
        if let Some(token) = &config.server.token {
            http = http.with_bearer_token(token.clone());
        }
        info!(base_url = %config.server.base_url, "Reporting listening stats");
        Ok(Self::new(Some(http)))
    }

    pub fn reports(&self) -> Vec<ListeningReport> {
        self.recorded.reports()
    }

    /// Wait for in-flight deliveries
    pub async fn settle(&self) {
        let Some(http) = &self.http else {
            return;
        };
        for handle in http.take_pending() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Stats delivery task failed");
            }
        }
    }
}

impl StatsReporter for SessionReporter {
    fn report(&self, report: ListeningReport) -> orpheon_playback::Result<()> {
        if let Some(http) = &self.http {
            http.report(report.clone())?;
        }
        self.recorded.report(report)
    }
}

/// Outcome of a session, printed by the binary
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub state: PlaybackState,
    pub reports: Vec<ListeningReport>,
}

pub struct Session {
    player: PlaybackController<SimulatedEngine>,
    clock: SimulationHandle,
    reporter: SessionReporter,
    catalog: Vec<Track>,
    step: f64,
}

impl Session {
    /// Open a session, resuming whatever the data directory holds
    pub fn open(config: &PlayerConfig, catalog: Vec<Track>, reporter: SessionReporter) -> Result<Self> {
        let store = FileStore::open(&config.storage.data_dir)?;
        let engine = SimulatedEngine::new();
        let clock = engine.handle();

        let player = PlaybackController::new(
            config.playback.clone(),
            engine,
            Box::new(store),
            Box::new(reporter.clone()),
        )?;

        let session = Self {
            player,
            clock,
            reporter,
            catalog,
            step: DEFAULT_STEP_SECS,
        };
        session.register_media();
        Ok(session)
    }

    /// Clock resolution for `listen`; non-positive values keep the default
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        if step.is_finite() && step > 0.0 {
            self.step = step;
        }
        self
    }

    /// Play a catalog track (the first one when `track_id` is `None`) with the
    /// whole catalog as context
    pub fn start(&mut self, track_id: Option<&TrackId>) -> Result<()> {
        let track = match track_id {
            Some(id) => find_track(&self.catalog, id)?.clone(),
            None => self
                .catalog
                .first()
                .cloned()
                .ok_or_else(|| PlayerError::catalog("catalog is empty"))?,
        };

        self.player.start_playback(&track, &self.catalog);
        self.log_events();
        Ok(())
    }

    pub fn apply(&mut self, action: &Action) -> Result<()> {
        debug!(action = %action, "Applying action");
        match action {
            Action::Tick(secs) => self.listen(*secs),
            Action::Seek(secs) => self.player.set_progress(*secs),
            Action::Toggle => self.player.toggle_play(),
            Action::Next => self.player.play_next(),
            Action::Previous => self.player.play_previous(),
            Action::Volume(volume) => self.player.set_volume(*volume),
            Action::Queue(id) => {
                let track = find_track(&self.catalog, id)?.clone();
                self.player.add_to_queue(vec![track]);
            }
        }
        self.log_events();
        Ok(())
    }

    /// Let `seconds` of wall time pass in `step` increments
    ///
    /// Time only moves the playhead while playing; track ends inside the
    /// window advance through the context as they would live.
    pub fn listen(&mut self, seconds: f64) {
        let mut remaining = seconds.max(0.0);
        while remaining > 0.0 {
            let dt = self.step.min(remaining);
            self.clock.advance(dt);
            self.player.pump();
            self.log_events();
            remaining -= dt;
        }
    }

    pub fn player(&self) -> &PlaybackController<SimulatedEngine> {
        &self.player
    }

    pub fn reporter(&self) -> &SessionReporter {
        &self.reporter
    }

    /// Tear the session down and collect what was reported
    pub fn finish(mut self) -> SessionSummary {
        self.player.teardown();
        self.log_events();
        SessionSummary {
            state: self.player.state().clone(),
            reports: self.reporter.reports(),
        }
    }

    fn register_media(&self) {
        let restored = self.player.state().current_track.clone();
        for track in self.catalog.iter().chain(restored.as_ref()) {
            let locator = self.player.resolver().resolve(track);
            self.clock.register_media(locator, f64::from(track.duration));
        }
    }

    fn log_events(&mut self) {
        for event in self.player.drain_events() {
            match event {
                PlaybackEvent::TrackChanged { track_id, .. } => {
                    info!(track_id = %track_id, "Now playing");
                }
                PlaybackEvent::TrackFinished { track_id } => {
                    info!(track_id = %track_id, "Track finished");
                }
                PlaybackEvent::ListeningFlushed { track_id, ranges } => {
                    info!(track_id = %track_id, ranges = ?ranges, "Listening stats flushed");
                }
                PlaybackEvent::Error { message } => warn!(error = %message, "Playback error"),
                other => debug!(event = ?other, "Playback event"),
            }
        }
    }
}
