//! JavaScript-facing player

use super::engine::HtmlAudioEngine;
use super::storage::LocalStorageStore;
use crate::controller::PlaybackController;
use crate::error::{PlaybackError, Result};
use crate::reporter::{LogReporter, StatsReporter};
use crate::storage::{KeyValueStore, MemoryStore};
use crate::types::{ListeningReport, PlaybackConfig};
use js_sys::Function;
use orpheon_core::Track;
use wasm_bindgen::prelude::*;

/// Forwards listening reports to a JS function `(report) => void`
///
/// The callback owns delivery (usually a `fetch` to the stats endpoint).
pub struct JsCallbackReporter {
    callback: Function,
}

impl JsCallbackReporter {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl StatsReporter for JsCallbackReporter {
    fn report(&self, report: ListeningReport) -> Result<()> {
        let value = serde_wasm_bindgen::to_value(&report)
            .map_err(|e| PlaybackError::reporting(e.to_string()))?;
        self.callback
            .call1(&JsValue::NULL, &value)
            .map_err(|e| PlaybackError::reporting(format!("{e:?}")))?;
        Ok(())
    }
}

/// Browser playback session
///
/// Engine events are queued by the `<audio>` element; call `pump()` from the
/// host loop (or from the element's own listeners) to apply them. UI events
/// go to the `onEvent` callback after every call.
#[wasm_bindgen]
pub struct WasmPlayer {
    inner: PlaybackController<HtmlAudioEngine>,
    on_event: Option<Function>,
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Create a player
    ///
    /// `config` is a (possibly partial) `PlaybackConfig` object or
    /// `undefined`. Without `statsCallback` reports are only logged.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, stats_callback: Option<Function>) -> std::result::Result<WasmPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let config: PlaybackConfig = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };

        let engine = HtmlAudioEngine::new().map_err(to_js)?;
        let storage: Box<dyn KeyValueStore> = match LocalStorageStore::new() {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(error = %e, "localStorage unavailable, state will not survive reloads");
                Box::new(MemoryStore::new())
            }
        };
        let reporter: Box<dyn StatsReporter> = match stats_callback {
            Some(callback) => Box::new(JsCallbackReporter::new(callback)),
            None => Box::new(LogReporter),
        };

        let inner = PlaybackController::new(config, engine, storage, reporter).map_err(to_js)?;
        Ok(Self {
            inner,
            on_event: None,
        })
    }

    // ===== Playback Control =====

    /// Play `track` (a Track object) within `context` (an array of Tracks)
    #[wasm_bindgen(js_name = startPlayback)]
    pub fn start_playback(&mut self, track: JsValue, context: JsValue) -> std::result::Result<(), JsValue> {
        let track: Track = serde_wasm_bindgen::from_value(track)?;
        let context: Vec<Track> = serde_wasm_bindgen::from_value(context)?;
        self.inner.start_playback(&track, &context);
        self.dispatch_events();
        Ok(())
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) {
        self.inner.toggle_play();
        self.dispatch_events();
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, volume: f64) {
        self.inner.set_volume(volume);
        self.dispatch_events();
    }

    #[wasm_bindgen(js_name = setProgress)]
    pub fn set_progress(&mut self, seconds: f64) {
        self.inner.set_progress(seconds);
        self.dispatch_events();
    }

    #[wasm_bindgen(js_name = playNext)]
    pub fn play_next(&mut self) {
        self.inner.play_next();
        self.dispatch_events();
    }

    #[wasm_bindgen(js_name = playPrevious)]
    pub fn play_previous(&mut self) {
        self.inner.play_previous();
        self.dispatch_events();
    }

    /// Append an array of Tracks to the explicit queue
    #[wasm_bindgen(js_name = addToQueue)]
    pub fn add_to_queue(&mut self, tracks: JsValue) -> std::result::Result<(), JsValue> {
        let tracks: Vec<Track> = serde_wasm_bindgen::from_value(tracks)?;
        self.inner.add_to_queue(tracks);
        self.dispatch_events();
        Ok(())
    }

    /// Apply queued `<audio>` events
    pub fn pump(&mut self) {
        self.inner.pump();
        self.dispatch_events();
    }

    /// Flush stats and state and release the audio source
    pub fn teardown(&mut self) {
        self.inner.teardown();
        self.dispatch_events();
    }

    // ===== State =====

    /// Current `PlaybackState` as a plain object
    pub fn state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.inner.state()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.state().is_playing
    }

    /// Explicit queue as an array of Tracks
    pub fn queue(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.inner.queue().queue()).unwrap_or(JsValue::NULL)
    }

    // ===== Events =====

    /// Register `(event) => void` for UI events
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        self.on_event = Some(callback);
    }

    fn dispatch_events(&mut self) {
        let events = self.inner.drain_events();
        let Some(callback) = &self.on_event else {
            return;
        };
        for event in events {
            if let Ok(value) = serde_wasm_bindgen::to_value(&event) {
                callback.call1(&JsValue::NULL, &value).ok();
            }
        }
    }
}

fn to_js(error: PlaybackError) -> JsValue {
    JsValue::from_str(&error.to_string())
}
