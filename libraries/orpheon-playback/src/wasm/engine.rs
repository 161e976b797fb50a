//! `HtmlAudioElement` engine

use crate::engine::{
    clamp_position, clamp_volume, AudioEngine, EngineEvent, EngineEventKind, SourceGeneration,
};
use crate::error::{PlaybackError, Result};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlAudioElement, Url};

#[derive(Debug, Default)]
struct Shared {
    generation: SourceGeneration,
    metadata_loaded: bool,
    pending_seek: Option<f64>,
    events: Vec<EngineEvent>,
}

impl Shared {
    fn push(&mut self, kind: EngineEventKind) {
        self.events.push(EngineEvent::new(self.generation, kind));
    }
}

/// Engine over a detached `<audio>` element
///
/// Element listeners only queue events; the owner applies them by pumping
/// the controller.
pub struct HtmlAudioEngine {
    audio: HtmlAudioElement,
    shared: Rc<RefCell<Shared>>,
    object_url: Option<String>,
    listeners: Vec<Closure<dyn FnMut()>>,
}

impl HtmlAudioEngine {
    pub fn new() -> Result<Self> {
        let audio = HtmlAudioElement::new()
            .map_err(|e| PlaybackError::engine(format!("cannot create audio element: {e:?}")))?;
        audio.set_preload("metadata");

        let shared = Rc::new(RefCell::new(Shared::default()));
        let mut engine = Self {
            audio,
            shared,
            object_url: None,
            listeners: Vec::new(),
        };
        engine.attach_listeners();
        Ok(engine)
    }

    /// Underlying element, for hosts that want to listen to it directly
    pub fn audio_element(&self) -> &HtmlAudioElement {
        &self.audio
    }

    fn attach_listeners(&mut self) {
        let shared = Rc::clone(&self.shared);
        let on_time = Closure::wrap(Box::new(move || {
            shared.borrow_mut().push(EngineEventKind::TimeUpdate);
        }) as Box<dyn FnMut()>);
        self.audio
            .set_ontimeupdate(Some(on_time.as_ref().unchecked_ref()));

        let shared = Rc::clone(&self.shared);
        let audio = self.audio.clone();
        let on_metadata = Closure::wrap(Box::new(move || {
            let mut shared = shared.borrow_mut();
            shared.metadata_loaded = true;
            shared.push(EngineEventKind::LoadedMetadata);
            if let Some(target) = shared.pending_seek.take() {
                audio.set_current_time(clamp_position(target, finite_or_zero(audio.duration())));
            }
        }) as Box<dyn FnMut()>);
        self.audio
            .set_onloadedmetadata(Some(on_metadata.as_ref().unchecked_ref()));

        let shared = Rc::clone(&self.shared);
        let on_ended = Closure::wrap(Box::new(move || {
            shared.borrow_mut().push(EngineEventKind::Ended);
        }) as Box<dyn FnMut()>);
        self.audio.set_onended(Some(on_ended.as_ref().unchecked_ref()));

        self.listeners = vec![on_time, on_metadata, on_ended];
    }

    fn revoke_object_url(&mut self) {
        if let Some(url) = self.object_url.take() {
            if let Err(e) = Url::revoke_object_url(&url) {
                tracing::warn!(url = %url, error = ?e, "Failed to revoke object URL");
            }
        }
    }
}

impl AudioEngine for HtmlAudioEngine {
    fn play(&mut self) -> Result<()> {
        if self.audio.src().is_empty() {
            return Err(PlaybackError::NoSourceLoaded);
        }

        let promise = self
            .audio
            .play()
            .map_err(|e| PlaybackError::PlayRejected(format!("{e:?}")))?;

        let shared = Rc::clone(&self.shared);
        let generation = shared.borrow().generation;
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                let reason = e.as_string().unwrap_or_else(|| format!("{e:?}"));
                shared.borrow_mut().events.push(EngineEvent::new(
                    generation,
                    EngineEventKind::PlayRejected { reason },
                ));
            }
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Err(e) = self.audio.pause() {
            tracing::warn!(error = ?e, "Failed to pause audio element");
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.audio.set_volume(clamp_volume(volume));
    }

    fn volume(&self) -> f64 {
        self.audio.volume()
    }

    fn set_progress(&mut self, seconds: f64) {
        let mut shared = self.shared.borrow_mut();
        if shared.metadata_loaded {
            let duration = finite_or_zero(self.audio.duration());
            self.audio.set_current_time(clamp_position(seconds, duration));
        } else if seconds.is_finite() {
            shared.pending_seek = Some(seconds.max(0.0));
        }
    }

    fn set_source(&mut self, locator: &str) -> SourceGeneration {
        self.revoke_object_url();

        let generation = {
            let mut shared = self.shared.borrow_mut();
            shared.generation += 1;
            shared.metadata_loaded = false;
            shared.pending_seek = None;
            shared.generation
        };

        self.audio.set_src(locator);
        if locator.starts_with("blob:") {
            self.object_url = Some(locator.to_string());
        }
        generation
    }

    fn release_source(&mut self) {
        self.pause();
        self.revoke_object_url();
        {
            let mut shared = self.shared.borrow_mut();
            shared.metadata_loaded = false;
            shared.pending_seek = None;
        }
        if self.audio.src().is_empty() {
            return;
        }
        if let Err(e) = self.audio.remove_attribute("src") {
            tracing::warn!(error = ?e, "Failed to detach audio source");
        }
        self.audio.load();
    }

    fn current_time(&self) -> f64 {
        if self.shared.borrow().metadata_loaded {
            finite_or_zero(self.audio.current_time())
        } else {
            0.0
        }
    }

    fn duration(&self) -> f64 {
        finite_or_zero(self.audio.duration())
    }

    fn is_paused(&self) -> bool {
        self.audio.paused()
    }

    fn generation(&self) -> SourceGeneration {
        self.shared.borrow().generation
    }

    fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.shared.borrow_mut().events)
    }
}

impl Drop for HtmlAudioEngine {
    fn drop(&mut self) {
        self.audio.set_ontimeupdate(None);
        self.audio.set_onloadedmetadata(None);
        self.audio.set_onended(None);
        self.revoke_object_url();
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
