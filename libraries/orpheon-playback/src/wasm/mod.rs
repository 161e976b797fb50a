//! Browser bindings
//!
//! An `<audio>`-backed engine, `localStorage` persistence and a
//! `#[wasm_bindgen]` facade over [`crate::PlaybackController`].

pub mod engine;
pub mod player;
pub mod storage;

pub use engine::HtmlAudioEngine;
pub use player::WasmPlayer;
pub use storage::LocalStorageStore;
