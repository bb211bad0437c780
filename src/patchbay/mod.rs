//! Patchbay module
//!
//! Keeps the canvas in step with the audio server graph: naming, stereo
//! pairing and the event/command plumbing around the graph model.
//! Independent of any UI toolkit or server transport.

pub mod icons;
pub mod manager;
pub mod naming;
pub mod pairing;
pub mod types;

pub use icons::{ClientIconLookup, ClientInfo, ClientRegistry};
pub use manager::PatchbayManager;
pub use types::{BackendRequest, CanvasAction, CanvasCommand, PatchEvent};
