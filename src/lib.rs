//! raybay - patchbay graph model for JACK/PipeWire sessions
//!
//! Mirrors the audio server's ports and connections into client groups,
//! detects stereo pairs, cleans up port names and keeps a canvas in sync.

pub mod config;
pub mod graph;
pub mod patchbay;
pub mod replay;
