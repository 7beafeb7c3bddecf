//! Trailhead library
//!
//! Headless client engine for an AR plant scavenger hunt: session
//! bootstrap, checkpoint state, the tap-to-discover state machine, and
//! progress aggregation over the remote API. Rendering, marker
//! tracking, and camera capture belong to the presentation layer.

pub mod api;
pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
