//! golcheck — visual verification harness for the Game of Life browser app.
//!
//! The harness drives a locally running instance of the visualizer over CDP
//! and runs three scripted scenarios: the mobile control layout, a seeded
//! game-of-life run with the "Glider" preset, and the 3D sphere view. Each
//! scenario reports its checks and leaves a screenshot behind as the visual
//! artifact.

pub mod browser;
pub mod client;
pub mod config;
pub mod logging;
pub mod page;
pub mod runtime;
pub mod scenario;
pub mod server;
pub mod types;
