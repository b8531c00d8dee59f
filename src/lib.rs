// Library surface so integration tests can drive the game headlessly;
// only the CLI and terminal bring-up stay in main.rs.
pub mod app;
pub mod app_dirs;
pub mod board;
pub mod input;
pub mod runtime;
pub mod service;
pub mod session;
pub mod stats;
pub mod timer;
pub mod ui;

/// Event loop cadence; the countdown timer derives whole seconds from this.
pub const TICK_RATE_MS: u64 = 100;
