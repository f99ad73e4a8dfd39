//! Screenshot capture orchestration for Wayland desktops.
//!
//! The binary is a thin wrapper around [`cli::run`]. Everything else is exposed
//! so other front-ends (a configurator, scripts driving the D-Bus interface)
//! can share the request model, validation and configuration code.

pub mod app;
pub mod capture;
pub mod cli;
pub mod color;
pub mod config;
pub mod control;
pub mod daemon;
pub mod event_loop;
pub mod instance;
pub mod notification;
pub mod orchestrator;
pub mod util;

pub use config::Config;
