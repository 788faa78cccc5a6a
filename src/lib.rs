// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod dataset;
pub mod error;
pub mod feature;
pub mod logging;
pub mod presentation;
pub mod quiz;
pub mod runtime;
pub mod selection;
pub mod ui;

pub use app::{Action, App};
