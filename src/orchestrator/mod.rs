//! Application-level orchestration.
//!
//! This module owns the toggle lifecycle for interactive front-ends: it turns UI
//! commands into compose invocations, serializes them, and reports results as
//! events so the UI thread never blocks on a subprocess.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
