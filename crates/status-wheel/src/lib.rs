//! Status wheel command-line application.
//!
//! - `cli` - flag definitions
//! - `app` - startup wiring and the run-until-interrupted entry point

pub mod app;
pub mod cli;
