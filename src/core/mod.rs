// src/core/mod.rs

pub mod config_loader;
pub mod environment;
pub mod locator;
pub mod module;
pub mod paths;
pub mod script;
pub mod status;
