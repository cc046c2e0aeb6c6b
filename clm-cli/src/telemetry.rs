//! Tracing setup for the terminal build.
//!
//! - LOG_LEVEL holds the filter directives (default `info,clm_core=debug`).
//! - LOG_FORMAT=json switches to JSON lines.
//!
//! The TUI owns the terminal, so events go to `~/.clm/clm.log`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::io;

pub fn init_tracing() -> Result<()> {
    let path = io::clm_dir()?.join("clm.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info,clm_core=debug"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}
