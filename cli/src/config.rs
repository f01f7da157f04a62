use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

pub const DEFAULT_BASE_URL: &str = "http://localhost:1337/api";

/// Where the API lives and where the session is kept.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Base URL of the content API.
    #[arg(long, env = "TODO_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Local storage file holding the logged-in user.
    #[arg(long, env = "TODO_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,
}

impl Config {
    pub fn session_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        let dir = dirs::config_dir().context("no config directory on this platform")?;
        Ok(dir.join("todo-client").join("storage.json"))
    }
}
