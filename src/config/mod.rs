//! Configuration types and path resolution for ringside.
//!
//! Settings are stored as TOML at the platform's XDG config path
//! (e.g. `~/.config/ringside/config.toml` on Linux). A `ringside.toml` found
//! between the working directory and the git root overrides it field by field.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;
#[allow(unused_imports)]
pub use types::{ChatConfig, DataConfig, ProviderConfig, ProviderEntry};

use anyhow::Result;

impl Config {
    /// Loads the global file (writing a default one on first run), layers the
    /// nearest `ringside.toml` over it and resolves `{env:VAR}` placeholders.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project()?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }
}
