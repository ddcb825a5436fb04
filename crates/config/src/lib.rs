//! Configuration loading and env substitution.
//!
//! Config files: `msgkit.toml`, `msgkit.yaml`, `msgkit.yml` or `msgkit.json`,
//! searched in `./` then the user config dir (`~/.config/msgkit/` on Linux).
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{AgentConfig, BotConfig, MsgkitConfig},
};
