//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `pack`    | `Pack`           |
//! | `serve`   | `Serve`          |
//! | `config`  | `Config`         |

pub mod config;
pub mod pack;
pub mod serve;

pub use config::cmd_config;
pub use pack::{PackArgs, cmd_pack};
pub use serve::cmd_serve;

use anyhow::Result;
use std::path::Path;

use confsearch::config::ServiceConfig;

/// Load `path` (or defaults) and apply environment overrides.
pub fn load_config(path: &Path) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::load_or_default(path)?;
    config.apply_env()?;
    Ok(config)
}
