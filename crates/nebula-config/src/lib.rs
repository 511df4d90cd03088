//! Configuration for the tile tools.
//!
//! Settings persist to disk as `config.ron` and embed the codec's
//! [`EncodeConfig`](nebula_tile::EncodeConfig). Command-line flags parsed by
//! [`CliArgs`] override whatever the file says.

mod cli;
mod config;
mod error;

pub use cli::{AlphaArg, CliArgs, HolesArg, LiquidArg};
pub use config::{CheckConfig, Config, DebugConfig};
pub use error::ConfigError;
