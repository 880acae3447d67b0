// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the wagate gateway.
//!
//! Values come from compiled defaults, up to three `wagate.toml` files and a
//! fixed set of environment variables (`PORT`, `WHATSAPP_TOKEN`,
//! `QUEUE_MODE`, ...). The model rejects unknown keys, and every semantic
//! check runs before the first error is reported.
//!
//! ```no_run
//! match wagate_config::load_and_validate() {
//!     Ok(config) => println!("queue mode: {:?}", config.queue.mode),
//!     Err(errors) => wagate_config::render_errors(&errors),
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, ConfigSources, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{QueueMode, WagateConfig};

/// Load configuration from the lookup hierarchy and environment, then validate it.
///
/// Extraction failures are reported against whichever config files exist,
/// so unknown keys can be underlined in place.
pub fn load_and_validate() -> Result<WagateConfig, Vec<ConfigError>> {
    finish(loader::load_config(), ConfigSources::discover)
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<WagateConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        ConfigSources::inline("<inline>", toml_content)
    })
}

fn finish(
    loaded: Result<WagateConfig, figment::Error>,
    sources: impl FnOnce() -> ConfigSources,
) -> Result<WagateConfig, Vec<ConfigError>> {
    let config =
        loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
