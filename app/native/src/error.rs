//! Error types for Tessera.
//!
//! Layer-specific errors live next to their code (`config`, `mosaic`); this is
//! the one the CLI surfaces.

use thiserror::Error;

use crate::config::ConfigError;
use crate::mosaic::CycleError;
use crate::mosaic::catalog::CatalogError;

/// Errors that can end a CLI command.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The cover folder could not be listed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// A manually triggered cycle failed.
    #[error("Update cycle failed: {0}")]
    Cycle(#[from] CycleError),
    /// IO error outside the engine (runtime startup, signal handling).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TesseraError {
    /// Whether this is a startup configuration problem.
    #[must_use]
    pub const fn is_config(&self) -> bool { matches!(self, Self::Config(_)) }
}
