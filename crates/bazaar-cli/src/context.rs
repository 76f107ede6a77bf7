#![deny(clippy::all, clippy::pedantic)]

use bazaar::config::{LoadError, Settings};
use bazaar::infra::error::InfraError;
use bazaar::{ClientError, Marketplace};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to render output: {0}")]
    Render(String),
    #[error("not signed in (run `bazaar-cli login` first)")]
    NotSignedIn,
}

/// Everything a command handler needs.
#[derive(Clone, Debug)]
pub struct Ctx {
    pub market: Marketplace,
}

impl Ctx {
    #[must_use]
    pub fn new(market: Marketplace) -> Self {
        Self { market }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        Ok(Self::new(Marketplace::from_settings(settings)?))
    }

    /// Fails fast for commands that need an identity.
    pub fn require_session(&self) -> Result<(), CliError> {
        if self.market.session().is_authenticated() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }
}
