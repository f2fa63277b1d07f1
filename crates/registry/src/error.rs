//! Fehlertypen fuer das Registry-Crate

use thiserror::Error;

/// Registry-Fehlertypen
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryFehler {
    #[error("Benutzer bereits angemeldet: {0}")]
    BereitsAngemeldet(String),

    #[error("Postfach voll: {belegt} von {kapazitaet} Nachrichten belegt")]
    PostfachVoll { belegt: usize, kapazitaet: usize },
}

pub type RegistryResult<T> = Result<T, RegistryFehler>;
