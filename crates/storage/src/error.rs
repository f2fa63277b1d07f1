//! Fehlertypen fuer das Storage-Crate

use thiserror::Error;

/// Speicher-Fehlertypen
#[derive(Debug, Error)]
pub enum SpeicherFehler {
    #[error("Ungueltiger Dateiname: {0}")]
    UngueltigerDateiname(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpeicherResult<T> = Result<T, SpeicherFehler>;
