//! Fehlertypen fuer das Client-Crate

use thiserror::Error;

/// Client-Fehlertypen
#[derive(Debug, Error)]
pub enum ClientFehler {
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] flurfunk_protocol::ProtokollFehler),

    #[error("Speicher-Fehler: {0}")]
    Speicher(#[from] flurfunk_storage::SpeicherFehler),

    #[error("Datei zu gross fuer das Laengenfeld: {0} Bytes")]
    DateiZuGross(u64),

    #[error("Ungueltiger Dateipfad: {0}")]
    UngueltigerPfad(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientFehler>;
