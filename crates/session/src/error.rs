//! Fehlertypen fuer das Session-Crate
//!
//! Behandelbare Protokollfehler werden dem Peer als Statuszeile
//! gemeldet und tauchen hier nicht auf; dieser Enum buendelt nur die
//! Fehler, die eine Session beenden oder nach aussen gemeldet werden.

use thiserror::Error;

/// Session-Fehlertypen
#[derive(Debug, Error)]
pub enum SessionFehler {
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] flurfunk_protocol::ProtokollFehler),

    #[error("Auth-Fehler: {0}")]
    Auth(#[from] flurfunk_auth::AuthFehler),

    #[error("Speicher-Fehler: {0}")]
    Speicher(#[from] flurfunk_storage::SpeicherFehler),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionFehler>;
