//! Fehlertypen fuer das Auth-Crate

use thiserror::Error;

/// Auth-Fehlertypen
#[derive(Debug, Error)]
pub enum AuthFehler {
    #[error("Benutzername bereits vergeben: {0}")]
    BenutzerVorhanden(String),

    #[error("Ungueltige Anmeldedaten fuer: {0}")]
    UngueltigeAnmeldedaten(String),

    #[error("Ungueltiger Benutzername: {0}")]
    UngueltigerBenutzername(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type AuthResult<T> = Result<T, AuthFehler>;
