//! Credential-Speicher – Trait und zeilenbasierte Datei-Implementierung
//!
//! Dateiformat: eine Zeile pro Benutzer, `benutzer passwort`,
//! whitespace-getrennt. Die Datei wird pro Zugriff gelesen bzw.
//! angehaengt; sie ist die einzige persistente Wahrheit des Systems.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;

use crate::error::{AuthFehler, AuthResult};

/// Abstrakter Credential-Speicher
#[allow(async_fn_in_trait)]
pub trait CredentialStore: Send + Sync {
    /// Prueft ob der Benutzername bereits vergeben ist
    async fn vorhanden(&self, benutzer: &str) -> AuthResult<bool>;

    /// Haengt einen neuen Eintrag an
    ///
    /// Schlaegt mit [`AuthFehler::BenutzerVorhanden`] fehl wenn der Name
    /// bereits existiert.
    async fn anhaengen(&self, benutzer: &str, passwort: &str) -> AuthResult<()>;

    /// Prueft Benutzername und Passwort gegen den Speicher
    async fn pruefen(&self, benutzer: &str, passwort: &str) -> AuthResult<bool>;
}

/// Zeilenbasierter Credential-Speicher auf Datei-Basis
#[derive(Debug, Clone)]
pub struct DateiCredentialStore {
    pfad: PathBuf,
}

impl DateiCredentialStore {
    /// Erstellt einen Speicher fuer die angegebene Datei
    ///
    /// Die Datei muss nicht existieren; ein fehlender Speicher verhaelt
    /// sich wie ein leerer.
    pub fn neu(pfad: impl Into<PathBuf>) -> Self {
        Self { pfad: pfad.into() }
    }

    /// Liest alle Eintraege als (benutzer, passwort)-Paare
    async fn eintraege(&self) -> AuthResult<Vec<(String, String)>> {
        let inhalt = match tokio::fs::read_to_string(&self.pfad).await {
            Ok(inhalt) => inhalt,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(inhalt
            .lines()
            .filter_map(|zeile| {
                let mut tokens = zeile.split_whitespace();
                match (tokens.next(), tokens.next()) {
                    (Some(benutzer), Some(passwort)) => {
                        Some((benutzer.to_string(), passwort.to_string()))
                    }
                    _ => None,
                }
            })
            .collect())
    }
}

/// Validiert dass ein Token das Zeilenformat nicht zerstoeren kann
fn token_pruefen(token: &str) -> AuthResult<()> {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AuthFehler::UngueltigerBenutzername(token.to_string()));
    }
    Ok(())
}

impl CredentialStore for DateiCredentialStore {
    async fn vorhanden(&self, benutzer: &str) -> AuthResult<bool> {
        Ok(self
            .eintraege()
            .await?
            .iter()
            .any(|(name, _)| name == benutzer))
    }

    async fn anhaengen(&self, benutzer: &str, passwort: &str) -> AuthResult<()> {
        token_pruefen(benutzer)?;
        token_pruefen(passwort)?;

        if self.vorhanden(benutzer).await? {
            return Err(AuthFehler::BenutzerVorhanden(benutzer.to_string()));
        }

        let mut datei = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.pfad)
            .await?;
        datei
            .write_all(format!("{benutzer} {passwort}\n").as_bytes())
            .await?;
        datei.flush().await?;

        tracing::info!(benutzer = benutzer, "Benutzer registriert");
        Ok(())
    }

    async fn pruefen(&self, benutzer: &str, passwort: &str) -> AuthResult<bool> {
        Ok(self
            .eintraege()
            .await?
            .iter()
            .any(|(name, pass)| name == benutzer && pass == passwort))
    }
}
