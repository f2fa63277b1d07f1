//! Geteilter Server-Zustand fuer alle Verbindungs-Tasks

use std::time::Duration;

use flurfunk_auth::CredentialStore;
use flurfunk_registry::{ClientDirectory, MailboxStore};
use flurfunk_storage::FileStore;

/// Limits einer Session
#[derive(Debug, Clone)]
pub struct SessionLimits {
    /// Maximale Laenge einer Befehlszeile in Bytes
    pub max_befehlszeile_bytes: usize,
    /// Maximale Groesse eines Stream-Frames in Bytes
    pub max_frame_bytes: usize,
    /// Maximale Groesse eines Datei-Uploads in Bytes
    pub max_datei_bytes: u64,
    /// Idle-Timeout; `None` = deaktiviert. Ablauf verhaelt sich wie ein
    /// Transportfehler: Session endet, Verzeichnis wird aufgeraeumt.
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_befehlszeile_bytes: 8192,
            max_frame_bytes: 16 * 1024 * 1024,
            max_datei_bytes: 256 * 1024 * 1024,
            idle_timeout: Some(Duration::from_secs(300)),
        }
    }
}

/// Geteilter Zustand des Servers
///
/// Verzeichnis und Postfach sind eigenstaendige kritische Abschnitte;
/// kein Codepfad haelt beide Locks gleichzeitig.
pub struct ServerState<C: CredentialStore> {
    pub directory: ClientDirectory,
    pub mailbox: MailboxStore,
    pub credentials: C,
    pub ablage: FileStore,
    pub limits: SessionLimits,
}

impl<C: CredentialStore> ServerState<C> {
    /// Erstellt den Server-Zustand mit Standard-Limits
    pub fn neu(credentials: C, ablage: FileStore) -> Self {
        Self {
            directory: ClientDirectory::neu(),
            mailbox: MailboxStore::neu(),
            credentials,
            ablage,
            limits: SessionLimits::default(),
        }
    }

    /// Setzt abweichende Limits
    pub fn mit_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Setzt ein abweichendes Postfach (z.B. andere Kapazitaet)
    pub fn mit_mailbox(mut self, mailbox: MailboxStore) -> Self {
        self.mailbox = mailbox;
        self
    }
}
