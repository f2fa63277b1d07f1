//! Session-Zustand einer Verbindung

use std::net::SocketAddr;

use flurfunk_core::SessionId;

/// Zustand einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionZustand {
    /// Verbunden, aber noch nicht angemeldet
    Unauthentifiziert,
    /// Angemeldet
    Authentifiziert,
    /// Verbindung wird beendet
    Beendend,
}

/// Eine aktive Verbindungs-Session
///
/// Gehoert exklusiv ihrem Verbindungs-Task; andere Sessions erreichen
/// sie nur indirekt ueber Verzeichnis und Postfach.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub zustand: SessionZustand,
    /// Angemeldeter Benutzername; `None` = anonym
    pub benutzername: Option<String>,
    pub peer_addr: SocketAddr,
}

impl Session {
    pub fn neu(peer_addr: SocketAddr) -> Self {
        Self {
            id: SessionId::new(),
            zustand: SessionZustand::Unauthentifiziert,
            benutzername: None,
            peer_addr,
        }
    }

    pub fn ist_angemeldet(&self) -> bool {
        self.zustand == SessionZustand::Authentifiziert
    }

    /// Markiert die Session als angemeldet
    pub fn anmelden(&mut self, benutzer: &str) {
        self.benutzername = Some(benutzer.to_string());
        self.zustand = SessionZustand::Authentifiziert;
    }

    /// Setzt die Session auf anonym zurueck (LOGOUT, Verbindung bleibt)
    pub fn abmelden(&mut self) {
        self.benutzername = None;
        self.zustand = SessionZustand::Unauthentifiziert;
    }

    /// Gibt den Benutzernamen zurueck, oder "" fuer anonyme Sessions
    pub fn benutzer(&self) -> &str {
        self.benutzername.as_deref().unwrap_or("")
    }
}
