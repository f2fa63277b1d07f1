//! Client-Verzeichnis – Wer ist gerade angemeldet?
//!
//! Bildet Benutzernamen auf die SessionId der haltenden Verbindung ab.
//! Pro Benutzername existiert hoechstens ein aktiver Eintrag; das
//! Check-and-Insert in [`ClientDirectory::hinzufuegen`] ist ein einziger
//! unteilbarer Schritt, damit zwei gleichzeitige LOGINs fuer denselben
//! Namen nie beide durchkommen.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use flurfunk_core::SessionId;

use crate::error::{RegistryFehler, RegistryResult};

/// Verzeichnis der angemeldeten Clients
///
/// Thread-safe via Arc + Mutex. Clone des Verzeichnisses teilt den
/// inneren Zustand. Alle vier Operationen laufen unter demselben Lock
/// und sind damit linearisierbar zueinander.
#[derive(Clone, Default)]
pub struct ClientDirectory {
    inner: Arc<Mutex<HashMap<String, SessionId>>>,
}

impl ClientDirectory {
    /// Erstellt ein leeres Verzeichnis
    pub fn neu() -> Self {
        Self::default()
    }

    /// Traegt einen Benutzer ein
    ///
    /// Schlaegt fehl wenn der Name bereits einen aktiven Eintrag hat.
    /// Pruefung und Eintrag passieren unter einem Lock.
    pub fn hinzufuegen(&self, benutzer: &str, session_id: SessionId) -> RegistryResult<()> {
        let mut eintraege = self.inner.lock();
        if eintraege.contains_key(benutzer) {
            return Err(RegistryFehler::BereitsAngemeldet(benutzer.to_string()));
        }
        eintraege.insert(benutzer.to_string(), session_id);
        drop(eintraege);

        tracing::info!(benutzer = benutzer, %session_id, "Client angemeldet");
        Ok(())
    }

    /// Entfernt den Eintrag der angegebenen Session, falls vorhanden
    ///
    /// Idempotent: eine Session ohne Eintrag ist kein Fehler.
    pub fn entfernen(&self, session_id: SessionId) {
        let entfernt = {
            let mut eintraege = self.inner.lock();
            let benutzer = eintraege
                .iter()
                .find(|(_, id)| **id == session_id)
                .map(|(name, _)| name.clone());
            if let Some(ref name) = benutzer {
                eintraege.remove(name);
            }
            benutzer
        };

        if let Some(benutzer) = entfernt {
            tracing::info!(benutzer = %benutzer, %session_id, "Client abgemeldet");
        }
    }

    /// Sucht die Session eines Benutzers
    pub fn finden(&self, benutzer: &str) -> Option<SessionId> {
        self.inner.lock().get(benutzer).copied()
    }

    /// Gibt alle Benutzernamen ausser dem angegebenen zurueck (sortiert)
    pub fn alle_ausser(&self, benutzer: &str) -> Vec<String> {
        let mut namen: Vec<String> = self
            .inner
            .lock()
            .keys()
            .filter(|name| name.as_str() != benutzer)
            .cloned()
            .collect();
        namen.sort();
        namen
    }

    /// Gibt die Anzahl der angemeldeten Clients zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hinzufuegen_und_finden() {
        let dir = ClientDirectory::neu();
        let id = SessionId::new();

        dir.hinzufuegen("alice", id).unwrap();
        assert_eq!(dir.finden("alice"), Some(id));
        assert_eq!(dir.finden("bob"), None);
        assert_eq!(dir.anzahl(), 1);
    }

    #[test]
    fn doppelter_name_abgelehnt() {
        let dir = ClientDirectory::neu();
        dir.hinzufuegen("alice", SessionId::new()).unwrap();

        let fehler = dir.hinzufuegen("alice", SessionId::new()).unwrap_err();
        assert_eq!(fehler, RegistryFehler::BereitsAngemeldet("alice".into()));
        assert_eq!(dir.anzahl(), 1);
    }

    #[test]
    fn entfernen_per_session_handle() {
        let dir = ClientDirectory::neu();
        let id = SessionId::new();
        dir.hinzufuegen("alice", id).unwrap();

        dir.entfernen(id);
        assert_eq!(dir.finden("alice"), None);

        // Idempotent
        dir.entfernen(id);
        assert_eq!(dir.anzahl(), 0);
    }

    #[test]
    fn nach_entfernen_wieder_anmeldbar() {
        let dir = ClientDirectory::neu();
        let erste = SessionId::new();
        dir.hinzufuegen("alice", erste).unwrap();
        dir.entfernen(erste);

        let zweite = SessionId::new();
        dir.hinzufuegen("alice", zweite).unwrap();
        assert_eq!(dir.finden("alice"), Some(zweite));
    }

    #[test]
    fn alle_ausser_ist_sortiert_und_exklusiv() {
        let dir = ClientDirectory::neu();
        dir.hinzufuegen("carol", SessionId::new()).unwrap();
        dir.hinzufuegen("alice", SessionId::new()).unwrap();
        dir.hinzufuegen("bob", SessionId::new()).unwrap();

        assert_eq!(dir.alle_ausser("bob"), vec!["alice", "carol"]);
        assert_eq!(dir.alle_ausser("niemand").len(), 3);
    }

    #[test]
    fn clone_teilt_inneren_state() {
        let dir1 = ClientDirectory::neu();
        let dir2 = dir1.clone();

        dir1.hinzufuegen("alice", SessionId::new()).unwrap();
        assert!(dir2.finden("alice").is_some());
    }

    #[test]
    fn gleichzeitige_anmeldung_genau_einer_gewinnt() {
        use std::sync::Barrier;

        let dir = ClientDirectory::neu();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let dir = dir.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    dir.hinzufuegen("alice", SessionId::new()).is_ok()
                })
            })
            .collect();

        let erfolge = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|erfolgreich| *erfolgreich)
            .count();
        assert_eq!(erfolge, 1, "Genau eine Anmeldung darf durchkommen");
        assert_eq!(dir.anzahl(), 1);
    }
}
