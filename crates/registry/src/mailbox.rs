//! Postfach-Speicher – Wartende Nachrichten pro Empfaenger
//!
//! Store-and-forward: SEND stellt eine Nachricht ein, RETRIEVE holt alle
//! wartenden Nachrichten des Abholers ab und loescht sie im selben
//! kritischen Abschnitt (at-most-once: nie doppelt zugestellt, nie
//! still dupliziert). Zustellung ist FIFO pro Empfaenger.
//!
//! Der Speicher ist begrenzt; ein volles Postfach ist eine explizite
//! Ablehnung an den Absender, nie ein stiller Verlust.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{RegistryFehler, RegistryResult};

/// Standard-Gesamtkapazitaet des Speichers (wartende Nachrichten)
pub const STANDARD_KAPAZITAET: usize = 1024;

/// Eine wartende Nachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nachricht {
    pub absender: String,
    pub empfaenger: String,
    pub text: String,
    pub gesendet_um: DateTime<Utc>,
}

struct MailboxInner {
    /// Empfaenger -> FIFO-Queue der wartenden Nachrichten
    postfaecher: HashMap<String, VecDeque<Nachricht>>,
    /// Gesamtzahl wartender Nachrichten ueber alle Empfaenger
    belegt: usize,
}

/// Speicher fuer unzugestellte Nachrichten
///
/// Thread-safe via Arc + Mutex. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct MailboxStore {
    inner: Arc<Mutex<MailboxInner>>,
    kapazitaet: usize,
}

impl MailboxStore {
    /// Erstellt einen Speicher mit Standardkapazitaet
    pub fn neu() -> Self {
        Self::mit_kapazitaet(STANDARD_KAPAZITAET)
    }

    /// Erstellt einen Speicher mit der angegebenen Gesamtkapazitaet
    pub fn mit_kapazitaet(kapazitaet: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MailboxInner {
                postfaecher: HashMap::new(),
                belegt: 0,
            })),
            kapazitaet,
        }
    }

    /// Stellt eine Nachricht fuer den Empfaenger ein
    ///
    /// Lehnt ab wenn die Gesamtkapazitaet erreicht ist.
    pub fn einstellen(
        &self,
        absender: &str,
        empfaenger: &str,
        text: &str,
    ) -> RegistryResult<()> {
        let mut inner = self.inner.lock();
        if inner.belegt >= self.kapazitaet {
            return Err(RegistryFehler::PostfachVoll {
                belegt: inner.belegt,
                kapazitaet: self.kapazitaet,
            });
        }

        inner
            .postfaecher
            .entry(empfaenger.to_string())
            .or_default()
            .push_back(Nachricht {
                absender: absender.to_string(),
                empfaenger: empfaenger.to_string(),
                text: text.to_string(),
                gesendet_um: Utc::now(),
            });
        inner.belegt += 1;
        drop(inner);

        tracing::debug!(
            absender = absender,
            empfaenger = empfaenger,
            "Nachricht eingestellt"
        );
        Ok(())
    }

    /// Holt alle wartenden Nachrichten des Empfaengers ab (FIFO)
    ///
    /// Lesen und Loeschen sind ein einziger kritischer Abschnitt: zwei
    /// gleichzeitige Abrufe fuer denselben Empfaenger sehen nie dieselbe
    /// Nachricht, und eine gleichzeitig eingestellte Nachricht geht nie
    /// verloren (sie landet entweder in diesem oder im naechsten Abruf).
    pub fn abholen(&self, empfaenger: &str) -> Vec<Nachricht> {
        let mut inner = self.inner.lock();
        let nachrichten: Vec<Nachricht> = inner
            .postfaecher
            .remove(empfaenger)
            .map(|queue| queue.into_iter().collect())
            .unwrap_or_default();
        inner.belegt -= nachrichten.len();
        nachrichten
    }

    /// Gibt die Gesamtzahl wartender Nachrichten zurueck
    pub fn wartend(&self) -> usize {
        self.inner.lock().belegt
    }
}

impl Default for MailboxStore {
    fn default() -> Self {
        Self::neu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn einstellen_und_abholen_genau_einmal() {
        let store = MailboxStore::neu();
        store.einstellen("alice", "bob", "hi").unwrap();

        let nachrichten = store.abholen("bob");
        assert_eq!(nachrichten.len(), 1);
        assert_eq!(nachrichten[0].absender, "alice");
        assert_eq!(nachrichten[0].empfaenger, "bob");
        assert_eq!(nachrichten[0].text, "hi");

        // Zweiter Abruf ist leer – nie doppelt zugestellt
        assert!(store.abholen("bob").is_empty());
        assert_eq!(store.wartend(), 0);
    }

    #[test]
    fn fifo_pro_empfaenger() {
        let store = MailboxStore::neu();
        store.einstellen("alice", "bob", "m1").unwrap();
        store.einstellen("carol", "bob", "m2").unwrap();
        store.einstellen("alice", "bob", "m3").unwrap();

        let texte: Vec<String> = store
            .abholen("bob")
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(texte, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn abholen_laesst_fremde_postfaecher_unberuehrt() {
        let store = MailboxStore::neu();
        store.einstellen("alice", "bob", "fuer bob").unwrap();
        store.einstellen("alice", "carol", "fuer carol").unwrap();

        assert_eq!(store.abholen("bob").len(), 1);
        assert_eq!(store.wartend(), 1);
        assert_eq!(store.abholen("carol").len(), 1);
    }

    #[test]
    fn volles_postfach_explizit_abgelehnt() {
        let store = MailboxStore::mit_kapazitaet(2);
        store.einstellen("a", "b", "1").unwrap();
        store.einstellen("a", "b", "2").unwrap();

        let fehler = store.einstellen("a", "b", "3").unwrap_err();
        assert_eq!(
            fehler,
            RegistryFehler::PostfachVoll {
                belegt: 2,
                kapazitaet: 2
            }
        );

        // Abholen gibt Kapazitaet wieder frei
        assert_eq!(store.abholen("b").len(), 2);
        store.einstellen("a", "b", "4").unwrap();
    }

    #[test]
    fn gleichzeitige_abrufe_teilen_keine_nachricht() {
        use std::sync::Barrier;

        let store = MailboxStore::neu();
        for i in 0..100 {
            store.einstellen("alice", "bob", &format!("m{i}")).unwrap();
        }

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store.abholen("bob")
                })
            })
            .collect();

        let mengen: Vec<Vec<Nachricht>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let gesamt: usize = mengen.iter().map(Vec::len).sum();
        assert_eq!(gesamt, 100, "Jede Nachricht genau einmal zugestellt");
    }
}
