//! flurfunk-storage – Datei-Ablage unter einer festen Wurzel
//!
//! Dieses Crate implementiert:
//! - `FileStore`: oeffnen/anlegen/loeschen/auflisten unter der
//!   Ablage-Wurzel, mit Dateinamen-Bereinigung vor jedem
//!   Dateisystem-Zugriff
//! - `freier_name`: der Kollisions-Helfer der Download-Seite
//!   (`name`, `name_1`, `name_2`, …)
//!
//! Die Wurzel ist prozessweit geteilt; gleichzeitiger Upload und
//! Download desselben Namens konkurrieren bewusst auf Dateisystem-Ebene
//! (last-writer-wins beim Upload).

pub mod error;
pub mod store;

pub use error::{SpeicherFehler, SpeicherResult};
pub use store::{freier_name, FileStore};
