//! flurfunk-protocol – Befehlsgrammatik und Wire-Format
//!
//! Dieses Crate implementiert:
//! - `command`: die zeilenbasierte Befehlsgrammatik (`LOGIN`, `SEND`, …),
//!   vollstaendig tokenisiert in einen geschlossenen `Befehl`-Enum
//! - `wire`: das laengen-praefixierte Binaerformat fuer Datei-Transfer
//!   und Video-Streaming (u32 big-endian + Payload, 0 = Sentinel)
//!
//! Beide Teilprotokolle laufen ueber denselben Byte-Strom: ausserhalb
//! eines Transfers traegt der Strom Befehlszeilen, innerhalb rohe Frames.

pub mod antwort;
pub mod command;
pub mod error;
pub mod wire;

pub use command::Befehl;
pub use error::{ProtokollFehler, ProtokollResult};
pub use wire::{DateiStatus, LAENGENFELD_BYTES};
