//! flurfunk-core – Gemeinsame Typen
//!
//! Enthaelt die crate-uebergreifenden Identifikationstypen. Fachliche
//! Typen (Nachrichten, Befehle, …) und Fehler leben in den jeweiligen
//! Fach-Crates.

pub mod types;

pub use types::SessionId;
