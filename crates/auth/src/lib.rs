//! flurfunk-auth – Credential-Speicher
//!
//! Das `CredentialStore`-Trait abstrahiert die Benutzerdatenbank; die
//! mitgelieferte Implementierung ist der zeilenbasierte Datei-Speicher
//! (`benutzer passwort` pro Zeile), den der Server als autoritativ und
//! synchron behandelt.
//!
//! Passwoerter werden unverschluesselt abgelegt – Passwort-Hashing ist
//! ausdruecklich ausserhalb des Funktionsumfangs dieses Dienstes.

pub mod credentials;
pub mod error;

pub use credentials::{CredentialStore, DateiCredentialStore};
pub use error::{AuthFehler, AuthResult};
