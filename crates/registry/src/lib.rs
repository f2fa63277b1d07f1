//! flurfunk-registry – Geteilter In-Memory-Zustand des Servers
//!
//! Dieses Crate implementiert:
//! - `ClientDirectory`: wer ist gerade angemeldet (Benutzername -> SessionId)
//! - `MailboxStore`: wartende Nachrichten pro Empfaenger (FIFO, begrenzt)
//!
//! Beide Typen sind Clone und teilen ihren inneren Zustand via Arc.
//! Jede oeffentliche Operation ist ein einzelner kritischer Abschnitt;
//! kein Aufrufer haelt jemals beide Locks gleichzeitig.
//!
//! Der Zustand ist bewusst fluechtig: er wird pro Prozesslebensdauer
//! aufgebaut und bei einem Neustart verworfen.

pub mod directory;
pub mod error;
pub mod mailbox;

pub use directory::ClientDirectory;
pub use error::{RegistryFehler, RegistryResult};
pub use mailbox::{MailboxStore, Nachricht};
