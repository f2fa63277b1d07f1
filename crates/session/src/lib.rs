//! flurfunk-session – Session-Protokollmaschine
//!
//! Dieses Crate implementiert den Kern des Dienstes:
//! - `Session`: Zustand einer Verbindung (anonym/angemeldet/beendend)
//! - `ClientVerbindung`: die Befehlsschleife einer Verbindung – liest
//!   eine Befehlszeile, dispatcht per exaktem Token-Vergleich, schreibt
//!   die Antwort, und wechselt fuer SEND_FILE/RECEIVE_FILE/STREAM_VIDEO
//!   in die binaeren Teilprotokolle auf demselben Strom
//! - `transfer`: Upload/Download mit exakter Byte-Buchfuehrung
//! - `stream`: Video-Frame-Empfang bis zum Sentinel
//!
//! Die Verbindung ist generisch ueber `AsyncRead + AsyncWrite`; der
//! Server reicht den TLS-Strom durch, Tests verwenden `tokio::io::duplex`.

pub mod dispatcher;
pub mod error;
pub mod session;
pub mod state;
pub mod stream;
pub mod transfer;

#[cfg(test)]
mod tests;

pub use dispatcher::ClientVerbindung;
pub use error::{SessionFehler, SessionResult};
pub use session::{Session, SessionZustand};
pub use state::{ServerState, SessionLimits};
pub use stream::{FrameSenke, ProtokollSenke, StreamErgebnis};
