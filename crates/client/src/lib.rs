//! flurfunk-client – Protokoll-Client
//!
//! Spricht das Befehls- und Wire-Protokoll des Dienstes ueber einen
//! beliebigen `AsyncRead + AsyncWrite`-Strom: eine TLS-Verbindung in
//! Produktion, `tokio::io::duplex` in Tests. Jede Operation entspricht
//! genau einem Befehl; die Teilprotokolle (Transfer, Stream) werden
//! komplett innerhalb des jeweiligen Aufrufs abgewickelt.

pub mod client;
pub mod error;

pub use client::{Client, DownloadErgebnis};
pub use error::{ClientFehler, ClientResult};
