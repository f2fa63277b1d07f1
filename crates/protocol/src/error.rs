//! Fehlertypen fuer das Protocol-Crate

use thiserror::Error;

/// Protokoll-Fehlertypen
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    #[error("Leere Befehlszeile")]
    LeereZeile,

    #[error("Unbekannter Befehl: {0}")]
    UnbekannterBefehl(String),

    #[error("Befehl '{befehl}' unvollstaendig: {fehlt} fehlt")]
    ArgumentFehlt {
        befehl: &'static str,
        fehlt: &'static str,
    },

    #[error("Befehlszeile zu lang (Maximum: {maximum} Bytes)")]
    ZeileZuLang { maximum: usize },

    #[error("Frame zu gross: {laenge} Bytes (Maximum: {maximum} Bytes)")]
    FrameZuGross { laenge: usize, maximum: usize },

    #[error("Unbekannter Transfer-Status: {0:#04x}")]
    UnbekannterStatus(u8),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtokollFehler {
    /// Gibt true zurueck wenn der Fehler ein vorzeitiges Stromende anzeigt
    pub fn ist_stromende(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }
}

pub type ProtokollResult<T> = Result<T, ProtokollFehler>;
