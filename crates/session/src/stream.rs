//! Media-Stream-Teilprotokoll (Empfaengerseite)
//!
//! Nach STREAM_VIDEO verlaesst die Verbindung den Befehlsmodus und
//! liest {Laengenfeld, kodierte Frame-Bytes} bis zum Sentinel
//! (Laenge 0). Jeder Frame ist unabhaengig dekodierbar; das Protokoll
//! kennt den Codec nicht und reicht die Bytes an eine [`FrameSenke`]
//! weiter. Taktung ist Sache des Senders – hier wird so schnell
//! konsumiert wie Frames eintreffen.

use tokio::io::AsyncRead;

use flurfunk_protocol::wire;

use crate::error::SessionResult;

/// Abnehmer fuer kodierte Video-Frames (Codec-Seam)
///
/// Eine echte Wiedergabe wuerde hier dekodieren und anzeigen; der
/// Server-Kern kennt nur Bytes.
pub trait FrameSenke {
    fn frame(&mut self, daten: &[u8]);
}

/// Standard-Senke: zaehlt Frames und Bytes, loggt den Durchsatz
#[derive(Debug, Default)]
pub struct ProtokollSenke {
    pub frames: u64,
    pub bytes: u64,
}

impl FrameSenke for ProtokollSenke {
    fn frame(&mut self, daten: &[u8]) {
        self.frames += 1;
        self.bytes += daten.len() as u64;
        tracing::trace!(frame = self.frames, bytes = daten.len(), "Frame empfangen");
    }
}

/// Ausgang eines Stream-Empfangs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErgebnis {
    /// Sender hat das Sentinel geschickt; Verbindung ist zurueck im
    /// Befehlsmodus
    Sentinel { frames: u64 },
    /// Kurzer/abgerissener Frame; Stream sofort beendet, kein Sentinel
    Abgebrochen { frames: u64 },
}

/// Liest Frames bis zum Sentinel oder Stromabriss
///
/// Ein vorzeitiges Stromende ist kein Session-Fehler: der Stream gilt
/// als abgebrochen und die Befehlsschleife sieht das EOF beim naechsten
/// Lesen. Ein ueberlanger Frame dagegen laesst sich nicht ueberspringen
/// und beendet die Session.
pub async fn empfangen<R, S>(
    reader: &mut R,
    senke: &mut S,
    max_frame_bytes: usize,
) -> SessionResult<StreamErgebnis>
where
    R: AsyncRead + Unpin,
    S: FrameSenke,
{
    let mut frames: u64 = 0;
    loop {
        match wire::lese_frame(reader, max_frame_bytes).await {
            Ok(Some(daten)) => {
                senke.frame(&daten);
                frames += 1;
            }
            Ok(None) => {
                tracing::debug!(frames, "Stream per Sentinel beendet");
                return Ok(StreamErgebnis::Sentinel { frames });
            }
            Err(e) if e.ist_stromende() => {
                tracing::warn!(frames, "Stream abgerissen (kurzer Frame)");
                return Ok(StreamErgebnis::Abgebrochen { frames });
            }
            Err(e) => return Err(e.into()),
        }
    }
}
