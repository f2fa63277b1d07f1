//! Binaeres Wire-Format fuer Transfer- und Stream-Teilprotokolle
//!
//! Beide Teilprotokolle verwenden dasselbe Frame-Format:
//!
//! ```text
//! +--------+--------+--------+--------+----...----+
//! | Laenge (u32 BE) | 4 Bytes        | Payload    |
//! +--------+--------+--------+--------+----...----+
//! ```
//!
//! Die Laenge gibt die Anzahl der Payload-Bytes an (ohne die 4
//! Laengen-Bytes). Im Stream-Teilprotokoll ist die Laenge 0 kein Frame,
//! sondern das Stromende-Sentinel; im Upload ist 0 ein Fehler.
//!
//! Der Datei-Download beginnt zusaetzlich mit einem Status-Byte, damit
//! "Datei nicht gefunden" von einem gueltigen Laengenfeld unterscheidbar
//! ist. Erst bei `Gefunden` folgt ueberhaupt ein Laengenfeld.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtokollFehler, ProtokollResult};

/// Groesse des Laengen-Felds in Bytes
pub const LAENGENFELD_BYTES: usize = 4;

/// Standard-maximale Frame-Groesse (16 MB)
pub const STANDARD_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Chunk-Groesse fuer das Durchreichen von Datei-Bytes
pub const TRANSFER_CHUNK_BYTES: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Laengenfeld
// ---------------------------------------------------------------------------

/// Liest ein 4-Byte-Laengenfeld (big-endian)
pub async fn lese_laenge<R>(reader: &mut R) -> ProtokollResult<u32>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; LAENGENFELD_BYTES];
    reader.read_exact(&mut buf).await?;
    Ok(u32::from_be_bytes(buf))
}

/// Schreibt ein 4-Byte-Laengenfeld (big-endian)
pub async fn schreibe_laenge<W>(writer: &mut W, laenge: u32) -> ProtokollResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&laenge.to_be_bytes()).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Liest einen vollstaendigen Frame
///
/// Gibt `Ok(None)` zurueck wenn das Laengenfeld 0 ist (Sentinel).
/// Ein vorzeitiges Stromende innerhalb des Payloads ist ein Fehler
/// (`UnexpectedEof`), kein halber Frame.
pub async fn lese_frame<R>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> ProtokollResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let laenge = lese_laenge(reader).await? as usize;
    if laenge == 0 {
        return Ok(None);
    }
    if laenge > max_frame_bytes {
        return Err(ProtokollFehler::FrameZuGross {
            laenge,
            maximum: max_frame_bytes,
        });
    }

    let mut payload = vec![0u8; laenge];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Schreibt einen Frame (Laengenfeld + Payload)
///
/// Ein leerer Payload ist nicht erlaubt – dafuer gibt es
/// [`schreibe_sentinel`].
pub async fn schreibe_frame<W>(
    writer: &mut W,
    payload: &[u8],
    max_frame_bytes: usize,
) -> ProtokollResult<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.is_empty() {
        return Err(ProtokollFehler::FrameZuGross {
            laenge: 0,
            maximum: max_frame_bytes,
        });
    }
    if payload.len() > max_frame_bytes {
        return Err(ProtokollFehler::FrameZuGross {
            laenge: payload.len(),
            maximum: max_frame_bytes,
        });
    }

    schreibe_laenge(writer, payload.len() as u32).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Schreibt das Stromende-Sentinel (Laenge 0, kein Payload)
pub async fn schreibe_sentinel<W>(writer: &mut W) -> ProtokollResult<()>
where
    W: AsyncWrite + Unpin,
{
    schreibe_laenge(writer, 0).await
}

// ---------------------------------------------------------------------------
// Transfer-Status (Download)
// ---------------------------------------------------------------------------

/// Status-Byte am Beginn eines Datei-Downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateiStatus {
    /// Datei existiert nicht in der Ablage – es folgt kein Laengenfeld
    NichtGefunden = 0x00,
    /// Datei gefunden – es folgen Laengenfeld und Datei-Bytes
    Gefunden = 0x01,
}

impl DateiStatus {
    /// Konvertiert ein Wire-Byte in den Status
    pub fn aus_byte(byte: u8) -> ProtokollResult<Self> {
        match byte {
            0x00 => Ok(Self::NichtGefunden),
            0x01 => Ok(Self::Gefunden),
            sonst => Err(ProtokollFehler::UnbekannterStatus(sonst)),
        }
    }
}

/// Liest das Status-Byte eines Downloads
pub async fn lese_status<R>(reader: &mut R) -> ProtokollResult<DateiStatus>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).await?;
    DateiStatus::aus_byte(buf[0])
}

/// Schreibt das Status-Byte eines Downloads
pub async fn schreibe_status<W>(writer: &mut W, status: DateiStatus) -> ProtokollResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&[status as u8]).await?;
    Ok(())
}
