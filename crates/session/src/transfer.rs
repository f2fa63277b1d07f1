//! Datei-Transfer-Teilprotokoll (Serverseite)
//!
//! Upload: nach `SEND_FILE <name>` folgt {u32-Laengenfeld, Datei-Bytes}.
//! Der Server liest das Laengenfeld IMMER zuerst – wird der Upload
//! abgelehnt (Groesse 0, zu gross, ungueltiger Name), werden die
//! angekuendigten Bytes verworfen, damit der Strom synchron bleibt.
//!
//! Download: nach `RECEIVE_FILE <name>` antwortet der Server mit einem
//! Status-Byte; erst bei `Gefunden` folgen Laengenfeld und Datei-Bytes.
//! In beiden Richtungen entscheidet die Byte-Buchhaltung (gezaehlt ==
//! angekuendigt) ueber die abschliessende Statuszeile.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use flurfunk_auth::CredentialStore;
use flurfunk_protocol::{antwort, wire, DateiStatus};
use flurfunk_storage::SpeicherFehler;

use crate::error::SessionResult;
use crate::state::ServerState;

/// Schreibt eine newline-terminierte Statuszeile und flusht
pub(crate) async fn statuszeile<W>(writer: &mut W, text: &str) -> SessionResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Schreibt einen Listen-Textblock als einzelnen laengen-praefixierten Frame
///
/// ONLINE, RETRIEVE und LIST_FILES antworten so: die Blockgroesse ist
/// unbegrenzt, der Client liest exakt die angekuendigten Bytes statt in
/// einen festen Puffer.
pub(crate) async fn textblock<W>(writer: &mut W, text: &str) -> SessionResult<()>
where
    W: AsyncWrite + Unpin,
{
    wire::schreibe_frame(writer, text.as_bytes(), u32::MAX as usize).await?;
    writer.flush().await?;
    Ok(())
}

/// Verwirft angekuendigte Upload-Bytes nach einer Ablehnung
async fn verwerfen<R>(reader: &mut R, mut rest: u64) -> SessionResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut puffer = [0u8; wire::TRANSFER_CHUNK_BYTES];
    while rest > 0 {
        let chunk = rest.min(puffer.len() as u64) as usize;
        let gelesen = reader.read(&mut puffer[..chunk]).await?;
        if gelesen == 0 {
            break;
        }
        rest -= gelesen as u64;
    }
    Ok(())
}

/// Empfaengt einen Datei-Upload in die Ablage
///
/// Ein unvollstaendiger Upload hinterlaesst kein Artefakt: das
/// Teilstueck wird geloescht und dem Client "unvollstaendig" gemeldet.
pub async fn upload_empfangen<C, R, W>(
    state: &ServerState<C>,
    reader: &mut R,
    writer: &mut W,
    benutzer: &str,
    dateiname: &str,
) -> SessionResult<()>
where
    C: CredentialStore,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let angekuendigt = wire::lese_laenge(reader).await? as u64;

    if angekuendigt == 0 {
        tracing::warn!(benutzer, dateiname, "Upload mit Groesse 0 abgewiesen");
        return statuszeile(writer, antwort::UPLOAD_GROESSE_NULL).await;
    }
    if angekuendigt > state.limits.max_datei_bytes {
        tracing::warn!(
            benutzer,
            dateiname,
            angekuendigt,
            maximum = state.limits.max_datei_bytes,
            "Upload zu gross, Bytes werden verworfen"
        );
        verwerfen(reader, angekuendigt).await?;
        return statuszeile(writer, antwort::DATEI_ZU_GROSS).await;
    }

    let mut datei = match state.ablage.anlegen_zum_schreiben(dateiname).await {
        Ok(datei) => datei,
        Err(SpeicherFehler::UngueltigerDateiname(_)) => {
            tracing::warn!(benutzer, dateiname, "Ungueltiger Dateiname, Bytes werden verworfen");
            verwerfen(reader, angekuendigt).await?;
            return statuszeile(writer, antwort::UNGUELTIGER_DATEINAME).await;
        }
        Err(e) => {
            tracing::error!(benutzer, dateiname, fehler = %e, "Ablage-Datei nicht anlegbar");
            verwerfen(reader, angekuendigt).await?;
            return statuszeile(writer, antwort::UPLOAD_FEHLGESCHLAGEN).await;
        }
    };

    let mut puffer = [0u8; wire::TRANSFER_CHUNK_BYTES];
    let mut empfangen: u64 = 0;
    while empfangen < angekuendigt {
        let chunk = (angekuendigt - empfangen).min(puffer.len() as u64) as usize;
        let gelesen = match reader.read(&mut puffer[..chunk]).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(benutzer, dateiname, fehler = %e, "Transportfehler im Upload");
                break;
            }
        };
        datei.write_all(&puffer[..gelesen]).await?;
        empfangen += gelesen as u64;
    }
    datei.flush().await?;
    drop(datei);

    if empfangen == angekuendigt {
        tracing::info!(benutzer, dateiname, bytes = empfangen, "Upload abgeschlossen");
        statuszeile(writer, antwort::UPLOAD_ERFOLGREICH).await
    } else {
        tracing::warn!(
            benutzer,
            dateiname,
            empfangen,
            angekuendigt,
            "Upload unvollstaendig, Teilstueck wird geloescht"
        );
        state.ablage.loeschen(dateiname).await?;
        statuszeile(writer, antwort::UPLOAD_UNVOLLSTAENDIG).await
    }
}

/// Sendet eine Datei aus der Ablage als Download
///
/// Erst das Status-Byte, dann (nur bei `Gefunden`) Laengenfeld und
/// Datei-Bytes. Ein ungueltiger oder fehlender Name wird einheitlich als
/// "nicht gefunden" beantwortet.
pub async fn download_senden<C, W>(
    state: &ServerState<C>,
    writer: &mut W,
    benutzer: &str,
    dateiname: &str,
) -> SessionResult<()>
where
    C: CredentialStore,
    W: AsyncWrite + Unpin,
{
    let geoeffnet = match state.ablage.oeffnen_zum_lesen(dateiname).await {
        Ok(geoeffnet) => geoeffnet,
        Err(SpeicherFehler::UngueltigerDateiname(_)) => None,
        Err(e) => {
            tracing::error!(benutzer, dateiname, fehler = %e, "Ablage-Datei nicht lesbar");
            None
        }
    };

    let Some((mut datei, groesse)) = geoeffnet else {
        wire::schreibe_status(writer, DateiStatus::NichtGefunden).await?;
        return statuszeile(writer, antwort::DATEI_NICHT_GEFUNDEN).await;
    };

    // Das Laengenfeld ist 32 Bit; groessere Dateien sind nicht lieferbar
    if groesse > u64::from(u32::MAX) {
        tracing::warn!(benutzer, dateiname, groesse, "Datei zu gross fuer das Laengenfeld");
        wire::schreibe_status(writer, DateiStatus::NichtGefunden).await?;
        return statuszeile(writer, antwort::DATEI_NICHT_GEFUNDEN).await;
    }

    wire::schreibe_status(writer, DateiStatus::Gefunden).await?;
    wire::schreibe_laenge(writer, groesse as u32).await?;

    let mut puffer = [0u8; wire::TRANSFER_CHUNK_BYTES];
    let mut gesendet: u64 = 0;
    while gesendet < groesse {
        let chunk = (groesse - gesendet).min(puffer.len() as u64) as usize;
        let gelesen = match datei.read(&mut puffer[..chunk]).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::error!(benutzer, dateiname, fehler = %e, "Lesefehler im Download");
                break;
            }
        };
        writer.write_all(&puffer[..gelesen]).await?;
        gesendet += gelesen as u64;
    }
    writer.flush().await?;

    if gesendet == groesse {
        tracing::info!(benutzer, dateiname, bytes = gesendet, "Download abgeschlossen");
        statuszeile(writer, antwort::DOWNLOAD_KOMPLETT).await
    } else {
        tracing::warn!(benutzer, dateiname, gesendet, groesse, "Download unvollstaendig");
        statuszeile(writer, antwort::DOWNLOAD_UNVOLLSTAENDIG).await
    }
}

/// Sendet die sortierte Dateiliste als Textblock
pub async fn liste_senden<C, W>(state: &ServerState<C>, writer: &mut W) -> SessionResult<()>
where
    C: CredentialStore,
    W: AsyncWrite + Unpin,
{
    let block = match state.ablage.auflisten().await {
        Ok(eintraege) if eintraege.is_empty() => format!("{}\n", antwort::KEINE_DATEIEN),
        Ok(eintraege) => {
            let mut block = String::new();
            for eintrag in &eintraege {
                block.push_str(eintrag);
                block.push('\n');
            }
            block
        }
        Err(e) => {
            tracing::error!(fehler = %e, "Dateiliste nicht lesbar");
            format!("{}\n", antwort::LISTE_FEHLGESCHLAGEN)
        }
    };
    textblock(writer, &block).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use flurfunk_auth::DateiCredentialStore;
    use flurfunk_storage::FileStore;
    use tokio::io::AsyncReadExt;

    use crate::state::SessionLimits;

    async fn test_state(dir: &tempfile::TempDir) -> ServerState<DateiCredentialStore> {
        let ablage = FileStore::neu(dir.path().join("ablage"));
        ablage.sicherstellen().await.unwrap();
        ServerState::neu(
            DateiCredentialStore::neu(dir.path().join("user_db")),
            ablage,
        )
    }

    /// Baut den Upload-Bytestrom: Laengenfeld + Payload + Rest
    async fn upload_strom(laenge: u32, payload: &[u8], rest: &[u8]) -> Vec<u8> {
        let mut strom: Vec<u8> = Vec::new();
        wire::schreibe_laenge(&mut strom, laenge).await.unwrap();
        strom.extend_from_slice(payload);
        strom.extend_from_slice(rest);
        strom
    }

    #[tokio::test]
    async fn upload_vollstaendig() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let strom = upload_strom(6, b"inhalt", b"").await;
        let mut reader = strom.as_slice();
        let mut writer: Vec<u8> = Vec::new();

        upload_empfangen(&state, &mut reader, &mut writer, "alice", "bericht.txt")
            .await
            .unwrap();

        assert_eq!(writer, b"File uploaded successfully\n");
        let (mut datei, groesse) = state
            .ablage
            .oeffnen_zum_lesen("bericht.txt")
            .await
            .unwrap()
            .expect("Datei muss existieren");
        assert_eq!(groesse, 6);
        let mut inhalt = Vec::new();
        datei.read_to_end(&mut inhalt).await.unwrap();
        assert_eq!(inhalt, b"inhalt");
    }

    #[tokio::test]
    async fn upload_groesse_null_abgewiesen() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let strom = upload_strom(0, b"", b"").await;
        let mut reader = strom.as_slice();
        let mut writer: Vec<u8> = Vec::new();

        upload_empfangen(&state, &mut reader, &mut writer, "alice", "leer.txt")
            .await
            .unwrap();

        assert_eq!(writer, b"File size is 0. Upload aborted\n");
        assert!(state.ablage.oeffnen_zum_lesen("leer.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn abgerissener_upload_wird_geloescht() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        // 100 Bytes angekuendigt, nur 10 geliefert
        let strom = upload_strom(100, &[0x42u8; 10], b"").await;
        let mut reader = strom.as_slice();
        let mut writer: Vec<u8> = Vec::new();

        upload_empfangen(&state, &mut reader, &mut writer, "alice", "halb.bin")
            .await
            .unwrap();

        assert_eq!(writer, b"File upload incomplete\n");
        assert!(state.ablage.oeffnen_zum_lesen("halb.bin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ungueltiger_name_verwirft_bytes_und_haelt_strom_synchron() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let strom = upload_strom(5, b"boese", b"ONLINE\n").await;
        let mut reader = strom.as_slice();
        let mut writer: Vec<u8> = Vec::new();

        upload_empfangen(&state, &mut reader, &mut writer, "alice", "../etc/passwd")
            .await
            .unwrap();

        assert_eq!(writer, b"Invalid filename\n");
        // Die Payload-Bytes sind konsumiert; der naechste Befehl liegt an
        assert_eq!(reader, b"ONLINE\n");
    }

    #[tokio::test]
    async fn zu_grosser_upload_verworfen() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await.mit_limits(SessionLimits {
            max_datei_bytes: 8,
            ..SessionLimits::default()
        });

        let strom = upload_strom(16, &[0u8; 16], b"LIST_FILES\n").await;
        let mut reader = strom.as_slice();
        let mut writer: Vec<u8> = Vec::new();

        upload_empfangen(&state, &mut reader, &mut writer, "alice", "gross.bin")
            .await
            .unwrap();

        assert_eq!(writer, b"File too large. Upload aborted\n");
        assert_eq!(reader, b"LIST_FILES\n");
        assert!(state.ablage.oeffnen_zum_lesen("gross.bin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn download_vorhandene_datei() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;
        tokio::fs::write(state.ablage.wurzel().join("daten.bin"), b"0123456789")
            .await
            .unwrap();

        let mut writer: Vec<u8> = Vec::new();
        download_senden(&state, &mut writer, "alice", "daten.bin")
            .await
            .unwrap();

        let mut reader = writer.as_slice();
        assert_eq!(
            wire::lese_status(&mut reader).await.unwrap(),
            DateiStatus::Gefunden
        );
        assert_eq!(wire::lese_laenge(&mut reader).await.unwrap(), 10);

        let mut payload = [0u8; 10];
        reader.read_exact(&mut payload).await.unwrap();
        assert_eq!(&payload, b"0123456789");
        assert_eq!(reader, b"File download complete\n");
    }

    #[tokio::test]
    async fn download_fehlende_datei() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let mut writer: Vec<u8> = Vec::new();
        download_senden(&state, &mut writer, "alice", "fehlt.bin")
            .await
            .unwrap();

        let mut reader = writer.as_slice();
        assert_eq!(
            wire::lese_status(&mut reader).await.unwrap(),
            DateiStatus::NichtGefunden
        );
        // Kein Laengenfeld: direkt die Statuszeile
        assert_eq!(reader, b"File not found\n");
    }

    #[tokio::test]
    async fn download_mit_traversal_name_ist_nicht_gefunden() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let mut writer: Vec<u8> = Vec::new();
        download_senden(&state, &mut writer, "alice", "../user_db")
            .await
            .unwrap();

        let mut reader = writer.as_slice();
        assert_eq!(
            wire::lese_status(&mut reader).await.unwrap(),
            DateiStatus::NichtGefunden
        );
    }

    #[tokio::test]
    async fn dateiliste_sortiert() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;
        tokio::fs::write(state.ablage.wurzel().join("b.txt"), b"").await.unwrap();
        tokio::fs::write(state.ablage.wurzel().join("a.txt"), b"").await.unwrap();

        let mut writer: Vec<u8> = Vec::new();
        liste_senden(&state, &mut writer).await.unwrap();

        let mut reader = writer.as_slice();
        let block = wire::lese_frame(&mut reader, u32::MAX as usize)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(block, b"a.txt\nb.txt\n");
    }

    #[tokio::test]
    async fn leere_dateiliste() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let mut writer: Vec<u8> = Vec::new();
        liste_senden(&state, &mut writer).await.unwrap();

        let mut reader = writer.as_slice();
        let block = wire::lese_frame(&mut reader, u32::MAX as usize)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(block, b"No files available for download\n");
    }
}
