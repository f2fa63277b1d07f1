//! Client-Seite des Kommando- und Wire-Protokolls

use std::path::Path;

use tokio::fs::File;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};

use flurfunk_protocol::{antwort, wire, DateiStatus};
use flurfunk_storage::freier_name;

use crate::error::{ClientFehler, ClientResult};

/// Ausgang eines Datei-Downloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadErgebnis {
    /// Der Server kennt die Datei nicht
    NichtGefunden { meldung: String },
    /// Datei lokal gespeichert; `dateiname` ist der tatsaechlich
    /// verwendete Name (bei Kollision `name_1`, `name_2`, …)
    Gespeichert {
        dateiname: String,
        bytes: u64,
        meldung: String,
    },
}

/// Verbindung zu einem Flurfunk-Server
///
/// Generisch ueber den Strom; der Aufrufer stellt die (TLS-)Verbindung
/// her und reicht sie durch.
pub struct Client<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn neu(strom: S) -> Self {
        let (lese, schreib) = tokio::io::split(strom);
        Self {
            reader: BufReader::new(lese),
            writer: schreib,
        }
    }

    async fn zeile_senden(&mut self, zeile: &str) -> ClientResult<()> {
        self.writer.write_all(zeile.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Liest die naechste Statuszeile des Servers (ohne Zeilenende)
    async fn statuszeile(&mut self) -> ClientResult<String> {
        let mut zeile = String::new();
        let gelesen = self.reader.read_line(&mut zeile).await?;
        if gelesen == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(zeile.trim_end().to_string())
    }

    async fn befehl(&mut self, zeile: &str) -> ClientResult<String> {
        self.zeile_senden(zeile).await?;
        self.statuszeile().await
    }

    /// Liest eine Listen-Antwort (laengen-praefixierter Textblock)
    async fn textblock(&mut self) -> ClientResult<String> {
        let block = wire::lese_frame(&mut self.reader, u32::MAX as usize)
            .await?
            .unwrap_or_default();
        Ok(String::from_utf8_lossy(&block).into_owned())
    }

    /// `REGISTER` – gibt die Serverantwort woertlich zurueck
    pub async fn registrieren(&mut self, benutzer: &str, passwort: &str) -> ClientResult<String> {
        self.befehl(&format!("REGISTER {benutzer} {passwort}")).await
    }

    /// `LOGIN` – true bei erfolgreicher Anmeldung
    pub async fn anmelden(&mut self, benutzer: &str, passwort: &str) -> ClientResult<bool> {
        let text = self.befehl(&format!("LOGIN {benutzer} {passwort}")).await?;
        Ok(text == antwort::LOGIN_ERFOLGREICH)
    }

    /// `LOGOUT`
    pub async fn abmelden(&mut self) -> ClientResult<String> {
        self.befehl("LOGOUT").await
    }

    /// `ONLINE` – die Namensliste (oder der Platzhalter) als Text
    pub async fn online(&mut self) -> ClientResult<String> {
        self.zeile_senden("ONLINE").await?;
        self.textblock().await
    }

    /// `RETRIEVE` – leert das eigene Postfach
    pub async fn abrufen(&mut self) -> ClientResult<String> {
        self.zeile_senden("RETRIEVE").await?;
        self.textblock().await
    }

    /// `SEND` – stellt eine Nachricht fuer den Empfaenger ein
    pub async fn senden(&mut self, empfaenger: &str, text: &str) -> ClientResult<String> {
        self.befehl(&format!("SEND {empfaenger} {text}")).await
    }

    /// `LIST_FILES` – die Ablage-Liste als Text
    pub async fn dateien_auflisten(&mut self) -> ClientResult<String> {
        self.zeile_senden("LIST_FILES").await?;
        self.textblock().await
    }

    /// `SEND_FILE` – laedt eine lokale Datei in die Ablage hoch
    ///
    /// Der Dateiname auf dem Server ist der letzte Pfadbestandteil.
    pub async fn datei_senden(&mut self, pfad: &Path) -> ClientResult<String> {
        let dateiname = pfad
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientFehler::UngueltigerPfad(pfad.display().to_string()))?;

        let mut datei = File::open(pfad).await?;
        let groesse = datei.metadata().await?.len();
        if groesse > u64::from(u32::MAX) {
            return Err(ClientFehler::DateiZuGross(groesse));
        }

        self.zeile_senden(&format!("SEND_FILE {dateiname}")).await?;
        wire::schreibe_laenge(&mut self.writer, groesse as u32).await?;

        let mut puffer = [0u8; wire::TRANSFER_CHUNK_BYTES];
        let mut gesendet: u64 = 0;
        while gesendet < groesse {
            let chunk = (groesse - gesendet).min(puffer.len() as u64) as usize;
            let gelesen = datei.read(&mut puffer[..chunk]).await?;
            if gelesen == 0 {
                break;
            }
            self.writer.write_all(&puffer[..gelesen]).await?;
            gesendet += gelesen as u64;
        }
        self.writer.flush().await?;

        tracing::debug!(dateiname, bytes = gesendet, "Upload gesendet");
        self.statuszeile().await
    }

    /// `RECEIVE_FILE` – laedt eine Datei in das Zielverzeichnis herunter
    ///
    /// Kollidiert der Name lokal, wird auf `name_1`, `name_2`, …
    /// ausgewichen statt zu ueberschreiben.
    pub async fn datei_empfangen(
        &mut self,
        dateiname: &str,
        zielverzeichnis: &Path,
    ) -> ClientResult<DownloadErgebnis> {
        self.zeile_senden(&format!("RECEIVE_FILE {dateiname}")).await?;

        match wire::lese_status(&mut self.reader).await? {
            DateiStatus::NichtGefunden => {
                let meldung = self.statuszeile().await?;
                Ok(DownloadErgebnis::NichtGefunden { meldung })
            }
            DateiStatus::Gefunden => {
                let groesse = u64::from(wire::lese_laenge(&mut self.reader).await?);
                let lokal = freier_name(zielverzeichnis, dateiname).await?;
                let mut datei = File::create(zielverzeichnis.join(&lokal)).await?;

                let mut puffer = [0u8; wire::TRANSFER_CHUNK_BYTES];
                let mut empfangen: u64 = 0;
                while empfangen < groesse {
                    let chunk = (groesse - empfangen).min(puffer.len() as u64) as usize;
                    let gelesen = self.reader.read(&mut puffer[..chunk]).await?;
                    if gelesen == 0 {
                        return Err(
                            std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()
                        );
                    }
                    datei.write_all(&puffer[..gelesen]).await?;
                    empfangen += gelesen as u64;
                }
                datei.flush().await?;

                let meldung = self.statuszeile().await?;
                tracing::info!(dateiname, lokal = %lokal, bytes = empfangen, "Download gespeichert");
                Ok(DownloadErgebnis::Gespeichert {
                    dateiname: lokal,
                    bytes: empfangen,
                    meldung,
                })
            }
        }
    }

    /// `STREAM_VIDEO` – sendet Frames und schliesst mit dem Sentinel ab
    pub async fn video_streamen<I, B>(&mut self, frames: I) -> ClientResult<u64>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        self.zeile_senden("STREAM_VIDEO").await?;

        let mut anzahl: u64 = 0;
        for frame in frames {
            wire::schreibe_frame(
                &mut self.writer,
                frame.as_ref(),
                wire::STANDARD_MAX_FRAME_BYTES,
            )
            .await?;
            anzahl += 1;
        }
        wire::schreibe_sentinel(&mut self.writer).await?;
        self.writer.flush().await?;

        tracing::debug!(frames = anzahl, "Stream gesendet");
        Ok(anzahl)
    }

    /// `exit` – beendet die Session; der Server antwortet nicht
    pub async fn beenden(mut self) -> ClientResult<()> {
        self.zeile_senden("exit").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::DuplexStream;
    use tokio::sync::watch;

    use flurfunk_auth::DateiCredentialStore;
    use flurfunk_session::{ClientVerbindung, ServerState};
    use flurfunk_storage::FileStore;

    struct Umgebung {
        state: Arc<ServerState<DateiCredentialStore>>,
        shutdown: watch::Sender<bool>,
        dir: tempfile::TempDir,
    }

    impl Umgebung {
        async fn neu() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let ablage = FileStore::neu(dir.path().join("ablage"));
            ablage.sicherstellen().await.unwrap();
            let credentials = DateiCredentialStore::neu(dir.path().join("user_db"));
            let (shutdown, _) = watch::channel(false);
            Self {
                state: Arc::new(ServerState::neu(credentials, ablage)),
                shutdown,
                dir,
            }
        }

        fn client(&self) -> Client<DuplexStream> {
            let (client_ende, server_ende) = tokio::io::duplex(64 * 1024);
            let verbindung = ClientVerbindung::neu(
                Arc::clone(&self.state),
                "127.0.0.1:40000".parse().unwrap(),
                self.shutdown.subscribe(),
            );
            tokio::spawn(verbindung.verarbeiten(server_ende));
            Client::neu(client_ende)
        }

        async fn angemeldeter_client(&self, benutzer: &str) -> Client<DuplexStream> {
            let mut client = self.client();
            assert_eq!(
                client.registrieren(benutzer, "geheim").await.unwrap(),
                "Registration successful"
            );
            assert!(client.anmelden(benutzer, "geheim").await.unwrap());
            client
        }
    }

    #[tokio::test]
    async fn registrieren_und_anmelden() {
        let umgebung = Umgebung::neu().await;
        let mut client = umgebung.client();

        assert_eq!(
            client.registrieren("alice", "geheim").await.unwrap(),
            "Registration successful"
        );
        assert!(!client.anmelden("alice", "falsch").await.unwrap());
        assert!(client.anmelden("alice", "geheim").await.unwrap());
        assert_eq!(client.abmelden().await.unwrap(), "Logged out successfully");
        client.beenden().await.unwrap();
    }

    #[tokio::test]
    async fn nachrichten_roundtrip() {
        let umgebung = Umgebung::neu().await;
        let mut alice = umgebung.angemeldeter_client("alice").await;
        let mut bob = umgebung.angemeldeter_client("bob").await;

        assert_eq!(bob.abrufen().await.unwrap(), "No new messages\n");
        assert_eq!(
            alice.senden("bob", "hallo bob").await.unwrap(),
            "Message sent"
        );
        assert_eq!(bob.abrufen().await.unwrap(), "From alice: hallo bob\n");

        assert_eq!(alice.online().await.unwrap(), "bob\n");
        alice.beenden().await.unwrap();
        bob.beenden().await.unwrap();
    }

    #[tokio::test]
    async fn datei_roundtrip_mit_kollisionsnamen() {
        let umgebung = Umgebung::neu().await;
        let mut alice = umgebung.angemeldeter_client("alice").await;

        let quelle = umgebung.dir.path().join("bericht.txt");
        tokio::fs::write(&quelle, b"quartalszahlen").await.unwrap();
        assert_eq!(
            alice.datei_senden(&quelle).await.unwrap(),
            "File uploaded successfully"
        );
        assert_eq!(alice.dateien_auflisten().await.unwrap(), "bericht.txt\n");

        let ziel = umgebung.dir.path().join("downloads");
        tokio::fs::create_dir_all(&ziel).await.unwrap();

        let erster = alice.datei_empfangen("bericht.txt", &ziel).await.unwrap();
        assert_eq!(
            erster,
            DownloadErgebnis::Gespeichert {
                dateiname: "bericht.txt".into(),
                bytes: 14,
                meldung: "File download complete".into()
            }
        );

        // Zweiter Download kollidiert lokal und weicht aus
        let zweiter = alice.datei_empfangen("bericht.txt", &ziel).await.unwrap();
        assert_eq!(
            zweiter,
            DownloadErgebnis::Gespeichert {
                dateiname: "bericht.txt_1".into(),
                bytes: 14,
                meldung: "File download complete".into()
            }
        );

        let inhalt = tokio::fs::read(ziel.join("bericht.txt_1")).await.unwrap();
        assert_eq!(inhalt, b"quartalszahlen");
        alice.beenden().await.unwrap();
    }

    #[tokio::test]
    async fn grosser_transfer_ueber_chunkgrenze() {
        let umgebung = Umgebung::neu().await;
        let mut alice = umgebung.angemeldeter_client("alice").await;

        // 10 000 Bytes: mehr als ein 8-KiB-Chunk, kein Vielfaches davon
        let daten: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let quelle = umgebung.dir.path().join("gross.bin");
        tokio::fs::write(&quelle, &daten).await.unwrap();
        assert_eq!(
            alice.datei_senden(&quelle).await.unwrap(),
            "File uploaded successfully"
        );

        let ziel = umgebung.dir.path().join("downloads");
        tokio::fs::create_dir_all(&ziel).await.unwrap();
        let ergebnis = alice.datei_empfangen("gross.bin", &ziel).await.unwrap();
        assert!(matches!(
            ergebnis,
            DownloadErgebnis::Gespeichert { bytes: 10_000, .. }
        ));

        let kopie = tokio::fs::read(ziel.join("gross.bin")).await.unwrap();
        assert_eq!(kopie, daten);
        alice.beenden().await.unwrap();
    }

    #[tokio::test]
    async fn download_fehlender_datei() {
        let umgebung = Umgebung::neu().await;
        let mut alice = umgebung.angemeldeter_client("alice").await;

        let ergebnis = alice
            .datei_empfangen("fehlt.bin", umgebung.dir.path())
            .await
            .unwrap();
        assert_eq!(
            ergebnis,
            DownloadErgebnis::NichtGefunden {
                meldung: "File not found".into()
            }
        );
        alice.beenden().await.unwrap();
    }

    #[tokio::test]
    async fn stream_und_weiter_im_befehlsmodus() {
        let umgebung = Umgebung::neu().await;
        let mut alice = umgebung.angemeldeter_client("alice").await;

        let frames: Vec<Vec<u8>> = (0..3).map(|i| vec![i as u8; 32]).collect();
        assert_eq!(alice.video_streamen(frames).await.unwrap(), 3);

        assert_eq!(alice.online().await.unwrap(), "No other users online.\n");
        alice.beenden().await.unwrap();
    }
}
