//! Test-Harness: echte Befehlsschleife ueber `tokio::io::duplex`
//!
//! Jede Testumgebung ist ein vollstaendiger Server-Zustand mit
//! Temp-Verzeichnissen; jeder Test-Client haelt das Peer-Ende eines
//! Duplex-Stroms und spricht das Wire-Protokoll woertlich.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use flurfunk_auth::DateiCredentialStore;
use flurfunk_protocol::wire;
use flurfunk_registry::MailboxStore;
use flurfunk_storage::FileStore;

use crate::dispatcher::ClientVerbindung;
use crate::error::SessionResult;
use crate::state::{ServerState, SessionLimits};


struct TestUmgebung {
    state: Arc<ServerState<DateiCredentialStore>>,
    shutdown: watch::Sender<bool>,
    _dir: tempfile::TempDir,
}

impl TestUmgebung {
    async fn neu() -> Self {
        Self::mit_limits(SessionLimits::default()).await
    }

    async fn mit_limits(limits: SessionLimits) -> Self {
        Self::bauen(limits, MailboxStore::neu()).await
    }

    async fn mit_postfach(kapazitaet: usize) -> Self {
        Self::bauen(
            SessionLimits::default(),
            MailboxStore::mit_kapazitaet(kapazitaet),
        )
        .await
    }

    async fn bauen(limits: SessionLimits, mailbox: MailboxStore) -> Self {
        let dir = tempfile::tempdir().expect("Temp-Verzeichnis konnte nicht erstellt werden");
        let ablage = FileStore::neu(dir.path().join("ablage"));
        ablage.sicherstellen().await.unwrap();
        let credentials = DateiCredentialStore::neu(dir.path().join("user_db"));
        let (shutdown, _) = watch::channel(false);

        Self {
            state: Arc::new(
                ServerState::neu(credentials, ablage)
                    .mit_limits(limits)
                    .mit_mailbox(mailbox),
            ),
            shutdown,
            _dir: dir,
        }
    }

    /// Startet eine Befehlsschleife und gibt das Client-Ende zurueck
    fn verbinden(&self) -> TestClient {
        let (client_ende, server_ende) = tokio::io::duplex(64 * 1024);
        let verbindung = ClientVerbindung::neu(
            Arc::clone(&self.state),
            "127.0.0.1:40000".parse().unwrap(),
            self.shutdown.subscribe(),
        );
        let task = tokio::spawn(verbindung.verarbeiten(server_ende));

        let (lese, schreib) = tokio::io::split(client_ende);
        TestClient {
            reader: BufReader::new(lese),
            writer: schreib,
            task,
        }
    }
}

struct TestClient {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    task: JoinHandle<SessionResult<()>>,
}

impl TestClient {
    /// Sendet eine Befehlszeile ohne auf eine Antwort zu warten
    async fn senden(&mut self, zeile: &str) {
        self.writer.write_all(zeile.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Liest die naechste Statuszeile (ohne Zeilenende)
    async fn zeile(&mut self) -> String {
        let mut zeile = String::new();
        self.reader.read_line(&mut zeile).await.unwrap();
        zeile.trim_end().to_string()
    }

    /// Sendet einen Befehl und liest die Statuszeile
    async fn befehl(&mut self, zeile: &str) -> String {
        self.senden(zeile).await;
        self.zeile().await
    }

    /// Liest eine Listen-Antwort (ein laengen-praefixierter Textblock)
    async fn textblock(&mut self) -> String {
        let block = wire::lese_frame(&mut self.reader, u32::MAX as usize)
            .await
            .unwrap()
            .expect("Listen-Antwort darf kein Sentinel sein");
        String::from_utf8(block).unwrap()
    }

    /// Registriert und meldet einen frischen Benutzer an
    async fn registrieren_und_anmelden(&mut self, benutzer: &str, passwort: &str) {
        assert_eq!(
            self.befehl(&format!("REGISTER {benutzer} {passwort}")).await,
            "Registration successful"
        );
        assert_eq!(
            self.befehl(&format!("LOGIN {benutzer} {passwort}")).await,
            "Login successful"
        );
    }

    /// Schickt das Upload-Teilprotokoll: Laengenfeld + Datei-Bytes
    async fn upload(&mut self, daten: &[u8]) {
        wire::schreibe_laenge(&mut self.writer, daten.len() as u32)
            .await
            .unwrap();
        self.writer.write_all(daten).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Beendet die Session per `exit` und wartet auf den Server-Task
    async fn beenden(mut self) {
        self.senden("exit").await;
        self.task.await.unwrap().unwrap();
    }
}
