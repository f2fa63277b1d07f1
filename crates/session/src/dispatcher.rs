//! Befehlsschleife einer Client-Verbindung
//!
//! Eine Verbindung traegt genau eine Session. Die Schleife liest
//! Befehlszeilen, erzwingt die Anmeldepflicht und verzweigt in die
//! Teilprotokolle (Transfer, Stream), die denselben Byte-Strom
//! uebernehmen und wieder zurueckgeben. Behandelbare Fehler werden als
//! Statuszeile beantwortet; nur Transport- und Rahmenfehler beenden die
//! Session.
//!
//! Der Verzeichnis-Eintrag der Session wird auf JEDEM Ausgang
//! entfernt – exit, EOF, Idle-Timeout, Shutdown und Fehler laufen alle
//! durch [`ClientVerbindung::verarbeiten`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::sync::watch;

use flurfunk_auth::{AuthFehler, CredentialStore};
use flurfunk_protocol::{antwort, command, Befehl, ProtokollFehler};

use crate::error::SessionResult;
use crate::session::{Session, SessionZustand};
use crate::state::ServerState;
use crate::stream::{self, ProtokollSenke, StreamErgebnis};
use crate::transfer;

/// Eine angenommene Client-Verbindung mit ihrer Session
pub struct ClientVerbindung<C: CredentialStore> {
    state: Arc<ServerState<C>>,
    session: Session,
    shutdown: watch::Receiver<bool>,
}

impl<C: CredentialStore> ClientVerbindung<C> {
    pub fn neu(
        state: Arc<ServerState<C>>,
        peer_addr: SocketAddr,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            state,
            session: Session::neu(peer_addr),
            shutdown,
        }
    }

    /// Treibt die Verbindung bis zu ihrem Ende
    ///
    /// Raeumt den Verzeichnis-Eintrag der Session garantiert auf, egal
    /// wie die Befehlsschleife endet.
    pub async fn verarbeiten<S>(mut self, strom: S) -> SessionResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        tracing::info!(
            session = %self.session.id,
            peer = %self.session.peer_addr,
            "Verbindung angenommen"
        );

        let (lese, mut schreib) = tokio::io::split(strom);
        let mut reader = BufReader::new(lese);

        let ergebnis = self.befehlsschleife(&mut reader, &mut schreib).await;

        self.state.directory.entfernen(self.session.id);
        tracing::info!(session = %self.session.id, "Verbindung beendet");
        ergebnis
    }

    async fn befehlsschleife<R, W>(&mut self, reader: &mut R, writer: &mut W) -> SessionResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let zeile = tokio::select! {
                zeile = zeile_lesen(reader, self.state.limits.max_befehlszeile_bytes) => zeile?,
                _ = self.shutdown.changed() => {
                    tracing::debug!(session = %self.session.id, "Shutdown-Signal, Session endet");
                    return Ok(());
                }
                _ = idle_ablauf(self.state.limits.idle_timeout) => {
                    tracing::warn!(session = %self.session.id, "Idle-Timeout, Session endet");
                    return Ok(());
                }
            };
            let Some(zeile) = zeile else {
                tracing::debug!(session = %self.session.id, "Peer hat die Verbindung geschlossen");
                return Ok(());
            };

            let befehl = match command::parse(&zeile) {
                Ok(befehl) => befehl,
                Err(e) => {
                    tracing::debug!(session = %self.session.id, fehler = %e, "Zeile nicht parsebar");
                    transfer::statuszeile(writer, antwort::UNBEKANNTER_BEFEHL).await?;
                    continue;
                }
            };

            if befehl.erfordert_anmeldung() && !self.session.ist_angemeldet() {
                transfer::statuszeile(writer, antwort::NICHT_ANGEMELDET).await?;
                continue;
            }

            tracing::debug!(
                session = %self.session.id,
                benutzer = self.session.benutzer(),
                befehl = befehl.name(),
                "Befehl empfangen"
            );

            match befehl {
                Befehl::Register { benutzer, passwort } => {
                    self.registrieren(writer, &benutzer, &passwort).await?;
                }
                Befehl::Login { benutzer, passwort } => {
                    self.anmelden(writer, &benutzer, &passwort).await?;
                }
                Befehl::Logout => self.abmelden(writer).await?,
                Befehl::Exit => {
                    self.session.zustand = SessionZustand::Beendend;
                    return Ok(());
                }
                Befehl::Online => self.online(writer).await?,
                Befehl::Retrieve => self.abrufen(writer).await?,
                Befehl::Send { empfaenger, text } => {
                    self.senden(writer, &empfaenger, &text).await?;
                }
                Befehl::SendFile { dateiname } => {
                    transfer::upload_empfangen(
                        &self.state,
                        reader,
                        writer,
                        self.session.benutzer(),
                        &dateiname,
                    )
                    .await?;
                }
                Befehl::ReceiveFile { dateiname } => {
                    transfer::download_senden(
                        &self.state,
                        writer,
                        self.session.benutzer(),
                        &dateiname,
                    )
                    .await?;
                }
                Befehl::ListFiles => transfer::liste_senden(&self.state, writer).await?,
                Befehl::StreamVideo => {
                    let mut senke = ProtokollSenke::default();
                    let ergebnis =
                        stream::empfangen(reader, &mut senke, self.state.limits.max_frame_bytes)
                            .await?;
                    match ergebnis {
                        StreamErgebnis::Sentinel { frames } => tracing::info!(
                            session = %self.session.id,
                            frames,
                            bytes = senke.bytes,
                            "Stream beendet"
                        ),
                        StreamErgebnis::Abgebrochen { frames } => tracing::warn!(
                            session = %self.session.id,
                            frames,
                            "Stream abgebrochen"
                        ),
                    }
                }
            }
        }
    }

    async fn registrieren<W>(
        &self,
        writer: &mut W,
        benutzer: &str,
        passwort: &str,
    ) -> SessionResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let text = match self.state.credentials.anhaengen(benutzer, passwort).await {
            Ok(()) => antwort::REGISTRIERUNG_ERFOLGREICH,
            Err(AuthFehler::BenutzerVorhanden(_)) => antwort::BENUTZER_VORHANDEN,
            Err(e) => {
                tracing::warn!(benutzer, fehler = %e, "Registrierung fehlgeschlagen");
                antwort::REGISTRIERUNG_FEHLGESCHLAGEN
            }
        };
        transfer::statuszeile(writer, text).await
    }

    async fn anmelden<W>(
        &mut self,
        writer: &mut W,
        benutzer: &str,
        passwort: &str,
    ) -> SessionResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        if self.session.ist_angemeldet() {
            return transfer::statuszeile(writer, antwort::BEREITS_ANGEMELDET).await;
        }

        let gueltig = self
            .state
            .credentials
            .pruefen(benutzer, passwort)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(benutzer, fehler = %e, "Credential-Pruefung fehlgeschlagen");
                false
            });
        if !gueltig {
            tracing::warn!(benutzer, "Anmeldung mit ungueltigen Anmeldedaten");
            return transfer::statuszeile(writer, antwort::UNGUELTIGE_ANMELDEDATEN).await;
        }

        match self.state.directory.hinzufuegen(benutzer, self.session.id) {
            Ok(()) => {
                self.session.anmelden(benutzer);
                transfer::statuszeile(writer, antwort::LOGIN_ERFOLGREICH).await
            }
            Err(e) => {
                tracing::warn!(benutzer, fehler = %e, "Name bereits angemeldet");
                transfer::statuszeile(writer, antwort::BEREITS_ANGEMELDET).await
            }
        }
    }

    async fn abmelden<W>(&mut self, writer: &mut W) -> SessionResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.state.directory.entfernen(self.session.id);
        self.session.abmelden();
        transfer::statuszeile(writer, antwort::ABGEMELDET).await
    }

    async fn online<W>(&self, writer: &mut W) -> SessionResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let andere = self.state.directory.alle_ausser(self.session.benutzer());
        let block = if andere.is_empty() {
            format!("{}\n", antwort::KEINE_ANDEREN_BENUTZER)
        } else {
            let mut block = String::new();
            for name in &andere {
                block.push_str(name);
                block.push('\n');
            }
            block
        };
        transfer::textblock(writer, &block).await
    }

    async fn abrufen<W>(&self, writer: &mut W) -> SessionResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let nachrichten = self.state.mailbox.abholen(self.session.benutzer());
        let block: String = if nachrichten.is_empty() {
            format!("{}\n", antwort::KEINE_NACHRICHTEN)
        } else {
            nachrichten
                .iter()
                .map(|n| antwort::nachricht_zeile(&n.absender, &n.text))
                .collect()
        };
        transfer::textblock(writer, &block).await
    }

    async fn senden<W>(&self, writer: &mut W, empfaenger: &str, text: &str) -> SessionResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        // Zustellung nur an angemeldete Empfaenger
        if self.state.directory.finden(empfaenger).is_none() {
            return transfer::statuszeile(writer, antwort::EMPFAENGER_NICHT_GEFUNDEN).await;
        }

        let text_antwort = match self
            .state
            .mailbox
            .einstellen(self.session.benutzer(), empfaenger, text)
        {
            Ok(()) => antwort::NACHRICHT_GESENDET,
            Err(e) => {
                tracing::warn!(empfaenger, fehler = %e, "Nachricht abgelehnt");
                antwort::POSTFACH_VOLL
            }
        };
        transfer::statuszeile(writer, text_antwort).await
    }
}

/// Liest eine Befehlszeile mit Laengen-Obergrenze
///
/// `Ok(None)` bei EOF. Eine Zeile, die das Maximum ohne Newline
/// erreicht, laesst sich nicht mehr sauber einordnen und beendet die
/// Session als Protokollfehler.
async fn zeile_lesen<R>(reader: &mut R, maximum: usize) -> SessionResult<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut zeile = String::new();
    let gelesen = reader.take(maximum as u64).read_line(&mut zeile).await?;
    if gelesen == 0 {
        return Ok(None);
    }
    if !zeile.ends_with('\n') && gelesen >= maximum {
        return Err(ProtokollFehler::ZeileZuLang { maximum }.into());
    }
    Ok(Some(zeile))
}

/// Schlaeft bis zum Idle-Timeout; ohne Timeout nie
async fn idle_ablauf(timeout: Option<Duration>) {
    match timeout {
        Some(dauer) => tokio::time::sleep(dauer).await,
        None => std::future::pending::<()>().await,
    }
}
