//! Befehlsparser fuer das zeilenbasierte Kommandoprotokoll
//!
//! Parst eine Befehlszeile in einen geschlossenen `Befehl`-Enum. Der
//! erste whitespace-getrennte Token wird exakt verglichen – nie per
//! Praefix. Damit kann `SEND_FILE` niemals im `SEND`-Zweig landen.
//!
//! Die Befehlsnamen sind case-sensitiv (`LOGIN`, aber `exit`).

use crate::error::{ProtokollFehler, ProtokollResult};

/// Ein vollstaendig geparster Befehl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Befehl {
    /// `REGISTER <user> <pass>` – Benutzerkonto anlegen
    Register { benutzer: String, passwort: String },
    /// `LOGIN <user> <pass>` – Anmelden
    Login { benutzer: String, passwort: String },
    /// `LOGOUT` – Abmelden, Verbindung bleibt bestehen
    Logout,
    /// `exit` – Session beenden
    Exit,
    /// `ONLINE` – Andere angemeldete Benutzer auflisten
    Online,
    /// `RETRIEVE` – Eigenes Postfach leeren
    Retrieve,
    /// `SEND <user> <text...>` – Nachricht einstellen
    Send { empfaenger: String, text: String },
    /// `SEND_FILE <name>` – Upload-Teilprotokoll betreten
    SendFile { dateiname: String },
    /// `RECEIVE_FILE <name>` – Download-Teilprotokoll betreten
    ReceiveFile { dateiname: String },
    /// `LIST_FILES` – Ablage auflisten
    ListFiles,
    /// `STREAM_VIDEO` – Stream-Teilprotokoll betreten
    StreamVideo,
}

impl Befehl {
    /// Gibt true zurueck wenn der Befehl eine angemeldete Session erfordert
    pub fn erfordert_anmeldung(&self) -> bool {
        !matches!(
            self,
            Befehl::Register { .. } | Befehl::Login { .. } | Befehl::Exit
        )
    }

    /// Gibt den Wire-Namen des Befehls zurueck (fuer Logging)
    pub fn name(&self) -> &'static str {
        match self {
            Befehl::Register { .. } => "REGISTER",
            Befehl::Login { .. } => "LOGIN",
            Befehl::Logout => "LOGOUT",
            Befehl::Exit => "exit",
            Befehl::Online => "ONLINE",
            Befehl::Retrieve => "RETRIEVE",
            Befehl::Send { .. } => "SEND",
            Befehl::SendFile { .. } => "SEND_FILE",
            Befehl::ReceiveFile { .. } => "RECEIVE_FILE",
            Befehl::ListFiles => "LIST_FILES",
            Befehl::StreamVideo => "STREAM_VIDEO",
        }
    }
}

/// Parst eine Befehlszeile
///
/// Zeilenenden (`\r\n` oder `\n`) werden entfernt. Argumente sind
/// whitespace-getrennt; bei `SEND` ist alles nach dem Empfaenger der
/// Nachrichtentext, Leerzeichen inklusive.
pub fn parse(zeile: &str) -> ProtokollResult<Befehl> {
    let zeile = zeile.trim_end_matches(['\r', '\n']).trim();
    if zeile.is_empty() {
        return Err(ProtokollFehler::LeereZeile);
    }

    let (name, rest) = match zeile.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (zeile, ""),
    };

    match name {
        "REGISTER" => {
            let (benutzer, passwort) = benutzer_und_passwort("REGISTER", rest)?;
            Ok(Befehl::Register { benutzer, passwort })
        }
        "LOGIN" => {
            let (benutzer, passwort) = benutzer_und_passwort("LOGIN", rest)?;
            Ok(Befehl::Login { benutzer, passwort })
        }
        "LOGOUT" => Ok(Befehl::Logout),
        "exit" => Ok(Befehl::Exit),
        "ONLINE" => Ok(Befehl::Online),
        "RETRIEVE" => Ok(Befehl::Retrieve),
        "SEND" => {
            let (empfaenger, text) = rest.split_once(char::is_whitespace).ok_or(
                ProtokollFehler::ArgumentFehlt {
                    befehl: "SEND",
                    fehlt: if rest.is_empty() {
                        "Empfaenger"
                    } else {
                        "Nachrichtentext"
                    },
                },
            )?;
            Ok(Befehl::Send {
                empfaenger: empfaenger.to_string(),
                text: text.trim_start().to_string(),
            })
        }
        "SEND_FILE" => Ok(Befehl::SendFile {
            dateiname: ein_argument("SEND_FILE", "Dateiname", rest)?,
        }),
        "RECEIVE_FILE" => Ok(Befehl::ReceiveFile {
            dateiname: ein_argument("RECEIVE_FILE", "Dateiname", rest)?,
        }),
        "LIST_FILES" => Ok(Befehl::ListFiles),
        "STREAM_VIDEO" => Ok(Befehl::StreamVideo),
        sonst => Err(ProtokollFehler::UnbekannterBefehl(sonst.to_string())),
    }
}

/// Extrahiert genau ein Argument (erster Token des Rests)
fn ein_argument(
    befehl: &'static str,
    fehlt: &'static str,
    rest: &str,
) -> ProtokollResult<String> {
    rest.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(ProtokollFehler::ArgumentFehlt { befehl, fehlt })
}

/// Extrahiert Benutzername und Passwort (weitere Tokens werden ignoriert)
fn benutzer_und_passwort(
    befehl: &'static str,
    rest: &str,
) -> ProtokollResult<(String, String)> {
    let mut tokens = rest.split_whitespace();
    let benutzer = tokens
        .next()
        .ok_or(ProtokollFehler::ArgumentFehlt {
            befehl,
            fehlt: "Benutzername",
        })?
        .to_string();
    let passwort = tokens
        .next()
        .ok_or(ProtokollFehler::ArgumentFehlt {
            befehl,
            fehlt: "Passwort",
        })?
        .to_string();
    Ok((benutzer, passwort))
}
