//! Statuszeilen des Kommandoprotokolls
//!
//! Jede behandelbare Antwort des Servers ist eine dieser Zeilen,
//! newline-terminiert. Die Texte entsprechen der Server-Ausgabe, auf
//! die sich Clients verlassen (z.B. "Login successful" als
//! Erfolgskriterium).
//!
//! Listen-Antworten (ONLINE, RETRIEVE, LIST_FILES) sind keine Zeilen,
//! sondern einzelne laengen-praefixierte Textbloecke – ihre Groesse ist
//! prinzipiell unbegrenzt und darf nie still abgeschnitten werden.

pub const REGISTRIERUNG_ERFOLGREICH: &str = "Registration successful";
pub const BENUTZER_VORHANDEN: &str = "Username already exists";
pub const REGISTRIERUNG_FEHLGESCHLAGEN: &str = "Registration failed";

pub const LOGIN_ERFOLGREICH: &str = "Login successful";
pub const BEREITS_ANGEMELDET: &str = "User already logged in";
pub const UNGUELTIGE_ANMELDEDATEN: &str = "Invalid credentials";
pub const ABGEMELDET: &str = "Logged out successfully";
pub const NICHT_ANGEMELDET: &str = "Not logged in";

pub const KEINE_NACHRICHTEN: &str = "No new messages";
pub const KEINE_ANDEREN_BENUTZER: &str = "No other users online.";
pub const NACHRICHT_GESENDET: &str = "Message sent";
pub const EMPFAENGER_NICHT_GEFUNDEN: &str = "Target user not found";
pub const POSTFACH_VOLL: &str = "Mailbox full, message rejected";

pub const UPLOAD_ERFOLGREICH: &str = "File uploaded successfully";
pub const UPLOAD_UNVOLLSTAENDIG: &str = "File upload incomplete";
pub const UPLOAD_FEHLGESCHLAGEN: &str = "File upload failed";
pub const UPLOAD_GROESSE_NULL: &str = "File size is 0. Upload aborted";
pub const DATEI_ZU_GROSS: &str = "File too large. Upload aborted";
pub const UNGUELTIGER_DATEINAME: &str = "Invalid filename";

pub const DATEI_NICHT_GEFUNDEN: &str = "File not found";
pub const DOWNLOAD_KOMPLETT: &str = "File download complete";
pub const DOWNLOAD_UNVOLLSTAENDIG: &str = "File download incomplete";
pub const KEINE_DATEIEN: &str = "No files available for download";
pub const LISTE_FEHLGESCHLAGEN: &str = "Failed to retrieve file list";

pub const UNBEKANNTER_BEFEHL: &str = "Unknown command";

/// Formatiert eine abgeholte Nachricht fuer die RETRIEVE-Antwort
pub fn nachricht_zeile(absender: &str, text: &str) -> String {
    format!("From {absender}: {text}\n")
}
