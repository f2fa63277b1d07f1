//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist (vorausgesetzt Zertifikat und Schluessel liegen unter
//! den Standardpfaden).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use flurfunk_session::SessionLimits;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk- und TLS-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datei-Ablage und Benutzerdatenbank
    pub ablage: AblageEinstellungen,
    /// Postfach-Einstellungen
    pub postfach: PostfachEinstellungen,
    /// Limits pro Session
    pub session: SessionEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Flurfunk Server".into(),
            max_clients: 64,
        }
    }
}

/// Netzwerk- und TLS-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse des TLS-Listeners
    pub bind_adresse: String,
    /// Port des TLS-Listeners
    pub tcp_port: u16,
    /// TLS-Zertifikat (PEM)
    pub tls_zertifikat: String,
    /// Privater TLS-Schluessel (PEM)
    pub tls_schluessel: String,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            tcp_port: 8080,
            tls_zertifikat: "server.crt".into(),
            tls_schluessel: "server.key".into(),
        }
    }
}

/// Datei-Ablage und Benutzerdatenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AblageEinstellungen {
    /// Wurzelverzeichnis der Datei-Ablage (wird beim Start angelegt)
    pub wurzel: String,
    /// Pfad der Benutzerdatenbank (eine Zeile pro Benutzer)
    pub benutzerdatei: String,
}

impl Default for AblageEinstellungen {
    fn default() -> Self {
        Self {
            wurzel: "store".into(),
            benutzerdatei: "user_db".into(),
        }
    }
}

/// Postfach-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostfachEinstellungen {
    /// Gesamtkapazitaet wartender Nachrichten
    pub kapazitaet: usize,
}

impl Default for PostfachEinstellungen {
    fn default() -> Self {
        Self { kapazitaet: 1024 }
    }
}

/// Limits pro Session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEinstellungen {
    /// Maximale Laenge einer Befehlszeile in Bytes
    pub max_befehlszeile_bytes: usize,
    /// Maximale Groesse eines Stream-Frames in Bytes
    pub max_frame_bytes: usize,
    /// Maximale Groesse eines Datei-Uploads in Bytes
    pub max_datei_bytes: u64,
    /// Idle-Timeout in Sekunden; 0 deaktiviert den Timeout
    pub idle_timeout_sekunden: u64,
}

impl Default for SessionEinstellungen {
    fn default() -> Self {
        Self {
            max_befehlszeile_bytes: 8192,
            max_frame_bytes: 16 * 1024 * 1024,
            max_datei_bytes: 256 * 1024 * 1024,
            idle_timeout_sekunden: 300,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse des Listeners zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.tcp_port)
    }

    /// Uebersetzt die Session-Sektion in die Limits der Protokollmaschine
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_befehlszeile_bytes: self.session.max_befehlszeile_bytes,
            max_frame_bytes: self.session.max_frame_bytes,
            max_datei_bytes: self.session.max_datei_bytes,
            idle_timeout: match self.session.idle_timeout_sekunden {
                0 => None,
                sekunden => Some(Duration::from_secs(sekunden)),
            },
        }
    }
}
