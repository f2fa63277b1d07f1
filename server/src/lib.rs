//! flurfunk-server – Bibliotheks-Root
//!
//! Baut den geteilten Zustand auf, bindet den TLS-Listener und spawnt
//! pro angenommener Verbindung eine Befehlsschleife. Ein Ctrl-C setzt
//! das Shutdown-Signal, auf das alle Sessions hoeren.

pub mod config;
pub mod tls;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;

use flurfunk_auth::DateiCredentialStore;
use flurfunk_registry::MailboxStore;
use flurfunk_session::{ClientVerbindung, ServerState};
use flurfunk_storage::FileStore;

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Ablage-Wurzel anlegen falls sie fehlt
    /// 2. TLS-Acceptor aus Zertifikat und Schluessel bauen
    /// 3. Listener binden und Verbindungen annehmen
    /// 4. Bei Ctrl-C das Shutdown-Signal an alle Sessions senden
    pub async fn starten(self) -> Result<()> {
        let ablage = FileStore::neu(&self.config.ablage.wurzel);
        ablage
            .sicherstellen()
            .await
            .context("Ablage-Wurzel nicht anlegbar")?;
        let credentials = DateiCredentialStore::neu(&self.config.ablage.benutzerdatei);

        let state = Arc::new(
            ServerState::neu(credentials, ablage)
                .mit_limits(self.config.session_limits())
                .mit_mailbox(MailboxStore::mit_kapazitaet(self.config.postfach.kapazitaet)),
        );

        let acceptor = tls::acceptor_laden(
            Path::new(&self.config.netzwerk.tls_zertifikat),
            Path::new(&self.config.netzwerk.tls_schluessel),
        )?;

        let adresse = self.config.tcp_bind_adresse();
        let listener = TcpListener::bind(&adresse)
            .await
            .with_context(|| format!("Bind auf {adresse} fehlgeschlagen"))?;
        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %adresse,
            max_clients = self.config.server.max_clients,
            "Server gestartet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let verbindungszaehler = Arc::new(AtomicUsize::new(0));
        let max_clients = self.config.server.max_clients;

        tokio::pin! {
            let shutdown_signal = tokio::signal::ctrl_c();
        }

        loop {
            let (strom, peer_addr) = tokio::select! {
                angenommen = listener.accept() => angenommen?,
                _ = &mut shutdown_signal => {
                    tracing::info!("Shutdown-Signal empfangen, Sessions werden beendet");
                    let _ = shutdown_tx.send(true);
                    break;
                }
            };

            // Verbindungslimit vor dem TLS-Handshake pruefen
            let aktuelle = verbindungszaehler.fetch_add(1, Ordering::SeqCst);
            if aktuelle >= max_clients {
                verbindungszaehler.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!(
                    peer = %peer_addr,
                    maximum = max_clients,
                    "Verbindung abgelehnt: Limit erreicht"
                );
                continue;
            }

            let acceptor = acceptor.clone();
            let state = Arc::clone(&state);
            let shutdown = shutdown_rx.clone();
            let zaehler = Arc::clone(&verbindungszaehler);

            tokio::spawn(async move {
                match acceptor.accept(strom).await {
                    Ok(tls_strom) => {
                        let verbindung = ClientVerbindung::neu(state, peer_addr, shutdown);
                        if let Err(e) = verbindung.verarbeiten(tls_strom).await {
                            tracing::warn!(peer = %peer_addr, fehler = %e, "Session mit Fehler beendet");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "TLS-Handshake fehlgeschlagen");
                    }
                }
                zaehler.fetch_sub(1, Ordering::SeqCst);
            });
        }

        Ok(())
    }
}
