//! TLS-Acceptor aus PEM-Dateien
//!
//! Der Server spricht ausschliesslich TLS; ohne gueltiges Zertifikat
//! und Schluessel startet er nicht.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls_pemfile::{certs, private_key};
use tokio_rustls::TlsAcceptor;

/// Baut den TLS-Acceptor aus Zertifikatskette und privatem Schluessel
pub fn acceptor_laden(zertifikat: &Path, schluessel: &Path) -> Result<TlsAcceptor> {
    let kette = zertifikate_lesen(zertifikat)?;
    let key = schluessel_lesen(schluessel)?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(kette, key)
        .context("TLS-Konfiguration ungueltig")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn zertifikate_lesen(pfad: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let datei = std::fs::File::open(pfad)
        .with_context(|| format!("Zertifikat '{}' nicht lesbar", pfad.display()))?;
    let mut reader = std::io::BufReader::new(datei);

    let kette = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .context("Zertifikat-Parsing fehlgeschlagen")?;
    if kette.is_empty() {
        anyhow::bail!("Keine Zertifikate in '{}'", pfad.display());
    }
    Ok(kette)
}

fn schluessel_lesen(pfad: &Path) -> Result<PrivateKeyDer<'static>> {
    let datei = std::fs::File::open(pfad)
        .with_context(|| format!("Schluessel '{}' nicht lesbar", pfad.display()))?;
    let mut reader = std::io::BufReader::new(datei);

    private_key(&mut reader)
        .context("Schluessel-Parsing fehlgeschlagen")?
        .ok_or_else(|| anyhow::anyhow!("Kein privater Schluessel in '{}'", pfad.display()))
}
