//! FileStore – Dateizugriffe unter der Ablage-Wurzel
//!
//! Jeder Zugriff laeuft ueber [`FileStore::pfad`], das den Dateinamen
//! vor dem ersten Dateisystem-Aufruf bereinigt: Pfad-Separatoren,
//! `..`-Sequenzen, fuehrende Punkte und Steuerzeichen werden abgelehnt.
//! Ein Client kann damit keinen Pfad ausserhalb der Wurzel erreichen.

use std::path::{Path, PathBuf};

use tokio::fs::File;

use crate::error::{SpeicherFehler, SpeicherResult};

/// Datei-Ablage unter einer festen Wurzel
#[derive(Debug, Clone)]
pub struct FileStore {
    wurzel: PathBuf,
}

impl FileStore {
    /// Erstellt eine Ablage fuer das angegebene Wurzelverzeichnis
    pub fn neu(wurzel: impl Into<PathBuf>) -> Self {
        Self {
            wurzel: wurzel.into(),
        }
    }

    /// Legt das Wurzelverzeichnis an falls es fehlt
    pub async fn sicherstellen(&self) -> SpeicherResult<()> {
        tokio::fs::create_dir_all(&self.wurzel).await?;
        tracing::debug!(wurzel = %self.wurzel.display(), "Ablage-Wurzel bereit");
        Ok(())
    }

    /// Gibt das Wurzelverzeichnis zurueck
    pub fn wurzel(&self) -> &Path {
        &self.wurzel
    }

    /// Bereinigt den Dateinamen und bildet den Pfad unter der Wurzel
    pub fn pfad(&self, dateiname: &str) -> SpeicherResult<PathBuf> {
        dateiname_pruefen(dateiname)?;
        Ok(self.wurzel.join(dateiname))
    }

    /// Oeffnet eine Datei zum Lesen
    ///
    /// Gibt `Ok(None)` zurueck wenn die Datei nicht existiert – das ist
    /// die "nicht gefunden"-Antwort des Download-Protokolls, kein Fehler.
    pub async fn oeffnen_zum_lesen(
        &self,
        dateiname: &str,
    ) -> SpeicherResult<Option<(File, u64)>> {
        let pfad = self.pfad(dateiname)?;
        match File::open(&pfad).await {
            Ok(datei) => {
                let groesse = datei.metadata().await?.len();
                Ok(Some((datei, groesse)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Legt eine Datei zum Schreiben an (ueberschreibt vorhandene)
    pub async fn anlegen_zum_schreiben(&self, dateiname: &str) -> SpeicherResult<File> {
        let pfad = self.pfad(dateiname)?;
        Ok(File::create(&pfad).await?)
    }

    /// Loescht eine Datei; eine fehlende Datei ist kein Fehler
    pub async fn loeschen(&self, dateiname: &str) -> SpeicherResult<()> {
        let pfad = self.pfad(dateiname)?;
        match tokio::fs::remove_file(&pfad).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Listet alle sichtbaren Eintraege der Wurzel auf (sortiert)
    ///
    /// Versteckte Eintraege (fuehrender Punkt) werden uebersprungen. Die
    /// Liste waechst dynamisch – es gibt keine feste Obergrenze.
    pub async fn auflisten(&self) -> SpeicherResult<Vec<String>> {
        let mut eintraege = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.wurzel).await?;
        while let Some(eintrag) = dir.next_entry().await? {
            let name = eintrag.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            eintraege.push(name);
        }
        eintraege.sort();
        Ok(eintraege)
    }
}

/// Prueft einen Dateinamen auf Traversal- und Separator-Angriffe
fn dateiname_pruefen(dateiname: &str) -> SpeicherResult<()> {
    let ungueltig = dateiname.is_empty()
        || dateiname.starts_with('.')
        || dateiname.contains("..")
        || dateiname.contains(['/', '\\', '\0'])
        || dateiname.chars().any(char::is_control);

    if ungueltig {
        return Err(SpeicherFehler::UngueltigerDateiname(dateiname.to_string()));
    }
    Ok(())
}

/// Sucht einen freien lokalen Dateinamen fuer die Download-Seite
///
/// Probiert `name`, `name_1`, `name_2`, … bis ein Name im Verzeichnis
/// frei ist. Check-then-create ist nicht atomar gegenueber anderen
/// Prozessen – das akzeptiert auch das Original.
pub async fn freier_name(verzeichnis: &Path, dateiname: &str) -> SpeicherResult<String> {
    if !tokio::fs::try_exists(verzeichnis.join(dateiname)).await? {
        return Ok(dateiname.to_string());
    }

    let mut zaehler = 1u32;
    loop {
        let kandidat = format!("{dateiname}_{zaehler}");
        if !tokio::fs::try_exists(verzeichnis.join(&kandidat)).await? {
            return Ok(kandidat);
        }
        zaehler += 1;
    }
}
