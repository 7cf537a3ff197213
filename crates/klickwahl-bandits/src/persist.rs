//! Speichern und Laden des [`PolicyState`] als JSON.
//!
//! Geschrieben wird genau einmal nach dem Training; der Auswahlprozess liest
//! die Datei vollständig ein, bevor er entscheidet. Die Trainings-Rewards der
//! Arme sind nicht Teil des Zustands und landen nie auf der Platte.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::{BanditError, Result};
use crate::state::{PolicyState, StateSnapshot};

const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

fn iso8601_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_string())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> BanditError + '_ {
    move |source| BanditError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Schreibt den Zustand nach `path` und überschreibt eine vorhandene Datei.
///
/// Fehlende Elternverzeichnisse werden angelegt.
///
/// # Errors
/// [`BanditError::CorruptState`], wenn ein Reward nicht endlich ist. JSON
/// kennt weder `NaN` noch `inf`; eine solche Datei ließe sich nicht mehr
/// laden. Geprüft wird, bevor die Datei angefasst wird.
pub fn save_state(state: &PolicyState, path: &Path) -> Result<()> {
    let mut snapshot = state.to_snapshot();
    for entry in &snapshot.contexts {
        if let Some((i, reward)) = entry
            .rewards
            .iter()
            .enumerate()
            .find(|(_, r)| !r.is_finite())
        {
            return Err(BanditError::CorruptState(format!(
                "context [{}] has non-finite reward {reward} for arm #{i}",
                entry.context
            )));
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err(path))?;
        }
    }
    snapshot.saved_at = Some(iso8601_now());

    let file = File::create(path).map_err(io_err(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush().map_err(io_err(path))?;

    log_info!(
        "saved policy state to {} ({} arms, {} contexts)",
        path.display(),
        state.arm_count(),
        state.context_count()
    );
    Ok(())
}

/// Liest einen zuvor mit [`save_state`] geschriebenen Zustand.
///
/// # Errors
/// I/O- und JSON-Fehler sowie [`BanditError::CorruptState`], wenn die
/// Sequenzen eines Kontexts nicht zum Arm-Katalog passen.
pub fn load_state(path: &Path) -> Result<PolicyState> {
    let file = File::open(path).map_err(io_err(path))?;
    let snapshot: StateSnapshot = serde_json::from_reader(BufReader::new(file))?;
    let state = PolicyState::try_from(snapshot)?;

    log_info!(
        "loaded policy state from {} ({} arms, {} contexts)",
        path.display(),
        state.arm_count(),
        state.context_count()
    );
    Ok(state)
}
