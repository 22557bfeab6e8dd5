use crate::data::{AppSettings, EventData, Persistable};
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub fn run() -> Result<()> {
    let dir = crate::data::persistence::get_config_dir()?;
    run_in_dir(&dir)?;
    println!("Config initialized in {}", dir.display());
    Ok(())
}

/// Writes a default `config.yaml` into `dir`, plus an empty `events.json`
/// unless one already exists.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    let path = AppSettings::default().save_to(dir)?;
    info!(path = %path.display(), "wrote default settings");
    if !dir.join(EventData::filename()).exists() {
        let path = EventData::default().save_to(dir)?;
        info!(path = %path.display(), "wrote empty event list");
    }
    Ok(())
}
