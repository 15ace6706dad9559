//! The bundled shortcut dataset loaded at store initialisation.

use crate::error::CatalogError;
use crate::types::NewShortcut;

const SEED_JSON: &str = include_str!("../data/shortcuts.json");

/// Decode the bundled dataset, in catalog order.
pub fn seed_shortcuts() -> Result<Vec<NewShortcut>, CatalogError> {
    Ok(serde_json::from_str(SEED_JSON)?)
}
