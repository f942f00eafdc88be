pub mod claude;
pub mod codex;
pub mod environments;
pub mod gemini;
pub mod mcp;
pub mod menu;

use crate::output;
use ccc_core::{ConfigPaths, ConfigStore, Registry};

/// Paths and registry access shared by every command
pub struct Context {
    pub paths: ConfigPaths,
    pub store: ConfigStore,
}

impl Context {
    pub fn new(paths: ConfigPaths) -> Self {
        let store = ConfigStore::new(&paths);
        Self { paths, store }
    }

    /// Fresh copy of the full registry
    pub fn registry(&self) -> ccc_core::Result<Registry> {
        self.store.load(None)
    }

    /// Save, telling the user when it did not work
    pub fn save(&self, registry: &Registry) -> bool {
        let saved = self.store.save(registry);
        if !saved {
            output::failure(format!(
                "Failed to save profile registry {}",
                self.store.path().display()
            ));
        }
        saved
    }
}
