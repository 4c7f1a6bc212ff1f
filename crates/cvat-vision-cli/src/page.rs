//! In-process page for `--offline`: scripts evaluate against the built-in
//! registry without touching the network.

use async_trait::async_trait;
use cvat_vision::{NativeHandle, PageEnvironment, ScriptRegistry, ScriptTag};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;
use url::Url;

pub struct BundledPage {
    registry: ScriptRegistry,
    globals: RwLock<HashMap<String, NativeHandle>>,
}

impl BundledPage {
    pub fn new() -> Self {
        Self {
            registry: ScriptRegistry::builtin(),
            globals: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PageEnvironment for BundledPage {
    async fn append_script(&self, src: &Url) -> cvat_vision::Result<ScriptTag> {
        let tag = ScriptTag::new(src.clone());
        match self.registry.evaluate(src) {
            Some((global, handle)) => {
                self.globals.write().await.insert(global, handle);
            }
            None => {
                warn!(%src, "no bundled library for this script");
                tag.detach();
            }
        }
        Ok(tag)
    }

    async fn global(&self, name: &str) -> Option<NativeHandle> {
        self.globals.read().await.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvat_vision::{Loader, LoaderConfig, VisionError};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_bundled_library_loads() {
        let loader = Loader::new(LoaderConfig::default(), Arc::new(BundledPage::new())).unwrap();
        loader.initialize().await.unwrap();
        assert!(loader.contours().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_library_fails_fast() {
        let config = LoaderConfig {
            library: "missing".into(),
            ..Default::default()
        };
        let loader = Loader::new(config, Arc::new(BundledPage::new())).unwrap();
        let err = loader.initialize().await.unwrap_err();
        assert!(matches!(err, VisionError::FetchFailure { .. }));
    }
}
