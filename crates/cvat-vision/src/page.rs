//! The hosting page: script elements and global bindings.
//!
//! A [`PageEnvironment`] is where the loader inserts the library script and
//! where it polls for the global the script registers. [`HttpPage`] fetches
//! scripts over HTTP and evaluates them against a [`ScriptRegistry`].

use crate::backend::ImageprocLibrary;
use crate::error::Result;
use crate::native::NativeHandle;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use url::Url;

/// Monotonic counter for script element identifiers.
static SCRIPT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A script-loading element inserted into the page.
///
/// Clones share the detached flag, so the page can mark a failed fetch and
/// the loader observes it on its next readiness check.
#[derive(Debug, Clone)]
pub struct ScriptTag {
    id: u64,
    src: Url,
    detached: Arc<AtomicBool>,
}

impl ScriptTag {
    pub fn new(src: Url) -> Self {
        Self {
            id: SCRIPT_COUNTER.fetch_add(1, Ordering::Relaxed),
            src,
            detached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn src(&self) -> &Url {
        &self.src
    }

    /// Remove the element from the page (the script failed to load).
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

/// A page that can load scripts and expose globals.
#[async_trait]
pub trait PageEnvironment: Send + Sync {
    /// Insert a script element that starts loading `src`.
    async fn append_script(&self, src: &Url) -> Result<ScriptTag>;

    /// Look up a global binding registered by a loaded script.
    async fn global(&self, name: &str) -> Option<NativeHandle>;
}

/// Builds the library a script registers.
pub type LibraryFactory = Arc<dyn Fn() -> NativeHandle + Send + Sync>;

#[derive(Clone)]
struct Registration {
    global: String,
    factory: LibraryFactory,
}

/// Which global each known script file defines once evaluated.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    entries: HashMap<String, Registration>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in library served as `opencv.js` under `cv`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "opencv.js",
            "cv",
            Arc::new(|| -> NativeHandle { Arc::new(ImageprocLibrary::new()) }),
        );
        registry
    }

    /// Declare that evaluating `file_name` defines `global`.
    pub fn register(&mut self, file_name: &str, global: &str, factory: LibraryFactory) {
        self.entries.insert(
            file_name.to_string(),
            Registration {
                global: global.to_string(),
                factory,
            },
        );
    }

    /// Evaluate a loaded script: the global it defines and its value.
    pub fn evaluate(&self, src: &Url) -> Option<(String, NativeHandle)> {
        let file_name = src.path_segments()?.last()?;
        let registration = self.entries.get(file_name)?;
        Some((registration.global.clone(), (registration.factory)()))
    }
}

/// Page that fetches scripts over HTTP.
#[derive(Clone)]
pub struct HttpPage {
    client: reqwest::Client,
    registry: ScriptRegistry,
    globals: Arc<RwLock<HashMap<String, NativeHandle>>>,
    scripts: Arc<Mutex<Vec<ScriptTag>>>,
}

impl HttpPage {
    pub fn new(registry: ScriptRegistry) -> Self {
        Self::with_client(reqwest::Client::new(), registry)
    }

    pub fn with_client(client: reqwest::Client, registry: ScriptRegistry) -> Self {
        Self {
            client,
            registry,
            globals: Arc::new(RwLock::new(HashMap::new())),
            scripts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script elements currently attached to the page.
    pub async fn scripts(&self) -> Vec<Url> {
        self.scripts
            .lock()
            .await
            .iter()
            .map(|tag| tag.src().clone())
            .collect()
    }

    async fn fetch(client: &reqwest::Client, src: &Url) -> Result<usize> {
        let body = client
            .get(src.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body.len())
    }
}

#[async_trait]
impl PageEnvironment for HttpPage {
    async fn append_script(&self, src: &Url) -> Result<ScriptTag> {
        let tag = ScriptTag::new(src.clone());
        self.scripts.lock().await.push(tag.clone());

        let page = self.clone();
        let loading = tag.clone();
        tokio::spawn(async move {
            let src = loading.src().clone();
            match Self::fetch(&page.client, &src).await {
                Ok(bytes) => {
                    info!(%src, bytes, "script loaded");
                    match page.registry.evaluate(&src) {
                        Some((global, handle)) => {
                            page.globals.write().await.insert(global, handle);
                        }
                        None => warn!(%src, "script defined no known global"),
                    }
                }
                Err(e) => {
                    warn!(%src, "failed to load script: {e}");
                    loading.detach();
                    page.scripts
                        .lock()
                        .await
                        .retain(|tag| tag.id() != loading.id());
                }
            }
        });

        Ok(tag)
    }

    async fn global(&self, name: &str) -> Option<NativeHandle> {
        self.globals.read().await.get(name).cloned()
    }
}
