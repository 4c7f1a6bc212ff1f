//! Lazy loader for the vision library.
//!
//! The loader injects the library script into its [`PageEnvironment`] once,
//! polls for the global the script registers, and hands out façades bound to
//! the resulting [`NativeHandle`]. Its state moves through
//! `uninitialized -> injecting -> initialized`; a failed injection falls
//! back to `uninitialized` so a later `initialize()` can try again.
//!
//! The injection runs on its own task: concurrent `initialize()` calls await
//! one shared outcome, and it settles even when every caller gave up.

use crate::config::LoaderConfig;
use crate::error::{Result, VisionError};
use crate::facade::{Contours, ImgProc, MatSpace, MatVectorSpace, Segmentation, Tracking};
use crate::native::NativeHandle;
use crate::page::{HttpPage, PageEnvironment, ScriptRegistry, ScriptTag};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use url::Url;

type Injection = Shared<BoxFuture<'static, Result<()>>>;

#[derive(Default)]
struct LoaderState {
    initialized: bool,
    injection: Option<Injection>,
    handle: Option<NativeHandle>,
    script: Option<ScriptTag>,
}

struct Inner {
    page: Arc<dyn PageEnvironment>,
    config: LoaderConfig,
    script_url: Url,
    state: Mutex<LoaderState>,
}

/// Instance-scoped loader; clones share the same state.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<Inner>,
}

impl Loader {
    /// Create an uninitialized loader for `page`.
    pub fn new(config: LoaderConfig, page: Arc<dyn PageEnvironment>) -> Result<Self> {
        config.validate()?;
        let script_url = config.script_url()?;
        Ok(Self {
            inner: Arc::new(Inner {
                page,
                config,
                script_url,
                state: Mutex::new(LoaderState::default()),
            }),
        })
    }

    /// Loader fetching the script over HTTP with the built-in registry.
    pub fn http(config: LoaderConfig) -> Result<Self> {
        Self::new(config, Arc::new(HttpPage::new(ScriptRegistry::builtin())))
    }

    /// Load the library, or join the injection already in flight.
    ///
    /// Returns immediately once initialized. Fails with
    /// [`VisionError::FetchFailure`] when the script cannot be retrieved and
    /// with [`VisionError::InitializationTimeout`] when the global never
    /// appears; either way the loader returns to uninitialized.
    pub async fn initialize(&self) -> Result<()> {
        let injection = {
            let mut state = self.inner.lock();
            if state.initialized {
                return Ok(());
            }
            match &state.injection {
                Some(injection) => injection.clone(),
                None => {
                    let task = tokio::spawn(Inner::inject(Arc::clone(&self.inner)));
                    let inner = Arc::clone(&self.inner);
                    let injection = async move {
                        task.await.unwrap_or_else(|e| {
                            inner.lock().injection = None;
                            Err(VisionError::Injection(e.to_string()))
                        })
                    }
                    .boxed()
                    .shared();
                    state.injection = Some(injection.clone());
                    injection
                }
            }
        };
        injection.await
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }

    pub fn initialization_in_progress(&self) -> bool {
        self.inner.lock().injection.is_some()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// Where the library script is loaded from.
    pub fn script_url(&self) -> &Url {
        &self.inner.script_url
    }

    fn handle(&self) -> Result<NativeHandle> {
        let state = self.inner.lock();
        match (&state.handle, state.initialized) {
            (Some(handle), true) => Ok(Arc::clone(handle)),
            _ => Err(VisionError::NotInitialized),
        }
    }

    pub fn mat(&self) -> Result<MatSpace> {
        Ok(MatSpace::new(self.handle()?))
    }

    pub fn mat_vector(&self) -> Result<MatVectorSpace> {
        Ok(MatVectorSpace::new(self.handle()?))
    }

    pub fn contours(&self) -> Result<Contours> {
        Ok(Contours::new(self.handle()?))
    }

    pub fn segmentation(&self) -> Result<Segmentation> {
        Ok(Segmentation::new(self.handle()?))
    }

    pub fn imgproc(&self) -> Result<ImgProc> {
        Ok(ImgProc::new(self.handle()?))
    }

    pub fn tracking(&self) -> Result<Tracking> {
        Ok(Tracking::new(self.handle()?))
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One injection attempt; settles the shared state when done.
    async fn inject(self: Arc<Self>) -> Result<()> {
        info!(url = %self.script_url, "injecting vision library");
        let outcome = self.load().await;

        let mut state = self.lock();
        state.injection = None;
        match outcome {
            Ok(handle) => {
                info!(library = handle.name(), "vision library initialized");
                state.handle = Some(handle);
                state.initialized = true;
                Ok(())
            }
            Err(e) => {
                warn!("vision library injection failed: {e}");
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<NativeHandle> {
        let tag = self.script_tag().await?;
        let interval = self.config.poll_interval;
        let mut remaining = self.config.timeout;

        loop {
            tokio::time::sleep(interval).await;

            if tag.is_detached() {
                self.lock().script = None;
                return Err(VisionError::FetchFailure {
                    url: self.script_url.to_string(),
                });
            }
            if let Some(handle) = self.page.global(&self.config.global_name).await {
                return Ok(handle);
            }

            remaining = remaining.saturating_sub(interval);
            if remaining.is_zero() {
                return Err(VisionError::InitializationTimeout {
                    waited: self.config.timeout,
                });
            }
            debug!(
                global = %self.config.global_name,
                remaining_ms = remaining.as_millis() as u64,
                "vision library not ready yet"
            );
        }
    }

    /// The attached script element, inserting one if there is none.
    async fn script_tag(&self) -> Result<ScriptTag> {
        let existing = {
            let mut state = self.lock();
            let live = state
                .script
                .as_ref()
                .filter(|tag| !tag.is_detached())
                .cloned();
            if live.is_none() {
                state.script = None;
            }
            live
        };
        if let Some(tag) = existing {
            return Ok(tag);
        }

        let tag = self.page.append_script(&self.script_url).await?;
        self.lock().script = Some(tag.clone());
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Page whose script never registers anything.
    #[derive(Default)]
    struct SilentPage {
        appended: AtomicUsize,
    }

    #[async_trait]
    impl PageEnvironment for SilentPage {
        async fn append_script(&self, src: &Url) -> Result<ScriptTag> {
            self.appended.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptTag::new(src.clone()))
        }

        async fn global(&self, _name: &str) -> Option<NativeHandle> {
            None
        }
    }

    /// Page whose script registers `cv` a fixed delay after being appended.
    struct DelayedPage {
        delay: Duration,
        appended_at: std::sync::Mutex<Option<tokio::time::Instant>>,
    }

    impl DelayedPage {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                appended_at: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl PageEnvironment for DelayedPage {
        async fn append_script(&self, src: &Url) -> Result<ScriptTag> {
            *self.appended_at.lock().unwrap() = Some(tokio::time::Instant::now());
            Ok(ScriptTag::new(src.clone()))
        }

        async fn global(&self, _name: &str) -> Option<NativeHandle> {
            let appended_at = (*self.appended_at.lock().unwrap())?;
            if appended_at.elapsed() < self.delay {
                return None;
            }
            let cv: NativeHandle = Arc::new(crate::backend::ImageprocLibrary::new());
            Some(cv)
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig {
            backend_api: "http://cvat.local/api".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_loader_is_uninitialized() {
        let loader = Loader::new(config(), Arc::new(SilentPage::default())).unwrap();
        assert!(!loader.is_initialized());
        assert!(!loader.initialization_in_progress());
        assert_eq!(loader.script_url().as_str(), "http://cvat.local/assets/opencv.js");
        assert_eq!(loader.mat().unwrap_err(), VisionError::NotInitialized);
    }

    #[test]
    fn test_new_loader_rejects_bad_config() {
        let bad = LoaderConfig {
            poll_interval: Duration::ZERO,
            ..config()
        };
        assert!(Loader::new(bad, Arc::new(SilentPage::default())).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_full_budget() {
        let page = Arc::new(SilentPage::default());
        let loader = Loader::new(config(), page.clone()).unwrap();

        let started = tokio::time::Instant::now();
        let err = loader.initialize().await.unwrap_err();
        assert_eq!(
            err,
            VisionError::InitializationTimeout {
                waited: Duration::from_secs(60)
            }
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
        assert!(!loader.is_initialized());
        assert!(!loader.initialization_in_progress());
        assert_eq!(page.appended.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_progress_while_polling() {
        let loader = Loader::new(config(), Arc::new(SilentPage::default())).unwrap();
        let background = loader.clone();
        let task = tokio::spawn(async move { background.initialize().await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(loader.initialization_in_progress());
        assert!(!loader.is_initialized());

        assert!(task.await.unwrap().is_err());
        assert!(!loader.initialization_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn test_injection_settles_after_caller_gives_up() {
        let page = Arc::new(DelayedPage::new(Duration::from_secs(2)));
        let loader = Loader::new(config(), page).unwrap();

        let abandoned = tokio::time::timeout(Duration::from_secs(1), loader.initialize()).await;
        assert!(abandoned.is_err());
        assert!(loader.initialization_in_progress());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(loader.is_initialized());
        assert!(!loader.initialization_in_progress());
        assert!(loader.contours().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_injection_still_times_out() {
        let page = Arc::new(SilentPage::default());
        let loader = Loader::new(config(), page.clone()).unwrap();

        let abandoned = tokio::time::timeout(Duration::from_secs(1), loader.initialize()).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(70)).await;
        assert!(!loader.initialization_in_progress());
        assert!(!loader.is_initialized());

        // A later call starts a fresh attempt on the same script element.
        assert!(loader.initialize().await.is_err());
        assert_eq!(page.appended.load(Ordering::SeqCst), 1);
    }
}
