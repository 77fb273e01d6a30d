//! Browser launchers.
//!
//! A [`BrowserLauncher`] hands out one [`BrowserDriver`] per test case, each
//! bound to a fresh isolated page. [`MockBrowser`] serves a [`MockSite`];
//! with the `browser` feature, [`launch_chromium`] drives a real Chromium over
//! CDP via chromiumoxide, one browser context per test case.

use crate::config::E2eConfig;
use crate::driver::{BrowserDriver, MockDriver, MockSite};
use crate::result::{E2eError, E2eResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source of isolated pages for test cases
#[async_trait]
pub trait BrowserLauncher: Send + Sync + fmt::Debug {
    /// A driver bound to a fresh page that shares no state with other pages
    async fn new_driver(&self) -> E2eResult<Box<dyn BrowserDriver>>;

    /// Shut the browser down
    async fn close(&self) -> E2eResult<()>;
}

/// Launcher serving an in-memory site
#[derive(Debug)]
pub struct MockBrowser {
    site: Arc<MockSite>,
    pages_opened: AtomicUsize,
    pages_closed: Arc<AtomicUsize>,
}

impl MockBrowser {
    /// Serve `site` to every page
    #[must_use]
    pub fn new(site: MockSite) -> Self {
        Self {
            site: Arc::new(site),
            pages_opened: AtomicUsize::new(0),
            pages_closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve the simulated AISR front-end
    #[must_use]
    pub fn aisr() -> Self {
        Self::new(MockSite::aisr())
    }

    /// Number of pages handed out so far
    #[must_use]
    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::Relaxed)
    }

    /// Number of pages closed so far
    #[must_use]
    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BrowserLauncher for MockBrowser {
    async fn new_driver(&self) -> E2eResult<Box<dyn BrowserDriver>> {
        let _ = self.pages_opened.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(
            MockDriver::new(Arc::clone(&self.site))
                .with_close_counter(Arc::clone(&self.pages_closed)),
        ))
    }

    async fn close(&self) -> E2eResult<()> {
        Ok(())
    }
}

/// Launch Chromium with the browser settings from `config`
#[cfg(feature = "browser")]
pub async fn launch_chromium(config: &E2eConfig) -> E2eResult<Arc<dyn BrowserLauncher>> {
    let browser = cdp::ChromiumBrowser::launch(config).await?;
    Ok(Arc::new(browser))
}

/// Launch Chromium with the browser settings from `config`
#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
pub async fn launch_chromium(_config: &E2eConfig) -> E2eResult<Arc<dyn BrowserLauncher>> {
    Err(E2eError::BrowserLaunch {
        message: "built without the `browser` feature; rebuild with `--features browser`"
            .to_string(),
    })
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumBrowser, ChromiumDriver};

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::{BrowserDriver, BrowserLauncher, E2eConfig, E2eError, E2eResult};
    use crate::driver::ElementSnapshot;
    use crate::locator::Selector;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;

    const SNAPSHOT_SCRIPT: &str = r"
        const describe = (el, index) => {
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            const text = (el.innerText ?? el.textContent ?? '').trim();
            const ownText = Array.from(el.childNodes)
                .filter((n) => n.nodeType === Node.TEXT_NODE)
                .map((n) => n.textContent)
                .join(' ')
                .trim();
            return {
                index,
                tag: el.tagName.toLowerCase(),
                id: el.id || null,
                classes: Array.from(el.classList),
                role: el.getAttribute('role'),
                name: (el.getAttribute('aria-label') ?? text).trim(),
                text,
                own_text: ownText,
                test_id: el.getAttribute('data-testid'),
                visible: rect.width > 0 && rect.height > 0
                    && style.visibility !== 'hidden' && style.display !== 'none',
            };
        };
    ";

    fn driver_error(e: impl std::fmt::Display) -> E2eError {
        E2eError::driver(e.to_string())
    }

    /// JS expression listing the candidate elements for `selector`
    fn candidates_expr(selector: &Selector) -> E2eResult<String> {
        match selector {
            Selector::Css(css) => Ok(format!(
                "Array.from(document.querySelectorAll({}))",
                serde_json::to_string(css)?
            )),
            _ => Ok(
                "Array.from(document.body ? document.body.querySelectorAll('*') : [])".to_string(),
            ),
        }
    }

    /// Chromium instance shared by every test case of a run
    #[derive(Debug)]
    pub struct ChromiumBrowser {
        inner: Arc<Mutex<CdpBrowser>>,
        handle: JoinHandle<()>,
    }

    impl ChromiumBrowser {
        /// Launch Chromium and start the CDP event loop
        pub async fn launch(config: &E2eConfig) -> E2eResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| E2eError::BrowserLaunch { message })?;

            let launched = CdpBrowser::launch(cdp_config).await;
            let (browser, mut handler) = launched.map_err(|e| E2eError::BrowserLaunch {
                message: e.to_string(),
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(headless = config.headless, "chromium launched");
            Ok(Self {
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }
    }

    #[async_trait]
    impl BrowserLauncher for ChromiumBrowser {
        async fn new_driver(&self) -> E2eResult<Box<dyn BrowserDriver>> {
            let browser = self.inner.lock().await;
            let context = browser
                .execute(CreateBrowserContextParams::default())
                .await
                .map_err(driver_error)?
                .result
                .browser_context_id;

            let params = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context.clone())
                .build()
                .map_err(driver_error)?;
            let page = browser.new_page(params).await.map_err(driver_error)?;

            Ok(Box::new(ChromiumDriver {
                page,
                context,
                browser: Arc::clone(&self.inner),
            }))
        }

        async fn close(&self) -> E2eResult<()> {
            let result = self.inner.lock().await.close().await;
            self.handle.abort();
            result.map(drop).map_err(driver_error)
        }
    }

    /// One page inside its own browser context
    #[derive(Debug)]
    pub struct ChromiumDriver {
        page: CdpPage,
        context: BrowserContextId,
        browser: Arc<Mutex<CdpBrowser>>,
    }

    impl ChromiumDriver {
        async fn eval<T: serde::de::DeserializeOwned>(&self, body: String) -> E2eResult<T> {
            let params = EvaluateParams::builder()
                .expression(body)
                .return_by_value(true)
                .await_promise(true)
                .build()
                .map_err(driver_error)?;
            self.page
                .evaluate_expression(params)
                .await
                .map_err(driver_error)?
                .into_value()
                .map_err(driver_error)
        }
    }

    #[async_trait]
    impl BrowserDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> E2eResult<()> {
            self.page
                .goto(url)
                .await
                .map(drop)
                .map_err(|e| E2eError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
        }

        async fn locate(&self, selector: &Selector) -> E2eResult<Vec<ElementSnapshot>> {
            let script = format!(
                "(() => {{ {SNAPSHOT_SCRIPT} return {}.map(describe); }})()",
                candidates_expr(selector)?
            );
            let candidates: Vec<ElementSnapshot> = self.eval(script).await?;
            Ok(match selector {
                Selector::Css(_) => candidates,
                _ => candidates
                    .into_iter()
                    .filter(|element| selector.matches(element))
                    .collect(),
            })
        }

        async fn click(&self, selector: &Selector, element: &ElementSnapshot) -> E2eResult<()> {
            let script = format!(
                "(() => {{ const el = {}[{}]; if (!el) return false; el.click(); return true; }})()",
                candidates_expr(selector)?,
                element.index
            );
            let clicked: bool = self.eval(script).await?;
            if clicked {
                Ok(())
            } else {
                Err(E2eError::driver(format!(
                    "{selector} element #{} detached before click",
                    element.index
                )))
            }
        }

        async fn current_url(&self) -> E2eResult<String> {
            Ok(self
                .page
                .url()
                .await
                .map_err(driver_error)?
                .unwrap_or_else(|| "about:blank".to_string()))
        }

        async fn close(&self) -> E2eResult<()> {
            let closed = self.page.clone().close().await.map_err(driver_error);
            let disposed = self
                .browser
                .lock()
                .await
                .execute(DisposeBrowserContextParams::new(self.context.clone()))
                .await
                .map(drop)
                .map_err(driver_error);
            closed.and(disposed)
        }
    }
}
