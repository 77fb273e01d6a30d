//! Fixture Management
//!
//! Named, lazily constructed, per-test-case values with dependency injection.
//!
//! A [`FixtureRegistry`] maps fixture names to factories. Each test case gets
//! a [`TestScope`] bound to its own page; the first reference to a fixture
//! runs the factory with that page and every later reference in the same
//! case returns the same instance. Scopes never share instances.
//!
//! Teardown runs in reverse setup order, once.

use crate::page::PageHandle;
use crate::page_object::PageObject;
use crate::result::{E2eError, E2eResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn(&PageHandle) -> E2eResult<Instance> + Send + Sync>;
type Teardown = Box<dyn Fn(&Instance) -> E2eResult<()> + Send + Sync>;

/// Lifecycle of one fixture inside one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered but not referenced yet
    Registered,
    /// Constructed and available
    SetUp,
    /// Teardown has run
    TornDown,
}

struct FixtureDef {
    type_name: &'static str,
    factory: Factory,
    teardown: Option<Teardown>,
}

/// Named fixture factories shared by every case of a suite
#[derive(Clone, Default)]
pub struct FixtureRegistry {
    defs: HashMap<String, Arc<FixtureDef>>,
}

impl fmt::Debug for FixtureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureRegistry")
            .field("fixtures", &self.names())
            .finish()
    }
}

impl FixtureRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture factory. Re-registering a name replaces it.
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&PageHandle) -> E2eResult<T> + Send + Sync + 'static,
    {
        self.insert(
            name.into(),
            wrap_factory(factory),
            None::<fn(&T) -> E2eResult<()>>,
        )
    }

    /// Register a fixture factory with a teardown hook
    pub fn register_with_teardown<T, F, D>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        teardown: D,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&PageHandle) -> E2eResult<T> + Send + Sync + 'static,
        D: Fn(&T) -> E2eResult<()> + Send + Sync + 'static,
    {
        self.insert(name.into(), wrap_factory(factory), Some(teardown))
    }

    /// Register a page object fixture built around the case's page
    pub fn page_object<P: PageObject>(&mut self, name: impl Into<String>) -> &mut Self {
        self.register(name, |page: &PageHandle| Ok(P::from_page(page.clone())))
    }

    fn insert<T, D>(&mut self, name: String, factory: Factory, teardown: Option<D>) -> &mut Self
    where
        T: Send + Sync + 'static,
        D: Fn(&T) -> E2eResult<()> + Send + Sync + 'static,
    {
        let teardown = teardown.map(|hook| -> Teardown {
            Box::new(move |instance: &Instance| match instance.downcast_ref::<T>() {
                Some(value) => hook(value),
                None => Ok(()),
            })
        });
        let _ = self.defs.insert(
            name,
            Arc::new(FixtureDef {
                type_name: std::any::type_name::<T>(),
                factory,
                teardown,
            }),
        );
        self
    }

    /// Whether a fixture with this name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Registered fixture names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Open a fresh scope for one test case
    #[must_use]
    pub fn scope(&self, page: PageHandle) -> TestScope {
        TestScope {
            inner: Arc::new(ScopeInner {
                id: Uuid::new_v4(),
                page,
                defs: self.defs.clone(),
                state: Mutex::new(ScopeState::default()),
            }),
        }
    }
}

fn wrap_factory<T, F>(factory: F) -> Factory
where
    T: Send + Sync + 'static,
    F: Fn(&PageHandle) -> E2eResult<T> + Send + Sync + 'static,
{
    Box::new(move |page: &PageHandle| factory(page).map(|value| Arc::new(value) as Instance))
}

#[derive(Default)]
struct ScopeState {
    instances: HashMap<String, Instance>,
    setup_order: Vec<String>,
    released: Vec<String>,
    torn_down: bool,
}

struct ScopeInner {
    id: Uuid,
    page: PageHandle,
    defs: HashMap<String, Arc<FixtureDef>>,
    state: Mutex<ScopeState>,
}

impl ScopeInner {
    fn lock(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn teardown(&self) -> E2eResult<()> {
        let (order, mut instances) = {
            let mut state = self.lock();
            if state.torn_down {
                return Ok(());
            }
            state.torn_down = true;
            let order = std::mem::take(&mut state.setup_order);
            state.released.clone_from(&order);
            (order, std::mem::take(&mut state.instances))
        };

        let mut first_error: Option<E2eError> = None;
        for name in order.iter().rev() {
            let Some(instance) = instances.remove(name) else {
                continue;
            };
            let Some(hook) = self.defs.get(name).and_then(|def| def.teardown.as_ref()) else {
                continue;
            };
            if let Err(e) = hook(&instance) {
                tracing::warn!(
                    scope = %self.id,
                    fixture = %name,
                    error = %e,
                    "fixture teardown failed"
                );
                if first_error.is_none() {
                    first_error = Some(E2eError::Teardown {
                        fixture: name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let pending = {
            let state = self.lock();
            !state.torn_down && !state.setup_order.is_empty()
        };
        if pending {
            tracing::warn!(scope = %self.id, "scope dropped without teardown, cleaning up");
            let _ = self.teardown();
        }
    }
}

/// Fixture scope of one test case.
///
/// Clones share the same instances; the last clone dropped without an
/// explicit [`TestScope::teardown`] tears down best-effort.
#[derive(Clone)]
pub struct TestScope {
    inner: Arc<ScopeInner>,
}

impl fmt::Debug for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestScope")
            .field("id", &self.inner.id)
            .field("page", &self.inner.page.id())
            .finish()
    }
}

impl TestScope {
    /// Scope identifier, used in logs
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Page owned by this test case
    #[must_use]
    pub fn page(&self) -> &PageHandle {
        &self.inner.page
    }

    /// Get a fixture, constructing it on first reference.
    ///
    /// Unknown names, failing factories and type mismatches are
    /// [`E2eError::Setup`] errors.
    pub fn fixture<T: Send + Sync + 'static>(&self, name: &str) -> E2eResult<Arc<T>> {
        let instance = self.instance(name)?;
        let type_name = self
            .inner
            .defs
            .get(name)
            .map_or("unknown", |def| def.type_name);
        instance.downcast::<T>().map_err(|_| {
            E2eError::setup(
                name,
                format!(
                    "fixture provides {type_name}, not {}",
                    std::any::type_name::<T>()
                ),
            )
        })
    }

    /// Construct a fixture now if it has not been constructed yet
    pub fn ensure(&self, name: &str) -> E2eResult<()> {
        self.instance(name).map(drop)
    }

    /// State of a fixture in this scope
    #[must_use]
    pub fn state(&self, name: &str) -> Option<FixtureState> {
        if !self.inner.defs.contains_key(name) {
            return None;
        }
        let state = self.inner.lock();
        Some(if state.instances.contains_key(name) {
            FixtureState::SetUp
        } else if state.released.iter().any(|released| released == name) {
            FixtureState::TornDown
        } else {
            FixtureState::Registered
        })
    }

    /// Tear down every constructed fixture in reverse setup order.
    ///
    /// Every hook runs even if an earlier one fails; the first failure is
    /// returned. Later calls are no-ops.
    pub fn teardown(&self) -> E2eResult<()> {
        self.inner.teardown()
    }

    fn instance(&self, name: &str) -> E2eResult<Instance> {
        let mut state = self.inner.lock();
        if state.torn_down {
            return Err(E2eError::setup(name, "scope has already been torn down"));
        }
        if let Some(instance) = state.instances.get(name) {
            return Ok(Arc::clone(instance));
        }

        let def = self
            .inner
            .defs
            .get(name)
            .ok_or_else(|| E2eError::setup(name, "no fixture registered under this name"))?;

        tracing::debug!(scope = %self.inner.id, fixture = %name, "setting up fixture");
        let instance = (def.factory)(&self.inner.page).map_err(|e| match e {
            E2eError::Setup { .. } => e,
            other => E2eError::setup(name, other.to_string()),
        })?;

        let _ = state
            .instances
            .insert(name.to_string(), Arc::clone(&instance));
        state.setup_order.push(name.to_string());
        Ok(instance)
    }
}
