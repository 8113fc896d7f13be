//! Service registry: string keys to shared instances or factories.
//!
//! Systems obtain collaborators through the registry instead of holding
//! direct references to each other. Four registration styles exist:
//!
//! - **instance** -- a ready-made value, returned on every resolve;
//! - **singleton** -- built by a factory from declared dependencies on first
//!   resolve, then cached;
//! - **transient** -- built by a factory from declared dependencies on every
//!   resolve;
//! - **factory** -- an arbitrary closure given the whole registry, invoked on
//!   every resolve.
//!
//! Resolved values are `Rc<T>`; shared mutable services are registered as
//! `RefCell<T>` so callers get `Rc<RefCell<T>>`. The registry holds no game
//! logic.

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

/// Well-known service keys.
pub mod keys {
    /// The [`EventBus`](polarise_events::EventBus).
    pub const EVENT_BUS: &str = "event_bus";
    /// The loaded [`GameConfig`](crate::config::GameConfig).
    pub const CONFIG: &str = "config";
    /// The scene collaborator, a [`SharedScene`](crate::scene::SharedScene).
    pub const SCENE: &str = "scene";
    /// `RefCell<GameState>`.
    pub const GAME_STATE: &str = "game_state";
    /// The player agent.
    pub const PLAYER: &str = "player";
    /// The NPC flocking engine.
    pub const NPC_SYSTEM: &str = "npc_system";
    /// The police system.
    pub const POLICE: &str = "police";
    /// The input collaborator, a [`SharedInput`](crate::input::SharedInput).
    pub const INPUT: &str = "input";
}

/// Errors raised while resolving services.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No registration exists under the key.
    #[error("service not found: {key}")]
    ServiceNotFound {
        /// The requested key.
        key: String,
    },

    /// The registered value is not of the requested type.
    #[error("service {key} is not a {expected}")]
    TypeMismatch {
        /// The requested key.
        key: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// Resolving the key requires resolving itself.
    #[error("circular dependency: {}", chain.join(" -> "))]
    CircularDependency {
        /// Keys on the resolution stack, ending with the repeated key.
        chain: Vec<String>,
    },

    /// A factory asked for a key it did not declare.
    #[error("service {key} resolved undeclared dependency {dependency}")]
    UndeclaredDependency {
        /// The service being built.
        key: String,
        /// The dependency it asked for.
        dependency: String,
    },

    /// A factory returned an error.
    #[error("factory for {key} failed: {source}")]
    Factory {
        /// The service being built.
        key: String,
        /// The factory's error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

type AnyService = Rc<dyn Any>;
type DependencyFactory = Rc<dyn Fn(&Dependencies<'_>) -> anyhow::Result<AnyService>>;
type RegistryFactory = Rc<dyn Fn(&ServiceRegistry) -> anyhow::Result<AnyService>>;

enum Registration {
    Instance(AnyService),
    Singleton {
        factory: DependencyFactory,
        dependencies: Vec<String>,
        cached: Option<AnyService>,
    },
    Transient {
        factory: DependencyFactory,
        dependencies: Vec<String>,
    },
    Factory(RegistryFactory),
}

impl Registration {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Instance(_) => "instance",
            Self::Singleton { .. } => "singleton",
            Self::Transient { .. } => "transient",
            Self::Factory(_) => "factory",
        }
    }
}

/// What a resolve needs to do once the table borrow is released.
enum Plan {
    Ready(AnyService),
    Build {
        factory: DependencyFactory,
        dependencies: Vec<String>,
        cache: bool,
    },
    Call(RegistryFactory),
}

/// Restricted view of the registry handed to singleton and transient
/// factories: only declared dependencies resolve.
pub struct Dependencies<'a> {
    registry: &'a ServiceRegistry,
    key: &'a str,
    declared: &'a [String],
}

impl Dependencies<'_> {
    /// Resolve a declared dependency.
    ///
    /// # Errors
    ///
    /// [`RegistryError::UndeclaredDependency`] if `key` was not declared,
    /// otherwise whatever resolving it produces.
    pub fn get<T: Any>(&self, key: &str) -> Result<Rc<T>, RegistryError> {
        if !self.declared.iter().any(|d| d == key) {
            return Err(RegistryError::UndeclaredDependency {
                key: self.key.to_owned(),
                dependency: key.to_owned(),
            });
        }
        self.registry.resolve::<T>(key)
    }

    /// Key of the service being built.
    pub const fn key(&self) -> &str {
        self.key
    }
}

/// Key-to-service table.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RefCell<HashMap<String, Registration>>,
    resolving: RefCell<Vec<String>>,
}

impl core::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    fn insert(&self, key: &str, registration: Registration) {
        let kind = registration.kind();
        let replaced = self
            .services
            .borrow_mut()
            .insert(key.to_owned(), registration);
        if replaced.is_some() {
            warn!(key, kind, "service registration replaced");
        } else {
            debug!(key, kind, "service registered");
        }
    }

    /// Register a ready-made instance.
    pub fn register_instance<T: Any>(&self, key: &str, instance: Rc<T>) {
        self.insert(key, Registration::Instance(instance));
    }

    /// Register a singleton built from `dependencies` on first resolve.
    pub fn register_singleton<T, F>(&self, key: &str, dependencies: &[&str], factory: F)
    where
        T: Any,
        F: Fn(&Dependencies<'_>) -> anyhow::Result<T> + 'static,
    {
        self.insert(
            key,
            Registration::Singleton {
                factory: wrap_dependency_factory(factory),
                dependencies: dependencies.iter().map(|d| (*d).to_owned()).collect(),
                cached: None,
            },
        );
    }

    /// Register a service rebuilt from `dependencies` on every resolve.
    pub fn register_transient<T, F>(&self, key: &str, dependencies: &[&str], factory: F)
    where
        T: Any,
        F: Fn(&Dependencies<'_>) -> anyhow::Result<T> + 'static,
    {
        self.insert(
            key,
            Registration::Transient {
                factory: wrap_dependency_factory(factory),
                dependencies: dependencies.iter().map(|d| (*d).to_owned()).collect(),
            },
        );
    }

    /// Register a closure invoked with the registry on every resolve.
    pub fn register_factory<T, F>(&self, key: &str, factory: F)
    where
        T: Any,
        F: Fn(&Self) -> anyhow::Result<T> + 'static,
    {
        let factory: RegistryFactory =
            Rc::new(move |registry: &Self| factory(registry).map(|v| Rc::new(v) as AnyService));
        self.insert(key, Registration::Factory(factory));
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve `key` as `T`.
    ///
    /// # Errors
    ///
    /// See [`RegistryError`]; an unknown key is a wiring bug and callers
    /// should treat it as fatal.
    pub fn resolve<T: Any>(&self, key: &str) -> Result<Rc<T>, RegistryError> {
        match self.resolve_any(key)?.downcast::<T>() {
            Ok(service) => Ok(service),
            Err(_) => Err(RegistryError::TypeMismatch {
                key: key.to_owned(),
                expected: type_name::<T>(),
            }),
        }
    }

    fn resolve_any(&self, key: &str) -> Result<AnyService, RegistryError> {
        if self.resolving.borrow().iter().any(|k| k == key) {
            let mut chain = self.resolving.borrow().clone();
            chain.push(key.to_owned());
            return Err(RegistryError::CircularDependency { chain });
        }

        let plan = {
            let services = self.services.borrow();
            match services.get(key) {
                None => {
                    return Err(RegistryError::ServiceNotFound {
                        key: key.to_owned(),
                    });
                }
                Some(Registration::Instance(service)) => Plan::Ready(Rc::clone(service)),
                Some(Registration::Singleton {
                    cached: Some(service),
                    ..
                }) => Plan::Ready(Rc::clone(service)),
                Some(Registration::Singleton {
                    factory,
                    dependencies,
                    cached: None,
                }) => Plan::Build {
                    factory: Rc::clone(factory),
                    dependencies: dependencies.clone(),
                    cache: true,
                },
                Some(Registration::Transient {
                    factory,
                    dependencies,
                }) => Plan::Build {
                    factory: Rc::clone(factory),
                    dependencies: dependencies.clone(),
                    cache: false,
                },
                Some(Registration::Factory(factory)) => Plan::Call(Rc::clone(factory)),
            }
        };

        let (factory_result, cache) = match plan {
            Plan::Ready(service) => return Ok(service),
            Plan::Build {
                factory,
                dependencies,
                cache,
            } => {
                self.resolving.borrow_mut().push(key.to_owned());
                let deps = Dependencies {
                    registry: self,
                    key,
                    declared: &dependencies,
                };
                let result = factory(&deps);
                self.resolving.borrow_mut().pop();
                (result, cache)
            }
            Plan::Call(factory) => {
                self.resolving.borrow_mut().push(key.to_owned());
                let result = factory(self);
                self.resolving.borrow_mut().pop();
                (result, false)
            }
        };

        let service = factory_result.map_err(|err| factory_error(key, err))?;
        if cache {
            if let Some(Registration::Singleton { cached, .. }) =
                self.services.borrow_mut().get_mut(key)
            {
                *cached = Some(Rc::clone(&service));
            }
            debug!(key, "singleton constructed");
        }
        Ok(service)
    }

    // -----------------------------------------------------------------------
    // Management
    // -----------------------------------------------------------------------

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.services.borrow().contains_key(key)
    }

    /// Remove a registration. Returns whether one existed.
    pub fn unregister(&self, key: &str) -> bool {
        self.services.borrow_mut().remove(key).is_some()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.services.borrow().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.services.borrow_mut().clear();
    }
}

fn wrap_dependency_factory<T, F>(factory: F) -> DependencyFactory
where
    T: Any,
    F: Fn(&Dependencies<'_>) -> anyhow::Result<T> + 'static,
{
    Rc::new(move |deps: &Dependencies<'_>| factory(deps).map(|v| Rc::new(v) as AnyService))
}

/// Registry errors raised inside a factory pass through unchanged so the
/// caller sees the root cause.
fn factory_error(key: &str, err: anyhow::Error) -> RegistryError {
    match err.downcast::<RegistryError>() {
        Ok(inner) => inner,
        Err(other) => RegistryError::Factory {
            key: key.to_owned(),
            source: other.into(),
        },
    }
}
