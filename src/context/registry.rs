//! Declarative component registration.
//!
//! Components are registered by name with a factory. Factories run in
//! registration order and may only depend on components registered before
//! them, so the wiring order is exactly the order written in the
//! composition function.

use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::context::guard::ContextGuard;
use crate::context::ApplicationContext;

/// Fatal errors while assembling the application context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiringError {
    #[error("an application context is already active in this process")]
    ContextActive,

    #[error("component `{0}` is registered more than once")]
    DuplicateComponent(&'static str),

    #[error("component `{component}` requires `{dependency}`, which is not registered before it")]
    MissingDependency {
        component: &'static str,
        dependency: String,
    },

    #[error("component `{component}` expected `{dependency}` to be a {expected}")]
    TypeMismatch {
        component: &'static str,
        dependency: String,
        expected: &'static str,
    },

    #[error("component `{component}` failed to initialize: {message}")]
    Factory {
        component: &'static str,
        message: String,
    },
}

impl WiringError {
    /// Wrap an arbitrary factory failure.
    pub fn factory(component: &'static str, error: impl fmt::Display) -> Self {
        Self::Factory {
            component,
            message: error.to_string(),
        }
    }
}

/// Failed lookup of a built component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LookupError {
    Missing,
    TypeMismatch { expected: &'static str },
}

type Component = Box<dyn Any + Send + Sync>;
type Factory = Box<dyn FnOnce(&Resolver<'_>) -> Result<Component, WiringError> + Send>;

/// Built components, in registration order.
pub struct ComponentRegistry {
    entries: Vec<(&'static str, Component)>,
    index: HashMap<&'static str, usize>,
}

impl ComponentRegistry {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn push(&mut self, name: &'static str, component: Component) {
        self.index.insert(name, self.entries.len());
        self.entries.push((name, component));
    }

    pub(crate) fn get<T: Clone + 'static>(&self, name: &str) -> Result<T, LookupError> {
        let position = self.index.get(name).ok_or(LookupError::Missing)?;
        self.entries[*position]
            .1
            .downcast_ref::<T>()
            .cloned()
            .ok_or(LookupError::TypeMismatch {
                expected: type_name::<T>(),
            })
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for ComponentRegistry {
    fn drop(&mut self) {
        // Tear down in reverse so dependents go before their dependencies.
        while let Some((name, component)) = self.entries.pop() {
            drop(component);
            tracing::debug!(component = name, "Component released");
        }
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(name, _)| name)).finish()
    }
}

/// View of the components built so far, handed to each factory.
pub struct Resolver<'a> {
    registry: &'a ComponentRegistry,
    component: &'static str,
}

impl Resolver<'_> {
    /// Fetch a dependency that must already be registered.
    pub fn require<T: Clone + 'static>(&self, name: &str) -> Result<T, WiringError> {
        self.registry.get(name).map_err(|e| match e {
            LookupError::Missing => WiringError::MissingDependency {
                component: self.component,
                dependency: name.to_string(),
            },
            LookupError::TypeMismatch { expected } => WiringError::TypeMismatch {
                component: self.component,
                dependency: name.to_string(),
                expected,
            },
        })
    }

    /// Fetch a dependency if it is registered.
    pub fn optional<T: Clone + 'static>(&self, name: &str) -> Result<Option<T>, WiringError> {
        match self.require(name) {
            Ok(value) => Ok(Some(value)),
            Err(WiringError::MissingDependency { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Name of the component being built.
    pub fn component(&self) -> &'static str {
        self.component
    }
}

/// A named component factory.
pub struct Registration {
    name: &'static str,
    factory: Factory,
}

impl Registration {
    pub fn new<T, F>(name: &'static str, factory: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Resolver<'_>) -> Result<T, WiringError> + Send + 'static,
    {
        Self {
            name,
            factory: Box::new(move |resolver: &Resolver<'_>| {
                factory(resolver).map(|value| Box::new(value) as Component)
            }),
        }
    }

    /// Register an already constructed value.
    pub fn instance<T>(name: &'static str, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::new(name, move |_| Ok(value))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("name", &self.name).finish()
    }
}

/// Collects registrations and builds the [`ApplicationContext`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ContextBuilder {
    registrations: Vec<Registration>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component built by `factory`.
    pub fn register<T, F>(self, name: &'static str, factory: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Resolver<'_>) -> Result<T, WiringError> + Send + 'static,
    {
        self.add(Registration::new(name, factory))
    }

    /// Register an already constructed value.
    pub fn instance<T>(self, name: &'static str, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.add(Registration::instance(name, value))
    }

    pub fn add(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Run every factory in order and freeze the result.
    ///
    /// All-or-nothing: on the first failure every component built so far is
    /// dropped and the process slot is released.
    pub fn build(self) -> Result<ApplicationContext, WiringError> {
        let mut seen = HashSet::with_capacity(self.registrations.len());
        for registration in &self.registrations {
            if !seen.insert(registration.name) {
                return Err(WiringError::DuplicateComponent(registration.name));
            }
        }

        let guard = ContextGuard::acquire()?;
        let mut registry = ComponentRegistry::new();

        for Registration { name, factory } in self.registrations {
            let resolver = Resolver {
                registry: &registry,
                component: name,
            };
            match factory(&resolver) {
                Ok(component) => {
                    registry.push(name, component);
                    tracing::debug!(component = name, "Component wired");
                }
                Err(e) => {
                    tracing::error!(component = name, error = %e, "Component wiring failed");
                    return Err(e);
                }
            }
        }

        tracing::info!(components = registry.len(), "Application context built");
        Ok(ApplicationContext::from_parts(registry, guard))
    }
}
