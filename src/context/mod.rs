//! Application context subsystem.
//!
//! # Data Flow
//! ```text
//! composition::compose(config, extras)
//!     → ContextBuilder (named registrations, in order)
//!     → build(): claim process slot → run factories → freeze
//!     → ApplicationContext (read-only, shared via Arc)
//!
//! On shutdown:
//!     close() → registry dropped in reverse order → slot released
//! ```
//!
//! # Design Decisions
//! - Explicit registration by name; no scanning, no reflection
//! - At most one active context per process
//! - Shape is frozen after build; lookups are lock-free

pub mod composition;
pub mod guard;
pub mod registry;

use std::fmt;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use thiserror::Error;

use crate::audit::AuditingHook;
use crate::config::AppConfig;
use crate::persistence::Persistence;

use self::guard::ContextGuard;
use self::registry::{ComponentRegistry, LookupError};

pub use composition::compose;
pub use registry::{ContextBuilder, Registration, Resolver, WiringError};

/// Names of the components every context carries.
pub mod names {
    pub const CONFIG: &str = "config";
    pub const CLOCK: &str = "clock";
    pub const AUDITOR: &str = "auditor";
    pub const AUDITING_HOOK: &str = "auditing_hook";
    pub const PERSISTENCE: &str = "persistence";
}

/// Failed lookup against a built context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("application context is closed")]
    Closed,

    #[error("no component named `{0}`")]
    Missing(String),

    #[error("component `{name}` is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

/// The process's set of wired components.
pub struct ApplicationContext {
    registry: ArcSwapOption<ComponentRegistry>,
    names: Vec<&'static str>,
    guard: Mutex<Option<ContextGuard>>,
}

impl ApplicationContext {
    /// Start collecting registrations.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub(crate) fn from_parts(registry: ComponentRegistry, guard: ContextGuard) -> Self {
        Self {
            names: registry.names(),
            registry: ArcSwapOption::from_pointee(registry),
            guard: Mutex::new(Some(guard)),
        }
    }

    /// Look up a component by name.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Result<T, ContextError> {
        let loaded = self.registry.load();
        let registry = (*loaded).as_ref().ok_or(ContextError::Closed)?;
        registry.get(name).map_err(|e| match e {
            LookupError::Missing => ContextError::Missing(name.to_string()),
            LookupError::TypeMismatch { expected } => ContextError::TypeMismatch {
                name: name.to_string(),
                expected,
            },
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|registered| *registered == name)
    }

    /// Component names in registration order.
    pub fn component_names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn config(&self) -> Result<Arc<AppConfig>, ContextError> {
        self.get(names::CONFIG)
    }

    pub fn auditing_hook(&self) -> Result<Arc<dyn AuditingHook>, ContextError> {
        self.get(names::AUDITING_HOOK)
    }

    pub fn persistence(&self) -> Result<Arc<Persistence>, ContextError> {
        self.get(names::PERSISTENCE)
    }

    pub fn is_closed(&self) -> bool {
        self.registry.load().is_none()
    }

    /// Release every component and the process slot.
    ///
    /// Returns `true` if this call closed the context; later calls are no-ops.
    pub fn close(&self) -> bool {
        let Some(registry) = self.registry.swap(None) else {
            return false;
        };
        drop(registry);

        let guard = self
            .guard
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        drop(guard);

        tracing::info!("Application context closed");
        true
    }
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("components", &self.names)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Serializes unit tests that claim the process-wide context slot.
#[cfg(test)]
pub(crate) fn serial_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Greeting(String);

    #[test]
    fn registers_and_resolves_in_order() {
        let _serial = serial_guard();

        let context = ApplicationContext::builder()
            .instance("name", Arc::new("shop".to_string()))
            .register("greeting", |r| {
                let name: Arc<String> = r.require("name")?;
                Ok(Greeting(format!("hello {}", name)))
            })
            .build()
            .unwrap();

        assert_eq!(context.component_names(), ["name", "greeting"]);
        assert_eq!(
            context.get::<Greeting>("greeting").unwrap(),
            Greeting("hello shop".into())
        );
        assert!(context.contains("name"));
        assert!(!context.contains("missing"));
    }

    #[test]
    fn dependency_must_come_first() {
        let _serial = serial_guard();

        let err = ApplicationContext::builder()
            .register("greeting", |r| {
                let name: Arc<String> = r.require("name")?;
                Ok(Greeting(name.to_string()))
            })
            .instance("name", Arc::new("shop".to_string()))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            WiringError::MissingDependency {
                component: "greeting",
                dependency: "name".into()
            }
        );
        assert!(!ContextGuard::is_held());
    }

    #[test]
    fn duplicate_names_rejected() {
        let _serial = serial_guard();

        let err = ApplicationContext::builder()
            .instance("a", 1u32)
            .instance("a", 2u32)
            .build()
            .unwrap_err();

        assert_eq!(err, WiringError::DuplicateComponent("a"));
    }

    #[test]
    fn wrong_type_is_reported() {
        let _serial = serial_guard();

        let err = ApplicationContext::builder()
            .instance("port", 8080u16)
            .register("server", |r| r.require::<String>("port"))
            .build()
            .unwrap_err();
        assert!(matches!(err, WiringError::TypeMismatch { component: "server", .. }));

        let context = ApplicationContext::builder()
            .instance("port", 8080u16)
            .build()
            .unwrap();
        assert!(matches!(
            context.get::<u32>("port"),
            Err(ContextError::TypeMismatch { .. })
        ));
        assert_eq!(
            context.get::<u16>("nope"),
            Err(ContextError::Missing("nope".into()))
        );
    }

    #[test]
    fn factory_failure_releases_everything() {
        let _serial = serial_guard();

        let built = Arc::new(());
        let probe = Arc::clone(&built);

        let err = ApplicationContext::builder()
            .instance("probe", probe)
            .register::<u8, _>("broken", |_| Err(WiringError::factory("broken", "boom")))
            .build()
            .unwrap_err();

        assert!(matches!(err, WiringError::Factory { component: "broken", .. }));
        assert_eq!(Arc::strong_count(&built), 1);
        assert!(!ContextGuard::is_held());
    }

    #[test]
    fn optional_dependency() {
        let _serial = serial_guard();

        let context = ApplicationContext::builder()
            .register("maybe", |r| r.optional::<u8>("absent"))
            .build()
            .unwrap();
        assert_eq!(context.get::<Option<u8>>("maybe").unwrap(), None);
    }

    #[test]
    fn only_one_active_context() {
        let _serial = serial_guard();

        let first = ApplicationContext::builder().build().unwrap();
        let second = ApplicationContext::builder().build();
        assert_eq!(second.unwrap_err(), WiringError::ContextActive);

        assert!(first.close());
        let third = ApplicationContext::builder().build().unwrap();
        third.close();
    }

    #[test]
    fn close_is_idempotent() {
        let _serial = serial_guard();

        let context = ApplicationContext::builder()
            .instance("n", 1u8)
            .build()
            .unwrap();

        assert!(context.close());
        assert!(!context.close());
        assert!(context.is_closed());
        assert_eq!(context.get::<u8>("n"), Err(ContextError::Closed));
        assert!(!ContextGuard::is_held());
    }

    #[test]
    fn dropping_context_releases_slot() {
        let _serial = serial_guard();

        {
            let _context = ApplicationContext::builder().build().unwrap();
            assert!(ContextGuard::is_held());
        }
        assert!(!ContextGuard::is_held());
    }
}
