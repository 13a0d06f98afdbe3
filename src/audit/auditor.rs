//! Resolution of the acting user recorded in audit fields.

use std::fmt::Debug;
use std::future::Future;

tokio::task_local! {
    static CURRENT_ACTOR: String;
}

/// Provides the identity of whoever is performing the current write.
pub trait AuditorAware: Debug + Send + Sync {
    /// `None` leaves the actor fields untouched.
    fn current_auditor(&self) -> Option<String>;
}

/// Always reports the same actor, or nobody.
#[derive(Debug, Default, Clone)]
pub struct FixedAuditor(pub Option<String>);

impl FixedAuditor {
    pub fn new(actor: impl Into<String>) -> Self {
        Self(Some(actor.into()))
    }
}

impl AuditorAware for FixedAuditor {
    fn current_auditor(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the actor bound to the running task by [`scope_actor`], falling back
/// to a configured default.
#[derive(Debug, Default, Clone)]
pub struct RequestScopedAuditor {
    fallback: Option<String>,
}

impl RequestScopedAuditor {
    pub fn new(fallback: Option<String>) -> Self {
        Self { fallback }
    }
}

impl AuditorAware for RequestScopedAuditor {
    fn current_auditor(&self) -> Option<String> {
        CURRENT_ACTOR
            .try_with(Clone::clone)
            .ok()
            .or_else(|| self.fallback.clone())
    }
}

/// Run `fut` with `actor` as the request-scoped auditor.
pub fn scope_actor<F>(actor: String, fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    CURRENT_ACTOR.scope(actor, fut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_auditor() {
        assert_eq!(FixedAuditor::new("ops").current_auditor().as_deref(), Some("ops"));
        assert_eq!(FixedAuditor::default().current_auditor(), None);
    }

    #[tokio::test]
    async fn scoped_actor_wins_over_fallback() {
        let auditor = RequestScopedAuditor::new(Some("system".into()));
        assert_eq!(auditor.current_auditor().as_deref(), Some("system"));

        let inside = scope_actor("alice".into(), async { auditor.current_auditor() }).await;
        assert_eq!(inside.as_deref(), Some("alice"));

        assert_eq!(auditor.current_auditor().as_deref(), Some("system"));
    }

    #[test]
    fn no_scope_no_fallback() {
        assert_eq!(RequestScopedAuditor::new(None).current_auditor(), None);
    }
}
