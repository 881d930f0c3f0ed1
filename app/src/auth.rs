use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiResult, TokenPair, User};
use crate::io::session_store::{
    ACCESS_TOKEN_KEY, MemoryStore, REFRESH_TOKEN_KEY, SessionStore, USER_KEY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshing,
}

/// Tokens handed back by the refresh endpoint. `refresh` is set when the backend rotates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access: String,
    pub refresh: Option<String>,
}

type PendingRefresh = Shared<BoxFuture<'static, ApiResult<String>>>;

struct Inner {
    store: Arc<dyn SessionStore>,
    // Bumped by every login, logout and expiry. A refresh started under an
    // older generation never writes to the store.
    generation: Mutex<u64>,
    refresh: Mutex<Option<PendingRefresh>>,
}

/// Sole owner of the persisted session. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                generation: Mutex::new(0),
                refresh: Mutex::new(None),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn state(&self) -> SessionState {
        if self.refresh_slot().is_some() {
            SessionState::Refreshing
        } else if self.access_token().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Always the latest stored value; never cache it across calls.
    pub fn access_token(&self) -> Option<String> {
        self.inner.store.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.store.get(REFRESH_TOKEN_KEY)
    }

    pub fn current_user(&self) -> Option<User> {
        let raw = self.inner.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring unreadable cached user: {}", e);
                None
            }
        }
    }

    pub(crate) fn establish(&self, tokens: &TokenPair) -> ApiResult<()> {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.inner.store.update(
            &[(ACCESS_TOKEN_KEY, tokens.access.as_str()), (REFRESH_TOKEN_KEY, tokens.refresh.as_str())],
            &[USER_KEY],
        )?;
        info!("Session established");
        Ok(())
    }

    pub(crate) fn cache_user(&self, user: &User) -> ApiResult<()> {
        let raw = serde_json::to_string(user).map_err(|e| ApiError::ParseError(e.to_string()))?;
        self.inner.store.set(USER_KEY, &raw)?;
        Ok(())
    }

    /// Drops every stored session key. Never fails; store errors are only logged.
    pub fn logout(&self) {
        let mut generation = self.lock_generation();
        *generation += 1;
        self.wipe();
        info!("Session cleared");
    }

    /// Single-flight recovery after `rejected` was refused with 401.
    ///
    /// Joins the refresh already in flight if there is one; returns the current
    /// token if a refresh already replaced `rejected`; otherwise starts exactly one
    /// refresh via `refresher`, which receives the stored refresh token and must
    /// report a rejected refresh token as [`ApiError::SessionExpired`].
    pub(crate) async fn refresh_after_rejection<F, Fut>(
        &self,
        rejected: &str,
        refresher: F,
    ) -> ApiResult<String>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<RefreshedTokens>> + Send + 'static,
    {
        let pending = {
            let mut slot = self.refresh_slot();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining in-flight session refresh");
                    pending.clone()
                }
                None => {
                    match self.access_token() {
                        Some(current) if current != rejected => return Ok(current),
                        Some(_) => {}
                        None => return Err(ApiError::SessionExpired),
                    }

                    let generation = *self.lock_generation();
                    let Some(refresh_token) = self.refresh_token() else {
                        warn!("No refresh token stored, ending session");
                        self.expire(generation);
                        return Err(ApiError::SessionExpired);
                    };

                    info!("Access token rejected, refreshing session");
                    let pending = self.spawn_refresh(generation, refresher(refresh_token));
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    // Runs in its own task so an abandoned caller cannot leave the session half-updated.
    fn spawn_refresh<Fut>(&self, generation: u64, request: Fut) -> PendingRefresh
    where
        Fut: Future<Output = ApiResult<RefreshedTokens>> + Send + 'static,
    {
        let manager = self.clone();
        let task = tokio::spawn(async move {
            let outcome = request.await;
            let resolved = manager.apply_refresh(generation, outcome);
            manager.refresh_slot().take();
            resolved
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(ApiError::NetworkError(format!("session refresh task failed: {}", e)))
            })
        }
        .boxed()
        .shared()
    }

    fn apply_refresh(&self, started: u64, outcome: ApiResult<RefreshedTokens>) -> ApiResult<String> {
        let mut generation = self.lock_generation();
        if *generation != started {
            debug!("Session changed while refreshing, discarding refresh result");
            return self.access_token().ok_or(ApiError::SessionExpired);
        }

        match outcome {
            Ok(tokens) => {
                match &tokens.refresh {
                    Some(refresh) => self.inner.store.update(
                        &[(ACCESS_TOKEN_KEY, tokens.access.as_str()), (REFRESH_TOKEN_KEY, refresh.as_str())],
                        &[],
                    )?,
                    None => self.inner.store.set(ACCESS_TOKEN_KEY, &tokens.access)?,
                }
                info!("Access token refreshed");
                Ok(tokens.access)
            }
            Err(ApiError::SessionExpired) => {
                *generation += 1;
                self.wipe();
                warn!("Refresh token rejected, session cleared");
                Err(ApiError::SessionExpired)
            }
            Err(other) => {
                warn!("Session refresh failed, keeping session: {}", other);
                Err(other)
            }
        }
    }

    fn expire(&self, started: u64) {
        let mut generation = self.lock_generation();
        if *generation == started {
            *generation += 1;
            self.wipe();
        }
    }

    fn wipe(&self) {
        let keys = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];
        if let Err(e) = self.inner.store.update(&[], &keys) {
            warn!("Failed to clear session store: {}", e);
        }
    }

    fn lock_generation(&self) -> MutexGuard<'_, u64> {
        self.inner.generation.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refresh_slot(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.inner.refresh.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        }
    }

    fn counting_refresher(
        calls: Arc<AtomicUsize>,
        outcome: ApiResult<RefreshedTokens>,
    ) -> impl FnOnce(String) -> BoxFuture<'static, ApiResult<RefreshedTokens>> {
        move |_refresh_token| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                outcome
            }
            .boxed()
        }
    }

    fn fresh(access: &str) -> ApiResult<RefreshedTokens> {
        Ok(RefreshedTokens {
            access: access.to_string(),
            refresh: None,
        })
    }

    #[test]
    fn test_establish_and_logout_transitions() {
        let session = SessionManager::in_memory();
        assert_eq!(session.state(), SessionState::Anonymous);

        session.establish(&pair("a1", "r1")).unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.access_token().as_deref(), Some("a1"));

        session.logout();
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.access_token(), None);
        assert_eq!(session.refresh_token(), None);
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_cached_user_round_trips_through_store() {
        let session = SessionManager::in_memory();
        session.establish(&pair("a1", "r1")).unwrap();
        let user = User {
            id: 7,
            username: "ana".to_string(),
            email: "ana@devlab.edu".to_string(),
            name: "Ana".to_string(),
            role: Role::Coordinator,
        };
        session.cache_user(&user).unwrap();

        assert_eq!(session.current_user(), Some(user));
    }

    #[test]
    fn test_restores_session_from_existing_store() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "persisted").unwrap();
        store.set(REFRESH_TOKEN_KEY, "persisted-refresh").unwrap();

        let session = SessionManager::new(store);
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_concurrent_rejections_share_one_refresh() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "r1")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            session.refresh_after_rejection("stale", counting_refresher(calls.clone(), fresh("new"))),
            session.refresh_after_rejection("stale", counting_refresher(calls.clone(), fresh("other"))),
            session.refresh_after_rejection("stale", counting_refresher(calls.clone(), fresh("other"))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "new");
        assert_eq!(b.unwrap(), "new");
        assert_eq!(c.unwrap(), "new");
        assert_eq!(session.access_token().as_deref(), Some("new"));
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_rejection_after_completed_refresh_reuses_new_token() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "r1")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = session
            .refresh_after_rejection("stale", counting_refresher(calls.clone(), fresh("new")))
            .await;
        let late = session
            .refresh_after_rejection("stale", counting_refresher(calls.clone(), fresh("newer")))
            .await;

        assert_eq!(first.unwrap(), "new");
        assert_eq!(late.unwrap(), "new");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_expires_every_waiter() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "revoked")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            session.refresh_after_rejection(
                "stale",
                counting_refresher(calls.clone(), Err(ApiError::SessionExpired))
            ),
            session.refresh_after_rejection(
                "stale",
                counting_refresher(calls.clone(), Err(ApiError::SessionExpired))
            ),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, Err(ApiError::SessionExpired));
        assert_eq!(b, Err(ApiError::SessionExpired));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert_eq!(session.refresh_token(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_session() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "r1")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = session
            .refresh_after_rejection(
                "stale",
                counting_refresher(calls, Err(ApiError::NetworkError("connection refused".into()))),
            )
            .await;

        assert!(matches!(result, Err(ApiError::NetworkError(_))));
        assert_eq!(session.access_token().as_deref(), Some("stale"));
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_replaces_stored_one() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "r1")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let rotated = Ok(RefreshedTokens {
            access: "new".to_string(),
            refresh: Some("r2".to_string()),
        });

        let result = session
            .refresh_after_rejection("stale", counting_refresher(calls.clone(), rotated))
            .await;

        assert_eq!(result.unwrap(), "new");
        assert_eq!(session.access_token().as_deref(), Some("new"));
        assert_eq!(session.refresh_token().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_unrotated_refresh_keeps_refresh_token() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "r1")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        session
            .refresh_after_rejection("stale", counting_refresher(calls, fresh("new")))
            .await
            .unwrap();

        assert_eq!(session.refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_session() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        store.set(ACCESS_TOKEN_KEY, "stale").unwrap();
        let session = SessionManager::new(store);
        let calls = Arc::new(AtomicUsize::new(0));

        let result = session
            .refresh_after_rejection("stale", counting_refresher(calls.clone(), fresh("new")))
            .await;

        assert_eq!(result, Err(ApiError::SessionExpired));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_during_refresh_discards_result() {
        let session = SessionManager::in_memory();
        session.establish(&pair("stale", "r1")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let refresh = session.refresh_after_rejection("stale", counting_refresher(calls, fresh("new")));
        let logout = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(session.state(), SessionState::Refreshing);
            session.logout();
        };
        let (result, ()) = tokio::join!(refresh, logout);

        assert_eq!(result, Err(ApiError::SessionExpired));
        assert_eq!(session.access_token(), None);
        assert_eq!(session.state(), SessionState::Anonymous);
    }
}
