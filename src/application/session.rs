//! Current identity and its persisted token.
//!
//! The session is the client's [`TokenSource`]: every request picks up the
//! bearer token of the identity held here. Identity and persisted token are
//! updated together under the write lock, so a reader never observes one
//! without the other.
//!
//! Sign-in and sign-out bump a generation counter. Validation of a token
//! only applies its outcome when no sign-in or sign-out happened while the
//! `/auth/me` call was in flight.

use std::fmt;
use std::sync::{Arc, RwLock};

use bazaar_api_types::{AuthSession, LoginForm, RegisterForm, Role, User};
use tracing::{debug, info, warn};

use crate::client::{ClientError, TokenSource, into_data};
use crate::infra::token_store::TokenStore;
use crate::resources::AuthApi;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "application::session";

/// The signed-in user together with the token that authenticates them.
#[derive(Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub token: String,
    pub user: User,
}

impl Identity {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            token: token.into(),
            user,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct SessionState {
    identity: Option<Identity>,
    /// Bumped by every sign-in and sign-out.
    generation: u64,
}

pub struct Session {
    state: RwLock<SessionState>,
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.current())
            .field("store", &self.store)
            .finish()
    }
}

impl TokenSource for Session {
    fn bearer_token(&self) -> Option<String> {
        rw_read(&self.state, SOURCE, "bearer_token")
            .identity
            .as_ref()
            .map(|identity| identity.token.clone())
    }
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            store,
        }
    }

    pub fn current(&self) -> Option<Identity> {
        rw_read(&self.state, SOURCE, "current").identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        rw_read(&self.state, SOURCE, "is_authenticated")
            .identity
            .is_some()
    }

    pub fn role(&self) -> Option<Role> {
        rw_read(&self.state, SOURCE, "role")
            .identity
            .as_ref()
            .map(|identity| identity.role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Re-validates a persisted token, if any. An invalid or unverifiable
    /// token is discarded.
    pub async fn restore(&self, auth: &AuthApi) -> Result<Option<Identity>, ClientError> {
        let Some(token) = self.store.load()? else {
            debug!(target: SOURCE, "no persisted session token");
            return Ok(None);
        };
        self.validate(auth, token).await
    }

    /// Re-fetches the current user, preferring the in-memory token over the
    /// persisted one.
    pub async fn refresh(&self, auth: &AuthApi) -> Result<Option<Identity>, ClientError> {
        let token = match self.bearer_token() {
            Some(token) => Some(token),
            None => self.store.load()?,
        };
        match token {
            Some(token) => self.validate(auth, token).await,
            None => Ok(None),
        }
    }

    async fn validate(
        &self,
        auth: &AuthApi,
        token: String,
    ) -> Result<Option<Identity>, ClientError> {
        let started = rw_read(&self.state, SOURCE, "validate.start").generation;
        let outcome = match auth.me_with_token(&token).await {
            Ok(envelope) => into_data(envelope, "Session is no longer valid"),
            Err(err) => Err(err),
        };

        let mut state = rw_write(&self.state, SOURCE, "validate");
        let token_matches = state
            .identity
            .as_ref()
            .is_none_or(|identity| identity.token == token);
        if state.generation != started || !token_matches {
            debug!(
                target: SOURCE,
                "session changed while validating a token; keeping the newer state"
            );
            return Ok(state.identity.clone());
        }

        match outcome {
            Ok(user) => {
                let identity = Identity::new(token, user);
                state.identity = Some(identity.clone());
                debug!(target: SOURCE, user_id = %identity.user_id, "session restored");
                Ok(Some(identity))
            }
            Err(err) => {
                warn!(
                    target: SOURCE,
                    error = %err,
                    "discarding session token that failed validation"
                );
                state.identity = None;
                self.store.clear()?;
                Ok(None)
            }
        }
    }

    pub async fn login(&self, auth: &AuthApi, form: &LoginForm) -> Result<Identity, ClientError> {
        let envelope = auth.login(form).await?;
        let session = into_data(envelope, "Login failed")?;
        self.establish(session)
    }

    pub async fn register(
        &self,
        auth: &AuthApi,
        form: &RegisterForm,
    ) -> Result<Identity, ClientError> {
        let envelope = auth.register(form).await?;
        let session = into_data(envelope, "Registration failed")?;
        self.establish(session)
    }

    fn establish(&self, session: AuthSession) -> Result<Identity, ClientError> {
        let AuthSession { token, user } = session;
        let identity = Identity::new(token, user);

        let mut state = rw_write(&self.state, SOURCE, "establish");
        self.store.save(&identity.token)?;
        state.identity = Some(identity.clone());
        state.generation += 1;
        info!(
            target: SOURCE,
            user_id = %identity.user_id,
            role = identity.role.as_str(),
            "signed in"
        );
        Ok(identity)
    }

    /// Ends the session. The remote call is best effort; the local identity
    /// and persisted token are dropped regardless of its outcome.
    pub async fn logout(&self, auth: &AuthApi) -> Result<(), ClientError> {
        if let Err(err) = auth.logout().await {
            warn!(target: SOURCE, error = %err, "remote logout failed; clearing local session");
        }

        let mut state = rw_write(&self.state, SOURCE, "logout");
        state.identity = None;
        state.generation += 1;
        self.store.clear()?;
        info!(target: SOURCE, "signed out");
        Ok(())
    }

    /// Replaces the cached user after a profile change, keeping the token.
    pub fn update_user(&self, user: User) {
        let mut state = rw_write(&self.state, SOURCE, "update_user");
        if let Some(identity) = state.identity.as_mut()
            && identity.user_id == user.id
        {
            identity.role = user.role;
            identity.user = user;
        }
    }
}
