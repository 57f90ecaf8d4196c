use crate::api::{ApiClient, ClientError};

/// Where the session token lives between runs. The browser shell
/// backs this with durable storage; tests keep it in memory.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, token: &str);
    fn clear(&mut self);
}

/// In-memory store for tests and short-lived shells.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn clear(&mut self) {
        self.token = None;
    }
}

/// Couples the API client to token persistence and owns the teardown
/// rule: any failure that signals a bad token discards it.
pub struct Session<S: TokenStore> {
    api: ApiClient,
    store: S,
}

impl<S: TokenStore> Session<S> {
    /// Restores the previous session's token, if the store has one.
    pub fn new(base_url: impl Into<String>, store: S) -> Self {
        let mut api = ApiClient::new(base_url);
        api.set_token(store.load());
        Self { api, store }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.has_token()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), ClientError> {
        self.api.register(username, password).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let token = self.api.login(username, password).await?;
        self.store.save(&token);
        self.api.set_token(Some(token));
        tracing::debug!("session established");
        Ok(())
    }

    /// Client-side only: the server keeps no session state to revoke.
    pub fn logout(&mut self) {
        self.store.clear();
        self.api.set_token(None);
    }

    /// Applies the teardown rule to a failed call. Returns true when
    /// the session was torn down, in which case the shell dispatches
    /// `Action::SessionEnded` to clear the view.
    pub fn absorb_error(&mut self, error: &ClientError) -> bool {
        if error.is_auth_failure() {
            tracing::warn!(error = %error, "session rejected, discarding token");
            self.logout();
            true
        } else {
            false
        }
    }
}
