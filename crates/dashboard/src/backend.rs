use std::future::Future;

use mcphub_api::{ActionResponse, AppSummary, AuthConfig, PasswordResponse, StoredAuthConfig};
use mcphub_api_client::{ApiClient, RebuildStream, SseEvent};

use crate::actions::AppAction;
use crate::error::BackendError;

/// Everything the dashboard needs from the orchestrator.
///
/// [`ApiBackend`] is the HTTP implementation; tests script a fake one.
pub trait Backend: Send + Sync + 'static {
    type Feed: BuildFeed;

    /// `Ok(true)` while the session cookie is valid.
    fn check_session(&self) -> impl Future<Output = Result<bool, BackendError>> + Send;

    /// `Ok(false)` when the password is wrong.
    fn login(&self, password: &str) -> impl Future<Output = Result<bool, BackendError>> + Send;

    fn logout(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    fn list_apps(&self) -> impl Future<Output = Result<Vec<AppSummary>, BackendError>> + Send;

    fn run_action(
        &self,
        action: AppAction,
        app: &str,
    ) -> impl Future<Output = Result<ActionResponse, BackendError>> + Send;

    fn logs(&self, app: &str) -> impl Future<Output = Result<String, BackendError>> + Send;

    fn password(
        &self,
        app: &str,
    ) -> impl Future<Output = Result<PasswordResponse, BackendError>> + Send;

    fn reset_password(
        &self,
        app: &str,
    ) -> impl Future<Output = Result<PasswordResponse, BackendError>> + Send;

    fn auth_config(
        &self,
        app: &str,
    ) -> impl Future<Output = Result<StoredAuthConfig, BackendError>> + Send;

    fn save_auth_config(
        &self,
        app: &str,
        config: &AuthConfig,
    ) -> impl Future<Output = Result<ActionResponse, BackendError>> + Send;

    fn open_rebuild(&self, app: &str)
    -> impl Future<Output = Result<Self::Feed, BackendError>> + Send;
}

/// An open server-push connection. Dropping it closes the transport.
pub trait BuildFeed: Send + 'static {
    /// Next event in arrival order, `Ok(None)` when the server hung up.
    fn recv(&mut self) -> impl Future<Output = Result<Option<SseEvent>, BackendError>> + Send;
}

/// [`Backend`] over the real HTTP API.
#[derive(Clone)]
pub struct ApiBackend {
    client: ApiClient,
}

impl ApiBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl Backend for ApiBackend {
    type Feed = RebuildStream;

    async fn check_session(&self) -> Result<bool, BackendError> {
        Ok(self.client.auth_check().await?)
    }

    async fn login(&self, password: &str) -> Result<bool, BackendError> {
        Ok(self.client.login(password).await?.is_ok())
    }

    async fn logout(&self) -> Result<(), BackendError> {
        Ok(self.client.logout().await?)
    }

    async fn list_apps(&self) -> Result<Vec<AppSummary>, BackendError> {
        Ok(self.client.list_apps().await?)
    }

    async fn run_action(&self, action: AppAction, app: &str) -> Result<ActionResponse, BackendError> {
        let resp = match action {
            AppAction::Deploy => self.client.deploy(app).await?,
            AppAction::Stop => self.client.stop(app).await?,
            AppAction::Delete => self.client.delete(app).await?,
            AppAction::Create => self.client.create(app).await?,
        };
        Ok(resp)
    }

    async fn logs(&self, app: &str) -> Result<String, BackendError> {
        Ok(self.client.logs(app).await?)
    }

    async fn password(&self, app: &str) -> Result<PasswordResponse, BackendError> {
        Ok(self.client.password(app).await?)
    }

    async fn reset_password(&self, app: &str) -> Result<PasswordResponse, BackendError> {
        Ok(self.client.reset_password(app).await?)
    }

    async fn auth_config(&self, app: &str) -> Result<StoredAuthConfig, BackendError> {
        Ok(self.client.auth_config(app).await?.auth)
    }

    async fn save_auth_config(
        &self,
        app: &str,
        config: &AuthConfig,
    ) -> Result<ActionResponse, BackendError> {
        Ok(self.client.set_auth_config(app, config).await?)
    }

    async fn open_rebuild(&self, app: &str) -> Result<RebuildStream, BackendError> {
        Ok(self.client.rebuild(app).await?)
    }
}

impl BuildFeed for RebuildStream {
    async fn recv(&mut self) -> Result<Option<SseEvent>, BackendError> {
        Ok(self.next_event().await?)
    }
}
