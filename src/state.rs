use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use crate::auth::SessionStore;
use crate::config::{Config, FormsCredentials};
use crate::error::StartupError;
use crate::google::{
    AccessTokenSource, DisabledForms, DisabledSignIn, FormCreator, GoogleFormsClient,
    GoogleIdTokenVerifier, IdTokenVerifier,
};
use crate::notify::{EmailTemplates, LogOnlyNotifier, Notifier, SmtpNotifier};
use crate::store::{MemorySurveyStore, SqliteSurveyStore, SurveyRepository};
use crate::survey::SurveyService;

pub struct AppState {
    pub config: Config,
    pub surveys: SurveyService,
    pub sessions: SessionStore,
    pub verifier: Arc<dyn IdTokenVerifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        surveys: SurveyService,
        verifier: Arc<dyn IdTokenVerifier>,
    ) -> Arc<Self> {
        let sessions = SessionStore::new(Duration::hours(config.session_ttl_hours));
        Arc::new(Self {
            config,
            surveys,
            sessions,
            verifier,
        })
    }

    /// Wires real capabilities, falling back to disabled ones where the
    /// configuration leaves them out.
    pub fn from_config(config: Config) -> Result<Arc<Self>, StartupError> {
        let store: Arc<dyn SurveyRepository> = match &config.database_path {
            Some(path) => Arc::new(SqliteSurveyStore::open(path)?),
            None => {
                info!("DATABASE_PATH not set, keeping surveys in memory");
                Arc::new(MemorySurveyStore::new())
            }
        };

        let forms: Arc<dyn FormCreator> = match &config.forms {
            Some(credentials) => {
                let tokens = match credentials {
                    FormsCredentials::AccessToken(token) => AccessTokenSource::Static(token.clone()),
                    FormsCredentials::Refresh(refresh) => AccessTokenSource::refreshing(refresh.clone()),
                };
                let client = GoogleFormsClient::new(tokens).map_err(|e| StartupError::Component {
                    component: "Google Forms client",
                    reason: e.to_string(),
                })?;
                Arc::new(client)
            }
            None => Arc::new(DisabledForms),
        };

        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(settings) => {
                let component = |reason: String| StartupError::Component {
                    component: "SMTP notifier",
                    reason,
                };
                let templates = EmailTemplates::load().map_err(component)?;
                Arc::new(SmtpNotifier::new(settings, templates).map_err(component)?)
            }
            None => Arc::new(LogOnlyNotifier),
        };

        let verifier: Arc<dyn IdTokenVerifier> = match &config.google_client_id {
            Some(client_id) => Arc::new(GoogleIdTokenVerifier::new(client_id.clone()).map_err(
                |e| StartupError::Component {
                    component: "Google Sign-In",
                    reason: e.to_string(),
                },
            )?),
            None => Arc::new(DisabledSignIn),
        };

        let surveys = SurveyService::new(store, forms, notifier);
        Ok(Self::new(config, surveys, verifier))
    }
}
