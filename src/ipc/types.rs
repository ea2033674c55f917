use crate::config::GradebookConfig;
use crate::store::GradeBook;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: GradebookConfig,
    pub gradebook: Option<GradeBook>,
    pub authenticated: bool,
}

impl AppState {
    /// Opens the configured data file. A file that cannot be loaded leaves
    /// the sidecar running without a gradebook until `gradebook.open`.
    pub fn new(config: GradebookConfig) -> Self {
        let gradebook = match GradeBook::open(&config.data_file) {
            Ok(gb) => Some(gb.with_authenticator(config.authenticator())),
            Err(e) => {
                log::error!("failed to open gradebook: {e}");
                None
            }
        };
        Self {
            authenticated: !config.require_login,
            config,
            gradebook,
        }
    }
}
