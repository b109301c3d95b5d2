use server_api::ApiContext;
use shared::protocol::ConnectorConfig;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiContext,
    pub connector: ConnectorConfig,
}
