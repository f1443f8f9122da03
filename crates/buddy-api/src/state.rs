//! Application state wiring the chat service to its concrete adapters.

use std::time::Duration;

use buddy_core::chat::ChatService;
use buddy_infra::config::{load_config, read_api_key, record_log_path, resolve_data_dir};
use buddy_infra::http::HttpChatTransport;
use buddy_infra::store::JsonlRecordStore;
use buddy_types::config::BuddyConfig;

/// The chat service pinned to the HTTP transport and JSON-lines store.
pub type ConcreteChatService = ChatService<HttpChatTransport, JsonlRecordStore>;

/// Everything a networked command needs.
pub struct AppState {
    pub chat_service: ConcreteChatService,
    pub config: BuddyConfig,
}

impl AppState {
    /// Load config, resolve the API key, and wire the service.
    ///
    /// `endpoint` overrides the configured endpoint for this run.
    pub async fn init(endpoint: Option<String>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let mut config = load_config(&data_dir).await?;
        if let Some(endpoint) = endpoint {
            config.endpoint = endpoint;
        }

        let api_key = read_api_key(&config)?;
        let transport = HttpChatTransport::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.connect_timeout_secs),
        )?;
        let store = JsonlRecordStore::new(record_log_path(&data_dir, &config));

        tracing::debug!(
            data_dir = %data_dir.display(),
            endpoint = %config.endpoint,
            records = %store.path().display(),
            "application state initialized"
        );

        Ok(Self {
            chat_service: ChatService::new(transport, store),
            config,
        })
    }
}
