use std::sync::Arc;
use std::time::Duration;

use matchroom_domain::chatroom::ChatroomService;
use matchroom_domain::matching::MatchService;
use matchroom_domain::notifications::NotificationService;
use matchroom_domain::ports::chatrooms::ChatroomStore;
use matchroom_domain::ports::exemptions::ExemptionStore;
use matchroom_domain::ports::groups::GroupStore;
use matchroom_domain::ports::invitations::InvitationStore;
use matchroom_domain::ports::notifications::NotificationSink;
use matchroom_domain::ports::users::UserStore;
use matchroom_domain::triggers::EngineTriggers;
use matchroom_infra::config::AppConfig;
use matchroom_infra::memory::MemoryStore;
use matchroom_infra::notify::{HttpNotificationSink, LogNotificationSink};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub group_store: Arc<dyn GroupStore>,
    pub user_store: Arc<dyn UserStore>,
    pub chatroom_store: Arc<dyn ChatroomStore>,
    pub exemption_store: Arc<dyn ExemptionStore>,
    pub invitation_store: Arc<dyn InvitationStore>,
    pub chatrooms: ChatroomService,
    pub triggers: EngineTriggers,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let sink: Arc<dyn NotificationSink> = if config.push_enabled {
            Arc::new(HttpNotificationSink::new(
                config.push_gateway_url.clone(),
                Duration::from_millis(config.push_timeout_ms),
            )?)
        } else {
            Arc::new(LogNotificationSink)
        };
        let store = Arc::new(MemoryStore::new(config.event_buffer));
        Ok(Self::with_store_and_sink(config, store, sink))
    }

    pub fn with_store_and_sink(
        config: AppConfig,
        store: Arc<MemoryStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let matching = MatchService::new(store.clone(), store.clone())
            .with_tx_attempts(config.tx_max_attempts);
        let chatrooms = ChatroomService::new(store.clone(), store.clone())
            .with_tx_attempts(config.tx_max_attempts);
        let notifications = NotificationService::new(sink);
        let triggers = EngineTriggers::new(matching.clone(), chatrooms.clone(), notifications);
        Self {
            config,
            group_store: store.clone(),
            user_store: store.clone(),
            chatroom_store: store.clone(),
            exemption_store: store.clone(),
            invitation_store: store.clone(),
            store,
            chatrooms,
            triggers,
        }
    }
}
