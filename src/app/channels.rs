use super::{task, AppModel, Message, Task};

impl AppModel {
    pub(super) fn handle_channels(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::SelectChannel(index) => {
                let Some(name) = self.channels.get(index).cloned() else {
                    return Vec::new();
                };

                // New context: everything in flight for the previous channel
                // is stale from here on.
                let token = self.guard.begin();

                self.active_channel = Some(index);
                self.search_active = false;
                self.search_query.clear();
                self.messages.clear();
                self.selected_message = None;
                self.preview_body.clear();
                self.summary.clear();
                self.related.clear();
                self.loading_body = false;
                self.status_message = format!("Loading {name}...");

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport
                        .messages_for_channel(&name)
                        .await
                        .map_err(|e| e.to_string());
                    Message::MessagesLoaded { token, result }
                })]
            }

            // Fast local read: the backend's cache, applied immediately, then
            // a background resync under the same token.
            Message::MessagesLoaded { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale message list");
                    return Vec::new();
                }
                match result {
                    Ok(messages) => {
                        self.messages = messages;
                        self.status_message =
                            format!("{} messages (cached)", self.messages.len());

                        let transport = self.transport.clone();
                        vec![task(async move {
                            let result = transport.sync().await.map_err(|e| e.to_string());
                            Message::SyncComplete { token, result }
                        })]
                    }
                    Err(e) => {
                        self.status_message = format!("Failed to load messages: {e}");
                        log::error!("Message load failed: {e}");
                        Vec::new()
                    }
                }
            }

            Message::SyncComplete { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale sync completion");
                    return Vec::new();
                }
                match result {
                    Ok(()) => self.refetch_active_channel(token),
                    Err(e) => {
                        // The cached view stays up; only the status line
                        // reports the failed resync.
                        self.status_message = format!("Sync failed: {e}");
                        log::error!("Background sync failed: {e}");
                        Vec::new()
                    }
                }
            }

            Message::FreshMessagesLoaded { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale resync result");
                    return Vec::new();
                }
                match result {
                    Ok(messages) => {
                        let selected_id = self
                            .selected_message
                            .and_then(|i| self.messages.get(i))
                            .map(|m| m.id.clone());
                        self.messages = messages;
                        self.selected_message = selected_id
                            .and_then(|id| self.messages.iter().position(|m| m.id == id));
                        self.status_message =
                            format!("{} messages (synced)", self.messages.len());
                    }
                    Err(e) => {
                        self.status_message = format!("Refresh failed: {e}");
                        log::error!("Post-sync refresh failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::LoadMore => {
                // Pagination extends the channel view; while search results
                // are on screen the re-fetch would silently replace them, so
                // the request is ignored until the search is cleared.
                if self.active_channel.is_none() || self.search_active {
                    return Vec::new();
                }
                let token = self.guard.current();
                let page_token = self.page_token.clone();
                self.status_message = "Loading older mail...".into();

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport
                        .sync_historical(&page_token)
                        .await
                        .map_err(|e| e.to_string());
                    Message::HistoricalSynced { token, result }
                })]
            }

            Message::HistoricalSynced { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale historical sync");
                    return Vec::new();
                }
                match result {
                    Ok(next_token) => {
                        self.page_token = next_token;
                        self.refetch_active_channel(token)
                    }
                    Err(e) => {
                        self.status_message = format!("Load more failed: {e}");
                        log::error!("Historical sync failed: {e}");
                        Vec::new()
                    }
                }
            }

            _ => Vec::new(),
        }
    }

    /// Re-read the active channel's list under an already-issued token.
    fn refetch_active_channel(&mut self, token: crate::core::context::ContextToken) -> Vec<Task> {
        let Some(name) = self
            .active_channel
            .and_then(|i| self.channels.get(i))
            .cloned()
        else {
            return Vec::new();
        };
        let transport = self.transport.clone();
        vec![task(async move {
            let result = transport
                .messages_for_channel(&name)
                .await
                .map_err(|e| e.to_string());
            Message::FreshMessagesLoaded { token, result }
        })]
    }
}
