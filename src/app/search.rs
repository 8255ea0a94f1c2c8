use super::{task, AppModel, Message, Task};

impl AppModel {
    pub(super) fn handle_search(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::SearchExecute(query) => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    return Vec::new();
                }

                // Search replaces the message list, so it is a context switch
                // like any other: older in-flight fetches go stale.
                let token = self.guard.begin();

                self.search_active = true;
                self.search_query = query.clone();
                self.selected_message = None;
                self.preview_body.clear();
                self.summary.clear();
                self.related.clear();
                self.loading_body = false;
                self.status_message = "Searching...".into();

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport.search(&query).await.map_err(|e| e.to_string());
                    Message::SearchResultsLoaded { token, result }
                })]
            }

            Message::SearchResultsLoaded { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale search results");
                    return Vec::new();
                }
                match result {
                    Ok(results) => {
                        let count = results.len();
                        self.messages = results;
                        if count > 0 {
                            self.status_message = format!(
                                "Search: {} results for \"{}\"",
                                count, self.search_query
                            );
                        } else {
                            self.status_message =
                                format!("Search: no results for \"{}\"", self.search_query);
                        }
                    }
                    Err(e) => {
                        self.status_message = format!("Search failed: {e}");
                        log::error!("Search failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::SearchClear => {
                if self.search_active {
                    self.search_active = false;
                    self.search_query.clear();
                    // Restore the channel view through the normal select flow
                    // (which begins a fresh context).
                    if let Some(index) = self.active_channel {
                        return self.dispatch(Message::SelectChannel(index));
                    }
                    self.messages.clear();
                    self.status_message = "Search cleared".into();
                }
                Vec::new()
            }

            _ => Vec::new(),
        }
    }
}
