use super::{task, AppModel, Message, Task};

impl AppModel {
    pub(super) fn handle_body(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::SelectMessage(index) => {
                if self.loading_body {
                    return Vec::new();
                }
                let Some(msg) = self.messages.get_mut(index) else {
                    return Vec::new();
                };

                let id = msg.id.clone();
                // Seed the related pane with whatever text we have on hand;
                // the full body has not arrived yet.
                let seed = if msg.snippet.is_empty() {
                    msg.subject.clone()
                } else {
                    msg.snippet.clone()
                };
                let was_unread = msg.is_read == 0;
                msg.is_read = 1;

                self.selected_message = Some(index);
                self.preview_body.clear();
                self.summary.clear();
                self.related.clear();
                self.loading_body = true;
                self.status_message = "Loading message...".into();

                // Detail fetches extend the active channel context; a channel
                // switch while they are in flight drops their results.
                let token = self.guard.current();
                let mut tasks = Vec::new();

                let transport = self.transport.clone();
                let body_id = id.clone();
                tasks.push(task(async move {
                    let result = transport
                        .message_body(&body_id)
                        .await
                        .map_err(|e| e.to_string());
                    Message::BodyLoaded { token, result }
                }));

                if !seed.is_empty() {
                    let transport = self.transport.clone();
                    tasks.push(task(async move {
                        let result = transport.search(&seed).await.map_err(|e| e.to_string());
                        Message::RelatedLoaded { token, result }
                    }));
                }

                if was_unread {
                    let transport = self.transport.clone();
                    tasks.push(task(async move {
                        let result = transport.mark_read(&id).await.map_err(|e| e.to_string());
                        Message::MarkReadComplete { id, result }
                    }));
                }

                tasks
            }

            Message::BodyLoaded { token, result } => {
                self.loading_body = false;
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale message body");
                    return Vec::new();
                }
                match result {
                    Ok(body) => {
                        self.preview_body = body;
                        self.status_message = "Message loaded".into();
                    }
                    Err(e) => {
                        self.status_message = format!("Failed to load message: {e}");
                        log::error!("Body fetch failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::RelatedLoaded { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale related results");
                    return Vec::new();
                }
                match result {
                    Ok(results) => {
                        let selected_id = self
                            .selected_message
                            .and_then(|i| self.messages.get(i))
                            .map(|m| m.id.clone());
                        self.related = results
                            .into_iter()
                            .filter(|m| Some(&m.id) != selected_id.as_ref())
                            .collect();
                    }
                    Err(e) => {
                        // The related pane is advisory; fail quietly.
                        log::warn!("Related search failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::Summarize => {
                let Some(id) = self
                    .selected_message
                    .and_then(|i| self.messages.get(i))
                    .map(|m| m.id.clone())
                else {
                    return Vec::new();
                };
                self.status_message = "Summarizing...".into();

                let token = self.guard.current();
                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport.summarize(&id).await.map_err(|e| e.to_string());
                    Message::SummaryLoaded { token, result }
                })]
            }

            Message::SummaryLoaded { token, result } => {
                if !self.guard.is_current(token) {
                    log::debug!("Dropping stale summary");
                    return Vec::new();
                }
                match result {
                    Ok(summary) => {
                        self.summary = summary;
                        self.status_message = "Summary ready".into();
                    }
                    Err(e) => {
                        self.status_message = format!("Summarize failed: {e}");
                        log::error!("Summarize failed: {e}");
                    }
                }
                Vec::new()
            }

            Message::OpenExternal(raw) => {
                match url::Url::parse(&raw) {
                    Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                        if let Err(e) = open::that(parsed.as_str()) {
                            log::warn!("Could not open {raw}: {e}");
                        }
                    }
                    Ok(parsed) => {
                        log::warn!("Refusing to open non-http URL: {parsed}");
                    }
                    Err(e) => {
                        log::warn!("Not a URL ({raw}): {e}");
                    }
                }
                Vec::new()
            }

            _ => Vec::new(),
        }
    }
}
