use super::{task, AppModel, Message, Task};

impl AppModel {
    pub(super) fn handle_actions(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::Trash(index) => {
                let Some(id) = self.messages.get(index).map(|m| m.id.clone()) else {
                    return Vec::new();
                };
                // Not optimistic: the message leaves the list only once the
                // backend confirms the server-side move.
                self.status_message = "Moving to trash...".into();

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport.trash(&id).await.map_err(|e| e.to_string());
                    Message::TrashComplete { id, result }
                })]
            }

            Message::TrashComplete { id, result } => {
                match result {
                    Ok(()) => {
                        let selected_id = self
                            .selected_message
                            .and_then(|i| self.messages.get(i))
                            .map(|m| m.id.clone());
                        self.messages.retain(|m| m.id != id);
                        self.selected_message = match selected_id {
                            Some(sid) if sid != id => {
                                self.messages.iter().position(|m| m.id == sid)
                            }
                            _ => None,
                        };
                        if self.selected_message.is_none() {
                            self.preview_body.clear();
                            self.summary.clear();
                            self.related.clear();
                        }
                        self.status_message = "Moved to trash".into();
                    }
                    Err(e) => {
                        self.status_message = format!("Trash failed: {e}");
                        log::error!("Trash failed for {id}: {e}");
                    }
                }
                Vec::new()
            }

            Message::MarkRead(index) => {
                let Some(msg) = self.messages.get_mut(index) else {
                    return Vec::new();
                };
                if msg.is_read != 0 {
                    return Vec::new();
                }
                // Optimistic: flip locally, let the backend catch up.
                msg.is_read = 1;
                let id = msg.id.clone();

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport.mark_read(&id).await.map_err(|e| e.to_string());
                    Message::MarkReadComplete { id, result }
                })]
            }

            Message::MarkReadComplete { id, result } => {
                if let Err(e) = result {
                    // The local flag stays; the backend will reconcile on the
                    // next sync.
                    log::warn!("Mark-read sync failed for {id}: {e}");
                }
                Vec::new()
            }

            Message::SetImportance(index, level) => {
                let level = level.clamp(1, 5);
                let Some(msg) = self.messages.get_mut(index) else {
                    return Vec::new();
                };
                // Optimistic: the human override is authoritative locally.
                msg.importance = level;
                let id = msg.id.clone();

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport
                        .set_importance(&id, level)
                        .await
                        .map_err(|e| e.to_string());
                    Message::ImportanceComplete { id, result }
                })]
            }

            Message::ImportanceComplete { id, result } => {
                match result {
                    Ok(()) => {
                        self.status_message = "Importance updated".into();
                    }
                    Err(e) => {
                        self.status_message = format!("Importance update failed: {e}");
                        log::error!("Importance update failed for {id}: {e}");
                    }
                }
                Vec::new()
            }

            _ => Vec::new(),
        }
    }
}
