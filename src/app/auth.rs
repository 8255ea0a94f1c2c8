use crate::transport::channels_with_retry;

use super::{task, AppModel, Message, Task};

impl AppModel {
    pub(super) fn handle_auth(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::Start => {
                self.status_message = "Connecting to backend...".into();
                let mut tasks = Vec::new();

                let transport = self.transport.clone();
                tasks.push(task(async move {
                    let result = transport.fetch_config().await.map_err(|e| e.to_string());
                    Message::ConfigLoaded(result)
                }));

                // The channel list is the first thing the backend may not
                // have ready; the retry helper soft-fails to an empty list.
                let transport = self.transport.clone();
                tasks.push(task(async move {
                    let result = channels_with_retry(transport.as_ref())
                        .await
                        .map_err(|e| e.to_string());
                    Message::ChannelsLoaded(result)
                }));

                tasks
            }

            Message::ConfigLoaded(Ok(config)) => {
                log::info!("Backend config loaded ({})", config.my_address);
                self.backend_config = Some(config);
                Vec::new()
            }
            Message::ConfigLoaded(Err(e)) => {
                log::warn!("Backend config unavailable: {e}");
                Vec::new()
            }

            Message::ChannelsLoaded(result) => {
                match result {
                    Ok(channels) => {
                        self.channels = channels;
                        self.status_message = format!("{} channels", self.channels.len());
                    }
                    Err(e) => {
                        self.status_message = format!("Backend unavailable: {e}");
                        log::error!("Channel list failed: {e}");
                    }
                }
                // Either way, find out whether the backend is authorized; an
                // unauthenticated backend serves no channels.
                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport.auth_url().await.map_err(|e| e.to_string());
                    Message::AuthChecked(result)
                })]
            }

            Message::AuthChecked(Ok(Some(url))) => {
                self.auth_url = Some(url);
                self.status_message =
                    "Authorization required — open the auth URL, then run: auth <code>".into();
                Vec::new()
            }
            Message::AuthChecked(Ok(None)) => {
                self.auth_url = None;
                self.dispatch(Message::ReloadChannels)
            }
            Message::AuthChecked(Err(e)) => {
                self.status_message = format!("Auth check failed: {e}");
                log::error!("Auth check failed: {e}");
                Vec::new()
            }

            Message::CompleteAuth(code) => {
                let code = code.trim().to_string();
                if code.is_empty() {
                    self.status_message = "Auth code is empty".into();
                    return Vec::new();
                }
                self.status_message = "Completing authorization...".into();

                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport
                        .complete_auth(&code)
                        .await
                        .map_err(|e| e.to_string());
                    Message::AuthCompleted(result)
                })]
            }

            Message::AuthCompleted(Ok(())) => {
                self.auth_url = None;
                self.status_message = "Authorized".into();
                log::info!("Backend authorization completed");
                self.dispatch(Message::ReloadChannels)
            }
            Message::AuthCompleted(Err(e)) => {
                self.status_message = format!("Authorization failed: {e}");
                log::error!("Authorization failed: {e}");
                Vec::new()
            }

            Message::ReloadChannels => {
                let transport = self.transport.clone();
                vec![task(async move {
                    let result = transport
                        .reload_channels()
                        .await
                        .map_err(|e| e.to_string());
                    Message::ChannelsReloaded(result)
                })]
            }

            Message::ChannelsReloaded(result) => {
                match result {
                    Ok(channels) if !channels.is_empty() => {
                        self.channels = channels;
                        self.status_message = format!("{} channels", self.channels.len());
                    }
                    Ok(_) => {
                        // The empty-list fallback: keep whatever tab bar we
                        // already have.
                        log::warn!("Channel reload returned nothing; keeping current list");
                    }
                    Err(e) => {
                        log::warn!("Channel reload failed: {e}");
                    }
                }
                self.select_first_if_idle()
            }

            _ => Vec::new(),
        }
    }
}
