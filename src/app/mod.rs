mod actions;
mod auth;
mod body;
mod channels;
mod search;

use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::Future;
use tokio::sync::mpsc;

use crate::core::context::{ContextGuard, ContextToken};
use crate::core::models::{BackendConfig, MessageSummary};
use crate::transport::Transport;

/// A unit of background work; resolves to the message that reports its
/// outcome. All tasks are driven on the single controller task, so state is
/// only ever touched from `update`.
pub type Task = Pin<Box<dyn Future<Output = Message> + Send + 'static>>;

pub(super) fn task(fut: impl Future<Output = Message> + Send + 'static) -> Task {
    Box::pin(fut)
}

#[derive(Debug)]
pub enum Message {
    /// Kick off the startup sequence (config, channels, auth check).
    Start,

    // Startup / auth
    ConfigLoaded(Result<BackendConfig, String>),
    ChannelsLoaded(Result<Vec<String>, String>),
    AuthChecked(Result<Option<String>, String>),
    CompleteAuth(String),
    AuthCompleted(Result<(), String>),
    ReloadChannels,
    ChannelsReloaded(Result<Vec<String>, String>),

    // Channel flow — completions carry the token captured at issuance
    SelectChannel(usize),
    MessagesLoaded {
        token: ContextToken,
        result: Result<Vec<MessageSummary>, String>,
    },
    SyncComplete {
        token: ContextToken,
        result: Result<(), String>,
    },
    FreshMessagesLoaded {
        token: ContextToken,
        result: Result<Vec<MessageSummary>, String>,
    },
    LoadMore,
    HistoricalSynced {
        token: ContextToken,
        result: Result<String, String>,
    },

    // Message detail
    SelectMessage(usize),
    BodyLoaded {
        token: ContextToken,
        result: Result<String, String>,
    },
    RelatedLoaded {
        token: ContextToken,
        result: Result<Vec<MessageSummary>, String>,
    },
    Summarize,
    SummaryLoaded {
        token: ContextToken,
        result: Result<String, String>,
    },
    OpenExternal(String),

    // Search
    SearchExecute(String),
    SearchResultsLoaded {
        token: ContextToken,
        result: Result<Vec<MessageSummary>, String>,
    },
    SearchClear,

    // Flag / trash / importance actions
    Trash(usize),
    TrashComplete {
        id: String,
        result: Result<(), String>,
    },
    MarkRead(usize),
    MarkReadComplete {
        id: String,
        result: Result<(), String>,
    },
    SetImportance(usize, i64),
    ImportanceComplete {
        id: String,
        result: Result<(), String>,
    },

    Quit,
    Noop,
}

pub struct AppModel {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) guard: ContextGuard,

    pub backend_config: Option<BackendConfig>,
    pub channels: Vec<String>,
    pub active_channel: Option<usize>,

    pub messages: Vec<MessageSummary>,
    pub selected_message: Option<usize>,

    pub preview_body: String,
    pub summary: String,
    pub related: Vec<MessageSummary>,
    pub(super) loading_body: bool,

    /// Page token for historical sync ("" = start from the newest mail).
    pub(super) page_token: String,

    pub search_active: bool,
    pub search_query: String,

    /// Set when the backend still needs the user to authorize it.
    pub auth_url: Option<String>,

    pub status_message: String,
    pub should_quit: bool,
}

impl AppModel {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        AppModel {
            transport,
            guard: ContextGuard::new(),
            backend_config: None,
            channels: Vec::new(),
            active_channel: None,
            messages: Vec::new(),
            selected_message: None,
            preview_body: String::new(),
            summary: String::new(),
            related: Vec::new(),
            loading_body: false,
            page_token: String::new(),
            search_active: false,
            search_query: String::new(),
            auth_url: None,
            status_message: "Starting up...".into(),
            should_quit: false,
        }
    }

    pub fn update(&mut self, message: Message) -> Vec<Task> {
        match message {
            // Startup / auth
            Message::Start
            | Message::ConfigLoaded(_)
            | Message::ChannelsLoaded(_)
            | Message::AuthChecked(_)
            | Message::CompleteAuth(_)
            | Message::AuthCompleted(_)
            | Message::ReloadChannels
            | Message::ChannelsReloaded(_) => self.handle_auth(message),

            // Channel selection / sync
            Message::SelectChannel(_)
            | Message::MessagesLoaded { .. }
            | Message::SyncComplete { .. }
            | Message::FreshMessagesLoaded { .. }
            | Message::LoadMore
            | Message::HistoricalSynced { .. } => self.handle_channels(message),

            // Message detail
            Message::SelectMessage(_)
            | Message::BodyLoaded { .. }
            | Message::RelatedLoaded { .. }
            | Message::Summarize
            | Message::SummaryLoaded { .. }
            | Message::OpenExternal(_) => self.handle_body(message),

            // Search
            Message::SearchExecute(_)
            | Message::SearchResultsLoaded { .. }
            | Message::SearchClear => self.handle_search(message),

            // Actions
            Message::Trash(_)
            | Message::TrashComplete { .. }
            | Message::MarkRead(_)
            | Message::MarkReadComplete { .. }
            | Message::SetImportance(_, _)
            | Message::ImportanceComplete { .. } => self.handle_actions(message),

            Message::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            Message::Noop => Vec::new(),
        }
    }

    /// Dispatch a message through the update loop (for recursive calls from
    /// handlers).
    pub(super) fn dispatch(&mut self, message: Message) -> Vec<Task> {
        self.update(message)
    }

    /// Select the first channel if none is active yet.
    pub(super) fn select_first_if_idle(&mut self) -> Vec<Task> {
        if self.active_channel.is_none() && !self.channels.is_empty() {
            return self.dispatch(Message::SelectChannel(0));
        }
        Vec::new()
    }
}

/// Drive the controller until `Quit` or until both the input channel and all
/// in-flight tasks are exhausted.
///
/// Everything runs on the one calling task: context-switch token increments
/// and staleness checks are totally ordered, and in-flight fetches are never
/// aborted — their results are simply dropped once stale.
pub async fn run<F>(
    mut model: AppModel,
    mut input: mpsc::UnboundedReceiver<Message>,
    mut render: F,
) -> AppModel
where
    F: FnMut(&AppModel),
{
    let mut pending: FuturesUnordered<Task> = FuturesUnordered::new();
    pending.extend(model.update(Message::Start));
    render(&model);

    loop {
        let message = tokio::select! {
            Some(msg) = input.recv() => msg,
            Some(msg) = pending.next() => msg,
            else => break,
        };
        pending.extend(model.update(message));
        render(&model);
        if model.should_quit {
            break;
        }
    }
    model
}

#[cfg(test)]
mod tests;
