use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{AppModel, Message, Task};
use crate::core::models::{BackendConfig, MessageSummary};
use crate::transport::{Result as TransportResult, Transport, TransportError};

fn msg(id: &str, subject: &str) -> MessageSummary {
    MessageSummary {
        id: id.into(),
        from: "sender@example.com".into(),
        recipient: "me@example.com".into(),
        subject: subject.into(),
        snippet: format!("snippet of {subject}"),
        is_read: 0,
        importance: 1,
        timestamp: 1_724_660_000_000,
        deadline: String::new(),
    }
}

/// In-memory backend with per-channel fixtures. `sync` flips the channel
/// lists to their post-sync versions, mirroring the real backend where a
/// resync can change what the cache read returned.
struct ScriptedTransport {
    channels: Vec<String>,
    lists: HashMap<String, Vec<MessageSummary>>,
    synced_lists: HashMap<String, Vec<MessageSummary>>,
    synced: AtomicBool,
    sync_calls: AtomicU32,
    mark_read_calls: AtomicU32,
    fail_sync: bool,
}

impl ScriptedTransport {
    fn new(channels: &[&str]) -> Self {
        ScriptedTransport {
            channels: channels.iter().map(|s| s.to_string()).collect(),
            lists: HashMap::new(),
            synced_lists: HashMap::new(),
            synced: AtomicBool::new(false),
            sync_calls: AtomicU32::new(0),
            mark_read_calls: AtomicU32::new(0),
            fail_sync: false,
        }
    }

    fn with_list(mut self, channel: &str, messages: Vec<MessageSummary>) -> Self {
        self.lists.insert(channel.into(), messages);
        self
    }

    fn with_synced_list(mut self, channel: &str, messages: Vec<MessageSummary>) -> Self {
        self.synced_lists.insert(channel.into(), messages);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_config(&self) -> TransportResult<BackendConfig> {
        Ok(BackendConfig {
            my_address: "me@example.com".into(),
            ..BackendConfig::default()
        })
    }
    async fn list_channels(&self) -> TransportResult<Vec<String>> {
        Ok(self.channels.clone())
    }
    async fn reload_channels(&self) -> TransportResult<Vec<String>> {
        Ok(self.channels.clone())
    }
    async fn messages_for_channel(&self, channel: &str) -> TransportResult<Vec<MessageSummary>> {
        if self.synced.load(Ordering::SeqCst) {
            if let Some(list) = self.synced_lists.get(channel) {
                return Ok(list.clone());
            }
        }
        Ok(self.lists.get(channel).cloned().unwrap_or_default())
    }
    async fn message_body(&self, id: &str) -> TransportResult<String> {
        Ok(format!("<p>body of {id}</p>"))
    }
    async fn sync(&self) -> TransportResult<()> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync {
            return Err(TransportError::Unavailable("gateway down".into()));
        }
        self.synced.store(true, Ordering::SeqCst);
        Ok(())
    }
    async fn sync_historical(&self, _page_token: &str) -> TransportResult<String> {
        Ok("next-page".into())
    }
    async fn search(&self, query: &str) -> TransportResult<Vec<MessageSummary>> {
        Ok(vec![msg("hit-1", query), msg("hit-2", query)])
    }
    async fn summarize(&self, id: &str) -> TransportResult<String> {
        Ok(format!("summary of {id}"))
    }
    async fn trash(&self, _id: &str) -> TransportResult<()> {
        Ok(())
    }
    async fn mark_read(&self, _id: &str) -> TransportResult<()> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    async fn set_importance(&self, _id: &str, _level: i64) -> TransportResult<()> {
        Ok(())
    }
    async fn auth_url(&self) -> TransportResult<Option<String>> {
        Ok(None)
    }
    async fn complete_auth(&self, _code: &str) -> TransportResult<()> {
        Ok(())
    }
}

fn model_with(transport: ScriptedTransport) -> (AppModel, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let mut model = AppModel::new(transport.clone());
    model.channels = transport.channels.clone();
    (model, transport)
}

/// Feed every pending task's completion back into the model, in completion
/// order, until nothing is in flight.
async fn drive_to_idle(model: &mut AppModel, tasks: Vec<Task>) {
    use futures::stream::{FuturesUnordered, StreamExt};
    let mut pending: FuturesUnordered<Task> = tasks.into_iter().collect();
    while let Some(message) = pending.next().await {
        pending.extend(model.update(message));
    }
}

fn subjects(model: &AppModel) -> Vec<&str> {
    model.messages.iter().map(|m| m.subject.as_str()).collect()
}

// -- Staleness guard scenarios --

#[tokio::test]
async fn late_result_from_previous_channel_is_discarded() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A", "B"])
            .with_list("A", vec![msg("a1", "from A")])
            .with_list("B", vec![msg("b1", "from B")]),
    );

    // Switch to A; its fetch stays in flight.
    let tasks_a = model.update(Message::SelectChannel(0));
    // Switch to B and let B's whole chain complete first.
    let tasks_b = model.update(Message::SelectChannel(1));
    drive_to_idle(&mut model, tasks_b).await;
    assert_eq!(subjects(&model), vec!["from B"]);

    // A's fetch finally resolves — it must be dropped on the floor.
    drive_to_idle(&mut model, tasks_a).await;
    assert_eq!(subjects(&model), vec!["from B"]);
    assert_eq!(model.active_channel, Some(1));
}

#[tokio::test]
async fn only_last_of_many_switches_applies_regardless_of_order() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["C1", "C2", "C3"])
            .with_list("C1", vec![msg("1", "one")])
            .with_list("C2", vec![msg("2", "two")])
            .with_list("C3", vec![msg("3", "three")]),
    );

    let t1 = model.update(Message::SelectChannel(0));
    let t2 = model.update(Message::SelectChannel(1));
    let t3 = model.update(Message::SelectChannel(2));

    // Resolve out of order: first, latest, middle.
    drive_to_idle(&mut model, t1).await;
    drive_to_idle(&mut model, t3).await;
    drive_to_idle(&mut model, t2).await;

    assert_eq!(subjects(&model), vec!["three"]);
}

#[tokio::test]
async fn fetch_under_initial_token_is_stale_after_first_switch() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "from A")]),
    );

    let initial = model.guard.current();
    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;
    assert_eq!(subjects(&model), vec!["from A"]);

    // A pre-switch straggler resolves now; it must not clobber anything.
    let stale = model.update(Message::MessagesLoaded {
        token: initial,
        result: Ok(vec![msg("ghost", "stale payload")]),
    });
    assert!(stale.is_empty());
    assert_eq!(subjects(&model), vec!["from A"]);
}

#[tokio::test]
async fn local_read_and_resync_both_apply_without_further_switch() {
    let (mut model, transport) = model_with(
        ScriptedTransport::new(&["A"])
            .with_list("A", vec![msg("a1", "cached")])
            .with_synced_list("A", vec![msg("a2", "fresh"), msg("a1", "cached")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;

    // The resync re-read replaced the initial cache read.
    assert_eq!(subjects(&model), vec!["fresh", "cached"]);
    assert_eq!(transport.sync_calls.load(Ordering::SeqCst), 1);
    assert_eq!(model.status_message, "2 messages (synced)");
}

#[tokio::test]
async fn failed_resync_keeps_the_cached_view() {
    let mut transport = ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "cached")]);
    transport.fail_sync = true;
    let (mut model, _) = model_with(transport);

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;

    assert_eq!(subjects(&model), vec!["cached"]);
    assert!(model.status_message.starts_with("Sync failed:"));
}

#[tokio::test]
async fn stale_search_results_are_discarded_after_channel_switch() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "from A")]),
    );

    let search_tasks = model.update(Message::SearchExecute("deadline".into()));
    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;

    drive_to_idle(&mut model, search_tasks).await;
    assert_eq!(subjects(&model), vec!["from A"]);
    assert!(!model.search_active);
}

#[tokio::test]
async fn load_more_is_ignored_while_search_results_are_shown() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "from A")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;
    let tasks = model.update(Message::SearchExecute("deadline".into()));
    drive_to_idle(&mut model, tasks).await;
    assert!(model.search_active);
    assert_eq!(subjects(&model), vec!["deadline", "deadline"]);

    // Pagination must not replace the search results with the channel list.
    let tasks = model.update(Message::LoadMore);
    assert!(tasks.is_empty());
    assert_eq!(subjects(&model), vec!["deadline", "deadline"]);
    assert!(model.search_active);
}

// -- Detail / action flows --

#[tokio::test]
async fn selecting_a_message_loads_body_related_and_marks_read() {
    let (mut model, transport) = model_with(
        ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "hello")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;

    let tasks = model.update(Message::SelectMessage(0));
    drive_to_idle(&mut model, tasks).await;

    assert_eq!(model.preview_body, "<p>body of a1</p>");
    assert_eq!(model.messages[0].is_read, 1);
    assert_eq!(transport.mark_read_calls.load(Ordering::SeqCst), 1);
    // Related results exclude the selected message itself; the scripted
    // search returns hit-1/hit-2, neither of which is a1.
    assert_eq!(model.related.len(), 2);
}

#[tokio::test]
async fn stale_body_is_dropped_after_channel_switch() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A", "B"])
            .with_list("A", vec![msg("a1", "from A")])
            .with_list("B", vec![msg("b1", "from B")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;
    let body_tasks = model.update(Message::SelectMessage(0));

    // Channel switch before the body arrives.
    let tasks = model.update(Message::SelectChannel(1));
    drive_to_idle(&mut model, tasks).await;

    drive_to_idle(&mut model, body_tasks).await;
    assert_eq!(model.preview_body, "");
    assert_eq!(model.selected_message, None);
}

#[tokio::test]
async fn summarize_fills_the_summary_pane() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "hello")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;
    let tasks = model.update(Message::SelectMessage(0));
    drive_to_idle(&mut model, tasks).await;

    let tasks = model.update(Message::Summarize);
    drive_to_idle(&mut model, tasks).await;
    assert_eq!(model.summary, "summary of a1");
}

#[tokio::test]
async fn trash_removes_the_message_only_after_confirmation() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A"])
            .with_list("A", vec![msg("a1", "first"), msg("a2", "second")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;

    let tasks = model.update(Message::Trash(0));
    // Still present until the backend confirms.
    assert_eq!(model.messages.len(), 2);
    drive_to_idle(&mut model, tasks).await;

    assert_eq!(subjects(&model), vec!["second"]);
    assert_eq!(model.status_message, "Moved to trash");
}

#[tokio::test]
async fn importance_override_is_applied_optimistically() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["A"]).with_list("A", vec![msg("a1", "hello")]),
    );

    let tasks = model.update(Message::SelectChannel(0));
    drive_to_idle(&mut model, tasks).await;

    let tasks = model.update(Message::SetImportance(0, 9));
    // Clamped and applied before the backend replies.
    assert_eq!(model.messages[0].importance, 5);
    drive_to_idle(&mut model, tasks).await;
    assert_eq!(model.status_message, "Importance updated");
}

// -- Startup / auth --

#[tokio::test]
async fn startup_selects_the_first_channel_when_authorized() {
    let (mut model, _) = model_with(
        ScriptedTransport::new(&["Inbox", "Work"])
            .with_list("Inbox", vec![msg("a1", "welcome")]),
    );
    model.channels.clear(); // Start discovers them

    let tasks = model.update(Message::Start);
    drive_to_idle(&mut model, tasks).await;

    assert_eq!(model.channels, vec!["Inbox", "Work"]);
    assert_eq!(model.active_channel, Some(0));
    assert_eq!(subjects(&model), vec!["welcome"]);
    assert!(model.auth_url.is_none());
    assert_eq!(
        model.backend_config.as_ref().map(|c| c.my_address.as_str()),
        Some("me@example.com")
    );
}

struct UnauthorizedTransport;

#[async_trait]
impl Transport for UnauthorizedTransport {
    async fn fetch_config(&self) -> TransportResult<BackendConfig> {
        Ok(BackendConfig::default())
    }
    async fn list_channels(&self) -> TransportResult<Vec<String>> {
        Err(TransportError::Unauthorized)
    }
    async fn reload_channels(&self) -> TransportResult<Vec<String>> {
        Ok(Vec::new())
    }
    async fn messages_for_channel(&self, _: &str) -> TransportResult<Vec<MessageSummary>> {
        Err(TransportError::Unauthorized)
    }
    async fn message_body(&self, _: &str) -> TransportResult<String> {
        Err(TransportError::Unauthorized)
    }
    async fn sync(&self) -> TransportResult<()> {
        Err(TransportError::Unauthorized)
    }
    async fn sync_historical(&self, _: &str) -> TransportResult<String> {
        Err(TransportError::Unauthorized)
    }
    async fn search(&self, _: &str) -> TransportResult<Vec<MessageSummary>> {
        Err(TransportError::Unauthorized)
    }
    async fn summarize(&self, _: &str) -> TransportResult<String> {
        Err(TransportError::Unauthorized)
    }
    async fn trash(&self, _: &str) -> TransportResult<()> {
        Err(TransportError::Unauthorized)
    }
    async fn mark_read(&self, _: &str) -> TransportResult<()> {
        Err(TransportError::Unauthorized)
    }
    async fn set_importance(&self, _: &str, _: i64) -> TransportResult<()> {
        Err(TransportError::Unauthorized)
    }
    async fn auth_url(&self) -> TransportResult<Option<String>> {
        Ok(Some("https://accounts.example.com/authorize".into()))
    }
    async fn complete_auth(&self, _: &str) -> TransportResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn startup_surfaces_the_auth_url_when_unauthorized() {
    let mut model = AppModel::new(Arc::new(UnauthorizedTransport));

    let tasks = model.update(Message::Start);
    drive_to_idle(&mut model, tasks).await;

    assert_eq!(
        model.auth_url.as_deref(),
        Some("https://accounts.example.com/authorize")
    );
    assert!(model.channels.is_empty());
    assert!(model.status_message.contains("auth"));
}
