//! The todo list controller shared by frontends.
//!
//! `TodoApp` pairs a [`TodoClient`] with a [`TodoState`] and a frontend's
//! [`Transport`]. Every mutation goes to the server first and only touches
//! local state once the server has answered, except `reorder`, which updates
//! local state immediately and keeps that change even if persisting it fails.

use std::thread;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::state::TodoState;
use crate::types::{CreateItem, Health, Item, ReorderItems, UpdateItem};

/// Upper bound on delete requests in flight during `clear_completed`.
pub const MAX_PARALLEL_DELETES: usize = 8;

pub struct TodoApp<T> {
    client: TodoClient,
    transport: T,
    state: TodoState,
}

impl<T: Transport> TodoApp<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            state: TodoState::new(),
        }
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TodoState {
        &mut self.state
    }

    /// Fetch the full list. Failure is logged and leaves the list empty.
    pub fn load(&mut self) {
        let result = self.fetch_all();
        self.state.finish_loading(result);
    }

    fn fetch_all(&self) -> Result<Vec<Item>, ApiError> {
        let response = self.transport.execute(self.client.build_list_items())?;
        self.client.parse_list_items(response)
    }

    /// Create a todo from `text`. Blank input is ignored without a request.
    pub fn add(&mut self, text: &str) -> Result<Option<&Item>, ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let request = self.client.build_create_item(&CreateItem {
            text: text.to_string(),
        })?;
        let created = self.client.parse_create_item(self.transport.execute(request)?)?;
        self.state.insert_created(created);
        Ok(self.state.items().first())
    }

    pub fn toggle(&mut self, id: &str, completed: bool) -> Result<(), ApiError> {
        self.update(
            id,
            UpdateItem {
                completed: Some(completed),
                ..UpdateItem::default()
            },
        )
    }

    /// Replace an item's text. An edit that trims to nothing keeps the
    /// current text.
    pub fn edit(&mut self, id: &str, text: &str) -> Result<(), ApiError> {
        let text = match text.trim() {
            "" => match self.state.items().iter().find(|item| item.id == id) {
                Some(item) => item.text.clone(),
                None => return Err(ApiError::NotFound),
            },
            trimmed => trimmed.to_string(),
        };
        self.update(
            id,
            UpdateItem {
                text: Some(text),
                ..UpdateItem::default()
            },
        )
    }

    fn update(&mut self, id: &str, changes: UpdateItem) -> Result<(), ApiError> {
        let request = self.client.build_update_item(id, &changes)?;
        let updated = self.client.parse_update_item(self.transport.execute(request)?)?;
        self.state.replace(updated);
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_item(id))?;
        self.client.parse_delete_item(response)?;
        self.state.remove(id);
        Ok(())
    }

    /// Delete every completed item, one request each, at most
    /// [`MAX_PARALLEL_DELETES`] in flight at once. Local state changes only
    /// if every delete succeeded.
    pub fn clear_completed(&mut self) -> Result<usize, ApiError> {
        let ids = self.state.completed_ids();
        for batch in ids.chunks(MAX_PARALLEL_DELETES) {
            self.delete_batch(batch)?;
        }
        self.state.drop_completed();
        Ok(ids.len())
    }

    fn delete_batch(&self, ids: &[String]) -> Result<(), ApiError> {
        let client = &self.client;
        let transport = &self.transport;
        thread::scope(|scope| {
            let handles: Vec<_> = ids
                .iter()
                .map(|id| {
                    scope.spawn(move || {
                        let response = transport.execute(client.build_delete_item(id))?;
                        client.parse_delete_item(response)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect::<Result<(), ApiError>>()
        })
    }

    /// Show `ids` in the given order right away, then persist the order.
    /// A failed persist is logged only; local order is not restored.
    pub fn reorder(&mut self, ids: Vec<String>) {
        self.state.apply_order(&ids);
        if let Err(error) = self.persist_order(ids) {
            tracing::warn!(%error, "failed to save todo order");
        }
    }

    fn persist_order(&self, ids: Vec<String>) -> Result<(), ApiError> {
        let request = self.client.build_reorder_items(&ReorderItems { ids })?;
        self.client.parse_reorder_items(self.transport.execute(request)?)?;
        Ok(())
    }

    pub fn health(&self) -> Result<Health, ApiError> {
        let response = self.transport.execute(self.client.build_health())?;
        self.client.parse_health(response)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};

    /// Replies from a queue and records what was sent.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.replies.lock().unwrap().push_back(ok(status, body));
            self
        }

        fn fail(self) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(TransportError("connection refused".to_string())));
            self
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.sent.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("no reply scripted".to_string())))
        }
    }

    fn item_json(id: &str, text: &str, completed: bool) -> String {
        format!(r#"{{"id":"{id}","text":"{text}","completed":{completed},"createdAt":1,"order":0}}"#)
    }

    fn list_json(items: &[(&str, bool)]) -> String {
        let items: Vec<String> = items
            .iter()
            .map(|(id, completed)| item_json(id, id, *completed))
            .collect();
        format!("[{}]", items.join(","))
    }

    /// An app whose initial load returns `items`; `transport` then answers
    /// whatever comes after.
    fn loaded(items: &[(&str, bool)], transport: Scripted) -> TodoApp<Scripted> {
        transport
            .replies
            .lock()
            .unwrap()
            .push_front(ok(200, &list_json(items)));
        let mut app = TodoApp::new(TodoClient::new("http://test"), transport);
        app.load();
        app
    }

    fn ids(app: &TodoApp<Scripted>) -> Vec<&str> {
        app.state().items().iter().map(|item| item.id.as_str()).collect()
    }

    fn sent(app: &TodoApp<Scripted>) -> Vec<(HttpMethod, String)> {
        app.transport
            .sent
            .lock()
            .unwrap()
            .iter()
            .map(|req| (req.method, req.path.clone()))
            .collect()
    }

    #[test]
    fn load_failure_leaves_empty_list() {
        let mut app = TodoApp::new(TodoClient::new("http://test"), Scripted::default().fail());
        app.load();
        assert!(!app.state().is_loading());
        assert!(app.state().items().is_empty());
    }

    #[test]
    fn add_prepends_server_copy() {
        let transport = Scripted::default().reply(201, &item_json("new", "Buy milk", false));
        let mut app = loaded(&[("old", false)], transport);

        let created = app.add("  Buy milk ").unwrap().unwrap();
        assert_eq!(created.text, "Buy milk");
        assert_eq!(ids(&app), ["new", "old"]);
    }

    #[test]
    fn add_blank_sends_nothing() {
        let mut app = loaded(&[], Scripted::default());
        assert!(app.add("   ").unwrap().is_none());
        assert_eq!(sent(&app).len(), 1);
    }

    #[test]
    fn failed_add_leaves_state_unchanged() {
        let transport = Scripted::default().reply(500, r#"{"error":"Failed to create todo"}"#);
        let mut app = loaded(&[("old", false)], transport);
        assert!(matches!(
            app.add("x"),
            Err(ApiError::HttpError { status: 500, .. })
        ));
        assert_eq!(ids(&app), ["old"]);
    }

    #[test]
    fn toggle_replaces_with_server_copy() {
        let transport = Scripted::default().reply(200, &item_json("a", "a", true));
        let mut app = loaded(&[("a", false), ("b", false)], transport);

        app.toggle("a", true).unwrap();
        assert!(app.state().items()[0].completed);
        assert_eq!(app.state().items_left(), 1);
        assert_eq!(sent(&app)[1], (HttpMethod::Patch, "http://test/api/todos/a".to_string()));
    }

    #[test]
    fn blank_edit_keeps_current_text() {
        let transport = Scripted::default().reply(200, &item_json("a", "a", false));
        let mut app = loaded(&[("a", false)], transport);

        app.edit("a", "   ").unwrap();
        let body = app.transport.sent.lock().unwrap()[1].body.clone().unwrap();
        assert_eq!(body, r#"{"text":"a"}"#);
    }

    #[test]
    fn delete_not_found_keeps_item() {
        let transport = Scripted::default().reply(404, r#"{"error":"Todo not found"}"#);
        let mut app = loaded(&[("a", false)], transport);
        assert!(matches!(app.delete("a"), Err(ApiError::NotFound)));
        assert_eq!(ids(&app), ["a"]);
    }

    #[test]
    fn clear_completed_deletes_each_completed_item() {
        let transport = Scripted::default().reply(204, "").reply(204, "");
        let mut app = loaded(&[("a", true), ("b", false), ("c", true)], transport);

        assert_eq!(app.clear_completed().unwrap(), 2);
        assert_eq!(ids(&app), ["b"]);
        let mut deletes: Vec<String> = sent(&app)
            .into_iter()
            .filter(|(method, _)| *method == HttpMethod::Delete)
            .map(|(_, path)| path)
            .collect();
        deletes.sort();
        assert_eq!(deletes, ["http://test/api/todos/a", "http://test/api/todos/c"]);
    }

    #[test]
    fn clear_completed_failure_keeps_state() {
        let transport = Scripted::default().reply(204, "").reply(500, "boom");
        let mut app = loaded(&[("a", true), ("c", true)], transport);
        assert!(app.clear_completed().is_err());
        assert_eq!(ids(&app), ["a", "c"]);
    }

    #[test]
    fn reorder_is_kept_when_persist_fails() {
        let transport = Scripted::default().fail();
        let mut app = loaded(&[("a", false), ("b", false), ("c", false)], transport);

        app.reorder(vec!["c".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(ids(&app), ["c", "a", "b"]);
        assert_eq!(
            sent(&app)[1],
            (HttpMethod::Put, "http://test/api/todos/reorder".to_string())
        );
    }

    /// Answers every request with 204 and tracks the peak number in flight.
    #[derive(Default)]
    struct Counting {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Transport for Counting {
        fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            ok(204, "")
        }
    }

    #[test]
    fn clear_completed_bounds_requests_in_flight() {
        let completed: Vec<String> = (0..MAX_PARALLEL_DELETES * 2 + 3)
            .map(|n| format!("t{n}"))
            .collect();
        let entries: Vec<(&str, bool)> = completed.iter().map(|id| (id.as_str(), true)).collect();

        let mut app = TodoApp::new(TodoClient::new("http://test"), Counting::default());
        app.state_mut().finish_loading(Ok(serde_json::from_str(&list_json(&entries)).unwrap()));

        assert_eq!(app.clear_completed().unwrap(), completed.len());
        assert!(app.state().items().is_empty());
        assert_eq!(app.transport.calls.load(Ordering::SeqCst), completed.len());
        assert!(app.transport.peak.load(Ordering::SeqCst) <= MAX_PARALLEL_DELETES);
    }
}
