//! Scripted session client and provider for integration tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::providers::traits::{
    AccountCredentials, ChatSummary, SelfInfo, SessionClient, SessionError, SessionEvent,
    SessionProvider,
};

/// A controllable [`SessionClient`]: tests set its connectivity, dialogs and
/// send behavior, and feed events through the paired sender.
pub struct StubSessionClient {
    connected: AtomicBool,
    authorized: AtomicBool,
    fail_sends: AtomicBool,
    send_attempts: AtomicUsize,
    dialogs: Mutex<Vec<ChatSummary>>,
    sent: Mutex<Vec<(i64, String)>>,
    events: AsyncMutex<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl StubSessionClient {
    /// Creates a connected, authorized client and the sender that feeds its
    /// event stream. Dropping the sender closes the stream.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedSender<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            connected: AtomicBool::new(true),
            authorized: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            send_attempts: AtomicUsize::new(0),
            dialogs: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            events: AsyncMutex::new(rx),
        });
        (client, tx)
    }

    /// Sets the connectivity flag reported by `is_connected`.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Current connectivity flag, for assertions.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Sets the authorization flag reported by `is_authorized`.
    pub fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
    }

    /// Makes every subsequent send fail (or succeed again).
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Replaces the dialog list returned by `list_dialogs`.
    pub fn set_dialogs(&self, dialogs: Vec<ChatSummary>) {
        *self.dialogs.lock().unwrap() = dialogs;
    }

    /// Messages sent through this client so far.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of send attempts, including failed ones.
    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionClient for StubSessionClient {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn is_authorized(&self) -> Result<bool, SessionError> {
        Ok(self.authorized.load(Ordering::SeqCst))
    }

    async fn get_self(&self) -> Result<SelfInfo, SessionError> {
        Ok(SelfInfo {
            user_id: 1,
            username: Some("stub".to_string()),
            display_name: "Stub".to_string(),
        })
    }

    async fn list_dialogs(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ChatSummary>, SessionError> {
        let dialogs = self.dialogs.lock().unwrap().clone();
        Ok(match limit {
            Some(limit) => dialogs.into_iter().take(limit).collect(),
            None => dialogs,
        })
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SessionError> {
        self.send_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SessionError::SendFailed("scripted send failure".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn next_event(&self) -> Result<SessionEvent, SessionError> {
        let mut events = self.events.lock().await;
        match events.recv().await {
            Some(event) => Ok(event),
            None => Err(SessionError::StreamClosed),
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// A [`SessionProvider`] that hands out scripted clients by credentials
/// reference (the stem of the session file).
#[derive(Default)]
pub struct StubSessionProvider {
    clients: Mutex<HashMap<String, Vec<Arc<StubSessionClient>>>>,
}

impl StubSessionProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a client to be returned for the given credentials reference.
    /// Successive `open` calls for the same reference pop in order.
    pub fn push_client(&self, credentials_ref: &str, client: Arc<StubSessionClient>) {
        self.clients
            .lock()
            .unwrap()
            .entry(credentials_ref.to_string())
            .or_default()
            .push(client);
    }
}

#[async_trait]
impl SessionProvider for StubSessionProvider {
    async fn open(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<Arc<dyn SessionClient>, SessionError> {
        let credentials_ref = credentials
            .session_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let mut clients = self.clients.lock().unwrap();
        match clients.get_mut(&credentials_ref) {
            Some(queue) if !queue.is_empty() => {
                let client: Arc<dyn SessionClient> = queue.remove(0);
                Ok(client)
            }
            _ => Err(SessionError::ConnectionFailed(format!(
                "no scripted session for {credentials_ref}"
            ))),
        }
    }
}
