use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::machine::{ConnectionMachine, LinkAction, LinkEvent, LinkState};
use crate::config::PushConfig;
use crate::sync::{Synchronizer, Trigger};

const EVENT_QUEUE: usize = 64;

/// Socket events, tagged with the attempt that produced them so that a late
/// event from a superseded socket can be told apart and dropped.
#[derive(Debug)]
enum SessionEvent {
    Opened(u64),
    Frame(u64, String),
    Failed(u64, String),
    Closed(u64),
}

impl SessionEvent {
    fn session(&self) -> u64 {
        match self {
            SessionEvent::Opened(id)
            | SessionEvent::Frame(id, _)
            | SessionEvent::Failed(id, _)
            | SessionEvent::Closed(id) => *id,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Failed(..) | SessionEvent::Closed(_))
    }

    fn into_link_event(self) -> LinkEvent {
        match self {
            SessionEvent::Opened(_) => LinkEvent::Opened,
            SessionEvent::Frame(_, text) => LinkEvent::Frame(text),
            SessionEvent::Failed(_, reason) => LinkEvent::Failed(reason),
            SessionEvent::Closed(_) => LinkEvent::Closed,
        }
    }
}

/// One connection attempt. Dropping it hangs up.
struct Session {
    hangup: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Link state writer held by one driver. Only the driver of the latest
/// `start` may publish; a stopped driver winding down is muted.
struct LinkPublisher {
    tx: watch::Sender<LinkState>,
    current: Arc<Mutex<u64>>,
    epoch: u64,
}

impl LinkPublisher {
    fn claim(tx: &watch::Sender<LinkState>, current: &Arc<Mutex<u64>>) -> Self {
        let mut latest = current.lock().unwrap_or_else(|p| p.into_inner());
        *latest += 1;
        Self {
            tx: tx.clone(),
            current: Arc::clone(current),
            epoch: *latest,
        }
    }

    /// Returns false when a newer driver has taken over.
    fn publish(&self, state: LinkState) -> bool {
        let latest = self.current.lock().unwrap_or_else(|p| p.into_inner());
        if *latest != self.epoch {
            return false;
        }
        self.tx.send_replace(state);
        true
    }
}

/// Owns the push notification channel.
///
/// Holds at most one live connection, reconnects after a fixed delay and
/// turns relevant notifications into refreshes. It never writes to the
/// snapshot itself.
pub struct PushCoordinator {
    url: String,
    reconnect_delay: Duration,
    sync: Arc<Synchronizer>,
    state: watch::Sender<LinkState>,
    epoch: Arc<Mutex<u64>>,
    running: Mutex<Option<Running>>,
}

impl PushCoordinator {
    pub fn new(config: &PushConfig, sync: Arc<Synchronizer>) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        Self {
            url: config.ws_url.clone(),
            reconnect_delay: config.reconnect_delay(),
            sync,
            state,
            epoch: Arc::new(Mutex::new(0)),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    /// Open the channel. A no-op while already running.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            debug!("push channel already running");
            return;
        }

        let (shutdown, shutdown_rx) = oneshot::channel();
        let driver = Driver::new(
            self.url.clone(),
            self.reconnect_delay,
            Arc::clone(&self.sync),
            LinkPublisher::claim(&self.state, &self.epoch),
        );
        let task = tokio::spawn(driver.run(shutdown_rx));

        info!(url = %self.url, "push channel starting");
        *running = Some(Running { shutdown, task });
    }

    /// Close the channel and cancel any pending reconnect. Safe to call
    /// repeatedly.
    pub fn stop(&self) {
        let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(Running { shutdown, .. }) = running.take() {
            let _ = shutdown.send(());
            info!("push channel stopping");
        }
    }

    /// Stop and wait until the socket is released.
    pub async fn shutdown(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(Running { shutdown, task }) = running {
            let _ = shutdown.send(());
            if let Err(e) = task.await {
                warn!(error = %e, "push driver ended abnormally");
            }
        }
    }
}

impl Drop for PushCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Single consumer of socket events, timer expiry and shutdown. Every state
/// transition happens here, one event at a time.
struct Driver {
    url: String,
    sync: Arc<Synchronizer>,
    state: LinkPublisher,
    machine: ConnectionMachine,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    session_id: u64,
    session: Option<Session>,
    draining: Option<JoinHandle<()>>,
    retry: Option<Pin<Box<Sleep>>>,
}

impl Driver {
    fn new(
        url: String,
        reconnect_delay: Duration,
        sync: Arc<Synchronizer>,
        state: LinkPublisher,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        Self {
            url,
            sync,
            state,
            machine: ConnectionMachine::new(reconnect_delay),
            events_tx,
            events_rx,
            session_id: 0,
            session: None,
            draining: None,
            retry: None,
        }
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        self.step(LinkEvent::Start);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.step(LinkEvent::Stop);
                    break;
                }
                Some(event) = self.events_rx.recv() => {
                    if event.session() != self.session_id {
                        debug!(session = event.session(), "dropping event from superseded connection");
                        continue;
                    }
                    if event.is_terminal() {
                        self.session = None;
                    }
                    self.step(event.into_link_event());
                }
                _ = retry_due(&mut self.retry) => {
                    self.retry = None;
                    self.step(LinkEvent::RetryDue);
                }
            }
        }

        if let Some(session) = self.session.take() {
            let _ = session.hangup.send(());
            self.draining = Some(session.task);
        }
        // unblocks a session stuck sending into a full queue
        self.events_rx.close();
        if let Some(task) = self.draining.take() {
            let _ = task.await;
        }
        debug!("push driver exited");
    }

    fn step(&mut self, event: LinkEvent) {
        for action in self.machine.handle(event) {
            self.execute(action);
        }
        self.state.publish(self.machine.state());
    }

    fn execute(&mut self, action: LinkAction) {
        match action {
            LinkAction::Dial => {
                if let Some(previous) = self.session.take() {
                    let _ = previous.hangup.send(());
                }
                self.session_id += 1;
                let (hangup, hangup_rx) = oneshot::channel();
                let task = tokio::spawn(run_session(
                    self.session_id,
                    self.url.clone(),
                    self.events_tx.clone(),
                    hangup_rx,
                ));
                self.session = Some(Session { hangup, task });
            }
            LinkAction::ScheduleRetry(delay) => {
                debug!(delay_ms = delay.as_millis() as u64, "push reconnect scheduled");
                self.retry = Some(Box::pin(sleep(delay)));
            }
            LinkAction::CancelRetry => {
                self.retry = None;
            }
            LinkAction::Hangup => {
                if let Some(session) = self.session.take() {
                    let _ = session.hangup.send(());
                    self.draining = Some(session.task);
                }
            }
            LinkAction::RefreshAll => {
                self.sync.spawn_refresh_all(Trigger::Push);
            }
        }
    }
}

async fn retry_due(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Connect, then forward frames until the socket ends or the driver hangs up.
/// Exactly one terminal event (Failed or Closed) is reported per attempt,
/// unless the driver hung up first.
async fn run_session(
    id: u64,
    url: String,
    events: mpsc::Sender<SessionEvent>,
    mut hangup: oneshot::Receiver<()>,
) {
    let socket = tokio::select! {
        _ = &mut hangup => return,
        connected = connect_async(url.as_str()) => match connected {
            Ok((socket, _)) => socket,
            Err(e) => {
                let _ = events.send(SessionEvent::Failed(id, e.to_string())).await;
                return;
            }
        }
    };

    if events.send(SessionEvent::Opened(id)).await.is_err() {
        return;
    }

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            _ = &mut hangup => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
            next = stream.next() => {
                let event = match next {
                    Some(Ok(Message::Text(text))) => SessionEvent::Frame(id, text),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => SessionEvent::Frame(id, text),
                        Err(_) => {
                            warn!("discarding non-utf8 binary push message");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = events.send(SessionEvent::Closed(id)).await;
                        return;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = events.send(SessionEvent::Failed(id, e.to_string())).await;
                        return;
                    }
                };
                if events.send(event).await.is_err() {
                    return;
                }
            }
        }
    }
}
