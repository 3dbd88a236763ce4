//! Push channel connection state machine.
//!
//! Pure and synchronous: it consumes [`LinkEvent`]s and answers with the
//! [`LinkAction`]s the driver must carry out. The driver owns the socket
//! and the reconnect timer; this type only decides.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::protocol::parse_frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Start,
    Stop,
    Opened,
    Frame(String),
    Failed(String),
    Closed,
    RetryDue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    Dial,
    ScheduleRetry(Duration),
    CancelRetry,
    Hangup,
    RefreshAll,
}

#[derive(Debug)]
pub struct ConnectionMachine {
    state: LinkState,
    running: bool,
    retry_pending: bool,
    retry_delay: Duration,
    retries_scheduled: u64,
}

impl ConnectionMachine {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            state: LinkState::Disconnected,
            running: false,
            retry_pending: false,
            retry_delay,
            retries_scheduled: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Total reconnects scheduled over the machine's lifetime
    pub fn retries_scheduled(&self) -> u64 {
        self.retries_scheduled
    }

    pub fn handle(&mut self, event: LinkEvent) -> Vec<LinkAction> {
        match event {
            LinkEvent::Start => {
                if self.running {
                    return Vec::new();
                }
                self.running = true;
                self.dial()
            }
            LinkEvent::Stop => {
                let mut actions = Vec::new();
                if !self.running {
                    return actions;
                }
                self.running = false;
                if self.retry_pending {
                    self.retry_pending = false;
                    actions.push(LinkAction::CancelRetry);
                }
                if self.state != LinkState::Disconnected {
                    actions.push(LinkAction::Hangup);
                }
                self.state = LinkState::Disconnected;
                actions
            }
            LinkEvent::Opened => {
                if !self.running || self.state != LinkState::Connecting {
                    return Vec::new();
                }
                info!("push channel connected");
                self.state = LinkState::Connected;
                if self.retry_pending {
                    self.retry_pending = false;
                    return vec![LinkAction::CancelRetry];
                }
                Vec::new()
            }
            LinkEvent::Frame(text) => {
                if self.state != LinkState::Connected {
                    return Vec::new();
                }
                match parse_frame(&text) {
                    Ok(Some(notification)) if notification.requires_refresh() => {
                        debug!(
                            kind = notification.kind(),
                            device_id = notification.device_id().unwrap_or("-"),
                            "push notification"
                        );
                        vec![LinkAction::RefreshAll]
                    }
                    Ok(_) => {
                        debug!("ignoring unrecognized push message");
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(error = %e, "discarding unparseable push message");
                        Vec::new()
                    }
                }
            }
            LinkEvent::Failed(reason) => {
                if self.state != LinkState::Disconnected {
                    warn!(%reason, "push channel error");
                }
                self.lost()
            }
            LinkEvent::Closed => {
                if self.state != LinkState::Disconnected {
                    info!("push channel disconnected");
                }
                self.lost()
            }
            LinkEvent::RetryDue => {
                self.retry_pending = false;
                if !self.running || self.state != LinkState::Disconnected {
                    return Vec::new();
                }
                debug!("reconnecting push channel");
                self.dial()
            }
        }
    }

    /// A new attempt always clears any earlier pending timer first.
    fn dial(&mut self) -> Vec<LinkAction> {
        let mut actions = Vec::with_capacity(2);
        if self.retry_pending {
            self.retry_pending = false;
            actions.push(LinkAction::CancelRetry);
        }
        self.state = LinkState::Connecting;
        actions.push(LinkAction::Dial);
        actions
    }

    /// Connection attempt or established link ended. Only the first end of
    /// a given attempt schedules a retry; an error followed by a close
    /// yields one.
    fn lost(&mut self) -> Vec<LinkAction> {
        if !self.running || self.state == LinkState::Disconnected {
            return Vec::new();
        }
        self.state = LinkState::Disconnected;

        let mut actions = Vec::with_capacity(2);
        if self.retry_pending {
            actions.push(LinkAction::CancelRetry);
        }
        self.retry_pending = true;
        self.retries_scheduled += 1;
        actions.push(LinkAction::ScheduleRetry(self.retry_delay));
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(5_000);

    fn started() -> ConnectionMachine {
        let mut machine = ConnectionMachine::new(DELAY);
        assert_eq!(machine.handle(LinkEvent::Start), vec![LinkAction::Dial]);
        machine
    }

    #[test]
    fn test_start_dials_once() {
        let mut machine = started();

        assert_eq!(machine.state(), LinkState::Connecting);
        assert!(machine.handle(LinkEvent::Start).is_empty());
    }

    #[test]
    fn test_open_then_close_schedules_one_retry() {
        let mut machine = started();
        machine.handle(LinkEvent::Opened);
        assert_eq!(machine.state(), LinkState::Connected);

        assert_eq!(
            machine.handle(LinkEvent::Closed),
            vec![LinkAction::ScheduleRetry(DELAY)]
        );
        assert_eq!(machine.state(), LinkState::Disconnected);
        assert!(machine.retry_pending());
    }

    #[test]
    fn test_error_followed_by_close_schedules_once() {
        let mut machine = started();
        machine.handle(LinkEvent::Opened);

        assert_eq!(
            machine.handle(LinkEvent::Failed("reset by peer".into())),
            vec![LinkAction::ScheduleRetry(DELAY)]
        );
        assert!(machine.handle(LinkEvent::Closed).is_empty());
        assert_eq!(machine.retries_scheduled(), 1);
    }

    #[test]
    fn test_failed_first_attempt_also_retries() {
        let mut machine = started();

        assert_eq!(
            machine.handle(LinkEvent::Failed("connection refused".into())),
            vec![LinkAction::ScheduleRetry(DELAY)]
        );
    }

    #[test]
    fn test_n_closes_schedule_n_retries_never_two_pending() {
        let mut machine = started();
        let mut pending = 0i32;
        let mut max_pending = 0i32;

        for round in 0..5 {
            if round % 2 == 0 {
                machine.handle(LinkEvent::Opened);
            }
            for action in machine.handle(LinkEvent::Closed) {
                match action {
                    LinkAction::ScheduleRetry(_) => pending += 1,
                    LinkAction::CancelRetry => pending -= 1,
                    _ => {}
                }
            }
            max_pending = max_pending.max(pending);

            for action in machine.handle(LinkEvent::RetryDue) {
                if action == LinkAction::CancelRetry {
                    pending -= 1;
                }
            }
            // the timer fired, so it is no longer pending
            pending = 0;
        }

        assert_eq!(machine.retries_scheduled(), 5);
        assert_eq!(max_pending, 1);
        assert_eq!(machine.state(), LinkState::Connecting);
    }

    #[test]
    fn test_retry_due_redials() {
        let mut machine = started();
        machine.handle(LinkEvent::Closed);

        assert_eq!(machine.handle(LinkEvent::RetryDue), vec![LinkAction::Dial]);
        assert_eq!(machine.state(), LinkState::Connecting);
        assert!(!machine.retry_pending());
    }

    #[test]
    fn test_stop_cancels_retry_and_is_idempotent() {
        let mut machine = started();
        machine.handle(LinkEvent::Closed);

        assert_eq!(machine.handle(LinkEvent::Stop), vec![LinkAction::CancelRetry]);
        assert!(machine.handle(LinkEvent::Stop).is_empty());
        assert!(machine.handle(LinkEvent::RetryDue).is_empty());
        assert!(machine.handle(LinkEvent::Closed).is_empty());
        assert_eq!(machine.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_stop_while_connected_hangs_up() {
        let mut machine = started();
        machine.handle(LinkEvent::Opened);

        assert_eq!(machine.handle(LinkEvent::Stop), vec![LinkAction::Hangup]);
        assert!(!machine.is_running());
    }

    #[test]
    fn test_restart_after_stop_dials_again() {
        let mut machine = started();
        machine.handle(LinkEvent::Stop);

        assert_eq!(machine.handle(LinkEvent::Start), vec![LinkAction::Dial]);
    }

    #[test]
    fn test_frames_only_count_when_connected() {
        let mut machine = started();
        let frame = r#"{"type": "status_update", "data": {"device_id": "d1", "color": "RED"}}"#;

        assert!(machine.handle(LinkEvent::Frame(frame.into())).is_empty());

        machine.handle(LinkEvent::Opened);
        assert_eq!(
            machine.handle(LinkEvent::Frame(frame.into())),
            vec![LinkAction::RefreshAll]
        );
        assert!(machine
            .handle(LinkEvent::Frame(r#"{"type": "command_failed"}"#.into()))
            .is_empty());
        assert!(machine.handle(LinkEvent::Frame("{{oops".into())).is_empty());
        assert_eq!(machine.state(), LinkState::Connected);
    }

    #[test]
    fn test_recognized_kind_with_odd_fields_refreshes() {
        let mut machine = started();
        machine.handle(LinkEvent::Opened);

        assert_eq!(
            machine.handle(LinkEvent::Frame(
                r#"{"type": "status_update", "timestamp": 1740938651}"#.into()
            )),
            vec![LinkAction::RefreshAll]
        );
        assert_eq!(
            machine.handle(LinkEvent::Frame(
                r#"{"type": "command_executed", "data": null}"#.into()
            )),
            vec![LinkAction::RefreshAll]
        );
    }
}
