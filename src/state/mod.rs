//! Local snapshot of the remote source of truth.
//!
//! Each resource is replaced wholesale on a successful fetch. Fetches take a
//! generation ticket when they are issued; a response whose ticket is older
//! than the last applied one for the same resource is discarded, so a slow
//! poll can no longer overwrite what a faster push-triggered fetch already
//! brought in.

use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::{CommandRecord, Device, EnergySummary, EnergyTimelineEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Devices,
    Commands,
    EnergySummary,
    EnergyTimeline,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Devices,
        Resource::Commands,
        Resource::EnergySummary,
        Resource::EnergyTimeline,
    ];

    fn index(self) -> usize {
        match self {
            Resource::Devices => 0,
            Resource::Commands => 1,
            Resource::EnergySummary => 2,
            Resource::EnergyTimeline => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::Devices => "devices",
            Resource::Commands => "commands",
            Resource::EnergySummary => "energy_summary",
            Resource::EnergyTimeline => "energy_timeline",
        }
    }
}

/// Issued to a fetch before it starts; presented back when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub resource: Resource,
    pub generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    /// Newest first
    pub commands: Vec<CommandRecord>,
    /// `None` until the first successful summary fetch
    pub energy_summary: Option<EnergySummary>,
    /// Oldest first
    pub energy_timeline: Vec<EnergyTimelineEntry>,
}

impl Snapshot {
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }
}

#[derive(Debug, Default)]
struct Ledger {
    issued: [u64; 4],
    applied: [u64; 4],
}

pub struct Store {
    tx: watch::Sender<Snapshot>,
    ledger: Mutex<Ledger>,
}

impl Store {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self {
            tx,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A clone of the current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Borrow the current snapshot without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receive every applied change
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn issue(&self, resource: Resource) -> Ticket {
        let mut ledger = self.ledger();
        let slot = &mut ledger.issued[resource.index()];
        *slot += 1;

        Ticket {
            resource,
            generation: *slot,
        }
    }

    /// Highest generation applied so far for the resource, 0 if none
    pub fn applied_generation(&self, resource: Resource) -> u64 {
        self.ledger().applied[resource.index()]
    }

    /// Run `replace` against the snapshot unless a newer fetch of the same
    /// resource already landed. Returns whether the response was applied.
    fn apply(&self, ticket: Ticket, replace: impl FnOnce(&mut Snapshot)) -> bool {
        let mut ledger = self.ledger();
        let applied = &mut ledger.applied[ticket.resource.index()];

        if ticket.generation <= *applied {
            debug!(
                resource = ticket.resource.name(),
                generation = ticket.generation,
                applied = *applied,
                "discarding stale response"
            );
            return false;
        }

        *applied = ticket.generation;
        self.tx.send_modify(replace);
        true
    }

    pub fn replace_devices(&self, ticket: Ticket, devices: Vec<Device>) -> bool {
        self.apply(ticket, |snapshot| {
            for device in &devices {
                let previous = snapshot.device(&device.id).and_then(|d| d.last_seen);
                if let (Some(before), Some(after)) = (previous, device.last_seen) {
                    if after < before {
                        warn!(
                            device_id = %device.id,
                            %before,
                            %after,
                            "backend reported an older heartbeat than before"
                        );
                    }
                }
            }
            snapshot.devices = devices;
        })
    }

    pub fn replace_commands(&self, ticket: Ticket, commands: Vec<CommandRecord>) -> bool {
        self.apply(ticket, |snapshot| snapshot.commands = commands)
    }

    pub fn replace_energy_summary(&self, ticket: Ticket, summary: EnergySummary) -> bool {
        self.apply(ticket, |snapshot| snapshot.energy_summary = Some(summary))
    }

    pub fn replace_energy_timeline(
        &self,
        ticket: Ticket,
        timeline: Vec<EnergyTimelineEntry>,
    ) -> bool {
        self.apply(ticket, |snapshot| snapshot.energy_timeline = timeline)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorSlot, LightColor};
    use pretty_assertions::assert_eq;

    fn device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            ip_address: "10.0.0.2".to_string(),
            color_slots: vec![ColorSlot {
                led_id: None,
                color: LightColor::Red,
            }],
            last_seen: None,
        }
    }

    #[test]
    fn test_generations_increase_per_resource() {
        let store = Store::new();

        assert_eq!(store.issue(Resource::Devices).generation, 1);
        assert_eq!(store.issue(Resource::Devices).generation, 2);
        assert_eq!(store.issue(Resource::Commands).generation, 1);
        assert_eq!(store.applied_generation(Resource::Devices), 0);
    }

    #[test]
    fn test_out_of_order_response_is_discarded() {
        let store = Store::new();
        let older = store.issue(Resource::Devices);
        let newer = store.issue(Resource::Devices);

        assert!(store.replace_devices(newer, vec![device("new")]));
        assert!(!store.replace_devices(older, vec![device("old")]));

        assert_eq!(store.snapshot().devices, vec![device("new")]);
        assert_eq!(store.applied_generation(Resource::Devices), 2);
    }

    #[test]
    fn test_resources_do_not_share_generations() {
        let store = Store::new();
        let devices = store.issue(Resource::Devices);
        let _ = store.issue(Resource::Commands);
        let _ = store.issue(Resource::Commands);

        assert!(store.replace_devices(devices, vec![device("a")]));
    }

    #[test]
    fn test_empty_success_clears_the_collection() {
        let store = Store::new();
        let first = store.issue(Resource::Devices);
        store.replace_devices(first, vec![device("a"), device("b")]);

        let second = store.issue(Resource::Devices);
        assert!(store.replace_devices(second, Vec::new()));
        assert!(store.snapshot().devices.is_empty());
    }

    #[test]
    fn test_subscribers_see_applied_changes() {
        let store = Store::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        let ticket = store.issue(Resource::EnergySummary);
        store.replace_energy_summary(ticket, EnergySummary::default());

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().energy_summary, Some(EnergySummary::default()));
    }
}
