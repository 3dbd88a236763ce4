use chrono::{DateTime, Utc};

/// A device is online while its last heartbeat is younger than this.
pub const ONLINE_WINDOW_MS: i64 = 30_000;

/// Derive online/offline from a heartbeat timestamp.
///
/// A device that never reported is always offline. A heartbeat stamped in
/// the future (clock skew between backend and host) counts as online.
pub fn is_online(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_seen {
        Some(seen) => (now - seen).num_milliseconds() < ONLINE_WINDOW_MS,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_boundary_is_exclusive() {
        let now = Utc::now();

        assert!(!is_online(Some(now - Duration::milliseconds(30_000)), now));
        assert!(is_online(Some(now - Duration::milliseconds(29_999)), now));
    }

    #[test]
    fn test_never_seen_is_offline() {
        assert!(!is_online(None, Utc::now()));
    }

    #[test]
    fn test_fresh_and_future_heartbeats_are_online() {
        let now = Utc::now();

        assert!(is_online(Some(now), now));
        assert!(is_online(Some(now + Duration::seconds(5)), now));
        assert!(!is_online(Some(now - Duration::hours(2)), now));
    }
}
