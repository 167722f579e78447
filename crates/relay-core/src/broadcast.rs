//! Fan-out of one response to every registered connection.

use crate::{ConnectionId, Registry};
use futures::future::join_all;
use relay_types::Response;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Outcome of one broadcast pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Connections whose write failed. They are gone from the registry.
    pub pruned: Vec<ConnectionId>,
}

/// Send `response` to every connection in the registry.
///
/// Writes run concurrently, each bounded by `write_timeout`. A connection
/// whose write fails is closed and removed before this returns; everybody
/// else still gets the message. Closes also run concurrently, so one pass
/// takes at most two timeouts however many clients hang.
pub async fn broadcast_all(
    registry: &mut Registry,
    response: &Response,
    write_timeout: Option<Duration>,
) -> BroadcastReport {
    let text = match response.to_json() {
        Ok(text) => text,
        Err(e) => {
            error!(target: "relay::broadcast", "Failed to serialize response: {}", e);
            return BroadcastReport::default();
        }
    };

    let writes = registry.handles_mut().map(|handle| {
        let text = text.clone();
        async move {
            let id = handle.id();
            (id, handle.send_text_within(text, write_timeout).await)
        }
    });
    let results = join_all(writes).await;

    let mut report = BroadcastReport::default();
    for (id, result) in results {
        match result {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(target: "relay::broadcast", "Dropping connection {} after failed write: {}", id, e);
                report.pruned.push(id);
            }
        }
    }

    let mut dropped: Vec<_> = report.pruned.iter().filter_map(|id| registry.remove(*id)).collect();
    join_all(dropped.iter_mut().map(|handle| handle.close_within(write_timeout))).await;

    debug!(
        target: "relay::broadcast",
        "Broadcast {:?} delivered to {} connections, pruned {}",
        response.action,
        report.delivered,
        report.pruned.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::testing::{broken_handle, channel_handle, drain, stalled_handle};

    #[tokio::test]
    async fn test_delivers_to_everyone() {
        let mut registry = Registry::new();
        let (a, mut rx_a) = channel_handle();
        let (b, mut rx_b) = channel_handle();
        registry.register(a).unwrap();
        registry.register(b).unwrap();

        let response = Response::chat("alice", "hi");
        let report = broadcast_all(&mut registry, &response, None).await;

        assert_eq!(report.delivered, 2);
        assert!(report.pruned.is_empty());
        assert_eq!(drain(&mut rx_a), vec![response.clone()]);
        assert_eq!(drain(&mut rx_b), vec![response]);
    }

    #[tokio::test]
    async fn test_failed_write_prunes_only_that_connection() {
        let mut registry = Registry::new();
        let (good, mut rx_good) = channel_handle();
        let bad = broken_handle();
        let good_id = good.id();
        let bad_id = bad.id();
        registry.register(good).unwrap();
        registry.register(bad).unwrap();

        let report = broadcast_all(&mut registry, &Response::list_users(vec![]), None).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.pruned, vec![bad_id]);
        assert!(registry.contains(good_id));
        assert!(!registry.contains(bad_id));
        assert_eq!(drain(&mut rx_good).len(), 1);

        // Nothing left to prune on the next pass.
        let report = broadcast_all(&mut registry, &Response::list_users(vec![]), None).await;
        assert_eq!(report.delivered, 1);
        assert!(report.pruned.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_client_is_timed_out_and_pruned() {
        let mut registry = Registry::new();
        let (good, mut rx_good) = channel_handle();
        let stalled = stalled_handle();
        let stalled_id = stalled.id();
        registry.register(good).unwrap();
        registry.register(stalled).unwrap();

        let report = broadcast_all(
            &mut registry,
            &Response::chat("bob", "anyone there?"),
            Some(Duration::from_secs(1)),
        )
        .await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.pruned, vec![stalled_id]);
        assert_eq!(registry.len(), 1);
        assert_eq!(drain(&mut rx_good).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_stalled_clients_share_one_deadline() {
        let mut registry = Registry::new();
        let (good, mut rx_good) = channel_handle();
        registry.register(good).unwrap();
        for _ in 0..3 {
            registry.register(stalled_handle()).unwrap();
        }

        let limit = Duration::from_secs(1);
        let started = tokio::time::Instant::now();
        let report = broadcast_all(&mut registry, &Response::chat("bob", "hello?"), Some(limit)).await;

        assert_eq!(report.pruned.len(), 3);
        assert_eq!(registry.len(), 1);
        assert_eq!(drain(&mut rx_good).len(), 1);
        // One timeout for the writes, one for the closes.
        assert!(started.elapsed() <= limit * 2, "took {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_empty_registry_is_a_no_op() {
        let mut registry = Registry::new();
        let report = broadcast_all(&mut registry, &Response::connected(), None).await;
        assert_eq!(report, BroadcastReport::default());
    }
}
