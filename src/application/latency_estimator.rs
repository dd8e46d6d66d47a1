// One-way delay estimation from server and client clock readings
use crate::domain::reading::Event;

const NANOS_PER_MILLI: f64 = 1e6;

/// Estimates end-to-end latency in milliseconds.
///
/// Assumes the server and client clocks are roughly in sync; no offset correction is
/// applied. With no server timestamp the result is the time since the epoch, which is
/// meaningless but harmless.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyEstimator;

impl LatencyEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, event: &Event) -> f64 {
        let delta = event
            .client_recv_unix_nano
            .saturating_sub(event.meta.send_unix_nano())
            .max(0);
        delta as f64 / NANOS_PER_MILLI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::{Reading, ServerMeta};

    fn event(sent: Option<i64>, received: Option<i64>, client: i64) -> Event {
        Event {
            reading: Reading::default(),
            meta: ServerMeta {
                sent_unix_nano: sent,
                received_unix_nano: received,
            },
            client_recv_unix_nano: client,
        }
    }

    #[test]
    fn test_prefers_sent_over_received() {
        let estimator = LatencyEstimator::new();
        assert_eq!(estimator.estimate(&event(Some(1_000_000), Some(0), 3_500_000)), 2.5);
        assert_eq!(estimator.estimate(&event(None, Some(1_000_000), 2_000_000)), 1.0);
    }

    #[test]
    fn test_never_negative() {
        let estimator = LatencyEstimator::new();
        let stamps = [None, Some(0), Some(5), Some(i64::MAX), Some(i64::MIN), Some(-7)];
        let clients = [0, 1, -1_000, i64::MAX, i64::MIN];

        for sent in stamps {
            for received in stamps {
                for client in clients {
                    let ms = estimator.estimate(&event(sent, received, client));
                    assert!(ms >= 0.0, "sent={sent:?} received={received:?} client={client}");
                }
            }
        }
    }

    #[test]
    fn test_missing_server_stamps_degrade_to_epoch_delta() {
        let estimator = LatencyEstimator::new();
        assert_eq!(estimator.estimate(&event(None, None, 4_000_000)), 4.0);
    }
}
