use crate::receiver::{ReceiverSnapshot, TelemetryError, TelemetrySource};
use log::{debug, warn};

/// A configured station endpoint and the last snapshot it delivered.
#[derive(Debug, Clone)]
pub struct StationSlot {
    pub endpoint: String,
    pub snapshot: Option<ReceiverSnapshot>,
    pub consecutive_failures: usize,
}

/// Outcome of refreshing every station once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

/// Current receiver state, in configuration order.
///
/// A failed refresh keeps the previous snapshot. Stations that never
/// reported are skipped by [`ReceiverRegistry::snapshots`].
#[derive(Debug, Clone, Default)]
pub struct ReceiverRegistry {
    slots: Vec<StationSlot>,
}

impl ReceiverRegistry {
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: endpoints
                .into_iter()
                .map(|endpoint| StationSlot {
                    endpoint: endpoint.into(),
                    snapshot: None,
                    consecutive_failures: 0,
                })
                .collect(),
        }
    }

    /// Endpoints that have not delivered a snapshot yet.
    pub fn silent_endpoints(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.snapshot.is_none())
            .map(|slot| slot.endpoint.as_str())
            .collect()
    }

    /// Snapshots of every station that has reported at least once.
    pub fn snapshots(&self) -> Vec<ReceiverSnapshot> {
        self.slots
            .iter()
            .filter_map(|slot| slot.snapshot.clone())
            .collect()
    }

    /// Polls every station sequentially through `source`.
    pub async fn refresh<S>(&mut self, source: &S) -> RefreshSummary
    where
        S: TelemetrySource + ?Sized,
    {
        let mut summary = RefreshSummary::default();
        for slot in &mut self.slots {
            match source.fetch(&slot.endpoint).await {
                Ok(snapshot) => {
                    debug!(
                        "{} -> {} doa {:.1} conf {} pwr {:.1}",
                        slot.endpoint,
                        snapshot.station_id,
                        snapshot.corrected_bearing,
                        snapshot.confidence,
                        snapshot.power
                    );
                    slot.snapshot = Some(snapshot);
                    slot.consecutive_failures = 0;
                    summary.refreshed += 1;
                }
                Err(err) => {
                    slot.consecutive_failures += 1;
                    log_fetch_failure(slot, &err);
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

fn log_fetch_failure(slot: &StationSlot, err: &TelemetryError) {
    if slot.snapshot.is_some() {
        warn!(
            "{} (keeping previous snapshot, {} consecutive failures)",
            err, slot.consecutive_failures
        );
    } else {
        warn!("{} (station has not reported yet)", err);
    }
}
