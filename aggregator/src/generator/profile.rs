use crate::workflow::runner::unix_now;
use async_trait::async_trait;
use dfcore::math::geodesy::{self, normalize_bearing};
use dfcore::receiver::{ReceiverSnapshot, TelemetryError, TelemetrySource};
use dfcore::GeoPoint;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One synthetic receiver, placed relative to the emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedStation {
    pub name: String,
    /// Direction from the emitter to the station.
    pub bearing_from_emitter_deg: f64,
    pub range_m: f64,
    /// Antenna heading reported alongside the relative bearing.
    pub heading: f64,
    pub power: f64,
    pub confidence: i32,
}

impl Default for SimulatedStation {
    fn default() -> Self {
        Self {
            name: "sim".into(),
            bearing_from_emitter_deg: 0.0,
            range_m: 20_000.0,
            heading: 0.0,
            power: 30.0,
            confidence: 60,
        }
    }
}

/// Configuration for a synthetic receiver network around a fixed emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub emitter: GeoPoint,
    pub stations: Vec<SimulatedStation>,
    /// Half-width of the uniform bearing jitter.
    pub bearing_noise_deg: f64,
    pub frequency: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let station = |name: &str, bearing: f64, range_m: f64, heading: f64| SimulatedStation {
            name: name.into(),
            bearing_from_emitter_deg: bearing,
            range_m,
            heading,
            ..Default::default()
        };
        Self {
            emitter: GeoPoint::new(38.9, -77.0),
            stations: vec![
                station("sim-north", 10.0, 18_000.0, 0.0),
                station("sim-east", 100.0, 25_000.0, 45.0),
                station("sim-south", 230.0, 30_000.0, 300.0),
            ],
            bearing_noise_deg: 0.5,
            frequency: 162.4,
            seed: 7,
        }
    }
}

impl SimulationConfig {
    pub fn station_names(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.name.clone()).collect()
    }
}

/// Telemetry source answering for the configured synthetic stations by name.
pub struct SimulatedFeed {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedFeed {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }

    fn jitter(&self) -> f64 {
        let noise = self.config.bearing_noise_deg.abs();
        if noise == 0.0 {
            return 0.0;
        }
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(-noise..noise),
            Err(_) => 0.0,
        }
    }

    fn snapshot_for(&self, station: &SimulatedStation) -> Result<ReceiverSnapshot, TelemetryError> {
        let position = geodesy::direct(
            self.config.emitter,
            station.bearing_from_emitter_deg,
            station.range_m,
        );
        let true_doa = geodesy::heading(position, self.config.emitter).map_err(|err| {
            TelemetryError::Malformed {
                endpoint: station.name.clone(),
                reason: err.to_string(),
            }
        })?;
        let doa = normalize_bearing(true_doa + self.jitter());
        let raw_bearing = normalize_bearing(station.heading + 360.0 - doa);

        Ok(ReceiverSnapshot::new(
            station.name.clone(),
            unix_now(),
            self.config.frequency,
            position.latitude,
            position.longitude,
            station.heading,
            raw_bearing,
            station.power,
            station.confidence,
        ))
    }
}

#[async_trait]
impl TelemetrySource for SimulatedFeed {
    async fn fetch(&self, endpoint: &str) -> Result<ReceiverSnapshot, TelemetryError> {
        let station = self
            .config
            .stations
            .iter()
            .find(|s| s.name == endpoint)
            .ok_or_else(|| TelemetryError::Transport {
                endpoint: endpoint.to_string(),
                reason: "no simulated station with that name".into(),
            })?;
        self.snapshot_for(station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfcore::math::geodesy::bearing_difference;

    #[tokio::test]
    async fn noiseless_station_points_at_the_emitter() {
        let config = SimulationConfig {
            bearing_noise_deg: 0.0,
            ..Default::default()
        };
        let emitter = config.emitter;
        let feed = SimulatedFeed::new(config);

        let snapshot = feed.fetch("sim-east").await.unwrap();
        assert_eq!(snapshot.station_id, "sim-east");
        assert_eq!(snapshot.heading, 45.0);
        let expected = geodesy::heading(snapshot.position(), emitter).unwrap();
        assert!(bearing_difference(snapshot.corrected_bearing, expected) < 1e-9);
        let range = geodesy::distance(snapshot.position(), emitter).unwrap();
        assert!((range - 25_000.0).abs() < 1.0);
    }

    #[tokio::test]
    async fn jitter_stays_within_configured_noise() {
        let config = SimulationConfig {
            bearing_noise_deg: 2.0,
            ..Default::default()
        };
        let emitter = config.emitter;
        let feed = SimulatedFeed::new(config);

        for _ in 0..50 {
            let snapshot = feed.fetch("sim-north").await.unwrap();
            let expected = geodesy::heading(snapshot.position(), emitter).unwrap();
            assert!(bearing_difference(snapshot.corrected_bearing, expected) <= 2.0 + 1e-9);
        }
    }

    #[tokio::test]
    async fn unknown_station_is_a_transport_failure() {
        let feed = SimulatedFeed::new(SimulationConfig::default());
        let err = feed.fetch("nowhere").await.unwrap_err();
        assert!(matches!(err, TelemetryError::Transport { .. }));
    }

    #[test]
    fn yaml_overrides_keep_station_defaults() {
        let config: SimulationConfig = serde_yaml::from_str(
            "emitter: { latitude: 10.0, longitude: 20.0 }\nstations:\n  - name: a\n    bearing_from_emitter_deg: 90.0\n",
        )
        .unwrap();
        assert_eq!(config.station_names(), vec!["a"]);
        assert_eq!(config.stations[0].confidence, 60);
        assert_eq!(config.seed, 7);
    }
}
