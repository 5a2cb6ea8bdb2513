use crate::fix::{AggregateFix, CandidateIntersection};
use crate::math::geodesy;
use crate::math::stats::StatsHelper;
use crate::prelude::{AggregationConfig, GeoPoint};
use crate::processing::intersection::{LineOfBearing, LobIntersector};
use crate::receiver::ReceiverSnapshot;
use crate::store::{FixStore, StoreError};
use crate::telemetry::LogManager;

/// Everything one aggregation pass learned about a polling cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub fix: Option<AggregateFix>,
    /// Mean support power of the candidates that went into the fix.
    pub mean_power: Option<f64>,
    pub candidates: Vec<CandidateIntersection>,
    /// Index into `candidates` of the strongest candidate.
    pub reference: Option<usize>,
    /// Indices into `candidates` farther than the limit from the reference.
    pub outliers: Vec<usize>,
    pub outliers_excluded: bool,
    pub qualified_receivers: usize,
    pub rejected_pairs: usize,
}

impl CycleOutcome {
    pub fn retained(&self) -> usize {
        if self.outliers_excluded {
            self.candidates.len() - self.outliers.len()
        } else {
            self.candidates.len()
        }
    }
}

/// Condenses one cycle's receiver snapshots into a single aggregate fix.
pub struct CycleAggregator {
    config: AggregationConfig,
    intersector: LobIntersector,
    logger: LogManager,
}

impl CycleAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        let intersector = LobIntersector::new(config.intersection.clone());
        Self {
            config,
            intersector,
            logger: LogManager::new("aggregator"),
        }
    }

    fn qualifies(&self, snapshot: &ReceiverSnapshot) -> bool {
        snapshot.confidence > self.config.min_confidence
            && (!self.config.enforce_min_power || snapshot.power > self.config.min_power)
    }

    /// Computes the cycle's fix without persisting it.
    pub fn aggregate(&self, snapshots: &[ReceiverSnapshot], cycle_time: i64) -> CycleOutcome {
        let mut outcome = CycleOutcome {
            outliers_excluded: self.config.exclude_outliers,
            ..Default::default()
        };

        let qualified: Vec<&ReceiverSnapshot> =
            snapshots.iter().filter(|s| self.qualifies(s)).collect();
        outcome.qualified_receivers = qualified.len();

        for (i, first) in qualified.iter().enumerate() {
            for second in &qualified[..i] {
                match self
                    .intersector
                    .intersect(LineOfBearing::from(*first), LineOfBearing::from(*second))
                {
                    Ok(location) => outcome.candidates.push(CandidateIntersection {
                        location,
                        support_power: (first.power + second.power) / 2.0,
                    }),
                    Err(rejection) => {
                        outcome.rejected_pairs += 1;
                        self.logger.detail(&format!(
                            "{} x {}: {}",
                            first.station_id, second.station_id, rejection
                        ));
                    }
                }
            }
        }

        if outcome.candidates.is_empty() {
            self.logger.detail("no intersections this cycle");
            return outcome;
        }

        let powers: Vec<f64> = outcome.candidates.iter().map(|c| c.support_power).collect();
        let reference = StatsHelper::argmax_first(&powers).unwrap_or(0);
        outcome.reference = Some(reference);
        outcome.outliers = self.find_outliers(&outcome.candidates, reference);

        let retained: Vec<&CandidateIntersection> = outcome
            .candidates
            .iter()
            .enumerate()
            .filter(|(idx, _)| !(self.config.exclude_outliers && outcome.outliers.contains(idx)))
            .map(|(_, candidate)| candidate)
            .collect();

        let latitudes: Vec<f64> = retained.iter().map(|c| c.location.latitude).collect();
        let longitudes: Vec<f64> = retained.iter().map(|c| c.location.longitude).collect();
        let supports: Vec<f64> = retained.iter().map(|c| c.support_power).collect();

        if let (Some(latitude), Some(longitude)) =
            (StatsHelper::mean(&latitudes), StatsHelper::mean(&longitudes))
        {
            outcome.fix = Some(AggregateFix::new(
                cycle_time,
                GeoPoint::new(latitude, longitude),
            ));
            outcome.mean_power = StatsHelper::mean(&supports);
        }

        if !outcome.outliers.is_empty() {
            self.logger.record(&format!(
                "{} of {} intersections beyond {:.0} m of the reference ({})",
                outcome.outliers.len(),
                outcome.candidates.len(),
                self.config.max_distance_from_reference_m,
                if self.config.exclude_outliers {
                    "excluded"
                } else {
                    "kept"
                }
            ));
        }

        outcome
    }

    fn find_outliers(&self, candidates: &[CandidateIntersection], reference: usize) -> Vec<usize> {
        let anchor = candidates[reference].location;
        candidates
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != reference)
            .filter(|(_, candidate)| {
                match geodesy::distance(anchor, candidate.location) {
                    Ok(meters) => meters > self.config.max_distance_from_reference_m,
                    // only fails for near-antipodal pairs
                    Err(_) => true,
                }
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Aggregates and appends the resulting fix, if any, to `store`.
    pub fn run_cycle(
        &self,
        snapshots: &[ReceiverSnapshot],
        cycle_time: i64,
        store: &mut dyn FixStore,
    ) -> Result<CycleOutcome, StoreError> {
        let outcome = self.aggregate(snapshots, cycle_time);
        if let Some(fix) = outcome.fix.as_ref() {
            store.append(fix)?;
            self.logger.record(&format!(
                "fix {:.5}, {:.5} from {} intersections (mean power {:.1})",
                fix.latitude,
                fix.longitude,
                outcome.retained(),
                outcome.mean_power.unwrap_or_default()
            ));
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geodesy::{direct, heading};
    use crate::store::MemoryFixStore;

    fn station(
        id: &str,
        origin: GeoPoint,
        bearing: f64,
        power: f64,
        confidence: i32,
    ) -> ReceiverSnapshot {
        // heading 0 with raw bearing 360 - b gives corrected bearing b
        ReceiverSnapshot::new(
            id,
            0,
            433.0,
            origin.latitude,
            origin.longitude,
            0.0,
            360.0 - bearing,
            power,
            confidence,
        )
    }

    fn aimed(
        id: &str,
        target: GeoPoint,
        from_bearing: f64,
        range_m: f64,
        power: f64,
    ) -> ReceiverSnapshot {
        let origin = direct(target, from_bearing, range_m);
        station(id, origin, heading(origin, target).unwrap(), power, 50)
    }

    fn wide_config() -> AggregationConfig {
        let mut config = AggregationConfig::default();
        config.intersection.max_range_m = 100_000.0;
        config
    }

    #[test]
    fn no_qualified_pairs_yield_no_fix() {
        let target = GeoPoint::new(45.0, 7.0);
        let mut low = aimed("a", target, 0.0, 20_000.0, 30.0);
        low.confidence = 10;
        let b = aimed("b", target, 90.0, 20_000.0, 30.0);

        let mut store = MemoryFixStore::new();
        let outcome = CycleAggregator::new(AggregationConfig::default())
            .run_cycle(&[low, b], 5, &mut store)
            .unwrap();
        assert!(outcome.fix.is_none());
        assert_eq!(outcome.qualified_receivers, 1);
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn rejected_pairs_yield_no_fix() {
        let a = station("a", GeoPoint::new(10.0, 0.0), 0.0, 20.0, 50);
        let b = station("b", GeoPoint::new(10.0, 0.2), 0.0, 20.0, 50);
        let outcome = CycleAggregator::new(AggregationConfig::default()).aggregate(&[a, b], 1);
        assert!(outcome.fix.is_none());
        assert_eq!(outcome.rejected_pairs, 1);
    }

    #[test]
    fn single_pair_fix_is_the_intersection() {
        let target = GeoPoint::new(45.0, 7.0);
        let a = aimed("a", target, 0.0, 20_000.0, 30.0);
        let b = aimed("b", target, 90.0, 20_000.0, 20.0);

        let expected = LobIntersector::default()
            .intersect(LineOfBearing::from(&b), LineOfBearing::from(&a))
            .unwrap();
        let outcome = CycleAggregator::new(AggregationConfig::default()).aggregate(&[a, b], 42);

        let fix = outcome.fix.unwrap();
        assert_eq!(fix.time, 42);
        assert_eq!(fix.location(), expected);
        assert_eq!(outcome.mean_power, Some(25.0));
    }

    #[test]
    fn multiple_pairs_average_retained_candidates() {
        let target = GeoPoint::new(-33.9, 18.4);
        let snapshots = vec![
            aimed("a", target, 0.0, 15_000.0, 20.0),
            aimed("b", target, 120.0, 25_000.0, 40.0),
            aimed("c", target, 240.0, 35_000.0, 60.0),
        ];
        let outcome = CycleAggregator::new(AggregationConfig::default()).aggregate(&snapshots, 7);

        assert_eq!(outcome.candidates.len(), 3);
        assert!(outcome.outliers.is_empty());
        let fix = outcome.fix.unwrap();
        let n = outcome.candidates.len() as f64;
        let lat = outcome.candidates.iter().map(|c| c.location.latitude).sum::<f64>() / n;
        let lon = outcome.candidates.iter().map(|c| c.location.longitude).sum::<f64>() / n;
        assert!((fix.latitude - lat).abs() < 1e-12);
        assert!((fix.longitude - lon).abs() < 1e-12);
        // c x b carries the most power
        assert_eq!(outcome.reference, Some(2));
        assert!(geodesy::distance(fix.location(), target).unwrap() < 1_000.0);
    }

    fn split_cycle() -> Vec<ReceiverSnapshot> {
        // a/b cross near a strong emitter, c/d cross thousands of km away
        let strong = GeoPoint::new(0.0, 0.0);
        let far = GeoPoint::new(40.0, 100.0);
        vec![
            aimed("a", strong, 180.0, 20_000.0, 90.0),
            aimed("b", strong, 270.0, 20_000.0, 90.0),
            aimed("c", far, 180.0, 20_000.0, 5.0),
            aimed("d", far, 270.0, 20_000.0, 5.0),
        ]
    }

    #[test]
    fn outliers_are_detected_and_excluded_by_default() {
        let outcome =
            CycleAggregator::new(AggregationConfig::default()).aggregate(&split_cycle(), 1);

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.reference, Some(0));
        assert_eq!(outcome.outliers, vec![1]);
        assert!(outcome.outliers_excluded);
        let fix = outcome.fix.unwrap();
        assert_eq!(fix.location(), outcome.candidates[0].location);
        assert_eq!(outcome.mean_power, Some(90.0));
    }

    #[test]
    fn outliers_can_be_kept_for_reference_behavior() {
        let config = AggregationConfig {
            exclude_outliers: false,
            ..Default::default()
        };
        let outcome = CycleAggregator::new(config).aggregate(&split_cycle(), 1);

        assert_eq!(outcome.outliers, vec![1]);
        assert!(!outcome.outliers_excluded);
        let fix = outcome.fix.unwrap();
        let expected_lon = (outcome.candidates[0].location.longitude
            + outcome.candidates[1].location.longitude)
            / 2.0;
        assert!((fix.longitude - expected_lon).abs() < 1e-12);
        assert_eq!(outcome.mean_power, Some(47.5));
    }

    #[test]
    fn power_ties_keep_first_candidate_as_reference() {
        let target = GeoPoint::new(20.0, 20.0);
        let snapshots = vec![
            aimed("a", target, 0.0, 10_000.0, 30.0),
            aimed("b", target, 90.0, 10_000.0, 30.0),
            aimed("c", target, 180.0, 10_000.0, 30.0),
        ];
        let outcome = CycleAggregator::new(AggregationConfig::default()).aggregate(&snapshots, 1);
        assert_eq!(outcome.reference, Some(0));
    }

    #[test]
    fn min_power_is_ignored_unless_enforced() {
        let target = GeoPoint::new(51.0, -1.0);
        let snapshots = vec![
            aimed("a", target, 30.0, 20_000.0, 2.0),
            aimed("b", target, 150.0, 20_000.0, 50.0),
        ];

        let lenient = CycleAggregator::new(AggregationConfig::default());
        assert!(lenient.aggregate(&snapshots, 1).fix.is_some());

        let strict = CycleAggregator::new(AggregationConfig {
            enforce_min_power: true,
            ..Default::default()
        });
        let outcome = strict.aggregate(&snapshots, 1);
        assert!(outcome.fix.is_none());
        assert_eq!(outcome.qualified_receivers, 1);
    }

    #[test]
    fn confidence_must_strictly_exceed_minimum() {
        let target = GeoPoint::new(51.0, -1.0);
        let mut a = aimed("a", target, 30.0, 20_000.0, 20.0);
        let b = aimed("b", target, 150.0, 20_000.0, 20.0);
        a.confidence = 10;
        let aggregator = CycleAggregator::new(AggregationConfig::default());
        let outcome = aggregator.aggregate(&[a.clone(), b.clone()], 1);
        assert!(outcome.fix.is_none());

        a.confidence = 11;
        let outcome = aggregator.aggregate(&[a, b], 1);
        assert!(outcome.fix.is_some());
    }

    #[test]
    fn equator_scenario_lands_halfway() {
        let a = station("west", GeoPoint::new(0.0, 0.0), 90.0, 20.0, 50);
        let b = station("east", GeoPoint::new(0.0, 1.0), 270.0, 20.0, 50);

        let default_range = CycleAggregator::new(AggregationConfig::default());
        assert!(default_range.aggregate(&[a.clone(), b.clone()], 1).fix.is_none());

        let mut store = MemoryFixStore::new();
        let outcome = CycleAggregator::new(wide_config())
            .run_cycle(&[a, b], 1_234, &mut store)
            .unwrap();
        let fix = outcome.fix.unwrap();
        assert!(fix.latitude.abs() < 0.01);
        assert!((fix.longitude - 0.5).abs() < 0.01);
        assert_eq!(store.read_all().unwrap(), vec![fix]);
    }
}
