//! Iterative ring growth.
//!
//! Every active city is buffered with the radii of the current
//! [`RoundState`], its newest ring is sampled and classified, and the
//! active set is partitioned into cities that finished this round and
//! cities that carry on. Rings are always rebuilt from the original
//! point, never from the previous ring. Growth stops when no city is
//! left or when the round cap is reached, in which case every remaining
//! city is finished with its last ring.

use geotargeting_density::DensitySampler;
use geotargeting_urban_models::{
    City, Classification, DensityStats, FinishReason, GrowthConfig, RoundState, Thresholds,
    UrbanArea,
};

use crate::classify::classify_with_rule;
use crate::progress::ProgressCallback;
use crate::ring::{Ring, build_rings};

/// A city that is still growing after a round, with the area it would be
/// frozen as if growth stopped now.
#[derive(Debug, Clone)]
pub struct Survivor {
    /// The original city.
    pub city: City,
    /// The city's geometry and densities as of this round.
    pub latest: UrbanArea,
}

impl Survivor {
    /// Freezes the survivor at its latest ring because the round cap was
    /// reached.
    #[must_use]
    pub fn force_finish(self) -> UrbanArea {
        UrbanArea {
            reason: FinishReason::RoundCap,
            ..self.latest
        }
    }
}

/// Result of one growth round.
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    /// Cities classified finished this round.
    pub finished: Vec<UrbanArea>,
    /// Cities that keep growing.
    pub survivors: Vec<Survivor>,
}

/// Result of a full growth run.
#[derive(Debug, Clone, Default)]
pub struct Growth {
    /// Finished areas in the order they finished, after the minimum
    /// radius filter.
    pub areas: Vec<UrbanArea>,
    /// Number of rounds performed, including the initial one.
    pub rounds: u32,
    /// Number of cities finished by the round cap (before filtering).
    pub capped: usize,
    /// Number of areas dropped by the minimum radius filter.
    pub dropped_small: usize,
}

fn freeze(city: &City, ring: Ring, stats: &DensityStats, round: &RoundState) -> UrbanArea {
    UrbanArea {
        name: city.name.clone(),
        location: city.location,
        geometry: ring.disc,
        rad: round.rad_km(),
        max_density: stats.max,
        mean_density: stats.mean,
        overlap_population: 0,
        round: round.index,
        reason: FinishReason::Density,
    }
}

/// Runs a single round for `active` cities.
///
/// Rings for every city are built and sampled as one batch, then each
/// city is classified independently.
#[must_use]
pub fn run_round(
    active: &[City],
    round: &RoundState,
    sampler: &dyn DensitySampler,
    thresholds: &Thresholds,
    config: &GrowthConfig,
) -> RoundOutcome {
    let locations: Vec<_> = active.iter().map(|city| city.location).collect();
    let rings = build_rings(&locations, round, config.buffer_segments);

    let annuli: Vec<_> = rings.iter().map(|ring| ring.annulus.clone()).collect();
    let stats = sampler.stats(&annuli);

    let mut outcome = RoundOutcome::default();

    for ((city, ring), stats) in active.iter().zip(rings).zip(stats) {
        let area = freeze(city, ring, &stats, round);

        match classify_with_rule(&stats, thresholds, config.finish_rule) {
            Classification::Finished => {
                log::debug!(
                    "{} finished at {} km (mean {:.2}, max {:.2})",
                    city.name,
                    area.rad,
                    stats.mean,
                    stats.max
                );
                outcome.finished.push(area);
            }
            Classification::Continue => outcome.survivors.push(Survivor {
                city: city.clone(),
                latest: area,
            }),
        }
    }

    outcome
}

/// Grows every city until it finishes or the round cap is reached, then
/// drops areas smaller than `config.min_rad_km`.
#[must_use]
pub fn grow(
    cities: &[City],
    sampler: &dyn DensitySampler,
    thresholds: &Thresholds,
    config: &GrowthConfig,
    progress: &dyn ProgressCallback,
) -> Growth {
    progress.set_total(u64::from(config.max_rounds));

    let mut finished: Vec<UrbanArea> = Vec::new();
    let mut active: Vec<City> = cities.to_vec();
    let mut round = RoundState::initial(config.step_m);
    let mut capped = 0;

    while !active.is_empty() && config.max_rounds > 0 {
        log::info!(
            "Round {}: {} active cities, rings {}-{} m",
            round.index,
            active.len(),
            round.inner_m,
            round.outer_m
        );
        progress.set_message(format!("Round {} ({} active)", round.index, active.len()));

        let outcome = run_round(&active, &round, sampler, thresholds, config);
        finished.extend(outcome.finished);
        progress.inc(1);

        if round.index + 1 >= config.max_rounds {
            capped = outcome.survivors.len();
            if capped > 0 {
                log::info!(
                    "Round cap reached: finishing {capped} cities at {} km",
                    round.rad_km()
                );
            }
            finished.extend(outcome.survivors.into_iter().map(Survivor::force_finish));
            round = round.next(config.step_m);
            break;
        }

        active = outcome
            .survivors
            .into_iter()
            .map(|survivor| survivor.city)
            .collect();
        round = round.next(config.step_m);
    }

    let total = finished.len();
    let areas = filter_min_radius(finished, config.min_rad_km);
    let dropped_small = total - areas.len();

    progress.finish(format!("{} urban areas after {} rounds", areas.len(), round.index));
    log::info!(
        "Growth finished after {} rounds: {} areas kept, {dropped_small} below {} km dropped",
        round.index,
        areas.len(),
        config.min_rad_km
    );

    Growth {
        areas,
        rounds: round.index,
        capped,
        dropped_small,
    }
}

/// Keeps only areas whose radius is at least `min_rad_km`.
#[must_use]
pub fn filter_min_radius(areas: Vec<UrbanArea>, min_rad_km: f64) -> Vec<UrbanArea> {
    areas
        .into_iter()
        .filter(|area| area.rad >= min_rad_km)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use geo::{MultiPolygon, Point};
    use geotargeting_spatial::projection;
    use geotargeting_urban_models::FinishRule;

    use crate::progress::NullProgress;

    /// Sampler that answers from a function of (call index, polygon index)
    /// and records the outer radius of every ring it is asked about.
    struct ScriptedSampler<F: Fn(usize, usize) -> DensityStats> {
        script: F,
        calls: RefCell<Vec<Vec<f64>>>,
        centers: Vec<Point<f64>>,
    }

    impl<F: Fn(usize, usize) -> DensityStats> ScriptedSampler<F> {
        fn new(centers: Vec<Point<f64>>, script: F) -> Self {
            Self {
                script,
                calls: RefCell::new(Vec::new()),
                centers,
            }
        }

        /// Outer radius (m) of a ring, measured from the nearest city center.
        fn outer_radius(&self, polygon: &MultiPolygon<f64>) -> f64 {
            let projected = projection::project(polygon);
            let Some(first) = projected.0.first() else {
                return 0.0;
            };
            let vertex = first.exterior().0[0];
            self.centers
                .iter()
                .map(|center| {
                    let c = projection::to_mercator((*center).into());
                    (vertex.x - c.x).hypot(vertex.y - c.y)
                })
                .fold(f64::INFINITY, f64::min)
        }
    }

    impl<F: Fn(usize, usize) -> DensityStats> DensitySampler for ScriptedSampler<F> {
        fn stats(&self, polygons: &[MultiPolygon<f64>]) -> Vec<DensityStats> {
            let call = self.calls.borrow().len();
            let radii = polygons.iter().map(|p| self.outer_radius(p)).collect();
            self.calls.borrow_mut().push(radii);
            (0..polygons.len()).map(|i| (self.script)(call, i)).collect()
        }

        fn total(&self) -> f64 {
            0.0
        }
    }

    fn density(mean: f64, max: f64) -> DensityStats {
        DensityStats {
            max,
            mean,
            sum: mean,
            count: 1,
        }
    }

    fn city(name: &str, lon: f64, lat: f64) -> City {
        City {
            name: name.to_string(),
            place: "city".to_string(),
            location: Point::new(lon, lat),
        }
    }

    const LIMITS: Thresholds = Thresholds {
        mean: 100.0,
        max: 1000.0,
    };

    fn config(min_rad_km: f64) -> GrowthConfig {
        GrowthConfig {
            min_rad_km,
            ..GrowthConfig::default()
        }
    }

    #[test]
    fn sparse_city_is_force_finished_at_ten_km() {
        let cities = vec![city("Lonely", 36.0, -1.0)];
        let sampler = ScriptedSampler::new(vec![cities[0].location], |_, _| density(1.0, 2.0));

        let growth = grow(&cities, &sampler, &LIMITS, &config(2.0), &NullProgress);

        assert_eq!(growth.areas.len(), 1);
        let area = &growth.areas[0];
        assert!((area.rad - 10.0).abs() < f64::EPSILON, "rad was {}", area.rad);
        assert_eq!(area.reason, FinishReason::RoundCap);
        assert_eq!(area.round, 9);
        assert_eq!(growth.rounds, 10);
        assert_eq!(growth.capped, 1);
    }

    #[test]
    fn dense_city_finishes_at_round_zero_and_is_filtered() {
        let cities = vec![city("Dense", 36.0, -1.0)];
        let sampler = ScriptedSampler::new(vec![cities[0].location], |_, _| density(500.0, 10.0));

        let growth = grow(&cities, &sampler, &LIMITS, &config(2.0), &NullProgress);

        assert!(growth.areas.is_empty());
        assert_eq!(growth.dropped_small, 1);
        assert_eq!(sampler.calls.borrow().len(), 1);
    }

    #[test]
    fn dense_city_survives_filter_when_minimum_allows() {
        let cities = vec![city("Dense", 36.0, -1.0)];
        let sampler = ScriptedSampler::new(vec![cities[0].location], |_, _| density(500.0, 10.0));

        let growth = grow(&cities, &sampler, &LIMITS, &config(1.0), &NullProgress);

        assert_eq!(growth.areas.len(), 1);
        assert!((growth.areas[0].rad - 1.0).abs() < f64::EPSILON);
        assert_eq!(growth.areas[0].reason, FinishReason::Density);
        assert!((growth.areas[0].mean_density - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn outer_radius_matches_round_index() {
        let cities = vec![city("A", 10.0, 10.0), city("B", 20.0, -20.0)];
        let centers = cities.iter().map(|c| c.location).collect();
        let sampler = ScriptedSampler::new(centers, |_, _| density(0.0, 0.0));

        let _ = grow(&cities, &sampler, &LIMITS, &config(0.0), &NullProgress);

        let calls = sampler.calls.borrow();
        assert_eq!(calls.len(), 10);
        for (i, radii) in calls.iter().enumerate() {
            let expected = 1000.0 * (i as f64 + 1.0);
            for radius in radii {
                assert!(
                    (radius - expected).abs() < 1e-2,
                    "round {i}: expected {expected} m, got {radius} m"
                );
            }
        }
    }

    #[test]
    fn finished_cities_leave_the_active_set() {
        // "Early" finishes on round 2; "Late" never finishes.
        let cities = vec![city("Early", 0.0, 0.0), city("Late", 5.0, 5.0)];
        let centers = cities.iter().map(|c| c.location).collect();
        let sampler = ScriptedSampler::new(centers, |call, i| {
            if call == 2 && i == 0 {
                density(500.0, 0.0)
            } else {
                density(0.0, 0.0)
            }
        });

        let growth = grow(&cities, &sampler, &LIMITS, &config(0.0), &NullProgress);

        let calls = sampler.calls.borrow();
        assert_eq!(calls[2].len(), 2);
        assert_eq!(calls[3].len(), 1, "finished city was sampled again");
        assert!(calls[3..].iter().all(|radii| radii.len() == 1));

        let early = growth
            .areas
            .iter()
            .find(|a| a.name == "Early")
            .expect("early area");
        assert!((early.rad - 3.0).abs() < f64::EPSILON);
        assert_eq!(early.round, 2);
        assert_eq!(growth.areas.len(), 2);
        assert_eq!(growth.areas[0].name, "Early", "areas keep finishing order");
    }

    #[test]
    fn never_exceeds_round_cap() {
        let cities: Vec<City> = (0..5)
            .map(|i| city(&format!("C{i}"), f64::from(i), 0.0))
            .collect();
        let centers = cities.iter().map(|c| c.location).collect();
        let sampler = ScriptedSampler::new(centers, |_, _| density(0.0, 0.0));
        let config = GrowthConfig {
            max_rounds: 4,
            min_rad_km: 0.0,
            ..GrowthConfig::default()
        };

        let growth = grow(&cities, &sampler, &LIMITS, &config, &NullProgress);

        assert_eq!(sampler.calls.borrow().len(), 4);
        assert_eq!(growth.areas.len(), 5);
        assert!(growth.areas.iter().all(|a| (a.rad - 4.0).abs() < f64::EPSILON));
    }

    #[test]
    fn empty_input_performs_no_rounds() {
        let sampler = ScriptedSampler::new(vec![], |_, _| density(0.0, 0.0));
        let growth = grow(&[], &sampler, &LIMITS, &config(2.0), &NullProgress);
        assert!(growth.areas.is_empty());
        assert_eq!(growth.rounds, 0);
        assert!(sampler.calls.borrow().is_empty());
    }

    #[test]
    fn sparse_rule_grows_until_density_drops() {
        // Dense for the first three rings, then empty.
        let cities = vec![city("Core", 36.0, -1.0)];
        let sampler = ScriptedSampler::new(vec![cities[0].location], |call, _| {
            if call < 3 {
                density(500.0, 5000.0)
            } else {
                density(0.0, 0.0)
            }
        });
        let config = GrowthConfig {
            finish_rule: FinishRule::Sparse,
            ..config(2.0)
        };

        let growth = grow(&cities, &sampler, &LIMITS, &config, &NullProgress);

        assert_eq!(growth.areas.len(), 1);
        assert!((growth.areas[0].rad - 4.0).abs() < f64::EPSILON);
        assert_eq!(growth.areas[0].reason, FinishReason::Density);
    }

    #[test]
    fn finished_geometry_is_the_outer_disc() {
        let cities = vec![city("Dense", 0.0, 0.0)];
        let sampler = ScriptedSampler::new(vec![cities[0].location], |call, _| {
            if call == 1 {
                density(500.0, 0.0)
            } else {
                density(0.0, 0.0)
            }
        });

        let growth = grow(&cities, &sampler, &LIMITS, &config(0.0), &NullProgress);

        let area = &growth.areas[0];
        assert!(area.geometry.interiors().is_empty());
        let vertex = area.geometry.exterior().0[0];
        assert!((vertex.x.hypot(vertex.y) - 2000.0).abs() < 1e-6);
    }
}
