//! Differential testing of the [`AabbTree`] against the [`BruteForce`] oracle, and a
//! throughput benchmark of the distance queries.
//!
//! The [`DifferentialTester`] generates random linear queries and query points inside the
//! bounding box of a tree, runs them through both implementations and reports the first
//! disagreement. Time spent in each implementation is accumulated per check in a [`Report`].
//!
//! [`AabbTree`]: ../tree/struct.AabbTree.html
//! [`BruteForce`]: ../oracle/struct.BruteForce.html

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::hint::black_box;
use std::time::{Duration, Instant};

use log::{info, warn};
use nalgebra::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::{
    BHValue, BoundingHierarchy, IntersectionAndPrimitive, PointAndPrimitive,
};
use crate::oracle::BruteForce;
use crate::point_query::PointDistance;
use crate::primitive::Primitive;
use crate::ray::{Line, LinearQuery, Ray};
use crate::shapes::{Intersection, Intersects, Segment};
use crate::tree::AabbTree;
use crate::utils::{distance_squared, fast_max, real};

/// Parameters of a differential run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifferentialConfig {
    /// Wall-clock time spent on the intersection checks, and again on the distance checks.
    pub check_duration: Duration,
    /// Number of rounds run by each family of checks even if the duration has elapsed.
    pub min_rounds: usize,
    /// Wall-clock time of [`DifferentialTester::benchmark_distance_queries`].
    pub benchmark_duration: Duration,
    /// Relative tolerance on squared distances and intersection parameters.
    pub relative_tolerance: f64,
    /// Seed of the query generator.
    pub seed: u64,
}

impl Default for DifferentialConfig {
    fn default() -> Self {
        DifferentialConfig {
            check_duration: Duration::from_millis(100),
            min_rounds: 1,
            benchmark_duration: Duration::from_secs(1),
            relative_tolerance: 1e-6,
            seed: 0,
        }
    }
}

/// The checks run by the [`DifferentialTester`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Check {
    /// `do_intersect` answers agree.
    DoIntersect,
    /// Intersection counts agree.
    NumberOfIntersectedPrimitives,
    /// Sets of intersected primitives agree.
    AllIntersectedPrimitives,
    /// The tree's any-primitive answer is one of the intersected primitives.
    AnyIntersectedPrimitive,
    /// Intersections agree primitive by primitive.
    AllIntersections,
    /// The tree's any-intersection answer is one of the intersections.
    AnyIntersection,
    /// First hits along the query are equally far.
    FirstIntersection,
    /// Closest points are equally far.
    ClosestPoint,
    /// Closest points are equally far and lie on the reported primitive.
    ClosestPointAndPrimitive,
    /// Hinted and unhinted queries of the tree are equally far.
    HintedDistance,
}

impl Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::DoIntersect => "do_intersect",
            Check::NumberOfIntersectedPrimitives => "number_of_intersected_primitives",
            Check::AllIntersectedPrimitives => "all_intersected_primitives",
            Check::AnyIntersectedPrimitive => "any_intersected_primitive",
            Check::AllIntersections => "all_intersections",
            Check::AnyIntersection => "any_intersection",
            Check::FirstIntersection => "first_intersection",
            Check::ClosestPoint => "closest_point",
            Check::ClosestPointAndPrimitive => "closest_point_and_primitive",
            Check::HintedDistance => "hinted_distance",
        };
        f.write_str(name)
    }
}

/// A disagreement found by the [`DifferentialTester`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Disagreement {
    /// The two answers differ.
    #[error("{check}: the tree answered {tree} where the reference answered {reference} for {query}")]
    Mismatch {
        /// The failed check.
        check: Check,
        /// The query, debug formatted.
        query: String,
        /// The answer of the tree, debug formatted.
        tree: String,
        /// The reference answer, debug formatted.
        reference: String,
    },
    /// Two values differ beyond the tolerance.
    #[error("{check}: {tree} and {reference} differ beyond tolerance for {query}")]
    Tolerance {
        /// The failed check.
        check: Check,
        /// The query, debug formatted.
        query: String,
        /// The value computed by the tree.
        tree: f64,
        /// The reference value.
        reference: f64,
    },
    /// A reported closest point does not lie on the reported primitive.
    #[error("{check}: {point} does not lie on primitive {id} for {query}")]
    NotOnPrimitive {
        /// The failed check.
        check: Check,
        /// The query, debug formatted.
        query: String,
        /// The reported point, debug formatted.
        point: String,
        /// The reported primitive, debug formatted.
        id: String,
    },
}

/// Accumulates the wall-clock time spent in timed calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    elapsed: Duration,
    calls: u64,
}

impl Stopwatch {
    /// Runs `f`, adding its duration to the accumulated time.
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.elapsed += start.elapsed();
        self.calls += 1;
        result
    }

    /// The accumulated time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The number of timed calls.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

/// Time spent in the tree and in the reference for one [`Check`].
///
/// The reference is the brute-force oracle, except for [`Check::HintedDistance`] where it is
/// the unhinted query of the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckTiming {
    /// Time spent in the reference.
    pub reference: Stopwatch,
    /// Time spent in the tree.
    pub tree: Stopwatch,
}

impl CheckTiming {
    /// How many times faster the tree answered than the reference.
    pub fn speedup(&self) -> f64 {
        self.reference.elapsed().as_secs_f64() / self.tree.elapsed().as_secs_f64()
    }
}

/// The timings of a differential run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    timings: BTreeMap<Check, CheckTiming>,
}

impl Report {
    /// Returns the timing of `check`, if it ran.
    pub fn timing(&self, check: Check) -> Option<&CheckTiming> {
        self.timings.get(&check)
    }

    /// Iterates over the checks that ran, with their timings.
    pub fn timings(&self) -> impl Iterator<Item = (Check, &CheckTiming)> {
        self.timings.iter().map(|(check, timing)| (*check, timing))
    }

    /// Times one call of the reference and one call of the tree for `check`.
    fn compare<R>(
        &mut self,
        check: Check,
        tree: impl FnOnce() -> R,
        reference: impl FnOnce() -> R,
    ) -> (R, R) {
        let timing = self.timings.entry(check).or_default();
        let reference = timing.reference.time(reference);
        let tree = timing.tree.time(tree);
        (tree, reference)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<34} {:>9} {:>14} {:>14} {:>9}",
            "check", "queries", "reference", "tree", "speedup"
        )?;
        for (check, timing) in &self.timings {
            writeln!(
                f,
                "{:<34} {:>9} {:>14?} {:>14?} {:>8.1}x",
                check.to_string(),
                timing.tree.calls(),
                timing.reference.elapsed(),
                timing.tree.elapsed(),
                timing.speedup()
            )?;
        }
        Ok(())
    }
}

fn by_id<T: BHValue, const D: usize, Id: Copy + Eq + Hash>(
    hits: &[IntersectionAndPrimitive<T, D, Id>],
) -> HashMap<Id, Intersection<T, D>> {
    hits.iter().map(|hit| (hit.id, hit.intersection)).collect()
}

fn mismatch(
    check: Check,
    query: &impl Debug,
    tree: &impl Debug,
    reference: &impl Debug,
) -> Disagreement {
    let disagreement = Disagreement::Mismatch {
        check,
        query: format!("{query:?}"),
        tree: format!("{tree:?}"),
        reference: format!("{reference:?}"),
    };
    warn!("{}", disagreement);
    disagreement
}

/// Cross-checks an [`AabbTree`] against a [`BruteForce`] oracle over the same primitives.
///
/// # Examples
/// ```
/// use aabb_tree::differential::{DifferentialConfig, DifferentialTester};
/// use aabb_tree::{AabbTree, Element, Segment};
/// use nalgebra::Point3;
/// use std::time::Duration;
///
/// let segments = (0..50).map(|i| {
///     let t = i as f64 * 0.1;
///     Segment::new(Point3::new(t, 0.0, t.sin()), Point3::new(t, 1.0, t.cos()))
/// });
/// let tree: AabbTree<f64, 3, _> = Element::enumerate(segments).collect();
/// let config = DifferentialConfig {
///     check_duration: Duration::ZERO,
///     min_rounds: 20,
///     ..Default::default()
/// };
///
/// let report = DifferentialTester::new(&tree, config).run().unwrap();
/// assert!(report.timings().count() > 0);
/// ```
///
/// [`AabbTree`]: ../tree/struct.AabbTree.html
/// [`BruteForce`]: ../oracle/struct.BruteForce.html
pub struct DifferentialTester<'t, T: BHValue, const D: usize, P: Primitive<T, D>> {
    tree: &'t AabbTree<T, D, P>,
    oracle: BruteForce<'t, T, D, P>,
    index_of: HashMap<P::Id, usize>,
    bounds: Aabb<T, D>,
    rng: StdRng,
    config: DifferentialConfig,
}

impl<'t, T: BHValue, const D: usize, P: Primitive<T, D>> DifferentialTester<'t, T, D, P> {
    /// Creates a tester over `tree` and an oracle over the same primitives.
    pub fn new(tree: &'t AabbTree<T, D, P>, config: DifferentialConfig) -> Self {
        let index_of = tree
            .primitives()
            .iter()
            .enumerate()
            .map(|(index, p)| (p.id(), index))
            .collect();
        let mut bounds = if tree.bbox().is_empty() {
            Aabb::with_bounds(Point::origin(), Point::from([T::one(); D]))
        } else {
            tree.bbox()
        };
        // Flat axes are widened so that two random points differ.
        let half = real::<T>(0.5);
        for axis in 0..D {
            if bounds.max[axis] - bounds.min[axis] <= T::zero() {
                bounds.min[axis] = bounds.min[axis] - half;
                bounds.max[axis] = bounds.max[axis] + half;
            }
        }
        DifferentialTester {
            tree,
            oracle: BruteForce::new(tree.primitives()),
            index_of,
            bounds,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Returns a uniformly distributed point of the bounding box of the tree.
    pub fn random_point(&mut self) -> Point<T, D> {
        let mut point = self.bounds.min;
        for axis in 0..D {
            let t = real::<T>(self.rng.random::<f64>());
            point[axis] = self.bounds.min[axis] + (self.bounds.max[axis] - self.bounds.min[axis]) * t;
        }
        point
    }

    /// Returns the reference point of a random primitive.
    fn random_hint(&mut self) -> PointAndPrimitive<T, D, P::Id> {
        let index = self.rng.random_range(0..self.tree.size());
        let primitive = &self.tree.primitives()[index];
        PointAndPrimitive::new(primitive.reference_point(), primitive.id())
    }

    /// Absolute slack added to every comparison, covering rounding at the scale of the scene.
    fn absolute_slack(&self) -> T {
        let extent = self.bounds.size().iter().fold(T::zero(), |acc, x| fast_max(acc, *x));
        let extent = fast_max(extent, T::one());
        extent * extent * T::epsilon() * real::<T>(64.0)
    }

    fn within_tolerance(&self, a: T, b: T) -> bool {
        let relative = real::<T>(self.config.relative_tolerance);
        (a - b).abs() <= relative * fast_max(a.abs(), b.abs()) + self.absolute_slack()
    }

    fn check_tolerance(
        &self,
        check: Check,
        query: &impl Debug,
        tree: T,
        reference: T,
    ) -> Result<(), Disagreement> {
        if self.within_tolerance(tree, reference) {
            return Ok(());
        }
        let disagreement = Disagreement::Tolerance {
            check,
            query: format!("{query:?}"),
            tree: tree.to_f64().unwrap_or(f64::NAN),
            reference: reference.to_f64().unwrap_or(f64::NAN),
        };
        warn!("{}", disagreement);
        Err(disagreement)
    }

    fn check_on_primitive(
        &self,
        check: Check,
        query: &Point<T, D>,
        closest: &PointAndPrimitive<T, D, P::Id>,
    ) -> Result<(), Disagreement> {
        let on_primitive = self.index_of.get(&closest.id).is_some_and(|index| {
            let datum = self.tree.primitives()[*index].datum();
            datum.distance_squared(&closest.point) <= self.absolute_slack()
        });
        if on_primitive {
            return Ok(());
        }
        let disagreement = Disagreement::NotOnPrimitive {
            check,
            query: format!("{query:?}"),
            point: format!("{:?}", closest.point),
            id: format!("{:?}", closest.id),
        };
        warn!("{}", disagreement);
        Err(disagreement)
    }

    /// Runs every intersection query family with `query` on the tree and on the oracle.
    pub fn check_intersection_queries<Q>(
        &self,
        query: &Q,
        report: &mut Report,
    ) -> Result<(), Disagreement>
    where
        Q: IntersectsAabb<T, D> + LinearQuery<T, D> + Debug,
        P::Datum: Intersects<T, D, Q>,
    {
        let (tree, oracle) = report.compare(
            Check::DoIntersect,
            || self.tree.do_intersect(query),
            || self.oracle.do_intersect(query),
        );
        if tree != oracle {
            return Err(mismatch(Check::DoIntersect, query, &tree, &oracle));
        }

        let (tree, oracle) = report.compare(
            Check::NumberOfIntersectedPrimitives,
            || self.tree.number_of_intersected_primitives(query),
            || self.oracle.number_of_intersected_primitives(query),
        );
        if tree != oracle {
            return Err(mismatch(
                Check::NumberOfIntersectedPrimitives,
                query,
                &tree,
                &oracle,
            ));
        }

        let (tree, oracle) = report.compare(
            Check::AllIntersectedPrimitives,
            || {
                let mut ids = Vec::new();
                self.tree.all_intersected_primitives(query, &mut ids);
                ids
            },
            || {
                let mut ids = Vec::new();
                self.oracle.all_intersected_primitives(query, &mut ids);
                ids
            },
        );
        let tree_set = tree.iter().copied().collect::<HashSet<_>>();
        let oracle_set = oracle.iter().copied().collect::<HashSet<_>>();
        if tree_set != oracle_set || tree.len() != tree_set.len() {
            return Err(mismatch(Check::AllIntersectedPrimitives, query, &tree, &oracle));
        }

        let (tree, oracle) = report.compare(
            Check::AnyIntersectedPrimitive,
            || self.tree.any_intersected_primitive(query),
            || self.oracle.any_intersected_primitive(query),
        );
        let valid = match tree {
            Some(id) => oracle_set.contains(&id),
            None => oracle_set.is_empty(),
        };
        if !valid {
            return Err(mismatch(Check::AnyIntersectedPrimitive, query, &tree, &oracle));
        }

        let (tree, oracle) = report.compare(
            Check::AllIntersections,
            || {
                let mut intersections = Vec::new();
                self.tree.all_intersections(query, &mut intersections);
                intersections
            },
            || {
                let mut intersections = Vec::new();
                self.oracle.all_intersections(query, &mut intersections);
                intersections
            },
        );
        let oracle_intersections = by_id(&oracle);
        if by_id(&tree) != oracle_intersections || tree.len() != oracle.len() {
            return Err(mismatch(Check::AllIntersections, query, &tree, &oracle));
        }

        let (tree, oracle) = report.compare(
            Check::AnyIntersection,
            || self.tree.any_intersection(query),
            || self.oracle.any_intersection(query),
        );
        let valid = match &tree {
            Some(hit) => oracle_intersections.get(&hit.id) == Some(&hit.intersection),
            None => oracle_intersections.is_empty(),
        };
        if !valid {
            return Err(mismatch(Check::AnyIntersection, query, &tree, &oracle));
        }

        let (tree, oracle) = report.compare(
            Check::FirstIntersection,
            || self.tree.first_intersection(query),
            || self.oracle.first_intersection(query),
        );
        match (&tree, &oracle) {
            (Some(tree_hit), Some(oracle_hit)) => self.check_tolerance(
                Check::FirstIntersection,
                query,
                tree_hit.intersection.parameter_along(query),
                oracle_hit.intersection.parameter_along(query),
            ),
            (None, None) => Ok(()),
            _ => Err(mismatch(Check::FirstIntersection, query, &tree, &oracle)),
        }
    }

    /// Runs every distance query family with a random query point.
    ///
    /// Does nothing on an empty tree, where distance queries are not defined.
    pub fn check_distance_queries(&mut self, report: &mut Report) -> Result<(), Disagreement> {
        if self.tree.is_empty() {
            return Ok(());
        }
        let query = self.random_point();
        let hint = self.random_hint();

        let (tree, oracle) = report.compare(
            Check::ClosestPoint,
            || self.tree.closest_point(&query),
            || self.oracle.closest_point(&query),
        );
        self.check_tolerance(
            Check::ClosestPoint,
            &query,
            distance_squared(&tree, &query),
            distance_squared(&oracle, &query),
        )?;

        let (tree, oracle) = report.compare(
            Check::ClosestPointAndPrimitive,
            || self.tree.closest_point_and_primitive(&query),
            || self.oracle.closest_point_and_primitive(&query),
        );
        self.check_tolerance(
            Check::ClosestPointAndPrimitive,
            &query,
            distance_squared(&tree.point, &query),
            distance_squared(&oracle.point, &query),
        )?;
        self.check_on_primitive(Check::ClosestPointAndPrimitive, &query, &tree)?;

        let (hinted, unhinted) = report.compare(
            Check::HintedDistance,
            || self.tree.closest_point_and_primitive_hinted(&query, hint),
            || self.tree.closest_point_and_primitive(&query),
        );
        self.check_tolerance(
            Check::HintedDistance,
            &query,
            distance_squared(&hinted.point, &query),
            distance_squared(&unhinted.point, &query),
        )?;
        self.check_tolerance(
            Check::HintedDistance,
            &query,
            self.tree.squared_distance_hinted(&query, hint.point),
            self.tree.squared_distance(&query),
        )
    }

    /// Runs the distance checks for the configured duration.
    pub fn run_distance_checks(&mut self, report: &mut Report) -> Result<(), Disagreement> {
        let start = Instant::now();
        let mut rounds = 0;
        while rounds < self.config.min_rounds || start.elapsed() < self.config.check_duration {
            self.check_distance_queries(report)?;
            rounds += 1;
        }
        info!("ran {} rounds of distance checks", rounds);
        Ok(())
    }

    /// Measures how many closest point queries the tree answers per second.
    ///
    /// # Panics
    ///
    /// Panics if the tree is empty.
    pub fn benchmark_distance_queries(&mut self) -> f64 {
        let start = Instant::now();
        let mut queries = 0_u64;
        while start.elapsed() < self.config.benchmark_duration {
            let query = self.random_point();
            black_box(self.tree.closest_point(&query));
            queries += 1;
        }
        let per_second = queries as f64 / start.elapsed().as_secs_f64();
        info!("{:.0} closest point queries per second", per_second);
        per_second
    }
}

impl<T: BHValue, const D: usize, P: Primitive<T, D>> DifferentialTester<'_, T, D, P>
where
    P::Datum: Intersects<T, D, Segment<T, D>>
        + Intersects<T, D, Ray<T, D>>
        + Intersects<T, D, Line<T, D>>,
{
    /// Runs the intersection checks with random segments, rays and lines through two random
    /// points of the bounding box, for the configured duration.
    pub fn run_intersection_checks(&mut self, report: &mut Report) -> Result<(), Disagreement> {
        let start = Instant::now();
        let mut rounds = 0;
        while rounds < self.config.min_rounds || start.elapsed() < self.config.check_duration {
            let a = self.random_point();
            let b = self.random_point();
            if a == b {
                continue;
            }
            self.check_intersection_queries(&Segment::new(a, b), report)?;
            self.check_intersection_queries(&Ray::through(a, b), report)?;
            self.check_intersection_queries(&Line::through(a, b), report)?;
            rounds += 1;
        }
        info!("ran {} rounds of intersection checks", rounds);
        Ok(())
    }

    /// Runs the intersection checks and then the distance checks, stopping at the first
    /// disagreement.
    pub fn run(&mut self) -> Result<Report, Disagreement> {
        let mut report = Report::default();
        self.run_intersection_checks(&mut report)?;
        self.run_distance_checks(&mut report)?;
        info!("differential run over {} primitives:\n{}", self.tree.size(), report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::differential::{Check, DifferentialConfig, DifferentialTester, Disagreement, Report};
    use crate::primitive::Element;
    use crate::ray::Ray;
    use crate::testbase::{random_triangle_soup, sphere_mesh};
    use crate::tree::AabbTree;

    fn quick_config(seed: u64) -> DifferentialConfig {
        DifferentialConfig {
            check_duration: Duration::ZERO,
            min_rounds: 200,
            benchmark_duration: Duration::from_millis(20),
            relative_tolerance: 1e-6,
            seed,
        }
    }

    #[test]
    fn test_triangle_soup_agrees_with_oracle() {
        let tree: AabbTree<f64, 3, _> = Element::enumerate(random_triangle_soup(2000, 1)).collect();
        let report = DifferentialTester::new(&tree, quick_config(1)).run().unwrap();
        for check in [
            Check::DoIntersect,
            Check::AllIntersections,
            Check::FirstIntersection,
            Check::HintedDistance,
        ] {
            assert!(report.timing(check).unwrap().tree.calls() >= 200);
        }
    }

    #[test]
    fn test_mesh_faces_and_edges_agree_with_oracle() {
        let mesh = sphere_mesh(32, 16);
        let faces = AabbTree::build(mesh.faces());
        DifferentialTester::new(&faces, quick_config(2)).run().unwrap();
        let edges = AabbTree::build(mesh.edges());
        DifferentialTester::new(&edges, quick_config(3)).run().unwrap();
    }

    #[test]
    fn test_single_precision_agrees_with_oracle() {
        let triangles = random_triangle_soup(500, 4)
            .into_iter()
            .map(|t| {
                crate::shapes::Triangle::new(t.a.cast::<f32>(), t.b.cast::<f32>(), t.c.cast::<f32>())
            })
            .collect::<Vec<_>>();
        let tree: AabbTree<f32, 3, _> = Element::enumerate(triangles).collect();
        let mut config = quick_config(4);
        config.relative_tolerance = 1e-4;
        DifferentialTester::new(&tree, config).run().unwrap();
    }

    #[test]
    fn test_empty_tree_agrees_with_oracle() {
        let tree: AabbTree<f64, 3, Element<crate::shapes::Triangle<f64>, usize>> =
            AabbTree::build(Vec::new());
        let report = DifferentialTester::new(&tree, quick_config(5)).run().unwrap();
        assert!(report.timing(Check::ClosestPoint).is_none());
        assert_eq!(report.timing(Check::DoIntersect).unwrap().tree.calls(), 600);
    }

    #[test]
    fn test_benchmark_reports_throughput() {
        let tree: AabbTree<f64, 3, _> = Element::enumerate(random_triangle_soup(1000, 6)).collect();
        let per_second = DifferentialTester::new(&tree, quick_config(6)).benchmark_distance_queries();
        assert!(per_second > 0.0);
    }

    #[test]
    /// A disagreement is reported with the failed check.
    fn test_disagreement_is_reported() {
        let triangles = random_triangle_soup(100, 7);
        let tree: AabbTree<f64, 3, _> = Element::enumerate(triangles.clone()).collect();
        // A tree missing one primitive disagrees with an oracle over all of them on a ray
        // through that primitive.
        let partial: AabbTree<f64, 3, _> = Element::enumerate(triangles.clone()).skip(1).collect();
        let tester = DifferentialTester::new(&tree, quick_config(7));
        let target = triangles[0].a + (triangles[0].b - triangles[0].a) * 0.25
            + (triangles[0].c - triangles[0].a) * 0.25;
        let ray = Ray::through(target + triangles[0].normal(), target);
        let mut report = Report::default();
        tester.check_intersection_queries(&ray, &mut report).unwrap();

        let oracle_of_partial = DifferentialTester {
            oracle: crate::oracle::BruteForce::new(tree.primitives()),
            ..DifferentialTester::new(&partial, quick_config(7))
        };
        let result = oracle_of_partial.check_intersection_queries(&ray, &mut report);
        assert!(matches!(
            result,
            Err(Disagreement::Mismatch { .. }) | Err(Disagreement::Tolerance { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        /// Arbitrary small soups agree with the oracle on queries through their bounding box.
        fn test_random_soups_agree(seed in 0u64..10_000, count in 1usize..64) {
            let tree: AabbTree<f64, 3, _> =
                Element::enumerate(random_triangle_soup(count, seed)).collect();
            let config = DifferentialConfig { min_rounds: 20, ..quick_config(seed) };
            prop_assert!(DifferentialTester::new(&tree, config).run().is_ok());
        }
    }

    #[test]
    fn test_report_lists_checks() {
        let tree: AabbTree<f64, 3, _> = Element::enumerate(random_triangle_soup(10, 8)).collect();
        let report = DifferentialTester::new(&tree, quick_config(8)).run().unwrap();
        let table = report.to_string();
        assert!(table.contains("closest_point_and_primitive"));
        assert!(table.contains("first_intersection"));
    }
}
