use std::sync::Arc;

use rupforge_config::{FilterConfig, NucleationEvaluatorConfig, ProbabilityCalcConfig};
use rupforge_core::PlausibilityResult::*;
use rupforge_core::{Collaborators, FilterDataKey};
use rupforge_test::{FaultNetwork, TableStiffnessCalc};

use super::*;
use crate::probability::build_calcs;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// three faults end to end along a north-running line, 5 km gaps
fn network() -> FaultNetwork {
    let mut net = FaultNetwork::new();
    net.add_fault(1, 3, (0.0, 0.0), 0.0);
    net.add_fault(2, 3, (0.0, 15.0), 0.0);
    net.add_fault(3, 3, (0.0, 30.0), 0.0);
    net.connect(1, 2);
    net.connect(2, 3);
    net
}

// 1 loads 2 negatively, 2 loads 1 positively
fn one_way_stiffness() -> Arc<TableStiffnessCalc> {
    Arc::new(
        TableStiffnessCalc::new(1.0)
            .with_parent_pair(1, 2, -1.0)
            .with_parent_pair(2, 1, 1.0),
    )
}

fn cluster_path(stiffness: Arc<TableStiffnessCalc>, fract: f64) -> PathPlausibilityFilter {
    let evaluator = ClusterCoulombPathEvaluator::new(stiffness, 0.0, true).unwrap();
    PathPlausibilityFilter::cluster_coulomb(evaluator, fract).unwrap()
}

fn shaw_evaluator(net: &FaultNetwork, min: f64) -> CumulativeJumpProbPathEvaluator {
    let collab = Collaborators::new().with_connection_strategy(Arc::new(net.connection_strategy()));
    let calcs = build_calcs(
        &[ProbabilityCalcConfig::Shaw07JumpDistProb { a: 1.0, r0: 5.0 }],
        &collab,
    )
    .unwrap();
    CumulativeJumpProbPathEvaluator::new(min, false, calcs).unwrap()
}

#[test]
fn test_single_cluster_passes() {
    let net = network();
    let rupture = net.strand(&[(1, 0..3)]);
    let filter = cluster_path(one_way_stiffness(), 1.0);
    assert_eq!(filter.apply(&rupture, EvalMode::Exhaustive).unwrap(), Pass);
    assert_eq!(filter.value(&rupture).unwrap(), None);
}

#[test]
fn test_reverse_growth_rescues_rupture() {
    let net = network();
    let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);
    let filter = cluster_path(one_way_stiffness(), 0.0);
    let evaluator = &filter.evaluators()[0];

    // growing 1 -> 2 receives -1 on each of three sections
    let forward = evaluator
        .nucleation_value(&rupture, rupture.first_cluster(), EvalMode::Exhaustive)
        .unwrap();
    assert_eq!(forward, Some(-3.0));
    let backward = evaluator
        .nucleation_value(&rupture, rupture.last_cluster(), EvalMode::Exhaustive)
        .unwrap();
    assert_eq!(backward, Some(3.0));

    for mode in [EvalMode::ShortCircuit, EvalMode::Exhaustive] {
        assert_eq!(filter.apply(&rupture, mode).unwrap(), Pass);
    }
    assert_eq!(filter.value(&rupture).unwrap(), Some(3.0));
}

#[test]
fn test_fraction_of_paths_needed() {
    let net = network();
    let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);
    let all = cluster_path(one_way_stiffness(), 1.0);
    assert_eq!(all.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
    // the value that must pass for every path to pass is the worst one
    assert_eq!(all.value(&rupture).unwrap(), Some(-3.0));

    let half = cluster_path(one_way_stiffness(), 0.5);
    assert_eq!(half.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
    assert_eq!(half.short_name(), "HalfPaths[CFF]≥0");
    assert_eq!(half.name(), "Half Paths Cluster [CFF] ≥0");
}

#[test]
fn test_failed_nucleation_clusters_are_skipped() {
    let net = network();
    let two = net.strand(&[(1, 0..3), (2, 0..3)]);
    let c2 = net.cluster(2, 0..3);
    let c3 = net.cluster(3, 0..3);
    let jump = net.jump(&c2, &c3);

    let stiffness = one_way_stiffness();
    let filter = cluster_path(stiffness.clone(), 1.0);
    let key = FilterDataKey::new(filter.short_name());

    let tracked = two.clone().with_filter_data();
    assert_eq!(filter.apply(&tracked, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
    assert_eq!(tracked.filter_data(&key), Some([100].into_iter().collect()));

    let before = stiffness.calls();
    let grown = tracked.take(&jump).unwrap();
    assert_eq!(filter.apply(&grown, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
    let with_skips = stiffness.calls() - before;

    let before = stiffness.calls();
    let untracked = two.take(&jump).unwrap();
    assert_eq!(filter.apply(&untracked, EvalMode::ShortCircuit).unwrap(), FailFuturePossible);
    let without_skips = stiffness.calls() - before;
    assert!(with_skips < without_skips);
}

#[test]
fn test_sect_path_grows_one_section_at_a_time() {
    let net = network();
    let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);
    let stiffness = one_way_stiffness();
    let evaluator =
        SectCoulombPathEvaluator::new(stiffness.clone(), None, 0.0, false, false, 15.0).unwrap();

    let forward = evaluator
        .nucleation_value(&rupture, rupture.first_cluster(), EvalMode::ShortCircuit)
        .unwrap();
    assert_eq!(forward, Some(-1.0));
    // from 2, section 102 then 101 then 100; same-parent sources count 1
    let backward = evaluator
        .nucleation_value(&rupture, rupture.last_cluster(), EvalMode::Exhaustive)
        .unwrap();
    assert_eq!(backward, Some(1.0));

    let filter = PathPlausibilityFilter::sect_coulomb(evaluator).unwrap();
    assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
    assert_eq!(filter.short_name(), "PathSect[CFF]≥0");
    assert!(matches!(
        filter.to_config(),
        FilterConfig::SectPathCoulombCompatibilityFilter(_)
    ));
}

#[test]
fn test_sect_path_jumps_to_most_favorable_section() {
    let mut net = FaultNetwork::new();
    net.add_fault(1, 3, (0.0, 0.0), 0.0);
    net.add_fault(2, 3, (1.0, 0.0), 0.0);
    let c1 = net.cluster(1, 0..3);
    let c2 = net.cluster(2, 0..3);
    let rupture = ClusterRupture::new(c1.clone())
        .take(&net.jump(&c1, &c2))
        .unwrap();
    let stiffness = Arc::new(
        TableStiffnessCalc::new(1.0)
            .with_section_pair(100, 200, -1.0)
            .with_section_pair(101, 200, -1.0),
    );

    let direct = SectCoulombPathEvaluator::new(stiffness.clone(), None, 0.0, false, false, 2.0)
        .unwrap();
    let value = direct
        .nucleation_value(&rupture, &c1, EvalMode::Exhaustive)
        .unwrap();
    assert_eq!(value, Some(-1.0));

    let favorable = SectCoulombPathEvaluator::new(
        stiffness.clone(),
        Some(Arc::new(net.calc())),
        0.0,
        false,
        true,
        2.0,
    )
    .unwrap();
    // enters at 201, so 200 is reached with two positive sources added
    let value = favorable
        .nucleation_value(&rupture, &c1, EvalMode::Exhaustive)
        .unwrap();
    assert_eq!(value, Some(0.0));
    assert_eq!(favorable.short_name(), "SectFav2[CFF]≥0");
    assert_eq!(favorable.name(), "Sect Favorable (2km) [CFF] ≥0");

    assert!(SectCoulombPathEvaluator::new(stiffness, None, 0.0, false, true, 2.0).is_err());
}

#[test]
fn test_jump_probability_from_every_nucleation_point() {
    let net = network();
    let rupture = net.strand(&[(1, 0..3), (2, 0..3), (3, 0..3)]);
    let evaluator = shaw_evaluator(&net, 0.1);
    for nucleation in rupture.all_clusters() {
        let value = evaluator
            .nucleation_value(&rupture, nucleation, EvalMode::Exhaustive)
            .unwrap()
            .unwrap();
        // two 5 km jumps regardless of where growth started
        assert!(close(value, (-2.0f64).exp()));
    }
    assert_eq!(evaluator.short_name(), "P(Shaw07[A=1,R0=5])≥0.1");

    let filter = PathPlausibilityFilter::new(0.0, false, vec![Arc::new(evaluator)]).unwrap();
    assert_eq!(filter.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
    let strict = PathPlausibilityFilter::new(0.0, false, vec![Arc::new(shaw_evaluator(&net, 0.2))])
        .unwrap();
    assert_eq!(strict.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailHardStop);
}

#[test]
fn test_evaluators_combine_with_and_or() {
    let net = network();
    let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);
    let coulomb: Arc<dyn NucleationEvaluator> =
        Arc::new(ClusterCoulombPathEvaluator::new(one_way_stiffness(), 0.0, true).unwrap());
    // a single 5 km jump has probability e^-1 < 0.5
    let prob: Arc<dyn NucleationEvaluator> = Arc::new(shaw_evaluator(&net, 0.5));

    let and = PathPlausibilityFilter::new(0.0, false, vec![coulomb.clone(), prob.clone()]).unwrap();
    for mode in [EvalMode::ShortCircuit, EvalMode::Exhaustive] {
        assert_eq!(and.apply(&rupture, mode).unwrap(), FailHardStop);
    }
    let or = PathPlausibilityFilter::new(0.0, true, vec![coulomb, prob]).unwrap();
    for mode in [EvalMode::ShortCircuit, EvalMode::Exhaustive] {
        assert_eq!(or.apply(&rupture, mode).unwrap(), Pass);
    }
    assert_eq!(or.short_name(), "Path[2 criteria]");
    assert!(or.as_scalar().is_none());
}

#[test]
fn test_to_config_preserves_form() {
    let filter = cluster_path(one_way_stiffness(), 0.5);
    assert_eq!(
        filter.to_config(),
        FilterConfig::ClusterPathCoulombCompatibilityFilter(ClusterPathCoulombConfig {
            threshold: 0.0,
            fract_pass_threshold: 0.5,
        })
    );

    let net = network();
    let general = PathPlausibilityFilter::new(0.25, false, vec![Arc::new(shaw_evaluator(&net, 0.1))])
        .unwrap();
    let FilterConfig::PathPlausibilityFilter(config) = general.to_config() else {
        panic!("expected the general path form");
    };
    assert_eq!(config.fract_pass_threshold, 0.25);
    assert!(matches!(
        config.evaluators[0],
        NucleationEvaluatorConfig::CumulativeJumpProbPathEvaluator { .. }
    ));
    assert!(PathPlausibilityFilter::new(1.5, false, vec![Arc::new(shaw_evaluator(&net, 0.1))]).is_err());
}
