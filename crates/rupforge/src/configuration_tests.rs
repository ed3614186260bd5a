use std::sync::Arc;

use rupforge_config::{
    CoulombThresholdConfig, CumulativeRakeChangeConfig, Directionality, FilterConfig,
    JumpAzimuthChangeConfig, JumpDistConfig, NumClustersConfig, ParentCoulombConfig,
    PlausibilityConfig, SplayCountConfig, SplayLengthConfig,
};
use rupforge_core::PlausibilityResult::*;
use rupforge_core::{ClusterRupture, Collaborators, Jump};
use rupforge_test::{FaultNetwork, TableStiffnessCalc};

use super::*;

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

fn collaborators(net: &FaultNetwork) -> Collaborators {
    Collaborators::new()
        .with_connection_strategy(Arc::new(net.connection_strategy()))
        .with_dist_az_calc(Arc::new(net.calc()))
        .with_stiffness(Arc::new(
            TableStiffnessCalc::new(1.0).with_parent_pair(1, 2, -1.0),
        ))
}

fn jump_dist(max_dist: f64) -> FilterConfig {
    FilterConfig::JumpDistFilter(JumpDistConfig { max_dist })
}

fn max_clusters(max_num_clusters: usize) -> FilterConfig {
    FilterConfig::NumClustersFilter(NumClustersConfig { max_num_clusters })
}

fn cluster_coulomb() -> FilterConfig {
    FilterConfig::ClusterCoulombCompatibilityFilter(CoulombThresholdConfig { threshold: 0.0 })
}

fn ruptures(net: &FaultNetwork) -> Vec<ClusterRupture> {
    vec![
        net.strand(&[(1, 0..3)]),
        net.strand(&[(1, 0..3), (2, 0..3)]),
        net.strand(&[(2, 0..3), (3, 0..3)]),
        net.strand(&[(1, 0..3), (2, 0..3), (3, 0..3)]),
    ]
}

#[test]
fn test_directional_filters_are_wrapped() {
    let net = network();
    let config = PlausibilityConfig::new(0)
        .with_filter(jump_dist(10.0))
        .with_filter(cluster_coulomb())
        .with_filter(FilterConfig::CumulativeRakeChangeFilter(
            CumulativeRakeChangeConfig { threshold: 180.0 },
        ));
    let unsplayed = PlausibilityConfiguration::from_config(&config, collaborators(&net)).unwrap();
    let names: Vec<String> = unsplayed.filters().iter().map(|f| f.short_name()).collect();
    assert_eq!(names[0], "JumpDist≤10km");
    assert!(names[1].starts_with("MultiDir["));
    assert!(!names[2].starts_with("MultiDir["));

    let splayed_config = PlausibilityConfig { max_num_splays: 1, ..config };
    let splayed =
        PlausibilityConfiguration::from_config(&splayed_config, collaborators(&net)).unwrap();
    assert!(splayed.filters()[2].short_name().starts_with("MultiDir["));
    assert!(!splayed.filters()[0].short_name().starts_with("MultiDir["));
}

#[test]
fn test_wrapping_rescues_order_dependent_failures() {
    let net = network();
    let collab = collaborators(&net);
    let rupture = net.strand(&[(1, 0..3), (2, 0..3)]);

    let raw = FilterBuilder::init(&cluster_coulomb(), &collab).unwrap();
    let unwrapped = PlausibilityConfiguration::new(vec![raw], 0, collab.clone());
    assert_eq!(unwrapped.apply(&rupture, EvalMode::ShortCircuit).unwrap(), FailHardStop);

    let config = PlausibilityConfig::new(0).with_filter(cluster_coulomb());
    let wrapped = PlausibilityConfiguration::from_config(&config, collab).unwrap();
    assert_eq!(wrapped.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
}

#[test]
fn test_filters_combine_with_and() {
    let net = network();
    let config = PlausibilityConfig::new(0)
        .with_filter(jump_dist(10.0))
        .with_filter(max_clusters(2));
    let filters = PlausibilityConfiguration::from_config(&config, collaborators(&net)).unwrap();
    let ruptures = ruptures(&net);

    assert_eq!(filters.apply(&ruptures[0], EvalMode::ShortCircuit).unwrap(), Pass);
    assert_eq!(filters.apply(&ruptures[1], EvalMode::ShortCircuit).unwrap(), Pass);
    for mode in [EvalMode::ShortCircuit, EvalMode::Exhaustive] {
        assert_eq!(filters.apply(&ruptures[3], mode).unwrap(), FailHardStop);
    }
    assert_eq!(filters.apply_each(&ruptures[3]).unwrap(), vec![Pass, FailHardStop]);

    let strict = PlausibilityConfig::new(0)
        .with_filter(jump_dist(1.0))
        .with_filter(max_clusters(2));
    let strict = PlausibilityConfiguration::from_config(&strict, collaborators(&net)).unwrap();
    assert_eq!(strict.apply_each(&ruptures[1]).unwrap(), vec![FailHardStop, Pass]);
}

// the line network plus fault 4 running east from beside the end of fault 2
fn branching_network() -> FaultNetwork {
    let mut net = network();
    net.add_fault(4, 3, (2.0, 27.5), 90.0);
    net.connect(2, 4);
    net
}

// 1 -> 2 loads negatively one way only; 2 and 4 unload each other
fn branching_collaborators(net: &FaultNetwork) -> Collaborators {
    Collaborators::new()
        .with_connection_strategy(Arc::new(net.connection_strategy()))
        .with_dist_az_calc(Arc::new(net.calc()))
        .with_stiffness(Arc::new(
            TableStiffnessCalc::new(1.0)
                .with_parent_pair(1, 2, -1.0)
                .with_parent_pair(2, 4, -1.0)
                .with_parent_pair(4, 2, -1.0),
        ))
}

fn jump_filters() -> Vec<FilterConfig> {
    vec![
        FilterConfig::GapWithinSectFilter,
        jump_dist(6.0),
        max_clusters(2),
        FilterConfig::SplayCountFilter(SplayCountConfig { max_splays: 0 }),
        FilterConfig::SplayLengthFilter(SplayLengthConfig {
            max_len: 10.0,
            is_fract_of_main: false,
            total_across_splays: false,
        }),
        FilterConfig::JumpAzimuthChangeFilter(JumpAzimuthChangeConfig {
            az_calc: Default::default(),
            threshold: 60.0,
            err_on_cant_evaluate: false,
        }),
        cluster_coulomb(),
        FilterConfig::ParentCoulombCompatibilityFilter(ParentCoulombConfig {
            threshold: 0.0,
            directionality: Directionality::Either,
        }),
    ]
}

// (rupture, jump) pairs covering strand growth, splays, reversed clusters
// and a gap within one parent
fn growth_cases(net: &FaultNetwork) -> Vec<(ClusterRupture, Jump)> {
    let c1 = net.full_cluster(1);
    let c2 = net.full_cluster(2);
    let c3 = net.full_cluster(3);
    let c4 = net.full_cluster(4);
    let one_two = net.strand(&[(1, 0..3), (2, 0..3)]);
    let splayed = one_two.take(&net.jump_from(&c2, 201, &c4)).unwrap();
    let rev2 = net.reversed_cluster(2, 0..3);
    let head = net.cluster(1, 0..1);
    vec![
        (net.strand(&[(1, 0..3)]), net.jump(&c1, &c2)),
        (net.strand(&[(2, 0..3)]), net.jump(&c2, &c3)),
        (one_two.clone(), net.jump(&c2, &c3)),
        (one_two.clone(), net.jump(&c2, &c4)),
        (one_two.clone(), net.jump_from(&c2, 201, &c4)),
        (net.strand(&[(1, 0..3), (2, 0..3), (3, 0..3)]), net.jump_from(&c2, 201, &c4)),
        (splayed, net.jump(&c2, &c3)),
        (
            net.strand_of(&[rev2.clone()]),
            net.jump(&rev2, &net.reversed_cluster(1, 0..3)),
        ),
        (net.strand_of(&[head.clone()]), net.jump(&head, &net.cluster(1, 2..3))),
    ]
}

#[test]
fn test_jump_agrees_with_grown_rupture() {
    let net = branching_network();
    let collab = branching_collaborators(&net);
    let cases = growth_cases(&net);
    let mut failures = 0;
    for config in jump_filters() {
        let raw = FilterBuilder::init(&config, &collab).unwrap();
        for filter in [raw.clone(), wrap_directional(raw, 1)] {
            for (rupture, jump) in &cases {
                if !filter.apply(rupture, EvalMode::Exhaustive).unwrap().is_pass() {
                    continue;
                }
                let grown = rupture.take(jump).unwrap();
                let whole = filter.apply(&grown, EvalMode::Exhaustive).unwrap();
                let incremental = filter.test_jump(rupture, jump, EvalMode::Exhaustive).unwrap();
                assert!(
                    incremental >= whole,
                    "{}: test_jump {} but apply {} for {}",
                    filter.short_name(),
                    incremental,
                    whole,
                    grown
                );
                if !whole.is_pass() {
                    failures += 1;
                }
            }
        }
    }
    assert!(failures > 0);
}

#[test]
fn test_jump_agrees_for_combined_configuration() {
    let net = branching_network();
    let config = jump_filters()
        .into_iter()
        .fold(PlausibilityConfig::new(1), |config, filter| config.with_filter(filter));
    let filters =
        PlausibilityConfiguration::from_config(&config, branching_collaborators(&net)).unwrap();
    for (rupture, jump) in growth_cases(&net) {
        if !filters.apply(&rupture, EvalMode::Exhaustive).unwrap().is_pass() {
            continue;
        }
        let grown = rupture.take(&jump).unwrap();
        for mode in [EvalMode::ShortCircuit, EvalMode::Exhaustive] {
            let whole = filters.apply(&grown, mode).unwrap();
            let incremental = filters.test_jump(&rupture, &jump, mode).unwrap();
            assert_eq!(incremental.is_pass(), whole.is_pass(), "{}", grown);
        }
    }
}

#[test]
fn test_parallel_evaluation_matches_sequential() {
    let net = network();
    let config = PlausibilityConfig::new(1)
        .with_filter(jump_dist(10.0))
        .with_filter(cluster_coulomb())
        .with_filter(FilterConfig::CumulativeRakeChangeFilter(
            CumulativeRakeChangeConfig { threshold: 180.0 },
        ));
    let filters = PlausibilityConfiguration::from_config(&config, collaborators(&net)).unwrap();
    let batch: Vec<ClusterRupture> = ruptures(&net).into_iter().cycle().take(40).collect();

    let expected: Vec<PlausibilityResult> = batch
        .iter()
        .map(|r| filters.apply(r, EvalMode::ShortCircuit).unwrap())
        .collect();
    let actual = filters.par_apply(&batch, EvalMode::ShortCircuit).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn test_config_round_trip_is_stable() {
    let net = network();
    let config = PlausibilityConfig::new(1)
        .with_filter(jump_dist(10.0))
        .with_filter(cluster_coulomb());
    let filters = PlausibilityConfiguration::from_config(&config, collaborators(&net)).unwrap();
    let persisted = filters.to_config();
    assert_eq!(persisted.max_num_splays, 1);
    assert!(matches!(
        persisted.filters[1],
        FilterConfig::MultiDirectionalPlausibilityFilter(_)
    ));

    let json = persisted.to_json_string().unwrap();
    let reloaded = PlausibilityConfig::from_json_str(&json).unwrap();
    let rebuilt = PlausibilityConfiguration::from_config(&reloaded, collaborators(&net)).unwrap();
    // the persisted wrapper is not wrapped a second time
    assert_eq!(rebuilt.to_config(), persisted);
    for rupture in ruptures(&net) {
        assert_eq!(
            rebuilt.apply(&rupture, EvalMode::Exhaustive).unwrap(),
            filters.apply(&rupture, EvalMode::Exhaustive).unwrap()
        );
    }
}

#[test]
fn test_load_from_file() {
    let net = network();
    let path = std::env::temp_dir().join(format!("rupforge-config-{}.json", std::process::id()));
    let config = PlausibilityConfig::new(0).with_filter(jump_dist(4.0));
    std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

    let filters = PlausibilityConfiguration::load(&path, collaborators(&net));
    std::fs::remove_file(&path).unwrap();
    let filters = filters.unwrap();
    assert_eq!(filters.max_num_splays(), 0);
    assert_eq!(
        filters
            .apply(&net.strand(&[(1, 0..3), (2, 0..3)]), EvalMode::ShortCircuit)
            .unwrap(),
        FailHardStop
    );
}

#[test]
fn test_missing_collaborator_fails_fast() {
    let config = PlausibilityConfig::new(0)
        .with_filter(jump_dist(10.0))
        .with_filter(cluster_coulomb());
    let err = PlausibilityConfiguration::from_config(&config, Collaborators::new()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let empty = PlausibilityConfiguration::from_config(&PlausibilityConfig::new(0), Collaborators::new())
        .unwrap();
    assert!(empty.is_empty());
}
