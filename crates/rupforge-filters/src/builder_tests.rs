use std::sync::Arc;

use rupforge_config::*;
use rupforge_core::Collaborators;
use rupforge_test::{FaultNetwork, TableStiffnessCalc};

use super::*;
use crate::filter::EvalMode;

fn network() -> FaultNetwork {
    let mut net = FaultNetwork::new();
    net.add_fault(1, 3, (0.0, 0.0), 0.0);
    net.add_fault(2, 3, (0.0, 17.0), 0.0);
    net.add_fault(3, 2, (0.0, 34.0), 20.0);
    net.connect(1, 2);
    net.connect(2, 3);
    net
}

fn collaborators(net: &FaultNetwork) -> Collaborators {
    Collaborators::new()
        .with_connection_strategy(Arc::new(net.connection_strategy()))
        .with_dist_az_calc(Arc::new(net.calc()))
        .with_stiffness(Arc::new(
            TableStiffnessCalc::new(1.0).with_parent_pair(1, 2, -0.5),
        ))
}

fn every_filter() -> Vec<FilterConfig> {
    let shaw = ProbabilityCalcConfig::Shaw07JumpDistProb { a: 1.0, r0: 3.0 };
    vec![
        FilterConfig::MinSectsPerParentFilter(MinSectsPerParentConfig {
            min_per_parent: 2,
            allow_if_no_direct: true,
            allow_chained: false,
        }),
        FilterConfig::ClusterAspectRatioFilter(ClusterAspectRatioConfig {
            min_aspect_ratio: 0.5,
            allow_if_no_direct: false,
            allow_chained: false,
        }),
        FilterConfig::GapWithinSectFilter,
        FilterConfig::JumpDistFilter(JumpDistConfig { max_dist: 5.0 }),
        FilterConfig::NumClustersFilter(NumClustersConfig { max_num_clusters: 2 }),
        FilterConfig::SplayCountFilter(SplayCountConfig { max_splays: 0 }),
        FilterConfig::SplayLengthFilter(SplayLengthConfig {
            max_len: 0.5,
            is_fract_of_main: true,
            total_across_splays: false,
        }),
        FilterConfig::JumpAzimuthChangeFilter(JumpAzimuthChangeConfig {
            az_calc: AzimuthCalcConfig::SimpleAzimuthCalc,
            threshold: 60.0,
            err_on_cant_evaluate: false,
        }),
        FilterConfig::TotalAzimuthChangeFilter(TotalAzimuthChangeConfig {
            az_calc: AzimuthCalcConfig::LeftLateralFlipAzimuthCalc {
                min_rake: -45.0,
                max_rake: 45.0,
            },
            threshold: 60.0,
            multi_fault_only: true,
            test_full_end: false,
        }),
        FilterConfig::CumulativeAzimuthChangeFilter(CumulativeAzimuthChangeConfig {
            az_calc: AzimuthCalcConfig::HardCodedLeftLateralFlipAzimuthCalc {
                parent_ids: vec![3],
            },
            threshold: 560.0,
        }),
        FilterConfig::CumulativeRakeChangeFilter(CumulativeRakeChangeConfig { threshold: 180.0 }),
        FilterConfig::U3CompatibleCumulativeRakeChangeFilter(CumulativeRakeChangeConfig {
            threshold: 180.0,
        }),
        FilterConfig::CumulativePenaltyFilter(CumulativePenaltyConfig {
            threshold: 2.0,
            penalties: vec![
                PenaltyConfig::JumpPenalty {
                    min_distance: 1.0,
                    value: 1.0,
                    distance_dependent: false,
                },
                PenaltyConfig::AzimuthChangePenalty {
                    az_calc: AzimuthCalcConfig::SimpleAzimuthCalc,
                    threshold: 30.0,
                    value: 1.0,
                    jumps_only: true,
                },
            ],
        }),
        FilterConfig::CumulativeProbabilityFilter(CumulativeProbabilityConfig {
            min_probability: 0.01,
            calcs: vec![
                shaw.clone(),
                ProbabilityCalcConfig::RelativeSlipRateProb {
                    only_at_increases: false,
                },
            ],
        }),
        FilterConfig::PathPlausibilityFilter(PathPlausibilityConfig {
            fract_pass_threshold: 0.0,
            logical_or: true,
            evaluators: vec![
                NucleationEvaluatorConfig::CumulativeJumpProbPathEvaluator {
                    min_probability: 0.01,
                    fail_future_possible: false,
                    calcs: vec![shaw],
                },
                NucleationEvaluatorConfig::SectCoulombPathEvaluator {
                    threshold: 0.0,
                    fail_future_possible: true,
                    jump_to_most_favorable: true,
                    max_jump_dist: 10.0,
                },
            ],
        }),
        FilterConfig::ClusterPathCoulombCompatibilityFilter(ClusterPathCoulombConfig {
            threshold: 0.0,
            fract_pass_threshold: 0.5,
        }),
        FilterConfig::SectPathCoulombCompatibilityFilter(SectPathCoulombConfig {
            threshold: 0.0,
            jump_to_most_favorable: false,
            max_jump_dist: 15.0,
            fail_future_possible: false,
        }),
        FilterConfig::ClusterCoulombCompatibilityFilter(CoulombThresholdConfig { threshold: 0.0 }),
        FilterConfig::NetClusterCoulombFilter(CoulombThresholdConfig { threshold: 0.0 }),
        FilterConfig::NetRuptureCoulombFilter(NetRuptureCoulombConfig {
            quantity: RupCoulombQuantity::MinSectCff,
            threshold: 0.0,
        }),
        FilterConfig::ParentCoulombCompatibilityFilter(ParentCoulombConfig {
            threshold: 0.0,
            directionality: Directionality::Sum,
        }),
        FilterConfig::MultiDirectionalPlausibilityFilter(MultiDirectionalConfig {
            filter: Box::new(FilterConfig::ClusterCoulombCompatibilityFilter(
                CoulombThresholdConfig { threshold: 0.0 },
            )),
            max_num_splays: 1,
        }),
    ]
}

#[test]
fn test_every_filter_preserves_its_config() {
    let net = network();
    let collab = collaborators(&net);
    let configs = every_filter();
    assert_eq!(configs.len(), 22);
    for config in configs {
        let filter = FilterBuilder::init(&config, &collab).unwrap();
        assert_eq!(filter.to_config(), config, "{}", filter.short_name());
    }
}

#[test]
fn test_json_round_trip_reproduces_results() {
    let net = network();
    let collab = collaborators(&net);
    let ruptures = [
        net.strand(&[(1, 0..3)]),
        net.strand(&[(1, 0..3), (2, 0..3)]),
        net.strand(&[(1, 1..3), (2, 0..1)]),
        net.strand(&[(1, 0..3), (2, 0..3), (3, 0..2)]),
    ];
    for config in every_filter() {
        let json = serde_json::to_string(&config).unwrap();
        let restored: FilterConfig = serde_json::from_str(&json).unwrap();
        let original = FilterBuilder::init(&config, &collab).unwrap();
        let rebuilt = FilterBuilder::init(&restored, &collab).unwrap();
        for rupture in &ruptures {
            let expected = original.apply(rupture, EvalMode::Exhaustive).unwrap();
            let actual = rebuilt.apply(rupture, EvalMode::Exhaustive).unwrap();
            assert_eq!(actual, expected, "{} on {}", original.short_name(), rupture);
        }
    }
}

#[test]
fn test_missing_collaborators_are_rejected() {
    let net = network();
    let empty = Collaborators::new();
    let jump_az = FilterConfig::JumpAzimuthChangeFilter(JumpAzimuthChangeConfig {
        az_calc: AzimuthCalcConfig::SimpleAzimuthCalc,
        threshold: 60.0,
        err_on_cant_evaluate: false,
    });
    assert!(matches!(
        FilterBuilder::init(&jump_az, &empty),
        Err(ConfigError::Invalid(_))
    ));

    let coulomb =
        FilterConfig::ClusterCoulombCompatibilityFilter(CoulombThresholdConfig { threshold: 0.0 });
    assert!(FilterBuilder::init(&coulomb, &empty).is_err());

    let parent = FilterConfig::ParentCoulombCompatibilityFilter(ParentCoulombConfig {
        threshold: 0.0,
        directionality: Directionality::Either,
    });
    let stiffness_only = Collaborators::new().with_stiffness(Arc::new(TableStiffnessCalc::new(1.0)));
    assert!(FilterBuilder::init(&parent, &stiffness_only).is_err());
    let with_strategy =
        stiffness_only.with_connection_strategy(Arc::new(net.connection_strategy()));
    assert!(FilterBuilder::init(&parent, &with_strategy).is_ok());

    // purely structural filters need nothing
    let gap = FilterBuilder::init(&FilterConfig::GapWithinSectFilter, &empty).unwrap();
    assert_eq!(gap.to_config(), FilterConfig::GapWithinSectFilter);
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let net = network();
    let collab = collaborators(&net);
    let bad = [
        FilterConfig::JumpDistFilter(JumpDistConfig { max_dist: -1.0 }),
        FilterConfig::NumClustersFilter(NumClustersConfig { max_num_clusters: 0 }),
        FilterConfig::CumulativeProbabilityFilter(CumulativeProbabilityConfig {
            min_probability: 1.5,
            calcs: vec![ProbabilityCalcConfig::BiasiWesnousky2017MechChangeProb],
        }),
        FilterConfig::PathPlausibilityFilter(PathPlausibilityConfig {
            fract_pass_threshold: 0.0,
            logical_or: false,
            evaluators: Vec::new(),
        }),
        FilterConfig::MultiDirectionalPlausibilityFilter(MultiDirectionalConfig {
            filter: Box::new(FilterConfig::MultiDirectionalPlausibilityFilter(
                MultiDirectionalConfig {
                    filter: Box::new(FilterConfig::GapWithinSectFilter),
                    max_num_splays: 0,
                },
            )),
            max_num_splays: 0,
        }),
    ];
    for config in bad {
        assert!(
            FilterBuilder::init(&config, &collab).is_err(),
            "{} accepted",
            config.class_name()
        );
    }
}

#[test]
fn test_evaluator_init() {
    let net = network();
    let collab = collaborators(&net);
    let config = NucleationEvaluatorConfig::ClusterCoulombPathEvaluator {
        threshold: 0.0,
        fail_future_possible: true,
    };
    let evaluator = FilterBuilder::init_evaluator(&config, &collab).unwrap();
    assert_eq!(evaluator.to_config(), config);
    assert!(FilterBuilder::init_evaluator(&config, &Collaborators::new()).is_err());
}
