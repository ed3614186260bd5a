use std::sync::Arc;

use rupforge_config::ProbabilityCalcConfig;
use rupforge_core::PlausibilityResult::*;
use rupforge_core::{ClusterRupture, Collaborators, PlausibilityError};
use rupforge_test::{FaultNetwork, TableStiffnessCalc};

use super::*;
use crate::filter::{PlausibilityFilter, ScalarValueFilter};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// 1 runs north; 2 continues north 7 km past it; 3 heads east from just
// beyond the tip of 1. Both candidate jumps leave section 102.
fn network(slip2: f64, slip3: f64) -> FaultNetwork {
    let mut net = FaultNetwork::new();
    net.add_fault(1, 3, (0.0, 0.0), 0.0);
    net.add_fault_with(2, 3, (0.0, 17.0), 0.0, |s| s.with_slip_rate(slip2));
    net.add_fault_with(3, 3, (2.0, 15.0), 90.0, |s| s.with_slip_rate(slip3));
    net.connect(1, 2);
    net.connect(1, 3);
    net
}

fn collaborators(net: &FaultNetwork) -> Collaborators {
    Collaborators::new()
        .with_connection_strategy(Arc::new(net.connection_strategy()))
        .with_dist_az_calc(Arc::new(net.calc()))
}

fn calc(config: ProbabilityCalcConfig, collaborators: &Collaborators) -> ProbabilityCalc {
    ProbabilityCalc::new(&config, collaborators).unwrap()
}

fn one_jump(net: &FaultNetwork, to: u32) -> ClusterRupture {
    net.strand(&[(1, 0..3), (to, 0..3)])
}

#[test]
fn test_passing_ratio_conversions() {
    assert!(close(passing_ratio_to_prob(1.0), 0.5));
    assert!(close(prob_to_passing_ratio(0.5), 1.0));
    assert!(close(prob_to_passing_ratio(passing_ratio_to_prob(2.7)), 2.7));
}

#[test]
fn test_bw16_strike_slip() {
    let net = network(1.0, 1.0);
    let collab = collaborators(&net);
    let bw16 = calc(
        ProbabilityCalcConfig::BiasiWesnousky2016SSJumpProb { min_jump_dist: 1.0 },
        &collab,
    );
    let rupture = one_jump(&net, 2);
    let jump = rupture.internal_jumps()[0].clone();
    assert!(close(jump.distance, 7.0));
    // 1.89 - 0.31 * 7 is negative, so no ruptures pass
    assert_eq!(bw16.jump_probability(&rupture, &jump).unwrap(), 0.0);

    let mut short = jump.clone();
    short.distance = 3.0;
    let ratio = 1.89 - 0.31 * 3.0;
    assert!(close(bw16.jump_probability(&rupture, &short).unwrap(), ratio / (ratio + 1.0)));

    short.distance = 0.0;
    assert_eq!(bw16.jump_probability(&rupture, &short).unwrap(), 1.0);
}

#[test]
fn test_bw16_combined_mechanisms() {
    let mut net = FaultNetwork::new();
    net.add_fault_with(1, 2, (0.0, 0.0), 0.0, |s| s.with_rake(90.0));
    net.add_fault_with(2, 2, (0.0, 12.0), 0.0, |s| s.with_rake(-90.0));
    let rupture = net.strand(&[(1, 0..2), (2, 0..2)]);
    let comb = calc(
        ProbabilityCalcConfig::BiasiWesnousky2016CombJumpDistProb { min_jump_dist: 1.0 },
        &Collaborators::new(),
    );
    let p = comb.rupture_probability(&rupture, EvalMode::ShortCircuit).unwrap();
    assert!(close(p, 0.5 * (0.62 + 0.37)));
}

#[test]
fn test_shaw07() {
    let net = network(1.0, 1.0);
    let rupture = one_jump(&net, 2);
    let shaw = calc(
        ProbabilityCalcConfig::Shaw07JumpDistProb { a: 1.0, r0: 7.0 },
        &Collaborators::new(),
    );
    let p = shaw.rupture_probability(&rupture, EvalMode::ShortCircuit).unwrap();
    assert!(close(p, (-1.0f64).exp()));
    assert_eq!(shaw.name(), "Shaw07 [A=1, R0=7]");

    // a > 1 lets short jumps exceed 1
    let bad = calc(
        ProbabilityCalcConfig::Shaw07JumpDistProb { a: 3.0, r0: 7.0 },
        &Collaborators::new(),
    );
    assert!(matches!(
        bad.rupture_probability(&rupture, EvalMode::ShortCircuit),
        Err(PlausibilityError::ProbabilityOutOfRange { .. })
    ));
}

#[test]
fn test_bw17_mech_change() {
    let mut net = FaultNetwork::new();
    net.add_fault(1, 2, (0.0, 0.0), 0.0);
    net.add_fault_with(2, 2, (0.0, 12.0), 0.0, |s| s.with_rake(90.0));
    net.add_fault_with(3, 2, (0.0, 24.0), 0.0, |s| s.with_rake(95.0));
    let mech = calc(ProbabilityCalcConfig::BiasiWesnousky2017MechChangeProb, &Collaborators::new());
    let rupture = net.strand(&[(1, 0..2), (2, 0..2), (3, 0..2)]);
    let jumps = rupture.internal_jumps();
    assert!(close(mech.jump_probability(&rupture, &jumps[0]).unwrap(), 4.0 / 75.0));
    assert_eq!(mech.jump_probability(&rupture, &jumps[1]).unwrap(), 1.0);
}

#[test]
fn test_bw17_az_change() {
    let mut net = FaultNetwork::new();
    net.add_fault(1, 3, (0.0, 0.0), 0.0);
    net.add_fault(2, 3, (0.0, 17.0), 0.0);
    net.add_fault(3, 3, (1.0, 16.0), 90.0);
    let collab = collaborators(&net);
    let az = calc(
        ProbabilityCalcConfig::BiasiWesnousky2017JumpAzChangeProb {
            az_calc: Default::default(),
        },
        &collab,
    );
    let straight = net.strand(&[(1, 0..3), (2, 0..3)]);
    let p = az.rupture_probability(&straight, EvalMode::ShortCircuit).unwrap();
    assert!(close(p, passing_ratio_to_prob(2.7)));

    let turn = net.strand(&[(1, 0..3), (3, 0..3)]);
    let p = az.rupture_probability(&turn, EvalMode::ShortCircuit).unwrap();
    assert!(close(p, passing_ratio_to_prob(0.08)));

    // no section before the jump
    let from_start = net.strand(&[(1, 0..1), (2, 0..3)]);
    assert_eq!(az.rupture_probability(&from_start, EvalMode::ShortCircuit).unwrap(), 1.0);
}

#[test]
fn test_relative_slip_rate() {
    let net = network(2.0, 3.0);
    let collab = collaborators(&net);
    let rel = calc(
        ProbabilityCalcConfig::RelativeSlipRateProb { only_at_increases: false },
        &collab,
    );
    assert!(rel.is_directional());
    assert_eq!(rel.name(), "Rel Slip Rate");
    let to_best = one_jump(&net, 3);
    assert_eq!(rel.rupture_probability(&to_best, EvalMode::ShortCircuit).unwrap(), 1.0);
    let to_other = one_jump(&net, 2);
    let p = rel.rupture_probability(&to_other, EvalMode::Exhaustive).unwrap();
    assert!(close(p, 2.0 / 3.0));
}

#[test]
fn test_relative_slip_rate_only_at_increases() {
    let collab_calc = |net: &FaultNetwork| {
        calc(
            ProbabilityCalcConfig::RelativeSlipRateProb { only_at_increases: true },
            &collaborators(net),
        )
    };
    // 1 -> 2 decreases from 1 to 0.5, so the jump is not scored
    let net = network(0.5, 3.0);
    let rel = collab_calc(&net);
    assert_eq!(rel.rupture_probability(&one_jump(&net, 2), EvalMode::ShortCircuit).unwrap(), 1.0);

    // 1 -> 2 increases from 1 to 2, scored against 3
    let net = network(2.0, 3.0);
    let rel = collab_calc(&net);
    let p = rel.rupture_probability(&one_jump(&net, 2), EvalMode::ShortCircuit).unwrap();
    assert!(close(p, 2.0 / 3.0));

    let single = ClusterRupture::new(net.full_cluster(1));
    assert_eq!(rel.rupture_probability(&single, EvalMode::ShortCircuit).unwrap(), 1.0);
}

#[test]
fn test_relative_coulomb() {
    let net = network(1.0, 1.0);
    let stiffness = TableStiffnessCalc::new(0.0)
        .with_parent_pair(1, 2, 3.0)
        .with_parent_pair(1, 3, 1.0);
    let collab = collaborators(&net).with_stiffness(Arc::new(stiffness));
    let config = |relative_to_best| ProbabilityCalcConfig::RelativeCoulombProb {
        full_rupture_source: false,
        allow_negative: false,
        relative_to_best,
    };
    let sum = calc(config(false), &collab);
    let best = calc(config(true), &collab);
    assert_eq!(best.name(), "Rel CFF, Rel Best");

    // three receivers each: 9 onto fault 2, 3 onto fault 3
    let to_2 = one_jump(&net, 2);
    let to_3 = one_jump(&net, 3);
    assert!(close(sum.rupture_probability(&to_2, EvalMode::ShortCircuit).unwrap(), 0.75));
    assert!(close(sum.rupture_probability(&to_3, EvalMode::ShortCircuit).unwrap(), 0.25));
    assert_eq!(best.rupture_probability(&to_2, EvalMode::ShortCircuit).unwrap(), 1.0);
    assert!(close(best.rupture_probability(&to_3, EvalMode::ShortCircuit).unwrap(), 1.0 / 3.0));
}

fn rel_coulomb(collab: &Collaborators, full_rupture_source: bool) -> ProbabilityCalc {
    calc(
        ProbabilityCalcConfig::RelativeCoulombProb {
            full_rupture_source,
            allow_negative: false,
            relative_to_best: false,
        },
        collab,
    )
}

#[test]
fn test_relative_coulomb_negative_jump_has_zero_probability() {
    let net = network(1.0, 1.0);
    for alternative in [1.0, -2.0] {
        let stiffness = TableStiffnessCalc::new(0.0)
            .with_parent_pair(1, 2, -1.0)
            .with_parent_pair(1, 3, alternative);
        let collab = collaborators(&net).with_stiffness(Arc::new(stiffness));
        let rel = rel_coulomb(&collab, false);
        let p = rel.rupture_probability(&one_jump(&net, 2), EvalMode::ShortCircuit).unwrap();
        assert_eq!(p, 0.0, "alternative {}", alternative);

        let filter = CumulativeProbabilityFilter::new(0.01, vec![Arc::new(rel)]).unwrap();
        assert_eq!(filter.apply(&one_jump(&net, 2), EvalMode::ShortCircuit).unwrap(), FailHardStop);
    }
}

#[test]
fn test_relative_coulomb_counts_targets_already_ruptured() {
    let net = network(1.0, 1.0);
    let stiffness = TableStiffnessCalc::new(0.0)
        .with_parent_pair(1, 2, 3.0)
        .with_parent_pair(1, 3, 1.0);
    let collab = collaborators(&net).with_stiffness(Arc::new(stiffness));
    let rel = rel_coulomb(&collab, false);

    // 3 -> 102 -> 2: the jump from 102 onto 3 is still an alternative
    let rupture = net.strand(&[(3, 0..3), (1, 2..3), (2, 0..3)]);
    let jump = rupture.internal_jumps()[1].clone();
    assert_eq!(jump.from_section.id, 102);
    // one source section: 9 onto fault 2, 3 onto fault 3
    assert!(close(rel.jump_probability(&rupture, &jump).unwrap(), 0.75));
}

#[test]
fn test_relative_coulomb_continuing_along_parent() {
    let net = network(1.0, 1.0);
    let stiffness = TableStiffnessCalc::new(0.0)
        .with_parent_pair(1, 2, 3.0)
        .with_parent_pair(1, 1, 1.0);
    let collab = collaborators(&net).with_stiffness(Arc::new(stiffness));
    let rel = rel_coulomb(&collab, false);

    // leaving 101 the rupture could have continued onto 102 instead
    let c1 = net.cluster(1, 0..2);
    let rupture = ClusterRupture::new(c1.clone())
        .take(&net.jump_from(&c1, 101, &net.full_cluster(2)))
        .unwrap();
    let jump = rupture.internal_jumps()[0].clone();
    assert!(close(rel.jump_probability(&rupture, &jump).unwrap(), 0.9));
}

#[test]
fn test_relative_coulomb_full_rupture_source_includes_later_splays() {
    let mut net = network(1.0, 1.0);
    net.add_fault(4, 3, (4.0, 20.0), 90.0);
    let stiffness = TableStiffnessCalc::new(0.0)
        .with_parent_pair(1, 2, 3.0)
        .with_parent_pair(4, 2, 2.0)
        .with_parent_pair(1, 3, 1.0)
        .with_parent_pair(4, 3, 1.0);
    let collab = collaborators(&net).with_stiffness(Arc::new(stiffness));

    // splay onto 4 branches from the middle of 2, after the scored jump
    let c2 = net.full_cluster(2);
    let rupture = one_jump(&net, 2)
        .take(&net.jump_from(&c2, 201, &net.full_cluster(4)))
        .unwrap();
    assert_eq!(rupture.total_num_splays(), 1);
    let jump = rupture.internal_jumps()[0].clone();

    // sources 1 and 4: median 2.5 onto each section of 2, 1 onto each of 3
    let full = rel_coulomb(&collab, true);
    assert!(close(full.jump_probability(&rupture, &jump).unwrap(), 7.5 / 10.5));
    let from_only = rel_coulomb(&collab, false);
    assert!(close(from_only.jump_probability(&rupture, &jump).unwrap(), 0.75));
}

#[test]
fn test_relative_requires_collaborators() {
    let config = ProbabilityCalcConfig::RelativeCoulombProb {
        full_rupture_source: true,
        allow_negative: false,
        relative_to_best: false,
    };
    assert!(ProbabilityCalc::new(&config, &Collaborators::new()).is_err());
    let net = network(1.0, 1.0);
    assert!(ProbabilityCalc::new(&config, &collaborators(&net)).is_err());
}

#[test]
fn test_cumulative_probability_filter() {
    let net = network(1.0, 1.0);
    let shaw = Arc::new(calc(
        ProbabilityCalcConfig::Shaw07JumpDistProb { a: 1.0, r0: 7.0 },
        &Collaborators::new(),
    ));
    let rupture = one_jump(&net, 2);

    let pass = CumulativeProbabilityFilter::new(0.3, vec![shaw.clone()]).unwrap();
    let fail = CumulativeProbabilityFilter::new(0.4, vec![shaw.clone()]).unwrap();
    assert_eq!(pass.apply(&rupture, EvalMode::ShortCircuit).unwrap(), Pass);
    assert_eq!(fail.apply(&rupture, EvalMode::Exhaustive).unwrap(), FailHardStop);
    assert_eq!(pass.short_name(), "P(Shaw07[A=1,R0=7])≥0.3");
    assert!(!pass.is_directional(true));

    let value = pass.value(&rupture).unwrap().unwrap();
    assert!(close(value, (-1.0f64).exp()));
    assert!(pass.acceptable_range().contains(value));
    assert!(!fail.acceptable_range().contains(value));

    // single cluster ruptures have probability one
    let single = ClusterRupture::new(net.full_cluster(1));
    assert_eq!(fail.apply(&single, EvalMode::ShortCircuit).unwrap(), Pass);

    let mech = Arc::new(calc(ProbabilityCalcConfig::BiasiWesnousky2017MechChangeProb, &Collaborators::new()));
    let both = CumulativeProbabilityFilter::new(0.3, vec![shaw, mech]).unwrap();
    assert_eq!(both.short_name(), "CumProb≥0.3");
    assert_eq!(both.name(), "Cumulative Probability Filter ≥0.3");
}

#[test]
fn test_build_calcs_round_trip() {
    let net = network(1.0, 1.0);
    let collab = collaborators(&net);
    let configs = vec![
        ProbabilityCalcConfig::BiasiWesnousky2016SSJumpProb { min_jump_dist: 1.0 },
        ProbabilityCalcConfig::RelativeSlipRateProb { only_at_increases: true },
    ];
    let calcs = build_calcs(&configs, &collab).unwrap();
    let rebuilt: Vec<ProbabilityCalcConfig> = calcs.iter().map(|c| c.to_config()).collect();
    assert_eq!(rebuilt, configs);
    assert!(build_calcs(&[], &collab).is_err());
}
