//! Monte-Carlo checks of the refusal engine against closed-form win rates,
//! plus the deterministic guarantees that hold for every single draw.

use std::collections::BTreeMap;

use pd_algo::Runner;
use pd_core::{Availability, User, UserId};

const SEED: u64 = 5_544_332_211;

fn free_users(partition: &str, prefix: &str, n: usize) -> Vec<User> {
    (0..n).map(|i| User::new(partition, format!("{prefix}{i}"))).collect()
}

fn couple(left: &str, right: &str, name: &str) -> [User; 2] {
    [
        User::new(left, format!("{name}L")).with_deps([format!("{name}R")]),
        User::new(right, format!("{name}R")).with_deps([format!("{name}L")]),
    ]
}

/// Fraction of runs in which each user got a pass.
fn win_rates(runner: &mut Runner, availabilities: &[Availability], runs: usize) -> BTreeMap<UserId, f64> {
    let mut wins: BTreeMap<UserId, usize> = BTreeMap::new();
    for id in runner.registry().iter().map(|u| u.id.clone()) {
        wins.insert(id, 0);
    }
    for _ in 0..runs {
        let solution = runner.run(availabilities).expect("run");
        for id in solution.passes.values().flatten() {
            *wins.get_mut(id).expect("winner is registered") += 1;
        }
    }
    wins.into_iter()
        .map(|(id, n)| (id, n as f64 / runs as f64))
        .collect()
}

fn assert_uniform(users: usize, passes: u32, want: f64) {
    let mut runner = Runner::seeded(free_users("TestPartition", "Free", users), SEED);
    let av = [Availability::new("TestPartition", passes)];
    for (id, p) in win_rates(&mut runner, &av, 20_000) {
        assert!(
            (p - want).abs() <= 0.02,
            "{users} users / {passes} passes: user={id} got {p}, want {want}"
        );
    }
}

#[test]
fn uniform_300_users_300_passes() {
    assert_uniform(300, 300, 1.0);
}

#[test]
fn uniform_50_users_30_passes() {
    assert_uniform(50, 30, 30.0 / 50.0);
}

#[test]
fn uniform_500_users_300_passes() {
    assert_uniform(500, 300, 300.0 / 500.0);
}

#[test]
fn uniform_500_users_30_passes() {
    assert_uniform(500, 30, 30.0 / 500.0);
}

#[test]
fn double_weight_user_wins_more_often() {
    // Six sequential refusals among eight refusal-weight-1 users and one
    // refusal-weight-0.5 user: the heavy user survives with probability
    // (8/8.5)(7/7.5)(6/6.5)(5/5.5)(4/4.5)(3/3.5) ≈ 0.5616, and the rest
    // share the remaining 3 - 0.5616 passes equally.
    let mut users = free_users("p", "n", 8);
    users.push(User::new("p", "heavy").with_weight(2.0));
    let mut runner = Runner::seeded(users, SEED);

    let survive: f64 = (3..=8).map(|j| j as f64 / (j as f64 + 0.5)).product();
    let rates = win_rates(&mut runner, &[Availability::new("p", 3)], 20_000);

    let heavy = rates[&UserId::from("heavy")];
    assert!((heavy - survive).abs() <= 0.02, "heavy: {heavy} vs {survive}");
    assert!(heavy > 0.5);

    let normal = (3.0 - survive) / 8.0;
    for (id, p) in rates.iter().filter(|(id, _)| id.as_str() != "heavy") {
        assert!((p - normal).abs() <= 0.02, "{id}: {p} vs {normal}");
    }
}

#[test]
fn dependents_never_outlive_their_dependency() {
    let mut users = free_users("A", "a", 20);
    users.extend(free_users("B", "b", 20));
    // b_i depends on a_i; "tail" depends on two B users.
    for u in users.iter_mut().filter(|u| u.partition.as_str() == "B") {
        let idx = &u.id.as_str()[1..];
        u.deps.push(UserId::new(format!("a{idx}")));
    }
    users.push(User::new("B", "tail").with_deps(["b0", "b1"]));

    let av = [Availability::new("A", 10), Availability::new("B", 15)];
    for seed in 0..200u64 {
        let mut runner = Runner::seeded(users.clone(), seed);
        let solution = runner.run(&av).unwrap();
        for u in runner.registry().iter() {
            if !solution.has_pass(&u.id) {
                continue;
            }
            for dep in &u.deps {
                assert!(solution.has_pass(dep), "seed {seed}: {} won but {dep} was refused", u.id);
            }
        }
    }
}

#[test]
fn couples_win_or_lose_together_and_terminate() {
    let mut users = free_users("lead", "L", 6);
    users.extend(free_users("follow", "F", 6));
    for i in 0..4 {
        users.extend(couple("lead", "follow", &format!("C{i}")));
    }
    let mut runner = Runner::seeded(users, SEED);
    let av = [Availability::new("lead", 5), Availability::new("follow", 5)];

    for _ in 0..2_000 {
        let solution = runner.run(&av).unwrap();
        for i in 0..4 {
            let l = solution.has_pass(&UserId::new(format!("C{i}L")));
            let r = solution.has_pass(&UserId::new(format!("C{i}R")));
            assert_eq!(l, r, "couple C{i} split");
        }
        assert!(solution.passes_for(&"lead".into()).len() <= 5);
        assert!(solution.passes_for(&"follow".into()).len() <= 5);
    }
}

#[test]
fn saturation_never_refuses() {
    let mut users = free_users("p", "u", 12);
    users.push(User::new("p", "dep").with_deps(["u3"]));
    for seed in 0..50u64 {
        let mut runner = Runner::seeded(users.clone(), seed);
        let solution = runner.run(&[Availability::new("p", 13)]).unwrap();
        assert_eq!(solution.passes_for(&"p".into()), runner.users(&"p".into()));
    }
}

#[test]
fn cross_partition_cascade_closes_dependent_partition() {
    // X is swept first and keeps nothing, so x0 goes in the first sweep and
    // takes every dependent Y user with it. Y then holds 2 users against an
    // availability of 4 and closes without drawing.
    let mut users = vec![User::new("X", "x0")];
    users.extend((0..5).map(|i| User::new("Y", format!("y{i}")).with_deps(["x0"])));
    users.extend(free_users("Y", "free", 2));
    for seed in 0..50u64 {
        let mut runner = Runner::seeded(users.clone(), seed);
        let draw = runner
            .run_detailed(&[Availability::new("X", 0), Availability::new("Y", 4)])
            .unwrap();
        assert_eq!(draw.stats.direct, 1);
        assert_eq!(draw.stats.cascaded, 5);
        let ys: Vec<&str> = draw.solution.passes_for(&"Y".into()).iter().map(UserId::as_str).collect();
        assert_eq!(ys, ["free0", "free1"]);
    }
}

#[test]
fn same_seed_same_solutions() {
    let mut users = free_users("lead", "L", 30);
    users.extend(free_users("follow", "F", 30));
    for i in 0..5 {
        users.extend(couple("lead", "follow", &format!("K{i}")));
    }
    let av = [Availability::new("lead", 12), Availability::new("follow", 14)];

    let mut a = Runner::seeded(users.clone(), 42);
    let mut b = Runner::seeded(users.iter().rev().cloned(), 42);
    for _ in 0..50 {
        assert_eq!(a.run(&av).unwrap(), b.run(&av).unwrap());
    }
}

#[test]
fn consecutive_runs_continue_the_stream() {
    let mut runner = Runner::seeded(free_users("p", "u", 40), 3);
    let av = [Availability::new("p", 10)];
    let first = runner.run(&av).unwrap();
    let words = runner.rng().words_consumed();
    let second = runner.run(&av).unwrap();
    assert!(runner.rng().words_consumed() > words);
    assert_ne!(first, second);
}

#[test]
fn vanishing_weight_still_leaves_a_random_draw() {
    // "a" is refused first almost surely; the other four share 3 passes.
    let mut users = free_users("p", "u", 4);
    users.push(User::new("p", "a").with_weight(1e-310));
    let mut runner = Runner::seeded(users, SEED);
    let rates = win_rates(&mut runner, &[Availability::new("p", 3)], 4_000);

    assert_eq!(rates[&UserId::from("a")], 0.0);
    for i in 0..4 {
        let p = rates[&UserId::new(format!("u{i}"))];
        assert!((p - 0.75).abs() <= 0.03, "u{i} got {p}");
    }
}
