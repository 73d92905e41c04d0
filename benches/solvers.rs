use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dpsolve::envs::{EnvBuilder, Inventory, InventoryConfig, KnapsackConfig};
use dpsolve::instances::KnapsackInstanceConfig;
use dpsolve::solvers::{SolverConfig, SweepMode};
use dpsolve::{evaluate_policy, policy_iteration, value_iteration, FiniteMdp, Policy};

fn inventory(capacity: u32) -> Inventory {
    InventoryConfig {
        capacity,
        ..InventoryConfig::default()
    }
    .build_env(0)
    .unwrap()
}

fn inventory_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("inventory");
    for capacity in [10, 50, 200] {
        let env = inventory(capacity);
        group.throughput(Throughput::Elements(env.states().len() as u64));

        let config = SolverConfig::default();
        group.bench_with_input(
            BenchmarkId::new("value_iteration", capacity),
            &env,
            |b, env| b.iter(|| value_iteration(env, &config).unwrap()),
        );
        let in_place = config.with_sweep(SweepMode::InPlace);
        group.bench_with_input(
            BenchmarkId::new("value_iteration_in_place", capacity),
            &env,
            |b, env| b.iter(|| value_iteration(env, &in_place).unwrap()),
        );
        group.bench_with_input(
            BenchmarkId::new("policy_iteration", capacity),
            &env,
            |b, env| b.iter(|| policy_iteration(env, &config).unwrap()),
        );
        let policy = Policy::first_admissible(&env).unwrap();
        group.bench_with_input(
            BenchmarkId::new("evaluate_policy", capacity),
            &env,
            |b, env| b.iter(|| evaluate_policy(env, &policy, &config).unwrap()),
        );
    }
    group.finish();
}

fn knapsack_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("knapsack");
    let env = KnapsackConfig::default().build_env(0).unwrap();
    group.bench_function("value_iteration_default", |b| {
        b.iter(|| value_iteration(&env, &SolverConfig::default()).unwrap())
    });
    for num_items in [10, 20, 40] {
        let env = KnapsackInstanceConfig {
            num_items,
            ..KnapsackInstanceConfig::default()
        }
        .generate(1)
        .unwrap();
        group.throughput(Throughput::Elements(env.states().len() as u64));
        group.bench_with_input(
            BenchmarkId::new("value_iteration", num_items),
            &env,
            |b, env| b.iter(|| value_iteration(env, &SolverConfig::default()).unwrap()),
        );
        group.bench_with_input(
            BenchmarkId::new("policy_iteration", num_items),
            &env,
            |b, env| b.iter(|| policy_iteration(env, &SolverConfig::default()).unwrap()),
        );
    }
    group.finish();
}

criterion_group!(benches, inventory_solvers, knapsack_solvers);
criterion_main!(benches);
