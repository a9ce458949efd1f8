use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

use orbitsim::config::ClusterConfig;
use orbitsim::physics::galaxy::RingGalaxy;
use orbitsim::physics::initial_conditions::InitialConditions;
use orbitsim::physics::integrators::Leapfrog;
use orbitsim::physics::system::{System, UpdateScheme};

/// A ring galaxy whose ring particles are given random masses so every pair
/// interacts
fn massive_galaxy(rings: usize, seed: u64) -> System {
    let config = ClusterConfig {
        name: "bench".to_string(),
        masses: vec![1.0],
        use_background: Some(false),
        initial_conditions: InitialConditions::RingGalaxy(RingGalaxy {
            rings,
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut system = System::from_config(&[config]).expect("valid benchmark galaxy");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for index in 1..system.n_bodies() {
        if let Some(body) = system.body_mut(index) {
            body.mass = rng.random_range(1e-4..1e-3);
        }
    }
    system.reset();
    system
}

fn bench_accelerations(c: &mut Criterion) {
    let mut group = c.benchmark_group("accelerations");

    for rings in [2, 5, 10] {
        let system = massive_galaxy(rings, 42);
        let count = system.n_bodies();

        group.bench_with_input(BenchmarkId::new("bodies", count), &system, |b, system| {
            b.iter(|| {
                for index in 0..system.n_bodies() {
                    black_box(system.acceleration(black_box(index)));
                }
            });
        });
    }

    group.finish();
}

fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for scheme in [UpdateScheme::Sequential, UpdateScheme::Synchronous] {
        for rings in [2, 5] {
            let system = massive_galaxy(rings, 42);
            let count = system.n_bodies();

            group.bench_with_input(
                BenchmarkId::new(scheme.name(), count),
                &system,
                |b, system| {
                    let mut system = system.clone();
                    b.iter(|| {
                        system.step(&Leapfrog, black_box(0.01), scheme);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_accelerations, bench_steps);
criterion_main!(benches);
