use criterion::{criterion_group, criterion_main, Criterion, black_box};

use svon::nav::{PathFinder, PathFinderSettings};
use svon::svo::mediator::link_from_location;
use svon::svo::{Obstacle, ObstacleSet, SvoBuilder, VolumeConfig};

use glam::Vec3;

/// Pillars and a floating sphere inside a 64m cube
fn test_world() -> ObstacleSet {
    let mut world = ObstacleSet::new();
    for i in 0..4 {
        let x = -24.0 + i as f32 * 16.0;
        world.add(Obstacle::cuboid(Vec3::new(x - 2.0, -32.0, -2.0), Vec3::new(x + 2.0, 20.0, 2.0)));
    }
    world.add(Obstacle::sphere(Vec3::new(0.0, 10.0, 16.0), 8.0));
    world
}

fn config(voxel_power: u8) -> VolumeConfig {
    VolumeConfig::new(Vec3::ZERO, Vec3::splat(32.0), voxel_power)
}

fn bench_generate_power_4(c: &mut Criterion) {
    let world = test_world();

    c.bench_function("generate_power_4", |b| {
        b.iter(|| SvoBuilder::new(black_box(config(4)), &world).build())
    });
}

fn bench_generate_power_5(c: &mut Criterion) {
    let world = test_world();

    c.bench_function("generate_power_5", |b| {
        b.iter(|| SvoBuilder::new(black_box(config(5)), &world).build())
    });
}

fn bench_find_path(c: &mut Criterion) {
    let world = test_world();
    let Ok(data) = SvoBuilder::new(config(5), &world).build() else {
        return;
    };
    let settings = PathFinderSettings::default();
    let start = Vec3::new(-30.0, 0.0, 0.0);
    let goal = Vec3::new(30.0, 0.0, 0.0);
    let (Ok(start_link), Ok(goal_link)) = (link_from_location(&data, start), link_from_location(&data, goal)) else {
        return;
    };

    c.bench_function("find_path_across_pillars", |b| {
        b.iter(|| {
            PathFinder::new(&data, &settings).find_path(
                black_box(start_link),
                black_box(goal_link),
                start,
                goal,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_generate_power_4,
    bench_generate_power_5,
    bench_find_path,
);

criterion_main!(benches);
