//! Navigation volume baker: rasterizes a scene into a bake file.
//!
//! Usage: cargo run --release --bin bake_volume -- [OPTIONS]
//!
//! Options:
//!   --scene <PATH>     Scene JSON (volume config, obstacles, path finder settings)
//!   --out <PATH>       Bake file to write (default: <scene stem>.svon next to the scene)
//!   --from <X,Y,Z>     Optional path query start, run against the fresh bake
//!   --to <X,Y,Z>       Optional path query goal
//!   --jobs <N>         Collision query threads (default: rayon's choice)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use glam::Vec3;

use svon::core::Result;
use svon::nav::NavVolume;
use svon::storage::{BakedVolume, SceneFile, BAKED_FILE_EXTENSION};

fn main() -> ExitCode {
    svon::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(scene_path) = parse_str_arg(&args, "--scene").map(PathBuf::from) else {
        eprintln!("Usage: bake_volume --scene <PATH> [--out <PATH>] [--from X,Y,Z --to X,Y,Z] [--jobs N]");
        return ExitCode::FAILURE;
    };

    if let Some(jobs) = parse_usize_arg(&args, "--jobs") {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("Could not configure thread pool: {}", e);
        }
    }

    match run(&args, scene_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String], scene_path: PathBuf) -> Result<()> {
    let out_path = parse_str_arg(args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| scene_path.with_extension(BAKED_FILE_EXTENSION));

    let scene = SceneFile::load(&scene_path)?;
    let world = scene.world();

    println!("=== SVON Volume Baker ===");
    println!("Scene:     {}", scene_path.display());
    println!("Origin:    {:?}", scene.volume.origin);
    println!("Extent:    {:?}", scene.volume.extent);
    println!("Layers:    {}", scene.volume.num_layers());
    println!("Obstacles: {}", world.len());
    println!("Output:    {}", out_path.display());
    println!();

    let start = Instant::now();
    let mut volume = NavVolume::new(scene.volume.clone())?;
    volume.generate(&world)?;
    volume.save_baked(&out_path)?;

    let stats = volume.data().stats();
    let file_size = std::fs::metadata(&out_path)?.len();
    println!("Nodes per layer: {:?}", stats.nodes_per_layer);
    println!("Leaves:          {} ({} occupied, {} blocked voxels)",
        stats.leaf_nodes, stats.occupied_leaves, stats.blocked_leaf_voxels);
    println!("Memory:          {:.1} KB", stats.memory_bytes as f64 / 1024.0);
    println!("File:            {:.1} KB", file_size as f64 / 1024.0);
    println!("Time:            {:.2}s", start.elapsed().as_secs_f64());

    // Re-read what we wrote so a broken bake fails here rather than in the game
    BakedVolume::load_sync(&out_path)?.into_data()?;

    let from = parse_vec3_arg(args, "--from");
    let to = parse_vec3_arg(args, "--to");
    if let (Some(from), Some(to)) = (from, to) {
        let search = Instant::now();
        let path = volume.find_path_immediate(from, to, &scene.path_finder)?;
        println!();
        println!("Path {} -> {}: {} points, length {:.2} ({:.2}ms)",
            from, to, path.len(), path.length(), search.elapsed().as_secs_f64() * 1000.0);
        for point in path.points() {
            println!("  [{:8.3}, {:8.3}, {:8.3}] layer {}",
                point.location.x, point.location.y, point.location.z, point.layer);
        }
    }

    Ok(())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_vec3_arg(args: &[String], flag: &str) -> Option<Vec3> {
    let value = parse_str_arg(args, flag)?;
    let parts: Vec<f32> = value.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
    match parts.as_slice() {
        [x, y, z] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}
