//! Trace demo
//!
//! Builds a posed crate, sweeps a few boxes and rays at it and logs what
//! they hit. Pass a TOML or RON collision config as the first argument to
//! override the defaults.

use mesh_collision::config::ConfigError;
use mesh_collision::prelude::*;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Collision(#[from] CollisionError),
}

struct Probe {
    label: &'static str,
    start: Vec3,
    end: Vec3,
    half_extents: Vec3,
}

fn load_config() -> Result<CollisionConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading collision config from {}", path);
            Ok(CollisionConfig::load_from_file(&path)?)
        }
        None => Ok(CollisionConfig::default()),
    }
}

fn log_trace(label: &str, trace: &TraceResult) {
    if trace.allsolid {
        log::info!("{:<14} all solid at {:?}", label, trace.endpos);
    } else if trace.hit() {
        log::info!(
            "{:<14} fraction {:.4} endpos ({:.3}, {:.3}, {:.3}) normal ({:.3}, {:.3}, {:.3}){}",
            label,
            trace.fraction,
            trace.endpos.x,
            trace.endpos.y,
            trace.endpos.z,
            trace.plane_normal.x,
            trace.plane_normal.y,
            trace.plane_normal.z,
            if trace.startsolid { " [startsolid]" } else { "" }
        );
    } else {
        log::info!("{:<14} clear", label);
    }
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    let mut system = MeshCollisionSystem::new(config)?;

    let crate_pose = Pose::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 30.0, 0.0));
    let crate_entity = system.register_entity(Box::new(
        StaticTriangleSource::cuboid(Vec3::new(2.0, 1.0, 1.0)).with_pose(crate_pose),
    ));

    let probes = [
        Probe {
            label: "drop",
            start: Vec3::new(0.5, 0.2, 8.0),
            end: Vec3::new(0.5, 0.2, -8.0),
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        },
        Probe {
            label: "ray",
            start: Vec3::new(-10.0, 0.1, 1.0),
            end: Vec3::new(10.0, 0.1, 1.0),
            half_extents: Vec3::zeros(),
        },
        Probe {
            label: "overhead",
            start: Vec3::new(-10.0, 0.0, 6.0),
            end: Vec3::new(10.0, 0.0, 6.0),
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        },
        Probe {
            label: "inside wall",
            start: Vec3::new(0.0, 0.0, 1.95),
            end: Vec3::new(0.0, 0.0, 5.0),
            half_extents: Vec3::zeros(),
        },
    ];

    for probe in &probes {
        let trace = system.sweep_test(
            crate_entity,
            probe.start,
            -probe.half_extents,
            probe.half_extents,
            probe.end,
        );
        log_trace(probe.label, &trace);
    }

    // Moving the crate forces exactly one rebuild
    system.set_pose(crate_entity, Pose::new(Vec3::new(0.0, 0.0, -3.0), crate_pose.angles));
    let probe = &probes[0];
    let trace = system.sweep_test(crate_entity, probe.start, -probe.half_extents, probe.half_extents, probe.end);
    log_trace("drop (moved)", &trace);

    if let Some(mesh) = system.mesh(crate_entity) {
        let stats = mesh.stats();
        log::info!(
            "Mesh '{}': {} facets, {} planes ({} requested), {} area nodes, ~{} bytes",
            mesh.name(),
            stats.facets,
            stats.planes,
            stats.plane_requests,
            stats.area_nodes,
            stats.memory_bytes
        );
    }

    let cache = system.stats();
    log::info!(
        "Cache: {} hits, {} rebuilds, {} empty",
        cache.hits,
        cache.rebuilds,
        cache.empty_meshes
    );

    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Starting trace demo");

    if let Err(err) = run() {
        log::error!("Trace demo failed: {}", err);
        std::process::exit(1);
    }
}
