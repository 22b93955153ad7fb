// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: inspect navigation meshes and query level visibility
//!
//! Usage:
//!   sightline nav <file.nav>
//!   sightline trace <maps_dir> <level> <x1> <y1> <z1> <x2> <y2> <z2>
//!   sightline callout <maps_dir> <level> <x> <y> <z>

use anyhow::{bail, Context, Result};
use nalgebra::Point3;
use sightline_core::{NavLayout, NavMesh};
use sightline_engine::{LevelStatus, LineOfSight, MapManager};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sightline=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "nav" => {
            let [path] = positional::<1>(&args)?;
            nav_summary(Path::new(path))
        }
        "trace" => {
            let [maps_dir, level, rest @ ..] = positional::<8>(&args)?;
            let coords = parse_coords(&rest)?;
            let from = Point3::new(coords[0], coords[1], coords[2]);
            let to = Point3::new(coords[3], coords[4], coords[5]);
            trace(Path::new(maps_dir), level, from, to)
        }
        "callout" => {
            let [maps_dir, level, rest @ ..] = positional::<5>(&args)?;
            let coords = parse_coords(&rest)?;
            callout(Path::new(maps_dir), level, Point3::new(coords[0], coords[1], coords[2]))
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"sightline - level visibility tools

Usage:
  sightline nav <file.nav>
      Parse a navigation mesh and print a JSON summary
  sightline trace <maps_dir> <level> <x1> <y1> <z1> <x2> <y2> <z2>
      Load a level and test the segment between two points
  sightline callout <maps_dir> <level> <x> <y> <z>
      Name the location of a point

Environment:
  RUST_LOG    Log filter (default: info,sightline=debug)"#
    );
}

/// Exactly `N` arguments after the command name
fn positional<const N: usize>(args: &[String]) -> Result<[&str; N]> {
    let rest: Vec<&str> = args.iter().skip(2).map(String::as_str).collect();
    match <[&str; N]>::try_from(rest) {
        Ok(values) => Ok(values),
        Err(rest) => bail!("'{}' expects {} arguments, got {}", args[1], N, rest.len()),
    }
}

fn parse_coords(values: &[&str]) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|v| v.parse::<f64>().with_context(|| format!("Invalid coordinate '{}'", v)))
        .collect()
}

fn nav_summary(path: &Path) -> Result<()> {
    let nav = NavMesh::load(path).with_context(|| format!("Cannot read '{}'", path.display()))?;

    let layout = match nav.layout() {
        NavLayout::Legacy { analyzed } => serde_json::json!({
            "kind": "legacy",
            "analyzed": analyzed,
        }),
        NavLayout::Polygon {
            corner_count,
            polygon_count,
        } => serde_json::json!({
            "kind": "polygon",
            "corners": corner_count,
            "polygons": polygon_count,
        }),
    };
    let placed = nav.areas().iter().filter(|a| a.place_id != 0).count();

    let summary = serde_json::json!({
        "path": path.display().to_string(),
        "version": nav.header().version,
        "subversion": nav.header().subversion,
        "layout": layout,
        "areas": nav.areas().len(),
        "areas_with_place": placed,
        "places": nav.places(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn trace(maps_dir: &Path, level: &str, from: Point3<f64>, to: Point3<f64>) -> Result<()> {
    let manager = MapManager::new(maps_dir);
    let status = manager.load_level(level);

    let delta = to - from;
    let length = delta.norm();
    let hit = delta
        .try_normalize(f64::EPSILON)
        .and_then(|dir| manager.ray_cast(&from, &dir, length).map(|hit| (dir, hit)));

    let summary = serde_json::json!({
        "level": manager.level_name(),
        "mode": match status {
            LevelStatus::Loaded { .. } => "geometry",
            LevelStatus::Fallback => "fallback",
        },
        "triangles": match status {
            LevelStatus::Loaded { triangles } => triangles,
            LevelStatus::Fallback => 0,
        },
        "visible": manager.is_visible(&from, &to),
        "distance": length,
        "hit": hit.map(|(dir, hit)| {
            let p = hit.point(&from, &dir);
            serde_json::json!({
                "distance": hit.distance,
                "point": [p.x, p.y, p.z],
                "normal": [hit.normal.x, hit.normal.y, hit.normal.z],
            })
        }),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn callout(maps_dir: &Path, level: &str, pos: Point3<f64>) -> Result<()> {
    let manager = MapManager::new(maps_dir);
    if let LevelStatus::Fallback = manager.load_level(level) {
        bail!("No level mesh for '{}' under '{}'", level, maps_dir.display());
    }

    match manager.callout(&pos) {
        Some(name) => println!("{}", name),
        None => println!("(unnamed)"),
    }
    Ok(())
}
