use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use sfc::continuation::{ContinuationManager, Measured};
use sfc::inflate::SeparatingInflator;
use sfc::obstacles::Pose2;
use sfc::occupancy::{OccupancyGrid, OccupancySource};
use sfc::optimizer::HermiteOptimizer;
use sfc::path::GridAstar;
use sfc::planner::{InputSnapshot, Planner, PlannerCfg};
use sfc::{BoundaryState, Corridor, Point, Trajectory};
use std::path::PathBuf;
use tracing_subscriber::fmt::SubscriberBuilder;

mod io;
mod provenance;

#[derive(Parser)]
#[command(name = "sfc")]
#[command(about = "Safe flight corridor planning runner")]
struct Cmd {
    /// Optional run label; propagated to outputs and logs
    #[arg(long)]
    label: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Build, simplify and optimize a corridor along a path CSV
    Plan(PlanArgs),
    /// Run replanning cycles on an ASCII occupancy map
    Grid(GridArgs),
    /// Print a small provenance JSON block with the default config
    Report,
}

#[derive(Args, Debug, Clone)]
struct PlanArgs {
    /// Reference path CSV with columns x,y[,z]
    #[arg(long)]
    path: PathBuf,
    /// Obstacle CSV with columns x,y[,z]
    #[arg(long)]
    obstacles: Option<PathBuf>,
    /// Planner config JSON; missing keys use defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Map extents `xmin,ymin,zmin,xmax,ymax,zmax`; inferred when absent
    #[arg(long, value_parser = parse_bounds)]
    bounds: Option<[f64; 6]>,
    /// Output JSON
    #[arg(long)]
    out: PathBuf,
    /// Optional trajectory samples (.csv or .parquet)
    #[arg(long)]
    samples: Option<PathBuf>,
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
}

#[derive(Args, Debug, Clone)]
struct GridArgs {
    /// ASCII map, `#` occupied and `.` free, first line is the top row
    #[arg(long)]
    map: PathBuf,
    #[arg(long, default_value_t = 1.0)]
    resolution: f64,
    /// Map origin `x,y`
    #[arg(long, value_parser = parse_xy, default_value = "0,0")]
    origin: [f64; 2],
    #[arg(long, value_parser = parse_xy)]
    start: [f64; 2],
    #[arg(long, value_parser = parse_xy)]
    goal: [f64; 2],
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of replanning cycles; the vehicle follows the committed trajectory between them
    #[arg(long, default_value_t = 1)]
    cycles: usize,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    samples: Option<PathBuf>,
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let vals: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<_, _>>()?;
    vals.try_into()
        .map_err(|v: Vec<f64>| format!("expected {N} comma-separated numbers, got {}", v.len()))
}

fn parse_xy(s: &str) -> Result<[f64; 2], String> {
    parse_floats::<2>(s)
}

fn parse_bounds(s: &str) -> Result<[f64; 6], String> {
    parse_floats::<6>(s)
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Plan(args) => plan(&args, cmd.label).map(|_| ()),
        Action::Grid(args) => grid(&args, cmd.label).map(|_| ()),
        Action::Report => report(cmd.label),
    }
}

#[derive(Serialize)]
struct PlanOutput {
    label: Option<String>,
    path: Vec<Point>,
    raw_regions: usize,
    corridor: Corridor,
    trajectory: Trajectory,
    cost: f64,
    duration: f64,
}

/// Map extents around the inputs, padded by the cover window. Planar inputs
/// get the configured z-slab.
fn infer_bounds(points: &[Point], cfg: &PlannerCfg) -> (Point, Point) {
    let pad = cfg.cover.half_window;
    let mut lo = Point::repeat(f64::INFINITY);
    let mut hi = Point::repeat(f64::NEG_INFINITY);
    for p in points {
        lo = lo.inf(p);
        hi = hi.sup(p);
    }
    lo.add_scalar_mut(-pad);
    hi.add_scalar_mut(pad);
    if points.iter().all(|p| p.z == 0.0) {
        lo.z = -cfg.slab_half_height;
        hi.z = cfg.slab_half_height;
    }
    (lo, hi)
}

fn plan(args: &PlanArgs, label: Option<String>) -> Result<PlanOutput> {
    tracing::info!(path = %args.path.display(), label = ?label, "plan");
    let cfg = io::load_config(args.config.as_deref())?;
    let path = io::read_points_csv(&args.path)?;
    let obstacles = match &args.obstacles {
        Some(p) => io::read_points_csv(p)?,
        None => Vec::new(),
    };
    let (Some(&start), Some(&goal)) = (path.first(), path.last()) else {
        return Err(anyhow!("path {} has no rows", args.path.display()));
    };
    let (low, high) = match args.bounds {
        Some(b) => (Point::new(b[0], b[1], b[2]), Point::new(b[3], b[4], b[5])),
        None => {
            let all: Vec<Point> = path.iter().chain(&obstacles).copied().collect();
            infer_bounds(&all, &cfg)
        }
    };

    let raw = cfg
        .cover_mode
        .build(&path, &obstacles, &low, &high, &cfg.cover, &SeparatingInflator::default())
        .context("building corridor")?;
    let corridor = cfg.simplifier.apply(&raw, cfg.overlap_tol, &cfg.cover.geom);
    tracing::info!(raw = raw.len(), kept = corridor.len(), "corridor");

    let optimizer = HermiteOptimizer { geom: cfg.cover.geom };
    let mut manager = ContinuationManager::new(cfg.continuation);
    let measured = Measured { pos: start, vel: None };
    let splice = manager
        .replan(&optimizer, &measured, &BoundaryState::at_rest(goal), &corridor, &cfg.optimizer, 0.0)
        .context("optimizing trajectory")?;
    let trajectory = manager
        .committed()
        .cloned()
        .ok_or_else(|| anyhow!("no trajectory committed"))?;

    let output = PlanOutput {
        label: label.clone(),
        path,
        raw_regions: raw.len(),
        duration: trajectory.total_duration(),
        corridor,
        trajectory,
        cost: splice.cost,
    };
    io::write_json(&args.out, &output)?;
    let mut outputs = vec![args.out.clone()];
    if let Some(samples) = &args.samples {
        io::write_samples(samples, &output.trajectory.sample(args.dt))?;
        outputs.push(samples.clone());
    }
    for artifact in &outputs {
        let mut payload = provenance::Payload::new("plan", json!({
            "label": label,
            "bounds": [low.as_slice(), high.as_slice()],
            "dt": args.dt,
            "config": cfg,
        }))
        .with_input(&args.path);
        if let Some(obs) = &args.obstacles {
            payload = payload.with_input(obs);
        }
        provenance::write_sidecar(artifact, payload)?;
    }
    Ok(output)
}

#[derive(Serialize)]
struct CycleSummary {
    now: f64,
    ok: bool,
    error: Option<String>,
    path_len: usize,
    raw_regions: usize,
    regions: usize,
    kept_pieces: usize,
    new_pieces: usize,
}

#[derive(Serialize)]
struct GridOutput {
    label: Option<String>,
    cycles: Vec<CycleSummary>,
    corridor: Option<Corridor>,
    trajectory: Option<Trajectory>,
}

fn grid(args: &GridArgs, label: Option<String>) -> Result<GridOutput> {
    tracing::info!(map = %args.map.display(), cycles = args.cycles, label = ?label, "grid");
    let cfg = io::load_config(args.config.as_deref())?;
    let text = io::read_text(&args.map)?;
    let origin = Point::new(args.origin[0], args.origin[1], 0.0);
    let map = OccupancyGrid::from_ascii(&text, args.resolution, origin)
        .with_context(|| format!("parsing map {}", args.map.display()))?;
    tracing::info!(size = ?map.size_in_cells(), occupied = map.occupied_count(), "map");

    let mut planner = Planner::new(
        map.clone(),
        GridAstar::new(map),
        SeparatingInflator::default(),
        HermiteOptimizer { geom: cfg.cover.geom },
        cfg,
    );
    let mut snap = InputSnapshot {
        pose: Some(Pose2::new(args.start[0], args.start[1], 0.0)),
        velocity: None,
        scan: Vec::new(),
        goal: Some(Point::new(args.goal[0], args.goal[1], 0.0)),
    };

    let mut cycles = Vec::with_capacity(args.cycles);
    let mut corridor = None;
    for k in 0..args.cycles {
        let now = k as f64 * cfg.period_s;
        // Follow the committed trajectory up to this cycle.
        let flown = planner
            .continuation()
            .trajectory_time(now)
            .and_then(|t| planner.trajectory().and_then(|traj| traj.state(t)));
        if let Some(state) = flown {
            snap.pose = Some(Pose2::new(state.pos.x, state.pos.y, state.vel.y.atan2(state.vel.x)));
            snap.velocity = Some(state.vel);
        }
        match planner.run_cycle(&snap, now) {
            Ok(report) => {
                cycles.push(CycleSummary {
                    now,
                    ok: true,
                    error: None,
                    path_len: report.path.len(),
                    raw_regions: report.raw_regions,
                    regions: report.corridor.len(),
                    kept_pieces: report.splice.kept_pieces,
                    new_pieces: report.splice.new_pieces,
                });
                corridor = Some(report.corridor);
            }
            Err(e) => {
                tracing::warn!(cycle = k, kind = ?e.kind(), error = %e, "cycle failed");
                cycles.push(CycleSummary {
                    now,
                    ok: false,
                    error: Some(e.to_string()),
                    path_len: 0,
                    raw_regions: 0,
                    regions: 0,
                    kept_pieces: 0,
                    new_pieces: 0,
                });
            }
        }
    }

    let output = GridOutput {
        label: label.clone(),
        cycles,
        corridor,
        trajectory: planner.trajectory().cloned(),
    };
    io::write_json(&args.out, &output)?;
    let mut outputs = vec![args.out.clone()];
    if let (Some(samples), Some(traj)) = (&args.samples, &output.trajectory) {
        io::write_samples(samples, &traj.sample(args.dt))?;
        outputs.push(samples.clone());
    }
    for artifact in &outputs {
        provenance::write_sidecar(
            artifact,
            provenance::Payload::new("grid", json!({
                "label": label,
                "resolution": args.resolution,
                "origin": args.origin,
                "start": args.start,
                "goal": args.goal,
                "cycles": args.cycles,
                "config": cfg,
            }))
            .with_input(&args.map),
        )?;
    }
    Ok(output)
}

fn report(label: Option<String>) -> Result<()> {
    let obj = json!({
        "code_rev": provenance::code_rev(),
        "version": sfc::VERSION,
        "label": label,
        "params": { "config": PlannerCfg::default() },
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_comma_separated_numbers() {
        assert_eq!(parse_xy("1.5, -2").unwrap(), [1.5, -2.0]);
        assert!(parse_xy("1,2,3").is_err());
        assert!(parse_bounds("0,0,0,1,1").is_err());
        assert!(parse_xy("a,1").is_err());
    }

    #[test]
    fn inferred_bounds_pad_and_use_slab() {
        let cfg = PlannerCfg::default();
        let (lo, hi) = infer_bounds(&[Point::new(0.0, 0.0, 0.0), Point::new(10.0, 2.0, 0.0)], &cfg);
        assert_eq!(lo, Point::new(-5.0, -5.0, -0.1));
        assert_eq!(hi, Point::new(15.0, 7.0, 0.1));
    }

    #[test]
    fn plan_writes_output_samples_and_sidecars() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("path.csv");
        fs::write(&path, "x,y\n0,0\n10,0\n").unwrap();
        let config = dir.path().join("cfg.json");
        fs::write(&config, r#"{"cover": {"progress": 10.0, "half_window": 2.0}}"#).unwrap();
        let args = PlanArgs {
            path,
            obstacles: None,
            config: Some(config),
            bounds: Some([-2.0, -2.0, -2.0, 12.0, 2.0, 2.0]),
            out: dir.path().join("run/plan.json"),
            samples: Some(dir.path().join("run/samples.csv")),
            dt: 0.5,
        };
        let out = plan(&args, Some("t".into())).unwrap();
        assert_eq!(out.raw_regions, 1);
        assert_eq!(out.corridor.len(), 1);
        assert_eq!(out.corridor.polys[0].len(), 6);
        assert!(out.cost.is_finite());
        assert!(dir.path().join("run/plan.provenance.json").exists());
        assert!(dir.path().join("run/samples.provenance.json").exists());
        let parsed: serde_json::Value = serde_json::from_slice(&fs::read(&args.out).unwrap()).unwrap();
        assert_eq!(parsed["label"], "t");
        assert!(parsed["trajectory"]["pieces"].is_array());
    }

    #[test]
    fn grid_runs_cycles_and_splices() {
        let dir = tempdir().unwrap();
        let map = dir.path().join("map.txt");
        fs::write(
            &map,
            "....#.....\n..........\n..........\n..........\n..........\n",
        )
        .unwrap();
        let args = GridArgs {
            map,
            resolution: 1.0,
            origin: [0.0, 0.0],
            start: [0.5, 2.5],
            goal: [8.5, 2.5],
            config: None,
            cycles: 3,
            out: dir.path().join("grid.json"),
            samples: None,
            dt: 0.1,
        };
        let out = grid(&args, None).unwrap();
        assert_eq!(out.cycles.len(), 3);
        assert!(out.cycles.iter().all(|c| c.ok), "{:?}", out.cycles.iter().map(|c| &c.error).collect::<Vec<_>>());
        assert_eq!(out.cycles[0].kept_pieces, 0);
        for c in &out.cycles[1..] {
            assert!(c.kept_pieces > 0);
            assert!(c.new_pieces > 0);
        }
        let last = &out.cycles[2];
        let traj = out.trajectory.as_ref().unwrap();
        assert_eq!(traj.piece_count(), last.kept_pieces + last.new_pieces);
        let end = traj.end_state().unwrap().pos;
        assert!((end - Point::new(8.5, 2.5, 0.0)).norm() < 1e-9);
        assert!(dir.path().join("grid.provenance.json").exists());
    }

    #[test]
    fn plan_honours_seed_cover_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("path.csv");
        fs::write(&path, "x,y\n0,0\n10,0\n").unwrap();
        let config = dir.path().join("cfg.json");
        fs::write(&config, r#"{"cover_mode": "Seeds", "cover": {"half_window": 6.0}}"#).unwrap();
        let args = PlanArgs {
            path,
            obstacles: None,
            config: Some(config),
            bounds: Some([-2.0, -2.0, -2.0, 12.0, 2.0, 2.0]),
            out: dir.path().join("seeds.json"),
            samples: None,
            dt: 0.5,
        };
        let out = plan(&args, None).unwrap();
        assert_eq!(out.raw_regions, 2);
        assert_eq!(out.corridor.len(), 2);
        assert!(out.corridor.covers_endpoints(&Point::new(0.0, 0.0, 0.0), &Point::new(10.0, 0.0, 0.0), 1e-9));
    }

    #[test]
    fn invalid_time_scale_is_rejected_on_load() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("cfg.json");
        fs::write(&config, r#"{"continuation": {"time_scale": 0.0}}"#).unwrap();
        assert!(io::load_config(Some(&config)).is_err());
    }
}
