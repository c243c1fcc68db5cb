//! File inputs and outputs: point CSVs, planner config, ASCII maps, sample tables.

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use sfc::planner::PlannerCfg;
use sfc::trajectory::Sample;
use sfc::Point;
use std::fs::{self, File};
use std::path::Path;

/// Read `x,y[,z]` rows; a missing `z` column means the plane `z = 0`.
pub fn read_points_csv(path: &Path) -> Result<Vec<Point>> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("reading {}", path.display()))?;
    let xs = float_column(&df, "x")?;
    let ys = float_column(&df, "y")?;
    let zs = if df.column("z").is_ok() {
        float_column(&df, "z")?
    } else {
        vec![0.0; xs.len()]
    };
    tracing::debug!(rows = xs.len(), file = %path.display(), "points_csv");
    Ok(xs
        .into_iter()
        .zip(ys)
        .zip(zs)
        .map(|((x, y), z)| Point::new(x, y, z))
        .collect())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::Float64)?;
    col.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.with_context(|| format!("null `{name}` at row {row}")))
        .collect()
}

/// Planner config from JSON; absent file or absent keys fall back to defaults.
/// The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<PlannerCfg> {
    let Some(path) = path else {
        return Ok(PlannerCfg::default());
    };
    let raw = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg: PlannerCfg =
        serde_json::from_slice(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}

/// Write trajectory samples as `.csv` or `.parquet`, chosen by extension.
pub fn write_samples(path: &Path, samples: &[Sample]) -> Result<()> {
    let pick = |f: fn(&Sample) -> f64| samples.iter().map(f).collect::<Vec<f64>>();
    let mut df = df!(
        "t" => pick(|s| s.t),
        "x" => pick(|s| s.state.pos.x),
        "y" => pick(|s| s.state.pos.y),
        "z" => pick(|s| s.state.pos.z),
        "vx" => pick(|s| s.state.vel.x),
        "vy" => pick(|s| s.state.vel.y),
        "vz" => pick(|s| s.state.vel.z),
        "ax" => pick(|s| s.state.acc.x),
        "ay" => pick(|s| s.state.acc.y),
        "az" => pick(|s| s.state.acc.z)
    )?;
    ensure_parent(path)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            CsvWriter::new(&mut file).finish(&mut df)?;
        }
        Some("parquet") => {
            ParquetWriter::new(&mut file).finish(&mut df)?;
        }
        other => bail!("unsupported samples extension {other:?}; use .csv or .parquet"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfc::trajectory::BoundaryState;
    use tempfile::tempdir;

    #[test]
    fn planar_csv_gets_zero_z() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("path.csv");
        fs::write(&p, "x,y\n0,0\n4,0.5\n").unwrap();
        let pts = read_points_csv(&p).unwrap();
        assert_eq!(pts, vec![Point::new(0.0, 0.0, 0.0), Point::new(4.0, 0.5, 0.0)]);
    }

    #[test]
    fn csv_with_z_and_missing_column() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("obs.csv");
        fs::write(&p, "x,y,z\n1.5,2,0.25\n").unwrap();
        assert_eq!(read_points_csv(&p).unwrap(), vec![Point::new(1.5, 2.0, 0.25)]);

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "a,b\n1,2\n").unwrap();
        assert!(read_points_csv(&bad).is_err());
    }

    #[test]
    fn config_defaults_fill_missing_keys() {
        assert!((load_config(None).unwrap().overlap_tol - 0.01).abs() < 1e-12);
        let dir = tempdir().unwrap();
        let p = dir.path().join("cfg.json");
        fs::write(&p, r#"{"cover": {"progress": 3.0}, "period_s": 0.5}"#).unwrap();
        let cfg = load_config(Some(&p)).unwrap();
        assert_eq!(cfg.cover.progress, 3.0);
        assert_eq!(cfg.cover.half_window, 5.0);
        assert_eq!(cfg.period_s, 0.5);
    }

    #[test]
    fn samples_roundtrip_through_csv() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("out/samples.csv");
        let s = Sample {
            t: 0.5,
            state: BoundaryState::at_rest(Point::new(1.0, 2.0, 0.0)),
        };
        write_samples(&p, &[s]).unwrap();
        let text = fs::read_to_string(&p).unwrap();
        assert!(text.starts_with("t,x,y,z,vx"));
        assert!(write_samples(&dir.path().join("s.txt"), &[s]).is_err());
    }
}
