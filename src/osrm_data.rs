//! OSRM dataset preparation for integration tests.
//!
//! Downloads a Geofabrik extract and runs the OSRM MLD preprocessing
//! pipeline through Docker so a real `osrm-routed` instance can back the
//! route adapter's integration tests. Not used at runtime.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug)]
pub enum OsrmDataError {
    Io(io::Error),
    Http(reqwest::Error),
    ProcessFailure(String),
}

impl From<io::Error> for OsrmDataError {
    fn from(err: io::Error) -> Self {
        OsrmDataError::Io(err)
    }
}

impl From<reqwest::Error> for OsrmDataError {
    fn from(err: reqwest::Error) -> Self {
        OsrmDataError::Http(err)
    }
}

/// Prepared OSRM dataset paths.
#[derive(Debug, Clone)]
pub struct OsrmTestData {
    pub data_dir: PathBuf,
    pub osrm_base: PathBuf,
}

impl OsrmTestData {
    /// Ensures the extract for a Geofabrik region path (e.g.
    /// "north-america/us/nevada") is downloaded and MLD-preprocessed under
    /// `data_root`, skipping every step whose output already exists.
    pub fn prepare(region_path: &str, data_root: impl Into<PathBuf>) -> Result<Self, OsrmDataError> {
        let region = region_path.rsplit('/').next().unwrap_or("region");
        let data_root: PathBuf = data_root.into();
        let data_root = if data_root.is_absolute() {
            data_root
        } else {
            std::env::current_dir()?.join(data_root)
        };
        let data_dir = data_root.join(region);
        fs::create_dir_all(&data_dir)?;

        let pbf_name = format!("{}-latest.osm.pbf", region);
        let pbf_path = data_dir.join(&pbf_name);
        if !pbf_path.exists() {
            let url = format!("https://download.geofabrik.de/{}-latest.osm.pbf", region_path);
            tracing::debug!(url, "downloading OSM extract");
            download(&url, &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{}-latest.osrm", region));
        if !osrm_base.exists() {
            osrm_backend(&data_dir, &["osrm-extract", "-p", "/opt/car.lua", &in_container(&pbf_path)])?;
        }
        if !mld_artifacts_present(&osrm_base) {
            osrm_backend(&data_dir, &["osrm-partition", &in_container(&osrm_base)])?;
            osrm_backend(&data_dir, &["osrm-customize", &in_container(&osrm_base)])?;
        }

        Ok(Self { data_dir, osrm_base })
    }
}

fn download(url: &str, dest: &Path) -> Result<(), OsrmDataError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let tmp_path = dest.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    writer.write_all(&response.bytes()?)?;
    writer.flush()?;
    fs::rename(tmp_path, dest)?;
    Ok(())
}

fn mld_artifacts_present(osrm_base: &Path) -> bool {
    ["osrm.partition", "osrm.mldgr", "osrm.cells"]
        .iter()
        .all(|ext| osrm_base.with_extension(ext).exists())
}

fn in_container(path: &Path) -> String {
    format!(
        "/data/{}",
        path.file_name().and_then(|name| name.to_str()).unwrap_or_default()
    )
}

fn osrm_backend(data_dir: &Path, args: &[&str]) -> Result<(), OsrmDataError> {
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg("osrm/osrm-backend")
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(OsrmDataError::ProcessFailure(format!(
            "docker {} exited with status {}",
            args.first().unwrap_or(&"?"),
            status
        )))
    }
}
