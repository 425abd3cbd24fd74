//! Debug logging infrastructure for terrain investigation
//!
//! `init_debug_log()` routes the `log` facade into a file. The file is
//! recreated on each call. Also hosts mesh diagnostics used by tests and
//! when chasing seams.

use log::{LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::mesh_buffer::{MeshBuffer, Vec3};
use crate::stitcher::{boundary_len, boundary_pair};
use crate::tile::Direction;

lazy_static::lazy_static! {
    static ref DEBUG_LOG: Mutex<Option<File>> = Mutex::new(None);
}

static FILE_LOGGER: FileLogger = FileLogger;

struct FileLogger;

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut guard) = DEBUG_LOG.lock() {
            if let Some(ref mut file) = *guard {
                let _ = writeln!(file, "{:<5} {}", record.level(), record.args());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = DEBUG_LOG.lock() {
            if let Some(ref mut file) = *guard {
                let _ = file.flush();
            }
        }
    }
}

/// Initialize the debug log file (overwrites any existing log).
/// The first call installs the file logger as the global `log` backend;
/// if another backend is already installed, only the file is recreated.
pub fn init_debug_log(path: impl AsRef<Path>) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "=== TERRAIN TILES DEBUG LOG ===")?;
    writeln!(file, "Timestamp: {:?}", std::time::SystemTime::now())?;
    writeln!(file)?;

    if let Ok(mut guard) = DEBUG_LOG.lock() {
        *guard = Some(file);
    }

    if log::set_logger(&FILE_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
    Ok(())
}

/// Statistics about normals in a mesh
#[derive(Debug)]
pub struct NormalStats {
    pub min_len: f32,
    pub max_len: f32,
    /// Zero-length or NaN normals
    pub degenerate_count: usize,
}

pub fn compute_normal_stats(normals: &[Vec3]) -> NormalStats {
    let mut min_len = f32::MAX;
    let mut max_len = f32::MIN;
    let mut degenerate_count = 0;

    for n in normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len.is_nan() || len == 0.0 {
            degenerate_count += 1;
            continue;
        }
        min_len = min_len.min(len);
        max_len = max_len.max(len);
    }

    if degenerate_count == normals.len() {
        min_len = 0.0;
        max_len = 0.0;
    }

    NormalStats {
        min_len,
        max_len,
        degenerate_count,
    }
}

/// Largest height difference between `mesh` and the tile lying in
/// `direction` across their shared boundary. Zero for a perfect seam.
pub fn max_seam_error(mesh: &MeshBuffer, neighbor: &MeshBuffer, direction: Direction) -> f32 {
    let n = mesh.sample_count;
    if n < 2 || neighbor.sample_count != n {
        return f32::INFINITY;
    }

    let mut worst = 0.0f32;
    for i in 0..boundary_len(direction, n) {
        let (local, remote) = boundary_pair(direction, n, i);
        match (mesh.vertices.get(local), neighbor.vertices.get(remote)) {
            (Some(a), Some(b)) => worst = worst.max((a[1] - b[1]).abs()),
            _ => return f32::INFINITY,
        }
    }
    worst
}
