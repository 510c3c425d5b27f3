use crate::core::models::particle::{ParticleError, ParticleRecord, ParticleStore};
use nalgebra::{Point3, Quaternion};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Particle {tag} has type '{type_name}', which is not registered")]
    UnknownType { tag: u32, type_name: String },
    #[error("Invalid particle record: {0}")]
    Particle(#[from] ParticleError),
}

/// One row of a snapshot file: `tag,type,x,y,z,qw,qx,qy,qz`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SnapshotRow {
    tag: u32,
    #[serde(rename = "type")]
    type_name: String,
    x: f64,
    y: f64,
    z: f64,
    qw: f64,
    qx: f64,
    qy: f64,
    qz: f64,
}

/// Appends the particles stored in CSV form to `store`, resolving type names against its type
/// table. Returns the number of particles read.
pub fn read_from<R: Read>(reader: R, store: &mut ParticleStore) -> Result<usize, SnapshotError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut count = 0;
    for row in csv_reader.deserialize::<SnapshotRow>() {
        let row = row?;
        let type_id = store
            .type_id(&row.type_name)
            .ok_or_else(|| SnapshotError::UnknownType {
                tag: row.tag,
                type_name: row.type_name.clone(),
            })?;
        store.insert(ParticleRecord {
            tag: row.tag,
            type_id,
            position: Point3::new(row.x, row.y, row.z),
            orientation: Quaternion::new(row.qw, row.qx, row.qy, row.qz),
        })?;
        count += 1;
    }
    Ok(count)
}

pub fn write_to<W: Write>(writer: W, store: &ParticleStore) -> Result<(), SnapshotError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for p in store.particles() {
        let type_name = store.type_name(p.type_id).unwrap_or_default().to_string();
        csv_writer.serialize(SnapshotRow {
            tag: p.tag,
            type_name,
            x: p.position.x,
            y: p.position.y,
            z: p.position.z,
            qw: p.orientation.w,
            qx: p.orientation.i,
            qy: p.orientation.j,
            qz: p.orientation.k,
        })?;
    }
    csv_writer.flush().map_err(|e| SnapshotError::Io {
        path: "<writer>".to_string(),
        source: e,
    })?;
    Ok(())
}

pub fn read_file(path: &Path, store: &mut ParticleStore) -> Result<usize, SnapshotError> {
    let file = std::fs::File::open(path).map_err(|e| SnapshotError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    read_from(std::io::BufReader::new(file), store)
}

pub fn write_file(path: &Path, store: &ParticleStore) -> Result<(), SnapshotError> {
    let file = std::fs::File::create(path).map_err(|e| SnapshotError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_to(std::io::BufWriter::new(file), store)
}
