//! Cell geometry and data loading
//!
//! The simulation domain is a branching 1-D cable: vertices with neighbor
//! lists. Geometry is loaded once during initialization, either from a
//! JSON cell file or generated synthetically, and never changes afterward.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::types::{FieldState, VertexIndex};

/// Errors that can occur while loading cell data
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Structurally invalid cell description
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// The simulation domain: vertices and their neighbor lists
#[derive(Debug, Clone)]
pub struct CellGeometry {
    neighbors: Vec<Vec<usize>>,
}

impl CellGeometry {
    /// Build a geometry from an edge list, validating every index
    pub fn from_edges(
        vertex_count: usize,
        edges: &[[usize; 2]],
    ) -> std::result::Result<Self, DataLoadError> {
        if vertex_count == 0 {
            return Err(DataLoadError::InvalidGeometry(
                "cell must have at least one vertex".into(),
            ));
        }

        let mut neighbors = vec![Vec::new(); vertex_count];
        for &[a, b] in edges {
            if a >= vertex_count || b >= vertex_count {
                return Err(DataLoadError::InvalidGeometry(format!(
                    "edge ({}, {}) references a vertex outside 0..{}",
                    a, b, vertex_count
                )));
            }
            if a == b {
                return Err(DataLoadError::InvalidGeometry(format!(
                    "self-edge at vertex {}",
                    a
                )));
            }
            neighbors[a].push(b);
            neighbors[b].push(a);
        }

        Ok(Self { neighbors })
    }

    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.neighbors[vertex]
    }

    /// Whether a resolved target index points inside this domain
    pub fn contains(&self, vertex: VertexIndex) -> bool {
        vertex
            .index()
            .map(|v| v < self.vertex_count())
            .unwrap_or(false)
    }
}

/// Everything initialization needs from a data source
#[derive(Debug, Clone)]
pub struct LoadedCell {
    pub geometry: CellGeometry,
    pub initial: FieldState,
}

/// Data-loading collaborator, invoked once during initialization
pub trait DataLoader {
    fn read_data(&mut self) -> std::result::Result<LoadedCell, DataLoadError>;
}

/// On-disk cell description
#[derive(Debug, Deserialize)]
struct CellFile {
    vertex_count: usize,
    edges: Vec<[usize; 2]>,
    /// Per-vertex starting potentials; defaults to the resting potential
    #[serde(default)]
    initial_values: Option<Vec<f64>>,
    #[serde(default = "default_resting")]
    resting_potential: f64,
}

fn default_resting() -> f64 {
    -65.0
}

/// Loader that reads a cell geometry from a JSON file
pub struct JsonCellLoader {
    path: PathBuf,
}

impl JsonCellLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a cell from a JSON string
    pub fn parse(json: &str) -> std::result::Result<LoadedCell, DataLoadError> {
        let file: CellFile = serde_json::from_str(json)?;
        let geometry = CellGeometry::from_edges(file.vertex_count, &file.edges)?;

        let initial = match file.initial_values {
            Some(values) => {
                if values.len() != file.vertex_count {
                    return Err(DataLoadError::InvalidGeometry(format!(
                        "initial_values has {} entries for {} vertices",
                        values.len(),
                        file.vertex_count
                    )));
                }
                FieldState { tick: 0, values }
            }
            None => FieldState::uniform(file.vertex_count, file.resting_potential),
        };

        Ok(LoadedCell { geometry, initial })
    }

    /// Load a cell from the configured path
    pub fn load(&self) -> std::result::Result<LoadedCell, DataLoadError> {
        let content = std::fs::read_to_string(&self.path)?;
        Self::parse(&content)
    }
}

impl DataLoader for JsonCellLoader {
    fn read_data(&mut self) -> std::result::Result<LoadedCell, DataLoadError> {
        self.load()
    }
}

/// Deterministic synthetic cell: a seeded random branching cable
///
/// Each vertex after the first attaches to a uniformly chosen earlier
/// vertex, producing a random tree. Starting potentials sit at rest with a
/// little seeded noise so the field is not perfectly flat.
pub struct SyntheticCell {
    vertex_count: usize,
    seed: u64,
    resting_potential: f64,
}

impl SyntheticCell {
    pub fn new(vertex_count: usize, seed: u64) -> Self {
        Self {
            vertex_count,
            seed,
            resting_potential: default_resting(),
        }
    }

    pub fn with_resting_potential(mut self, resting: f64) -> Self {
        self.resting_potential = resting;
        self
    }
}

impl DataLoader for SyntheticCell {
    fn read_data(&mut self) -> std::result::Result<LoadedCell, DataLoadError> {
        if self.vertex_count == 0 {
            return Err(DataLoadError::InvalidGeometry(
                "synthetic cell must have at least one vertex".into(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut edges = Vec::with_capacity(self.vertex_count.saturating_sub(1));
        for v in 1..self.vertex_count {
            let parent = rng.gen_range(0..v);
            edges.push([parent, v]);
        }
        let geometry = CellGeometry::from_edges(self.vertex_count, &edges)?;

        let values = (0..self.vertex_count)
            .map(|_| self.resting_potential + rng.gen_range(-2.0..2.0))
            .collect();

        Ok(LoadedCell {
            geometry,
            initial: FieldState { tick: 0, values },
        })
    }
}
