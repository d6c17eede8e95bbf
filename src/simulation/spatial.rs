//! Spatial indexing for efficient neighbor queries.
//!
//! A uniform grid over world space. Each cell keeps the ids of the agents whose
//! position falls inside it, in insertion order. The index also caches every
//! agent's last known position so radius queries can filter on true distance
//! without going back to the owning pool.
//!
//! The cell side is chosen close to the largest behavior radius, so a query
//! usually touches the center cell and its eight neighbors.

use std::collections::HashMap;

use ndarray::Array1;

use super::agent::AgentId;
use super::error::SimError;
use super::locatable::Locatable;

/// A query hit: agent id plus its squared distance to the query center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Id of the agent found.
    pub id: AgentId,
    /// Squared Euclidean distance to the query center.
    pub dist_sq: f32,
}

/// Result of a spatial radius query.
pub type SpatialQueryResult = Vec<Neighbor>;

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    cell: usize,
    pos: [f32; 2],
}

/// Uniform-grid spatial index.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<AgentId>>,
    entries: HashMap<AgentId, IndexEntry>,
}

impl SpatialIndex {
    /// Creates an empty index covering a `width` x `height` world.
    ///
    /// # Arguments
    ///
    /// * `width` - World width
    /// * `height` - World height
    /// * `cell_size` - Side length of a grid cell
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cell_size = cell_size.max(f32::EPSILON);
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            entries: HashMap::new(),
        }
    }

    /// Side length of a grid cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as `(cols, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Number of indexed agents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no agent is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if the agent is indexed.
    pub fn contains(&self, id: AgentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Cell currently holding the agent.
    pub fn cell_of(&self, id: AgentId) -> Option<usize> {
        self.entries.get(&id).map(|entry| entry.cell)
    }

    /// Ids stored in a cell, in insertion order.
    pub fn cell(&self, key: usize) -> &[AgentId] {
        self.cells.get(key).map_or(&[], Vec::as_slice)
    }

    /// Computes the cell key for a world position.
    ///
    /// Positions outside the world map to the nearest edge cell.
    ///
    /// # Returns
    ///
    /// `None` if either coordinate is NaN or infinite.
    pub fn cell_key(&self, pos: &Array1<f32>) -> Option<usize> {
        let (x, y) = (pos[0], pos[1]);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let col = self.axis_cell(x, self.cols);
        let row = self.axis_cell(y, self.rows);
        Some(row * self.cols + col)
    }

    fn axis_cell(&self, coord: f32, count: usize) -> usize {
        let cell = (coord / self.cell_size).floor();
        if cell <= 0.0 {
            0
        } else {
            (cell as usize).min(count - 1)
        }
    }

    /// Adds an agent to the cell matching its current position.
    pub fn insert(&mut self, agent: &impl Locatable) -> Result<(), SimError> {
        let id = agent.id();
        if self.entries.contains_key(&id) {
            return Err(SimError::DuplicateInsert(id));
        }
        let pos = agent.pos();
        let cell = self.cell_key(pos).ok_or(SimError::InvalidPosition(id))?;
        self.cells[cell].push(id);
        self.entries.insert(
            id,
            IndexEntry {
                cell,
                pos: [pos[0], pos[1]],
            },
        );
        Ok(())
    }

    /// Removes an agent from its current cell.
    pub fn remove(&mut self, id: AgentId) -> Result<(), SimError> {
        let entry = self.entries.remove(&id).ok_or(SimError::NotFound(id))?;
        let cell = &mut self.cells[entry.cell];
        if let Some(at) = cell.iter().position(|&other| other == id) {
            cell.remove(at);
        }
        Ok(())
    }

    /// Refreshes an agent's cached position and moves it to a new cell if its
    /// cell key changed.
    ///
    /// # Returns
    ///
    /// `true` if the agent changed cells.
    pub fn relocate(&mut self, agent: &impl Locatable) -> Result<bool, SimError> {
        let id = agent.id();
        let pos = agent.pos();
        let new_cell = self.cell_key(pos).ok_or(SimError::InvalidPosition(id))?;
        let entry = self.entries.get_mut(&id).ok_or(SimError::NotFound(id))?;
        entry.pos = [pos[0], pos[1]];
        if entry.cell == new_cell {
            return Ok(false);
        }
        let old_cell = std::mem::replace(&mut entry.cell, new_cell);
        let cell = &mut self.cells[old_cell];
        if let Some(at) = cell.iter().position(|&other| other == id) {
            cell.remove(at);
        }
        self.cells[new_cell].push(id);
        Ok(true)
    }

    /// Finds every indexed agent within `radius` of `center`.
    ///
    /// Scans all cells whose bounding box intersects the query circle, so there
    /// are no false negatives. Results come in row-major cell order, then in
    /// insertion order within a cell.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position for the query
    /// * `radius` - Search radius (inclusive)
    ///
    /// # Returns
    ///
    /// Vector of neighbors within radius, each with its squared distance.
    pub fn query_radius(&self, center: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        let (cx, cy) = (center[0], center[1]);
        if !cx.is_finite() || !cy.is_finite() || radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let radius_sq = radius * radius;

        let col_lo = self.axis_cell(cx - radius, self.cols);
        let col_hi = self.axis_cell(cx + radius, self.cols);
        let row_lo = self.axis_cell(cy - radius, self.rows);
        let row_hi = self.axis_cell(cy + radius, self.rows);

        let mut result = Vec::new();
        for row in row_lo..=row_hi {
            let (y_lo, y_hi) = self.cell_span(row, self.rows);
            let dy = axis_gap(cy, y_lo, y_hi);
            for col in col_lo..=col_hi {
                let (x_lo, x_hi) = self.cell_span(col, self.cols);
                let dx = axis_gap(cx, x_lo, x_hi);
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                for &id in &self.cells[row * self.cols + col] {
                    let Some(entry) = self.entries.get(&id) else {
                        continue;
                    };
                    let ex = entry.pos[0] - cx;
                    let ey = entry.pos[1] - cy;
                    let dist_sq = ex * ex + ey * ey;
                    if dist_sq <= radius_sq {
                        result.push(Neighbor { id, dist_sq });
                    }
                }
            }
        }
        result
    }

    /// Removes every agent from the index.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.entries.clear();
    }

    // Edge cells also hold everything beyond the world border.
    fn cell_span(&self, index: usize, count: usize) -> (f32, f32) {
        let lo = if index == 0 {
            f32::NEG_INFINITY
        } else {
            index as f32 * self.cell_size
        };
        let hi = if index + 1 == count {
            f32::INFINITY
        } else {
            (index + 1) as f32 * self.cell_size
        };
        (lo, hi)
    }
}

/// Distance from `value` to the interval `[lo, hi]` along one axis.
fn axis_gap(value: f32, lo: f32, hi: f32) -> f32 {
    if value < lo {
        lo - value
    } else if value > hi {
        value - hi
    } else {
        0.0
    }
}
