//! Immutable scene point sets
//!
//! Coordinates are stored flat (`len * dims` values) so that the index and
//! the simulator can borrow a point as a plain slice.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Ordered, read-only collection of fixed-dimension points
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    /// Column names carried over from the file header
    columns: Vec<String>,

    /// Flattened coordinates, `dims` values per point
    coords: Vec<f64>,

    /// Number of coordinates per point
    dims: usize,
}

impl PointSet {
    /// Build a point set from coordinate rows
    ///
    /// Every row must have the same, non-zero number of finite coordinates.
    pub fn from_rows<I, R>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f64]>,
    {
        let mut coords = Vec::new();
        let mut dims = 0;

        for (idx, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            if idx == 0 {
                if row.is_empty() {
                    return Err(Error::InvalidConfig(
                        "points need at least one coordinate".to_string(),
                    ));
                }
                dims = row.len();
            } else if row.len() != dims {
                return Err(Error::DimensionMismatch {
                    expected: dims,
                    found: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidConfig(format!(
                    "point {} has a non-finite coordinate",
                    idx
                )));
            }
            coords.extend_from_slice(row);
        }

        if coords.is_empty() {
            return Err(Error::EmptyPointSet);
        }

        Ok(Self {
            columns: Vec::new(),
            coords,
            dims,
        })
    }

    /// Load a point set from a coordinate file with a header line
    ///
    /// # Arguments
    /// * `path` - Path to the comma separated coordinate file
    ///
    /// # Returns
    /// * `Result<PointSet>` - Points in file order
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!("Reading points from {}", path.display());

        let points = Self::from_reader(file)?;
        info!(
            "Loaded {} points ({} dimensions) from {}",
            points.len(),
            points.dims,
            path.display()
        );
        Ok(points)
    }

    /// Read comma separated coordinates with a header line
    ///
    /// Fields may be quoted and padded with whitespace; blank lines are
    /// skipped. Every row must have one finite number per header column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let dims = columns.len();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line() as usize);
            if record.len() != dims {
                return Err(Error::Parse {
                    line,
                    msg: format!("expected {} fields, found {}", dims, record.len()),
                });
            }

            let row = record
                .iter()
                .map(|field| match field.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    Ok(_) => Err(Error::Parse {
                        line,
                        msg: format!("non-finite coordinate '{}'", field),
                    }),
                    Err(_) => Err(Error::Parse {
                        line,
                        msg: format!("invalid coordinate '{}'", field),
                    }),
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        let mut points = Self::from_rows(rows)?;
        points.columns = columns;
        Ok(points)
    }

    /// Get the coordinates of the point at `idx`
    ///
    /// Panics if `idx` is out of bounds, like slice indexing.
    pub fn point(&self, idx: usize) -> &[f64] {
        let start = idx * self.dims;
        &self.coords[start..start + self.dims]
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.coords.len() / self.dims
    }

    /// Check if the set has no points (never true for a constructed set)
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of coordinates per point
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Column names from the source file header
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}
