use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// names of the three lattice vectors, in the order they are stored in
/// [Structure::cell]
pub const CELL_VECTORS: [&str; 3] = ["A", "B", "C"];

/// a single atomic site: the name of its kind (usually, but not necessarily,
/// an element symbol) and its Cartesian position in Ångström
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Site {
    pub kind_name: String,
    pub position: [f64; 3],
}

impl Site {
    pub fn new(kind_name: &str, x: f64, y: f64, z: f64) -> Self {
        Self {
            kind_name: kind_name.to_owned(),
            position: [x, y, z],
        }
    }
}

/// Structure holds a periodic atomic structure: the three lattice vectors and
/// the ordered list of sites
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Structure {
    pub cell: [[f64; 3]; 3],
    pub sites: Vec<Site>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected three lattice vectors, found {0}")]
    MissingCell(usize),

    #[error("malformed lattice vector on line {line}: `{text}`")]
    Cell { line: usize, text: String },

    #[error("malformed site on line {line}: `{text}`")]
    Site { line: usize, text: String },
}

impl Structure {
    pub fn new(cell: [[f64; 3]; 3], sites: Vec<Site>) -> Self {
        Self { cell, sites }
    }

    /// a cubic cell with edge length `a` and no sites
    pub fn cubic(a: f64) -> Self {
        Self {
            cell: [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]],
            sites: Vec::new(),
        }
    }

    pub fn append_site(&mut self, site: Site) {
        self.sites.push(site);
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// the kind names of the sites, in site order, without deduplication
    pub fn kind_names(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(|s| s.kind_name.as_str())
    }
}

impl Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for [x, y, z] in &self.cell {
            writeln!(f, "{x:15.10} {y:15.10} {z:15.10}")?;
        }
        for site in &self.sites {
            let [x, y, z] = site.position;
            writeln!(
                f,
                "{:5} {:15.10} {:15.10} {:15.10}",
                site.kind_name, x, y, z
            )?;
        }
        Ok(())
    }
}

/// parse exactly three floats out of `fields`, or None
fn triple<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<[f64; 3]> {
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    let z = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some([x, y, z])
}

impl FromStr for Structure {
    type Err = ParseError;

    /// parse a Structure from text like
    ///
    /// ```text
    /// 4.0 0.0 0.0
    /// 0.0 4.0 0.0
    /// 0.0 0.0 4.0
    /// Ba 0.0 0.0 0.0
    /// Ti 2.0 2.0 2.0
    /// ```
    ///
    /// where the first three non-empty lines are the lattice vectors and the
    /// rest are sites
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cell = Vec::with_capacity(3);
        let mut sites = Vec::new();
        for (i, line) in s.lines().enumerate() {
            let line_no = i + 1;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if cell.len() < 3 {
                let Some(v) = triple(text.split_whitespace()) else {
                    return Err(ParseError::Cell {
                        line: line_no,
                        text: text.to_owned(),
                    });
                };
                cell.push(v);
                continue;
            }
            let mut fields = text.split_whitespace();
            let label = fields.next().unwrap_or_default();
            let Some([x, y, z]) = triple(fields) else {
                return Err(ParseError::Site {
                    line: line_no,
                    text: text.to_owned(),
                });
            };
            sites.push(Site::new(label, x, y, z));
        }
        let cell: [[f64; 3]; 3] = cell
            .try_into()
            .map_err(|c: Vec<_>| ParseError::MissingCell(c.len()))?;
        Ok(Self { cell, sites })
    }
}
