//! Track grid parsing and cell lookup.
//!
//! A track file is plain text: the first line is a header (historically the
//! grid dimensions) and is ignored; every following line is one row with one
//! character per cell.
//!
//! | Character | Cell |
//! |-----------|------|
//! | `.` | open track |
//! | `#` | wall |
//! | `S` | start line |
//! | `F` | finish line |

use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Type of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Open,
    Wall,
    Start,
    Finish,
}

impl CellType {
    /// Parse a track-file character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(CellType::Open),
            '#' => Some(CellType::Wall),
            'S' => Some(CellType::Start),
            'F' => Some(CellType::Finish),
            _ => None,
        }
    }

    /// Track-file character for this cell.
    pub fn as_char(self) -> char {
        match self {
            CellType::Open => '.',
            CellType::Wall => '#',
            CellType::Start => 'S',
            CellType::Finish => 'F',
        }
    }

    /// Whether a vehicle can rest on this cell.
    pub fn is_track(self) -> bool {
        !matches!(self, CellType::Wall)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellType::Open => "open",
            CellType::Wall => "wall",
            CellType::Start => "start",
            CellType::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Integer grid coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position displaced by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Immutable rectangular track grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellType>,
}

impl Grid {
    /// Parse a track file body: header line followed by the grid rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTrack`] when the header or rows are missing,
    /// rows have inconsistent lengths, or a character is not a cell symbol.
    ///
    /// # Examples
    ///
    /// ```
    /// use racetrack::racetrack::{CellType, Grid};
    ///
    /// let grid = Grid::parse("3,4\n####\nS..F\n####\n")?;
    /// assert_eq!(grid.width(), 4);
    /// assert_eq!(grid.cell_type_at(3, 1)?, CellType::Finish);
    /// # Ok::<(), racetrack::Error>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate();
        if lines.next().is_none() {
            return Err(Error::MalformedTrack {
                line: 1,
                reason: "missing header line".to_string(),
            });
        }
        Self::from_numbered_rows(lines.map(|(index, row)| (index + 1, row)))
    }

    /// Build a grid from rows without a header line.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        Self::from_numbered_rows(
            rows.iter()
                .enumerate()
                .map(|(index, row)| (index + 1, row.as_ref())),
        )
    }

    /// Fail with [`Error::InconsistentTables`] unless the cell count matches
    /// the dimensions.
    pub(crate) fn check_consistency(&self) -> Result<()> {
        if self.width == 0 || self.cells.len() != self.width * self.height {
            return Err(Error::InconsistentTables {
                message: format!(
                    "grid holds {} cells for {}x{}",
                    self.cells.len(),
                    self.width,
                    self.height
                ),
            });
        }
        Ok(())
    }

    /// Read and parse a track file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read track file {path:?}"),
            source,
        })?;
        Self::parse(&text)
    }

    fn from_numbered_rows<'a>(rows: impl Iterator<Item = (usize, &'a str)>) -> Result<Self> {
        let mut rows: Vec<(usize, &str)> = rows.map(|(line, row)| (line, row.trim_end())).collect();
        while rows.last().is_some_and(|(_, row)| row.is_empty()) {
            rows.pop();
        }

        let Some(&(first_line, first_row)) = rows.first() else {
            return Err(Error::MalformedTrack {
                line: 1,
                reason: "track has no rows".to_string(),
            });
        };
        let width = first_row.chars().count();
        if width == 0 {
            return Err(Error::MalformedTrack {
                line: first_line,
                reason: "first row is empty".to_string(),
            });
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for &(line, row) in &rows {
            let got = row.chars().count();
            if got != width {
                return Err(Error::MalformedTrack {
                    line,
                    reason: format!("row has {got} cells, expected {width}"),
                });
            }
            for (column, c) in row.chars().enumerate() {
                let cell = CellType::from_char(c).ok_or_else(|| Error::MalformedTrack {
                    line,
                    reason: format!("invalid cell character '{c}' at column {column}"),
                })?;
                cells.push(cell);
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells in the grid.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell type at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for coordinates outside the grid.
    pub fn cell_type_at(&self, x: i32, y: i32) -> Result<CellType> {
        self.get(Position::new(x, y)).ok_or(Error::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })
    }

    /// Cell type at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: Position) -> Option<CellType> {
        self.cell_index(pos).map(|index| self.cells[index])
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.cell_index(pos).is_some()
    }

    /// Row-major index of `pos`, or `None` outside the grid.
    pub fn cell_index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, CellType)> + '_ {
        self.cells.iter().enumerate().map(|(index, &cell)| {
            let x = (index % self.width) as i32;
            let y = (index / self.width) as i32;
            (Position::new(x, y), cell)
        })
    }

    /// Positions holding the given cell type, in row-major order.
    pub fn positions_of(&self, cell: CellType) -> impl Iterator<Item = Position> + '_ {
        self.cells()
            .filter(move |&(_, c)| c == cell)
            .map(|(pos, _)| pos)
    }

    /// Check that the grid has at least one Start and one Finish cell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingTerminal`] naming the absent cell type.
    pub fn validate_terminals(&self) -> Result<()> {
        for cell in [CellType::Start, CellType::Finish] {
            if !self.cells.contains(&cell) {
                return Err(Error::MissingTerminal { cell });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            let line: String = row.iter().map(|cell| cell.as_char()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
