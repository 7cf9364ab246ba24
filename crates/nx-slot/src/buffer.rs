//! Fixed-capacity reel buffer

use rand::Rng;

use crate::Symbol;
use crate::config::GridSpec;
use crate::error::{Result, SlotError};
use crate::weights::WeightTable;

/// Most reels a machine can have
pub const MAX_REELS: usize = 10;
/// Most visible rows per reel
pub const MAX_ROWS: usize = 5;

/// Reel × row grid of symbols
///
/// Storage is fixed at `MAX_REELS × MAX_ROWS`; only the configured
/// `reels × rows` window is ever read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReelBuffer {
    reels: usize,
    rows: usize,
    cells: [[Symbol; MAX_ROWS]; MAX_REELS],
}

impl ReelBuffer {
    /// Create a buffer filled with symbol 0
    pub fn new(grid: GridSpec) -> Result<Self> {
        grid.validate()?;
        Ok(Self {
            reels: grid.reels as usize,
            rows: grid.rows as usize,
            cells: [[0; MAX_ROWS]; MAX_REELS],
        })
    }

    /// Create a buffer with every cell drawn independently from `weights`
    pub fn generate<R: Rng + ?Sized>(
        grid: GridSpec,
        weights: &WeightTable,
        rng: &mut R,
    ) -> Result<Self> {
        weights.validate()?;
        let mut buffer = Self::new(grid)?;
        buffer.refill(weights, rng);
        Ok(buffer)
    }

    /// Build from columns (one `Vec` per reel, top row first)
    pub fn from_columns<C: AsRef<[Symbol]>>(columns: &[C]) -> Result<Self> {
        let rows = columns.first().map(|c| c.as_ref().len()).unwrap_or(0);
        if columns.len() > MAX_REELS || rows > MAX_ROWS {
            return Err(SlotError::GridTooLarge {
                reels: columns.len(),
                rows,
                max_reels: MAX_REELS,
                max_rows: MAX_ROWS,
            });
        }
        let mut buffer = Self::new(GridSpec::new(columns.len() as u8, rows as u8))?;
        for (reel, column) in columns.iter().enumerate() {
            let column = column.as_ref();
            if column.len() != rows {
                return Err(SlotError::RaggedGrid {
                    reel,
                    len: column.len(),
                    expected: rows,
                });
            }
            buffer.cells[reel][..rows].copy_from_slice(column);
        }
        Ok(buffer)
    }

    /// Redraw every cell. Cells are independent: matching symbols across
    /// reels or rows are coincidence, not a sampling constraint.
    pub fn refill<R: Rng + ?Sized>(&mut self, weights: &WeightTable, rng: &mut R) {
        for column in &mut self.cells[..self.reels] {
            for cell in &mut column[..self.rows] {
                *cell = weights.generate(rng);
            }
        }
    }

    /// Number of reels
    pub fn reels(&self) -> usize {
        self.reels
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Symbol at `(reel, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the configured grid.
    pub fn at(&self, reel: usize, row: usize) -> Symbol {
        assert!(
            reel < self.reels && row < self.rows,
            "cell ({reel}, {row}) outside {}x{} grid",
            self.reels,
            self.rows
        );
        self.cells[reel][row]
    }

    /// Symbol at `(reel, row)`, `None` outside the grid
    pub fn get(&self, reel: usize, row: usize) -> Option<Symbol> {
        (reel < self.reels && row < self.rows).then(|| self.cells[reel][row])
    }

    /// Shift `reel` down one row; `symbol` enters at row 0 and the bottom
    /// symbol is discarded.
    ///
    /// # Panics
    ///
    /// Panics if `reel` is outside the configured grid.
    pub fn advance(&mut self, reel: usize, symbol: Symbol) {
        assert!(reel < self.reels, "reel {reel} outside {} reels", self.reels);
        let column = &mut self.cells[reel][..self.rows];
        column.copy_within(..self.rows - 1, 1);
        column[0] = symbol;
    }

    /// Visible symbols of one reel, top row first
    pub fn column(&self, reel: usize) -> &[Symbol] {
        &self.cells[reel][..self.rows]
    }

    /// Symbols across all reels for one row
    pub fn row(&self, row: usize) -> impl Iterator<Item = Symbol> + '_ {
        self.cells[..self.reels].iter().map(move |column| column[row])
    }

    /// Every visible symbol, reel-major
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.cells[..self.reels]
            .iter()
            .flat_map(move |column| column[..self.rows].iter().copied())
    }

    /// Grid as nested vectors (reels × rows), for logs and reports
    pub fn to_grid(&self) -> Vec<Vec<Symbol>> {
        (0..self.reels).map(|reel| self.column(reel).to_vec()).collect()
    }
}
