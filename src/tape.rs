use crate::{Error, Result};

/// Raw cell storage. Wider than a byte: an increment past 255 parks the
/// cell at 256 until the next increment resets it, and `write` only
/// rejects values above [`CELL_MAX`].
pub type CellValue = i32;

pub const CELL_MAX: CellValue = 255;

/// Growable byte tape owned by a single processor.
///
/// Starts with one zero cell and only ever grows, either by prepending at
/// index 0 or appending at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<CellValue>,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    pub fn new() -> Self {
        Self { cells: vec![0] }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn read(&self, index: usize) -> Result<CellValue> {
        self.cells
            .get(index)
            .copied()
            .ok_or(Error::OutOfBounds {
                index,
                size: self.cells.len(),
            })
    }

    /// Stores `value` at `index`. Values above 255 are rejected; negative
    /// values are not.
    pub fn write(&mut self, index: usize, value: CellValue) -> Result<()> {
        let size = self.cells.len();
        let slot = self
            .cells
            .get_mut(index)
            .ok_or(Error::OutOfBounds { index, size })?;
        if value > CELL_MAX {
            return Err(Error::ValueOutOfRange { value });
        }
        *slot = value;
        Ok(())
    }

    /// The reset only fires once a cell already holds more than 255, so
    /// 255 steps to 256 and the following increment lands on 0.
    pub fn increment(&mut self, index: usize) -> Result<()> {
        let slot = self.slot_mut(index)?;
        if *slot > CELL_MAX {
            *slot = 0;
        } else {
            *slot += 1;
        }
        Ok(())
    }

    pub fn decrement(&mut self, index: usize) -> Result<()> {
        let slot = self.slot_mut(index)?;
        if *slot <= 0 {
            *slot = CELL_MAX;
        } else {
            *slot -= 1;
        }
        Ok(())
    }

    pub fn grow_left(&mut self) {
        self.cells.insert(0, 0);
    }

    pub fn grow_right(&mut self) {
        self.cells.push(0);
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut CellValue> {
        let size = self.cells.len();
        self.cells
            .get_mut(index)
            .ok_or(Error::OutOfBounds { index, size })
    }
}
