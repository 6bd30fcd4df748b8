use std::collections::BTreeMap;
use std::mem;

use crate::{Error, Result};

/// Converts a raw value into an address.
pub(crate) fn cast(num: i64) -> Result<usize> {
    usize::try_from(num).map_err(|_| Error::NegativeAddress { addr: num })
}

/// How far past the end a write may land and still grow the dense cells.
const DENSE_REACH: usize = 1 << 20;

/// The memory of the computer.
///
/// Every address reads as zero until it is written. Writes just past the end
/// grow the dense cells, writes far beyond them are kept in a sparse map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
    far: BTreeMap<usize, i64>,
}

impl Memory {
    pub fn new(program: Vec<i64>) -> Self {
        Self {
            cells: program,
            far: BTreeMap::new(),
        }
    }

    /// Read the value at the given address.
    pub fn read(&self, addr: usize) -> i64 {
        match self.cells.get(addr) {
            Some(&value) => value,
            None => self.far.get(&addr).copied().unwrap_or(0),
        }
    }

    /// Write a value to the given address.
    pub fn write(&mut self, addr: usize, value: i64) {
        let len = self.cells.len();
        if addr < len {
            self.cells[addr] = value;
        } else if addr - len < DENSE_REACH {
            self.cells.resize(addr + 1, 0);
            let rest = self.far.split_off(&(addr + 1));
            for (a, v) in mem::replace(&mut self.far, rest) {
                self.cells[a] = v;
            }
            self.cells[addr] = value;
        } else {
            self.far.insert(addr, value);
        }
    }

    /// The dense cells, from address zero up to the highest one loaded or
    /// written near them.
    pub fn dump(&self) -> &[i64] {
        &self.cells
    }

    /// Cells written far beyond the dense ones, by ascending address.
    pub fn far(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.far.iter().map(|(&addr, &value)| (addr, value))
    }

    /// The number of dense cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.far.is_empty()
    }
}
