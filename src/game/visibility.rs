//! Bounded look window around a player

use std::fmt;

use super::map::{Map, Position};

/// Side length of every look reply
pub const LOOK_SIZE: usize = 7;
/// Cells outside the player's view or the map
pub const UNKNOWN: char = 'X';
/// Another live player
pub const PLAYER: char = 'P';

const HALF: isize = (LOOK_SIZE / 2) as isize;

/// A 7x7 snapshot centered on the viewer, rows north to south
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookReply {
    cells: [[char; LOOK_SIZE]; LOOK_SIZE],
}

impl LookReply {
    /// Render the window. `others` are positions of live players other than
    /// the viewer; `radius` is 2 without a lantern and 3 with one.
    pub fn render(map: &Map, others: &[Position], center: Position, radius: usize) -> Self {
        let mut cells = [[UNKNOWN; LOOK_SIZE]; LOOK_SIZE];
        let radius = radius.min(HALF as usize) as isize;

        for (r, row) in cells.iter_mut().enumerate() {
            let d_row = r as isize - HALF;
            for (c, cell) in row.iter_mut().enumerate() {
                let d_col = c as isize - HALF;
                if d_row.abs() > radius || d_col.abs() > radius {
                    continue;
                }
                let Some(pos) = center.offset(d_row, d_col) else {
                    continue;
                };
                let Some(tile) = map.tile(pos) else {
                    continue;
                };
                *cell = if others.contains(&pos) {
                    PLAYER
                } else {
                    tile.symbol()
                };
            }
        }

        Self { cells }
    }

    #[cfg(test)]
    pub fn cell(&self, row: usize, col: usize) -> char {
        self.cells[row][col]
    }

    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|row| row.iter().collect())
    }
}

impl fmt::Display for LookReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(&row)?;
        }
        Ok(())
    }
}
