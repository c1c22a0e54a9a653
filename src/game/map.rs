//! Static dungeon terrain and the map file loader

use std::fmt;
use std::fs;
use std::path::Path;

/// Pickup-able tile contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    /// Treasure worth `amount` gold
    Gold(u32),
    /// Restores one point of health
    Health,
    Armour,
    Sword,
    /// Widens the look window from 5x5 to 7x7
    Lantern,
}

impl Item {
    pub fn symbol(self) -> char {
        match self {
            Item::Gold(_) => 'G',
            Item::Health => 'H',
            Item::Armour => 'A',
            Item::Sword => 'S',
            Item::Lantern => 'L',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Item::Gold(_) => "gold",
            Item::Health => "health potion",
            Item::Armour => "armour",
            Item::Sword => "sword",
            Item::Lantern => "lantern",
        }
    }
}

/// A single terrain cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    /// The exit; entering it with enough gold wins the game
    Portal,
    /// Floor with an item lying on it
    Item(Item),
}

impl Tile {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        let tile = match symbol {
            '#' => Tile::Wall,
            '.' => Tile::Floor,
            'E' => Tile::Portal,
            'G' => Tile::Item(Item::Gold(1)),
            'H' => Tile::Item(Item::Health),
            'A' => Tile::Item(Item::Armour),
            'S' => Tile::Item(Item::Sword),
            'L' => Tile::Item(Item::Lantern),
            _ => return None,
        };
        Some(tile)
    }

    pub fn symbol(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Floor => '.',
            Tile::Portal => 'E',
            Tile::Item(item) => item.symbol(),
        }
    }

    pub fn is_walkable(self) -> bool {
        !matches!(self, Tile::Wall)
    }
}

/// Grid coordinate, row first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset by a signed delta, `None` if it would leave the first quadrant
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Map loading errors
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Failed to read map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Map has no grid rows")]
    Empty,

    #[error("Row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unknown map symbol {symbol:?} at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },

    #[error("Map has no portal tile")]
    NoPortal,

    #[error("Invalid win requirement: {0:?}")]
    InvalidWin(String),
}

/// Dungeon terrain. The layout is fixed after load; only item cells are
/// cleared as players pick them up.
#[derive(Debug, Clone)]
pub struct Map {
    name: String,
    tiles: Vec<Vec<Tile>>,
    gold_total: u32,
    gold_required: u32,
}

impl Map {
    /// Parse the `name` / `win` header followed by the symbol grid
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let mut name = String::from("Unnamed Dungeon");
        let mut win: Option<u32> = None;
        let mut tiles: Vec<Vec<Tile>> = Vec::new();

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if tiles.is_empty() {
                if let Some(rest) = line.strip_prefix("name ") {
                    name = rest.trim().to_string();
                    continue;
                }
                if let Some(rest) = line.strip_prefix("win ") {
                    let value = rest.trim();
                    win = Some(
                        value
                            .parse()
                            .map_err(|_| MapError::InvalidWin(value.to_string()))?,
                    );
                    continue;
                }
            }

            let row = tiles.len();
            let parsed = line
                .chars()
                .enumerate()
                .map(|(col, symbol)| {
                    Tile::from_symbol(symbol).ok_or(MapError::UnknownSymbol { symbol, row, col })
                })
                .collect::<Result<Vec<_>, _>>()?;

            if let Some(first) = tiles.first() {
                if first.len() != parsed.len() {
                    return Err(MapError::Ragged {
                        row,
                        expected: first.len(),
                        found: parsed.len(),
                    });
                }
            }
            tiles.push(parsed);
        }

        Self::from_tiles(name, tiles, win)
    }

    /// Load and parse a map file
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Build a map from an already-parsed grid. `win` defaults to all the gold.
    pub fn from_tiles(
        name: String,
        tiles: Vec<Vec<Tile>>,
        win: Option<u32>,
    ) -> Result<Self, MapError> {
        if tiles.is_empty() || tiles[0].is_empty() {
            return Err(MapError::Empty);
        }
        if !tiles.iter().flatten().any(|t| *t == Tile::Portal) {
            return Err(MapError::NoPortal);
        }

        let gold_total = tiles
            .iter()
            .flatten()
            .map(|t| match t {
                Tile::Item(Item::Gold(amount)) => *amount,
                _ => 0,
            })
            .sum();

        Ok(Self {
            name,
            tiles,
            gold_total,
            gold_required: win.unwrap_or(gold_total),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn cols(&self) -> usize {
        self.tiles[0].len()
    }

    /// Sum of all gold on the map at load time
    pub fn gold_total(&self) -> u32 {
        self.gold_total
    }

    /// Gold a player must carry for the portal to win the game
    pub fn gold_required(&self) -> u32 {
        self.gold_required
    }

    pub fn tile(&self, pos: Position) -> Option<Tile> {
        self.tiles.get(pos.row)?.get(pos.col).copied()
    }

    /// Remove the item at `pos`, leaving bare floor
    pub fn take_item(&mut self, pos: Position) -> Option<Item> {
        let cell = self.tiles.get_mut(pos.row)?.get_mut(pos.col)?;
        match *cell {
            Tile::Item(item) => {
                *cell = Tile::Floor;
                Some(item)
            }
            _ => None,
        }
    }

    /// Bare floor cells in row-major order
    pub fn floor_tiles(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, t)| **t == Tile::Floor)
                .map(move |(col, _)| Position::new(row, col))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SMALL: &str = "\
name Small Test Dungeon
win 2
#########
#..G....#
#.#####.#
#.L...G.#
#...E...#
#########
";

    #[test]
    fn parses_header_and_grid() {
        let map = Map::parse(SMALL).unwrap();
        assert_eq!(map.name(), "Small Test Dungeon");
        assert_eq!(map.rows(), 6);
        assert_eq!(map.cols(), 9);
        assert_eq!(map.gold_total(), 2);
        assert_eq!(map.gold_required(), 2);
        assert_eq!(map.tile(Position::new(4, 4)), Some(Tile::Portal));
        assert_eq!(map.tile(Position::new(3, 2)), Some(Tile::Item(Item::Lantern)));
        assert_eq!(map.tile(Position::new(6, 0)), None);
    }

    #[test]
    fn win_defaults_to_total_gold() {
        let map = Map::parse("#####\n#GEG#\n#####\n").unwrap();
        assert_eq!(map.name(), "Unnamed Dungeon");
        assert_eq!(map.gold_required(), 2);
    }

    #[test]
    fn rejects_bad_maps() {
        assert!(matches!(Map::parse("name x\n"), Err(MapError::Empty)));
        assert!(matches!(
            Map::parse("####\n#E.\n"),
            Err(MapError::Ragged { row: 1, expected: 4, found: 3 })
        ));
        assert!(matches!(
            Map::parse("#E?#\n"),
            Err(MapError::UnknownSymbol { symbol: '?', row: 0, col: 2 })
        ));
        assert!(matches!(Map::parse("#..#\n"), Err(MapError::NoPortal)));
        assert!(matches!(
            Map::parse("win lots\n#E#\n"),
            Err(MapError::InvalidWin(_))
        ));
    }

    #[test]
    fn take_item_clears_only_items() {
        let mut map = Map::parse(SMALL).unwrap();
        let gold = Position::new(1, 3);
        assert_eq!(map.take_item(gold), Some(Item::Gold(1)));
        assert_eq!(map.tile(gold), Some(Tile::Floor));
        assert_eq!(map.take_item(gold), None);
        assert_eq!(map.take_item(Position::new(4, 4)), None);
        assert_eq!(map.tile(Position::new(4, 4)), Some(Tile::Portal));
    }

    #[test]
    fn floor_tiles_are_row_major() {
        let map = Map::parse(SMALL).unwrap();
        let first: Vec<_> = map.floor_tiles().take(3).collect();
        assert_eq!(
            first,
            vec![Position::new(1, 1), Position::new(1, 2), Position::new(1, 4)]
        );
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.map");
        std::fs::write(&path, SMALL).unwrap();
        let map = Map::load(&path).unwrap();
        assert_eq!(map.gold_required(), 2);

        assert!(matches!(
            Map::load(&dir.path().join("missing.map")),
            Err(MapError::Io(_))
        ));
    }
}
