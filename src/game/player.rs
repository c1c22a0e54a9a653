//! Per-connection player state

use super::map::{Item, Position};

/// Health every player spawns with
pub const MAX_HEALTH: i32 = 3;

/// Items a player is carrying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inventory {
    pub has_armour: bool,
    pub has_sword: bool,
    pub has_lantern: bool,
}

/// Result of trying to pick up an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pickup {
    /// Gold added to the purse
    Gold(u32),
    /// Non-gold effect applied
    Applied,
    /// Already carrying one, item stays on the floor
    AlreadyHeld,
}

/// Player state (authoritative). A player is alive exactly while it is
/// present in the world; leaving removes it.
#[derive(Debug, Clone)]
pub struct Player {
    pub position: Position,
    pub health: i32,
    pub gold: u32,
    pub inventory: Inventory,
}

impl Player {
    pub fn new(spawn: Position) -> Self {
        Self {
            position: spawn,
            health: MAX_HEALTH,
            gold: 0,
            inventory: Inventory::default(),
        }
    }

    /// Whether this item would be consumed if picked up now
    pub fn can_take(&self, item: Item) -> bool {
        match item {
            Item::Gold(_) | Item::Health => true,
            Item::Armour => !self.inventory.has_armour,
            Item::Sword => !self.inventory.has_sword,
            Item::Lantern => !self.inventory.has_lantern,
        }
    }

    /// Apply an item's pickup effect
    pub fn pick_up(&mut self, item: Item) -> Pickup {
        if !self.can_take(item) {
            return Pickup::AlreadyHeld;
        }
        match item {
            Item::Gold(amount) => {
                self.gold += amount;
                return Pickup::Gold(amount);
            }
            Item::Health => self.health = (self.health + 1).min(MAX_HEALTH),
            Item::Armour => self.inventory.has_armour = true,
            Item::Sword => self.inventory.has_sword = true,
            Item::Lantern => self.inventory.has_lantern = true,
        }
        Pickup::Applied
    }

    /// Look radius around the player
    pub fn view_radius(&self) -> usize {
        if self.inventory.has_lantern {
            3
        } else {
            2
        }
    }
}
