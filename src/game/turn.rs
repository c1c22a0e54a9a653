//! Strict round-robin turn order across connected players

use super::SessionId;

/// Turn state of a single player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// May submit a mutating command
    Active,
    /// Queued behind the active player
    Waiting,
}

/// Rotation of session ids in join order. Exactly one entry is active
/// whenever the rotation is non-empty.
#[derive(Debug, Default)]
pub struct TurnScheduler {
    order: Vec<SessionId>,
    active: usize,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a player to the end of the rotation, returns their initial state
    pub fn join(&mut self, id: SessionId) -> TurnState {
        if self.order.contains(&id) {
            return self.state(id).unwrap_or(TurnState::Waiting);
        }
        self.order.push(id);
        if self.order.len() == 1 {
            self.active = 0;
            TurnState::Active
        } else {
            TurnState::Waiting
        }
    }

    /// Remove a player. If they held the turn, returns the player who now does.
    pub fn leave(&mut self, id: SessionId) -> Option<SessionId> {
        let idx = self.order.iter().position(|s| *s == id)?;
        self.order.remove(idx);

        if self.order.is_empty() {
            self.active = 0;
            return None;
        }

        if idx < self.active {
            self.active -= 1;
            None
        } else if idx == self.active {
            self.active %= self.order.len();
            Some(self.order[self.active])
        } else {
            None
        }
    }

    /// Finish `id`'s turn and hand it to the next player (wrapping).
    /// Returns the newly active player, which is `id` itself when alone.
    pub fn end_turn(&mut self, id: SessionId) -> Option<SessionId> {
        if self.active() != Some(id) {
            return None;
        }
        self.active = (self.active + 1) % self.order.len();
        Some(self.order[self.active])
    }

    pub fn active(&self) -> Option<SessionId> {
        self.order.get(self.active).copied()
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        self.active() == Some(id)
    }

    pub fn state(&self, id: SessionId) -> Option<TurnState> {
        if !self.order.contains(&id) {
            return None;
        }
        Some(if self.is_active(id) {
            TurnState::Active
        } else {
            TurnState::Waiting
        })
    }

    /// Session ids in rotation order
    pub fn iter(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.order.iter().copied()
    }
}
