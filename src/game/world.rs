//! Authoritative world state: terrain, players and turn order

use std::collections::HashMap;

use tracing::info;

use crate::net::protocol::{Direction, ServerMsg};

use super::map::{Item, Map, Position, Tile};
use super::player::{Pickup, Player};
use super::turn::{TurnScheduler, TurnState};
use super::visibility::LookReply;
use super::SessionId;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Players are exploring
    Running,
    /// Someone escaped through the portal with enough gold
    Won { winner: SessionId },
}

/// Rejected join attempts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("server full")]
    Full,

    #[error("no free spawn tile")]
    NoSpawnTile,

    #[error("game over")]
    GameOver,

    #[error("already joined")]
    AlreadyJoined,
}

/// Rejected world mutations. The message is sent back as `FAIL <message>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("cannot move into a wall")]
    Wall,

    #[error("cannot move off the map")]
    OutOfBounds,

    #[error("tile is occupied by another player")]
    Occupied,

    #[error("nothing to pick up")]
    NothingToPickUp,

    #[error("already carrying a {0}")]
    AlreadyCarrying(&'static str),

    #[error("not in the game")]
    NotJoined,
}

/// Messages produced by one world operation
#[derive(Debug, Default)]
pub struct Outcome {
    /// Lines for the session that issued the operation
    pub reply: Vec<ServerMsg>,
    /// Lines for other sessions, in delivery order
    pub notices: Vec<(SessionId, ServerMsg)>,
    /// The issuing session should be closed
    pub end_session: bool,
}

impl Outcome {
    pub fn reply(msg: ServerMsg) -> Self {
        Self {
            reply: vec![msg],
            ..Self::default()
        }
    }
}

/// Effects of a successful move or pickup
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ActionEffects {
    pub gold_gained: Option<u32>,
    pub won: bool,
}

/// The single source of truth, mutated only by command execution
pub struct World {
    map: Map,
    players: HashMap<SessionId, Player>,
    turns: TurnScheduler,
    phase: GamePhase,
    max_players: usize,
}

impl World {
    pub fn new(map: Map, max_players: usize) -> Self {
        Self {
            map,
            players: HashMap::new(),
            turns: TurnScheduler::new(),
            phase: GamePhase::Running,
            max_players,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn player(&self, id: SessionId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn turns(&self) -> &TurnScheduler {
        &self.turns
    }

    pub(crate) fn turns_mut(&mut self) -> &mut TurnScheduler {
        &mut self.turns
    }

    /// Sessions other than `id`, in turn order
    pub fn others(&self, id: SessionId) -> Vec<SessionId> {
        self.turns.iter().filter(|s| *s != id).collect()
    }

    fn is_occupied(&self, pos: Position) -> bool {
        self.players.values().any(|p| p.position == pos)
    }

    /// First free floor tile in row-major order
    fn spawn_tile(&self) -> Option<Position> {
        self.map.floor_tiles().find(|pos| !self.is_occupied(*pos))
    }

    /// Place a new player and queue them in the rotation
    pub fn join(&mut self, id: SessionId) -> Result<Outcome, JoinError> {
        if self.players.contains_key(&id) {
            return Err(JoinError::AlreadyJoined);
        }
        if self.phase != GamePhase::Running {
            return Err(JoinError::GameOver);
        }
        if self.players.len() >= self.max_players {
            return Err(JoinError::Full);
        }
        let spawn = self.spawn_tile().ok_or(JoinError::NoSpawnTile)?;

        self.players.insert(id, Player::new(spawn));
        let state = self.turns.join(id);

        info!(
            session_id = %id,
            spawn = %spawn,
            players = self.players.len(),
            "Player joined"
        );

        let mut outcome = Outcome::default();
        if let Some(view) = self.look(id) {
            outcome.reply.push(ServerMsg::LookReply(view));
        }
        outcome.reply.push(match state {
            TurnState::Active => ServerMsg::StartTurn,
            TurnState::Waiting => ServerMsg::Waiting,
        });
        outcome.notices = self
            .others(id)
            .into_iter()
            .map(|other| (other, ServerMsg::Change))
            .collect();
        Ok(outcome)
    }

    /// Remove a player, vacating their tile and releasing their turn slot
    pub fn leave(&mut self, id: SessionId) -> Outcome {
        let mut outcome = Outcome {
            end_session: true,
            ..Outcome::default()
        };

        let Some(player) = self.players.remove(&id) else {
            return outcome;
        };
        let next = self.turns.leave(id);

        info!(
            session_id = %id,
            gold = player.gold,
            players = self.players.len(),
            "Player left"
        );

        for other in self.others(id) {
            outcome.notices.push((other, ServerMsg::Change));
        }
        if let Some(next) = next {
            outcome.notices.push((next, ServerMsg::StartTurn));
        }
        outcome
    }

    /// Visibility snapshot for one player
    pub fn look(&self, id: SessionId) -> Option<LookReply> {
        let player = self.players.get(&id)?;
        let others: Vec<Position> = self
            .players
            .iter()
            .filter(|(other, _)| **other != id)
            .map(|(_, p)| p.position)
            .collect();
        Some(LookReply::render(
            &self.map,
            &others,
            player.position,
            player.view_radius(),
        ))
    }

    /// Step one tile, collecting whatever lies there
    pub fn move_player(
        &mut self,
        id: SessionId,
        dir: Direction,
    ) -> Result<ActionEffects, ActionError> {
        let from = self.players.get(&id).ok_or(ActionError::NotJoined)?.position;
        let (d_row, d_col) = dir.delta();
        let to = from.offset(d_row, d_col).ok_or(ActionError::OutOfBounds)?;

        let tile = self.map.tile(to).ok_or(ActionError::OutOfBounds)?;
        if !tile.is_walkable() {
            return Err(ActionError::Wall);
        }
        if self.is_occupied(to) {
            return Err(ActionError::Occupied);
        }

        let player = self.players.get_mut(&id).ok_or(ActionError::NotJoined)?;
        player.position = to;

        let mut effects = ActionEffects::default();
        if let Tile::Item(item) = tile {
            if player.can_take(item) {
                effects.gold_gained = collect(&mut self.map, player, to, item);
            }
        }

        if tile == Tile::Portal && player.gold >= self.map.gold_required() {
            effects.won = true;
            self.phase = GamePhase::Won { winner: id };
            info!(session_id = %id, gold = player.gold, "Player escaped through the portal");
        }

        Ok(effects)
    }

    /// Take an item left on the player's tile
    pub fn pickup(&mut self, id: SessionId) -> Result<ActionEffects, ActionError> {
        let player = self.players.get_mut(&id).ok_or(ActionError::NotJoined)?;
        let pos = player.position;
        let Some(Tile::Item(item)) = self.map.tile(pos) else {
            return Err(ActionError::NothingToPickUp);
        };
        if !player.can_take(item) {
            return Err(ActionError::AlreadyCarrying(item.name()));
        }

        Ok(ActionEffects {
            gold_gained: collect(&mut self.map, player, pos, item),
            won: false,
        })
    }
}

/// Clear the tile and apply the item to the player
fn collect(map: &mut Map, player: &mut Player, pos: Position, item: Item) -> Option<u32> {
    map.take_item(pos);
    match player.pick_up(item) {
        Pickup::Gold(amount) => Some(amount),
        Pickup::Applied | Pickup::AlreadyHeld => None,
    }
}
