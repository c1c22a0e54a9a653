//! Command interpreter: applies one client command to the world

use tracing::debug;

use crate::net::protocol::{ClientMsg, ParseError, ServerMsg};

use super::world::{ActionEffects, ActionError, GamePhase, Outcome, World};
use super::SessionId;

/// Reasons a command is rejected before or while it is applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("not your turn")]
    NotYourTurn,

    #[error("game over")]
    GameOver,

    #[error("chat is not supported")]
    ChatUnsupported,

    #[error("slow down")]
    RateLimited,
}

impl From<CommandError> for ServerMsg {
    fn from(err: CommandError) -> Self {
        ServerMsg::fail(err)
    }
}

/// Parse and apply one protocol line
pub fn interpret(world: &mut World, id: SessionId, line: &str) -> Outcome {
    match ClientMsg::parse(line) {
        Ok(msg) => execute(world, id, msg),
        Err(err) => {
            debug!(session_id = %id, error = %err, "Rejected command line");
            Outcome::reply(CommandError::from(err).into())
        }
    }
}

/// Apply a parsed command. Mutating commands must hold the turn; the turn
/// rotates after they are applied whether or not they succeeded.
pub fn execute(world: &mut World, id: SessionId, msg: ClientMsg) -> Outcome {
    match msg {
        ClientMsg::Look => match world.look(id) {
            Some(view) => Outcome::reply(ServerMsg::LookReply(view)),
            None => Outcome::reply(CommandError::from(ActionError::NotJoined).into()),
        },
        ClientMsg::Chat(_) => Outcome::reply(CommandError::ChatUnsupported.into()),
        ClientMsg::Quit => {
            let mut outcome = world.leave(id);
            outcome.reply.push(ServerMsg::Lose);
            outcome
        }
        ClientMsg::Move(dir) => take_turn(world, id, |world| world.move_player(id, dir)),
        ClientMsg::Pickup => take_turn(world, id, |world| world.pickup(id)),
    }
}

fn take_turn<F>(world: &mut World, id: SessionId, action: F) -> Outcome
where
    F: FnOnce(&mut World) -> Result<ActionEffects, ActionError>,
{
    if world.player(id).is_none() {
        return Outcome::reply(CommandError::from(ActionError::NotJoined).into());
    }
    if world.phase() != GamePhase::Running {
        return Outcome::reply(CommandError::GameOver.into());
    }
    if !world.turns().is_active(id) {
        return Outcome::reply(CommandError::NotYourTurn.into());
    }

    let mut outcome = Outcome::default();
    let others = world.others(id);
    let mut won = false;

    match action(world) {
        Ok(effects) => {
            if let Some(amount) = effects.gold_gained {
                outcome.reply.push(ServerMsg::TreasureMod(i64::from(amount)));
            }
            won = effects.won;
        }
        Err(err) => outcome.reply.push(CommandError::from(err).into()),
    }

    for other in &others {
        outcome.notices.push((*other, ServerMsg::Change));
    }

    if won {
        outcome.reply.push(ServerMsg::Win);
        for other in &others {
            outcome.notices.push((*other, ServerMsg::Win));
        }
        return outcome;
    }

    outcome.reply.push(ServerMsg::EndTurn);
    match world.turns_mut().end_turn(id) {
        Some(next) if next == id => outcome.reply.push(ServerMsg::StartTurn),
        Some(next) => outcome.notices.push((next, ServerMsg::StartTurn)),
        None => {}
    }
    outcome
}
