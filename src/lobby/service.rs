//! Game service - serializes every world operation and fans out the results

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::game::{interpret, CommandError, JoinError, Map, Outcome, SessionId, World};
use super::hub::{Hub, Inbox};

/// Owns the shared world. All mutation and turn bookkeeping happens inside
/// one critical section per operation, and resulting messages are queued
/// before the lock is released so every session sees them in world order.
pub struct GameService {
    world: Mutex<World>,
    hub: Hub,
}

impl GameService {
    pub fn new(map: Map, max_players: usize) -> Self {
        Self {
            world: Mutex::new(World::new(map, max_players)),
            hub: Hub::new(),
        }
    }

    /// Register a session and place its player. The inbox already holds
    /// the first look reply and turn state.
    pub fn connect(&self, id: SessionId) -> Result<Inbox, JoinError> {
        let inbox = self.hub.register(id);
        let mut world = self.world.lock();
        match world.join(id) {
            Ok(outcome) => {
                self.dispatch(id, outcome);
                Ok(inbox)
            }
            Err(err) => {
                self.hub.unregister(id);
                warn!(session_id = %id, error = %err, "Join rejected");
                Err(err)
            }
        }
    }

    /// Interpret one inbound line. Returns false once the session should end.
    pub fn submit(&self, id: SessionId, line: &str) -> bool {
        let mut world = self.world.lock();
        let outcome = interpret(&mut world, id, line);
        let end_session = outcome.end_session;
        self.dispatch(id, outcome);
        if end_session {
            self.hub.unregister(id);
        }
        !end_session
    }

    /// Answer a session with a rejection without touching the world
    pub fn reject(&self, id: SessionId, err: CommandError) {
        self.hub.send(id, err.into());
    }

    /// Release the player after the connection dropped. Safe to call after
    /// an explicit QUIT.
    pub fn disconnect(&self, id: SessionId) {
        let mut world = self.world.lock();
        if world.player(id).is_some() {
            let outcome = world.leave(id);
            self.dispatch(id, outcome);
            info!(session_id = %id, "Connection dropped, player released");
        }
        self.hub.unregister(id);
    }

    pub fn player_count(&self) -> usize {
        self.world.lock().player_count()
    }

    /// Run a read-only closure against a consistent world snapshot
    #[cfg(test)]
    pub fn with_world<T>(&self, f: impl FnOnce(&World) -> T) -> T {
        let world = self.world.lock();
        f(&world)
    }

    fn dispatch(&self, id: SessionId, outcome: Outcome) {
        for msg in outcome.reply {
            self.hub.send(id, msg);
        }
        for (to, msg) in outcome.notices {
            self.hub.send(to, msg);
        }
    }
}

/// Drain everything currently queued for a session
#[cfg(test)]
pub(crate) fn drain(inbox: &mut Inbox) -> Vec<crate::net::protocol::ServerMsg> {
    let mut out = Vec::new();
    while let Ok(msg) = inbox.try_recv() {
        out.push(msg);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::tests::SMALL;
    use crate::game::map::Position;
    use crate::net::protocol::ServerMsg;
    use std::sync::Arc;
    use uuid::Uuid;

    fn service(max_players: usize) -> GameService {
        GameService::new(Map::parse(SMALL).unwrap(), max_players)
    }

    fn names(msgs: &[ServerMsg]) -> Vec<String> {
        msgs.iter()
            .map(|m| match m {
                ServerMsg::LookReply(_) => "LOOKREPLY".to_string(),
                other => other.to_string(),
            })
            .collect()
    }

    #[test]
    fn first_player_gets_view_and_turn() {
        let game = service(4);
        let a = Uuid::new_v4();
        let mut inbox = game.connect(a).unwrap();
        assert_eq!(names(&drain(&mut inbox)), vec!["LOOKREPLY", "STARTTURN"]);
    }

    #[test]
    fn second_player_waits_and_first_hears_about_it() {
        let game = service(4);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut inbox_a = game.connect(a).unwrap();
        let mut inbox_b = game.connect(b).unwrap();
        drain(&mut inbox_a);

        assert_eq!(names(&drain(&mut inbox_b)), vec!["LOOKREPLY", "WAITING"]);

        assert!(game.submit(a, "MOVE S"));
        assert_eq!(names(&drain(&mut inbox_a)), vec!["ENDTURN"]);
        assert_eq!(names(&drain(&mut inbox_b)), vec!["CHANGE", "STARTTURN"]);

        assert!(game.submit(a, "MOVE S"));
        assert_eq!(names(&drain(&mut inbox_a)), vec!["FAIL not your turn"]);
        assert!(drain(&mut inbox_b).is_empty());
    }

    #[test]
    fn full_server_rejects_join() {
        let game = service(1);
        let _inbox = game.connect(Uuid::new_v4()).unwrap();
        assert_eq!(game.connect(Uuid::new_v4()).unwrap_err(), JoinError::Full);
        assert_eq!(game.player_count(), 1);
    }

    #[test]
    fn quit_flushes_lose_then_closes() {
        let game = service(4);
        let a = Uuid::new_v4();
        let mut inbox = game.connect(a).unwrap();
        drain(&mut inbox);

        assert!(!game.submit(a, "QUIT"));
        assert_eq!(names(&drain(&mut inbox)), vec!["LOSE"]);
        assert!(inbox.try_recv().is_err());
        assert_eq!(game.player_count(), 0);

        // A later disconnect is harmless
        game.disconnect(a);
    }

    #[test]
    fn disconnect_while_waiting_skips_vanished_session() {
        let game = service(4);
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut inboxes: Vec<_> = ids.iter().map(|id| game.connect(*id).unwrap()).collect();
        for inbox in inboxes.iter_mut() {
            drain(inbox);
        }

        game.disconnect(ids[1]);
        assert_eq!(names(&drain(&mut inboxes[0])), vec!["CHANGE"]);

        game.submit(ids[0], "MOVE S");
        assert!(names(&drain(&mut inboxes[1])).is_empty());
        // The second CHANGE merges into the one still queued
        assert_eq!(names(&drain(&mut inboxes[2])), vec!["CHANGE", "STARTTURN"]);
        game.with_world(|world| assert!(world.turns().is_active(ids[2])));
    }

    #[test]
    fn disconnect_of_active_player_passes_turn() {
        let game = service(4);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let _inbox_a = game.connect(a).unwrap();
        let mut inbox_b = game.connect(b).unwrap();
        drain(&mut inbox_b);

        game.disconnect(a);
        assert_eq!(names(&drain(&mut inbox_b)), vec!["CHANGE", "STARTTURN"]);
        assert!(game.submit(b, "MOVE W"));
        game.with_world(|world| {
            assert_eq!(world.player(b).unwrap().position, Position::new(1, 1));
        });
    }

    #[test]
    fn concurrent_moves_never_share_a_tile() {
        let game = Arc::new(service(4));
        let ids: Vec<_> = (0..4).map(|_| Uuid::new_v4()).collect();
        let _inboxes: Vec<_> = ids.iter().map(|id| game.connect(*id).unwrap()).collect();

        let handles: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let game = game.clone();
                let id = *id;
                std::thread::spawn(move || {
                    let dirs = ["MOVE E", "MOVE S", "MOVE W", "MOVE N"];
                    for step in 0..200 {
                        game.submit(id, dirs[(step + i) % dirs.len()]);
                        game.with_world(|world| {
                            let mut seen: Vec<Position> = world
                                .turns()
                                .iter()
                                .filter_map(|s| world.player(s))
                                .map(|p| p.position)
                                .collect();
                            let total = seen.len();
                            seen.sort_by_key(|p| (p.row, p.col));
                            seen.dedup();
                            assert_eq!(seen.len(), total);

                            let active = world
                                .turns()
                                .iter()
                                .filter(|s| world.turns().is_active(*s))
                                .count();
                            assert_eq!(active, 1);
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
