//! Room identifiers. A room identifier names a match and seeds its RNG.

use rand::Rng;

/// Source of fresh room identifiers for [`restart`](crate::MatchController::restart).
pub trait RoomIdSource {
    fn next_room_id(&mut self, prefix: &str) -> String;
}

/// Prefix followed by 16 hex digits of thread-local entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoomIds;

impl RoomIdSource for RandomRoomIds {
    fn next_room_id(&mut self, prefix: &str) -> String {
        let id: u64 = rand::rng().random();
        format!("{prefix}{id:016x}")
    }
}

/// Always hands out the same identifier, ignoring the prefix.
#[derive(Debug, Clone)]
pub struct FixedRoomId(pub String);

impl RoomIdSource for FixedRoomId {
    fn next_room_id(&mut self, _prefix: &str) -> String {
        self.0.clone()
    }
}

/// Prefix followed by a counter.
#[derive(Debug, Clone, Default)]
pub struct SequentialRoomIds {
    next: u64,
}

impl RoomIdSource for SequentialRoomIds {
    fn next_room_id(&mut self, prefix: &str) -> String {
        let id = self.next;
        self.next += 1;
        format!("{prefix}{id}")
    }
}
