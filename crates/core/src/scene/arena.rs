use serde::{Deserialize, Serialize};

use crate::actor::Actor;

/// Generational handle to an actor stored in a scene. A handle outlives its
/// actor safely: once the slot is reused the generation no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId {
    index: u32,
    generation: u32,
}

impl ActorId {
    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    actor: Option<Actor>,
}

#[derive(Debug, Default)]
pub(crate) struct ActorArena {
    slots: Vec<Slot>,
    free_indices: Vec<u32>,
    len: usize,
}

impl ActorArena {
    pub fn insert(&mut self, actor: Actor) -> ActorId {
        self.len += 1;
        // Reuse a previously freed slot in O(1).
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.actor = Some(actor);
            return ActorId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            actor: Some(actor),
        });
        ActorId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: ActorId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.slot(id)?.actor.as_ref()
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .actor
            .as_mut()
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.get(id).is_some()
    }

    /// Removes an actor, bumping the slot generation.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let actor = slot.actor.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index);
        self.len -= 1;
        Some(actor)
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ids_miss_after_reuse() {
        let mut arena = ActorArena::default();
        let first = arena.insert(Actor::new().with_name("first"));
        assert!(arena.remove(first).is_some());
        assert!(arena.remove(first).is_none());

        let second = arena.insert(Actor::new().with_name("second"));
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second).map(Actor::name), Some("second"));
        assert_eq!(arena.len(), 1);
    }
}
