//! Minimal behavior tree used to lay out a character's turn.
//!
//! Every tick completes immediately: a node either settles the turn
//! ([`Status::Success`]) or hands over to the next one ([`Status::Failure`]).
//! Nodes are plain functions over the blackboard, so a tree is a static
//! slice and ticking it allocates nothing.

/// Result of ticking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl From<bool> for Status {
    #[inline]
    fn from(settled: bool) -> Self {
        if settled { Status::Success } else { Status::Failure }
    }
}

/// A node evaluated against the blackboard `C`.
pub trait Behavior<C> {
    fn tick(&self, ctx: &mut C) -> Status;
}

/// Leaf node: a stage function.
pub type Node<C> = fn(&mut C) -> Status;

impl<C> Behavior<C> for Node<C> {
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        self(ctx)
    }
}

/// Ticks children left to right until one succeeds (logical OR).
pub struct Selector<'n, C> {
    children: &'n [Node<C>],
}

impl<'n, C> Selector<'n, C> {
    pub const fn new(children: &'n [Node<C>]) -> Self {
        Self { children }
    }
}

impl<C> Behavior<C> for Selector<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in self.children {
            if child.tick(ctx).is_success() {
                return Status::Success;
            }
        }
        Status::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(log: &mut Vec<u8>) -> Status {
        log.push(1);
        Status::Success
    }

    fn fail(log: &mut Vec<u8>) -> Status {
        log.push(0);
        Status::Failure
    }

    #[test]
    fn selector_stops_at_first_success() {
        let children: [Node<Vec<u8>>; 4] = [fail, fail, ok, fail];
        let mut log = Vec::new();
        assert_eq!(Selector::new(&children).tick(&mut log), Status::Success);
        assert_eq!(log, vec![0, 0, 1]);

        let none: [Node<Vec<u8>>; 2] = [fail, fail];
        assert_eq!(Selector::new(&none).tick(&mut Vec::new()), Status::Failure);
        assert_eq!(Status::from(true), Status::Success);
    }
}
