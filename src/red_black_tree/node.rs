use crate::arena::Handle;

/// The color of a node in a red-black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// The side of a node relative to its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Left = 0,
    Right = 1,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// An internal node of a 2-3 red-black tree.
///
/// Nodes link both downward and upward: each child records which slot of its parent it
/// occupies in `direction`, so rotations and the bottom-up rebalancing walks never have to
/// re-identify which child pointer to update. `direction` is meaningful only while `parent`
/// is present.
pub struct Node<P> {
    pub payload: P,
    pub children: [Option<Handle>; 2],
    pub parent: Option<Handle>,
    pub direction: Direction,
    pub color: Color,
}

impl<P> Node<P> {
    pub fn new(payload: P, parent: Option<Handle>, direction: Direction) -> Self {
        Node {
            payload,
            children: [None, None],
            parent,
            direction,
            color: Color::Red,
        }
    }

    pub fn child(&self, direction: Direction) -> Option<Handle> {
        self.children[direction as usize]
    }

    pub fn set_child(&mut self, direction: Direction, child: Option<Handle>) {
        self.children[direction as usize] = child;
    }
}
