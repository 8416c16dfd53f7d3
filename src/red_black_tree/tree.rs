use crate::arena::{Arena, Handle};
use crate::red_black_tree::node::{Color, Direction, Node};
use crate::red_black_tree::Error;
use std::cmp::Ordering;
use std::mem;

/// Where a probed key lives in the tree: an existing node, or the attachment point a new
/// node would take.
pub enum Location {
    Occupied(Handle),
    Vacant {
        parent: Option<Handle>,
        direction: Direction,
    },
}

/// A 2-3 red-black tree over payloads of type `P`.
///
/// The tree stores its nodes in an arena and is agnostic about what a payload contains;
/// every key decision enters through probe closures, so typed and type-erased containers
/// share this code path.
pub struct Tree<P> {
    nodes: Arena<Node<P>>,
    root: Option<Handle>,
}

impl<P> Tree<P> {
    pub fn new() -> Self {
        Tree {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub fn payload(&self, node: Handle) -> &P {
        &self.nodes[node].payload
    }

    pub fn payload_mut(&mut self, node: Handle) -> &mut P {
        &mut self.nodes[node].payload
    }

    fn is_red(&self, node: Option<Handle>) -> bool {
        // an absent node is black
        match node {
            Some(handle) => self.nodes[handle].color == Color::Red,
            None => false,
        }
    }

    fn is_black(&self, node: Option<Handle>) -> bool {
        !self.is_red(node)
    }

    /// Walks the `direction` child links until they run out, yielding the minimum (left) or
    /// maximum (right) node of the subtree.
    fn xmost_node(&self, mut node: Handle, direction: Direction) -> Handle {
        while let Some(child) = self.nodes[node].child(direction) {
            node = child;
        }
        node
    }

    /// Descends preferring the `direction` child, falling back to the other, until a leaf is
    /// reached: the first node a post-order walk of the subtree would visit.
    fn xmost_leaf(&self, mut node: Handle, direction: Direction) -> Handle {
        loop {
            if let Some(child) = self.nodes[node].child(direction) {
                node = child;
            } else if let Some(child) = self.nodes[node].child(direction.opposite()) {
                node = child;
            } else {
                return node;
            }
        }
    }

    /// The next node of a post-order walk (`Right`), or the previous one (`Left`).
    fn post_order_xcessor(&self, node: Handle, direction: Direction) -> Option<Handle> {
        let parent = self.nodes[node].parent?;
        if self.nodes[node].direction != direction {
            if let Some(subtree) = self.nodes[parent].child(direction) {
                return Some(self.xmost_leaf(subtree, direction.opposite()));
            }
        }
        Some(parent)
    }

    /// Rotates the subtree rooted at `node` toward `direction` and returns the new subtree
    /// root. The new root keeps the rotated node's color and direction, and the displaced
    /// middle grandchild's color moves onto the rotated node, so black depths outside the
    /// subtree are untouched. The caller reattaches the returned root.
    ///
    /// Precondition: the child opposite `direction` exists.
    fn rotate(&mut self, node: Handle, direction: Direction) -> Handle {
        let promoted = self.nodes[node]
            .child(direction.opposite())
            .expect("rotation requires a child opposite the rotation direction");
        let parent = self.nodes[node].parent;
        let node_direction = self.nodes[node].direction;
        let node_color = self.nodes[node].color;

        let middle = self.nodes[promoted].child(direction);
        let promoted_color = self.nodes[promoted].color;

        if let Some(middle) = middle {
            let middle_node = &mut self.nodes[middle];
            middle_node.parent = Some(node);
            middle_node.direction = direction.opposite();
        }

        {
            let rotated = &mut self.nodes[node];
            rotated.set_child(direction.opposite(), middle);
            rotated.parent = Some(promoted);
            rotated.direction = direction;
            rotated.color = promoted_color;
        }

        {
            let promoted_node = &mut self.nodes[promoted];
            promoted_node.set_child(direction, Some(node));
            promoted_node.parent = parent;
            promoted_node.direction = node_direction;
            promoted_node.color = node_color;
        }

        promoted
    }

    /// Writes a rotated subtree root back into its parent's child slot, or into the tree
    /// root when the subtree has no parent.
    fn reattach(&mut self, subtree: Handle) {
        match self.nodes[subtree].parent {
            Some(parent) => {
                let direction = self.nodes[subtree].direction;
                self.nodes[parent].set_child(direction, Some(subtree));
            }
            None => self.root = Some(subtree),
        }
    }

    /// Descends from the root, steering by `probe`: `Less` goes left, `Greater` goes right.
    pub fn locate<F>(&self, mut probe: F) -> Location
    where
        F: FnMut(&P) -> Ordering,
    {
        let mut parent = None;
        let mut direction = Direction::Left;
        let mut node = self.root;

        while let Some(handle) = node {
            match probe(&self.nodes[handle].payload) {
                Ordering::Less => {
                    parent = Some(handle);
                    direction = Direction::Left;
                    node = self.nodes[handle].child(Direction::Left);
                }
                Ordering::Greater => {
                    parent = Some(handle);
                    direction = Direction::Right;
                    node = self.nodes[handle].child(Direction::Right);
                }
                Ordering::Equal => return Location::Occupied(handle),
            }
        }

        Location::Vacant { parent, direction }
    }

    pub fn find<F>(&self, probe: F) -> Option<Handle>
    where
        F: FnMut(&P) -> Ordering,
    {
        match self.locate(probe) {
            Location::Occupied(node) => Some(node),
            Location::Vacant { .. } => None,
        }
    }

    /// Attaches a new red node at a vacancy reported by [`locate`](#method.locate) and
    /// rebalances upward. On allocation failure the tree is unchanged.
    pub fn insert_at(
        &mut self,
        parent: Option<Handle>,
        direction: Direction,
        payload: P,
    ) -> Result<Handle, Error> {
        let inserted = self
            .nodes
            .try_allocate(Node::new(payload, parent, direction))?;
        match parent {
            Some(parent) => self.nodes[parent].set_child(direction, Some(inserted)),
            None => self.root = Some(inserted),
        }

        let mut node = inserted;

        while let Some(mut parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Red {
                if self.nodes[node].direction != self.nodes[parent].direction {
                    // A red chain bending the wrong way: rotate the parent so the chain
                    // leans in one direction before the grandparent rotation.
                    node = parent;
                    let direction = self.nodes[node].direction;
                    let subtree = self.rotate(node, direction);
                    self.reattach(subtree);
                }

                let above = self.nodes[node].parent.expect("a red node is never the root");
                let grandparent = self.nodes[above]
                    .parent
                    .expect("a red node is never the root");
                let direction = self.nodes[node].direction;
                let subtree = self.rotate(grandparent, direction.opposite());
                self.reattach(subtree);

                parent = self.nodes[node].parent.expect("a rotation keeps the node attached");
            }

            // A black parent with two red children is an overfull 3-node: split it by
            // pushing the redness up one level, then keep seeking from there.
            let direction = self.nodes[node].direction;
            match self.nodes[parent].child(direction.opposite()) {
                Some(sibling) if self.nodes[sibling].color == Color::Red => {
                    self.nodes[node].color = Color::Black;
                    self.nodes[sibling].color = Color::Black;
                    self.nodes[parent].color = Color::Red;
                    node = parent;
                }
                _ => break,
            }
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }

        Ok(inserted)
    }

    /// Detaches a node and returns its payload, rebalancing upward when the removal leaves a
    /// path one black node short.
    pub fn remove_at(&mut self, mut node: Handle) -> P {
        if let (Some(left), Some(_)) = (
            self.nodes[node].child(Direction::Left),
            self.nodes[node].child(Direction::Right),
        ) {
            // A node with two children trades payloads with its in-order predecessor, which
            // has at most one child, and the predecessor is detached instead.
            let predecessor = self.xmost_node(left, Direction::Right);
            let (target, donor) = self.nodes.get2_mut(node, predecessor);
            mem::swap(&mut target.payload, &mut donor.payload);
            node = predecessor;
        }

        let parent = self.nodes[node].parent;
        let node_direction = self.nodes[node].direction;
        let node_color = self.nodes[node].color;

        let child = self.nodes[node]
            .child(Direction::Left)
            .or_else(|| self.nodes[node].child(Direction::Right));
        if let Some(child) = child {
            // A lone child splices into the detached node's place, inheriting its
            // attachment and color.
            {
                let child_node = &mut self.nodes[child];
                child_node.parent = parent;
                child_node.direction = node_direction;
                child_node.color = node_color;
            }
            let payload = self.nodes.free(node).payload;
            match parent {
                Some(parent) => self.nodes[parent].set_child(node_direction, Some(child)),
                None => self.root = Some(child),
            }
            return payload;
        }

        let payload = self.nodes.free(node).payload;
        match parent {
            Some(parent) => self.nodes[parent].set_child(node_direction, None),
            None => self.root = None,
        }

        // Detaching a red leaf removes no black node; detaching the root shortens every
        // path alike. Everything else owes the vacated slot one black node.
        let mut parent = match parent {
            Some(parent) if node_color == Color::Black => parent,
            _ => return payload,
        };
        let mut node_direction = node_direction;

        loop {
            let sibling = self.nodes[parent]
                .child(node_direction.opposite())
                .expect("a black-deficient slot has a sibling");

            if self.nodes[sibling].color == Color::Red {
                // A red sibling hides the black nephews; rotate it above the parent so the
                // deficit faces a black sibling.
                let subtree = self.rotate(parent, node_direction);
                self.reattach(subtree);
            }

            let sibling = self.nodes[parent]
                .child(node_direction.opposite())
                .expect("a black-deficient slot has a sibling");
            self.nodes[sibling].color = Color::Red;

            if self.is_red(self.nodes[sibling].child(Direction::Left))
                || self.is_red(self.nodes[sibling].child(Direction::Right))
            {
                let sibling_direction = self.nodes[sibling].direction;
                if self.is_black(self.nodes[sibling].child(sibling_direction)) {
                    // The red nephew is the inner one; rotate it outward first.
                    let subtree = self.rotate(sibling, sibling_direction);
                    let direction = self.nodes[subtree].direction;
                    self.nodes[parent].set_child(direction, Some(subtree));
                }

                let subtree = self.rotate(parent, node_direction);
                self.reattach(subtree);

                let left = self.nodes[subtree]
                    .child(Direction::Left)
                    .expect("the rotated subtree root has two children");
                let right = self.nodes[subtree]
                    .child(Direction::Right)
                    .expect("the rotated subtree root has two children");
                self.nodes[left].color = Color::Black;
                self.nodes[right].color = Color::Black;
                return payload;
            }

            // No red nephew to borrow from: the whole subtree is now one black short, so
            // the deficit moves up a level.
            let node = parent;
            node_direction = self.nodes[node].direction;
            match self.nodes[node].parent {
                Some(above) if self.nodes[node].color == Color::Black => parent = above,
                _ => {
                    self.nodes[node].color = Color::Black;
                    return payload;
                }
            }
        }
    }

    /// Releases every node with a post-order walk and resets the root.
    pub fn clear(&mut self) {
        if let Some(root) = self.root {
            let mut node = Some(self.xmost_leaf(root, Direction::Left));
            while let Some(handle) = node {
                node = self.post_order_xcessor(handle, Direction::Right);
                self.nodes.free(handle);
            }
        }
        self.root = None;
    }

    /// Deep-copies the tree into a fresh arena by replaying its shape in post-order: twins
    /// are allocated top-down, and the walk climbs whenever a subtree is exhausted. On
    /// allocation failure the partial copy is released and the source is untouched.
    pub fn try_clone(&self) -> Result<Self, Error>
    where
        P: Clone,
    {
        let mut clone = Tree::new();

        let src_root = match self.root {
            Some(root) => root,
            None => return Ok(clone),
        };

        let dst_root = clone.nodes.try_allocate(Node {
            payload: self.nodes[src_root].payload.clone(),
            children: [None, None],
            parent: None,
            direction: self.nodes[src_root].direction,
            color: self.nodes[src_root].color,
        })?;
        clone.root = Some(dst_root);

        let mut src = src_root;
        let mut dst = dst_root;

        loop {
            let direction;
            if self.nodes[src].child(Direction::Left).is_some() {
                direction = Direction::Left;
            } else if self.nodes[src].child(Direction::Right).is_some() {
                direction = Direction::Right;
            } else {
                // Climb until a node still has an uncopied right subtree.
                loop {
                    if self.nodes[src].child(Direction::Right).is_some()
                        && clone.nodes[dst].child(Direction::Right).is_none()
                    {
                        break;
                    }
                    match self.nodes[src].parent {
                        Some(parent) => {
                            dst = clone.nodes[dst]
                                .parent
                                .expect("the copy mirrors the source tree");
                            src = parent;
                        }
                        None => return Ok(clone),
                    }
                }
                direction = Direction::Right;
            }

            let child = self.nodes[src]
                .child(direction)
                .expect("the descent direction points at a child");
            let twin = clone.nodes.try_allocate(Node {
                payload: self.nodes[child].payload.clone(),
                children: [None, None],
                parent: Some(dst),
                direction,
                color: self.nodes[child].color,
            })?;
            clone.nodes[dst].set_child(direction, Some(twin));
            src = child;
            dst = twin;
        }
    }

    /// Visits every payload in key order.
    pub fn in_order<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a P),
    {
        fn walk<'a, P, F>(tree: &'a Tree<P>, node: Handle, visit: &mut F)
        where
            F: FnMut(&'a P),
        {
            if let Some(left) = tree.nodes[node].child(Direction::Left) {
                walk(tree, left, visit);
            }
            visit(&tree.nodes[node].payload);
            if let Some(right) = tree.nodes[node].child(Direction::Right) {
                walk(tree, right, visit);
            }
        }

        if let Some(root) = self.root {
            walk(self, root, &mut visit);
        }
    }

    /// Validates every structural invariant of the tree plus key ordering under `compare`
    /// and the tracked length, reporting the first violation found.
    pub fn check<F>(&self, expected_len: usize, mut compare: F) -> Result<(), Error>
    where
        F: FnMut(&P, &P) -> Ordering,
    {
        if let Some(root) = self.root {
            if self.nodes[root].color == Color::Red {
                return Err(Error::InvariantViolation("the root must be black"));
            }
            if self.nodes[root].parent.is_some() {
                return Err(Error::InvariantViolation("the root must not have a parent"));
            }
            self.check_structure(root)?;
            self.check_order(root, &mut None, &mut compare)?;
        }

        if self.count_nodes() != expected_len {
            return Err(Error::InvariantViolation(
                "the reachable node count must match the tracked length",
            ));
        }

        Ok(())
    }

    /// Recursively validates links, colors, and black depth; returns the subtree's black
    /// depth, counting absent children as one black node.
    fn check_structure(&self, node: Handle) -> Result<usize, Error> {
        let mut depths = [1, 1];

        for &direction in &[Direction::Left, Direction::Right] {
            if let Some(child) = self.nodes[node].child(direction) {
                if self.nodes[child].parent != Some(node) {
                    return Err(Error::InvariantViolation(
                        "a child must link back to its parent",
                    ));
                }
                if self.nodes[child].direction != direction {
                    return Err(Error::InvariantViolation(
                        "a child's direction tag must match its slot",
                    ));
                }
                if self.nodes[child].color == Color::Red && self.nodes[node].color == Color::Red {
                    return Err(Error::InvariantViolation(
                        "a red node must not have a red parent",
                    ));
                }
                depths[direction as usize] = self.check_structure(child)?;
            }
        }

        if self.is_red(self.nodes[node].child(Direction::Left))
            && self.is_red(self.nodes[node].child(Direction::Right))
        {
            return Err(Error::InvariantViolation(
                "a node must not have two red children",
            ));
        }

        if depths[0] != depths[1] {
            return Err(Error::InvariantViolation(
                "every path must contain the same number of black nodes",
            ));
        }

        Ok(depths[0] + if self.nodes[node].color == Color::Black { 1 } else { 0 })
    }

    fn check_order<F>(
        &self,
        node: Handle,
        previous: &mut Option<Handle>,
        compare: &mut F,
    ) -> Result<(), Error>
    where
        F: FnMut(&P, &P) -> Ordering,
    {
        if let Some(left) = self.nodes[node].child(Direction::Left) {
            self.check_order(left, previous, compare)?;
        }

        if let Some(previous) = *previous {
            if compare(&self.nodes[previous].payload, &self.nodes[node].payload) != Ordering::Less {
                return Err(Error::InvariantViolation(
                    "keys must be unique and strictly increasing in order",
                ));
            }
        }
        *previous = Some(node);

        if let Some(right) = self.nodes[node].child(Direction::Right) {
            self.check_order(right, previous, compare)?;
        }

        Ok(())
    }

    /// Counts reachable nodes by streaming the tree in post-order.
    fn count_nodes(&self) -> usize {
        let mut count = 0;
        if let Some(root) = self.root {
            let mut node = Some(self.xmost_leaf(root, Direction::Left));
            while let Some(handle) = node {
                count += 1;
                node = self.post_order_xcessor(handle, Direction::Right);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, Tree};
    use crate::red_black_tree::node::{Color, Direction};
    use crate::red_black_tree::Error;

    fn insert(tree: &mut Tree<i32>, key: i32) {
        match tree.locate(|&stored| key.cmp(&stored)) {
            Location::Occupied(_) => panic!("duplicate key in test fixture"),
            Location::Vacant { parent, direction } => {
                tree.insert_at(parent, direction, key).unwrap();
            }
        }
    }

    fn checked(tree: &Tree<i32>, expected_len: usize) {
        tree.check(expected_len, |x, y| x.cmp(y)).unwrap();
    }

    #[test]
    fn test_empty_tree_checks() {
        let tree: Tree<i32> = Tree::new();
        checked(&tree, 0);
    }

    #[test]
    fn test_insert_ascending_stays_balanced() {
        let mut tree = Tree::new();
        for key in 0..64 {
            insert(&mut tree, key);
            checked(&tree, (key + 1) as usize);
        }
    }

    #[test]
    fn test_insert_descending_stays_balanced() {
        let mut tree = Tree::new();
        for key in (0..64).rev() {
            insert(&mut tree, key);
            checked(&tree, (64 - key) as usize);
        }
    }

    #[test]
    fn test_remove_rebalances() {
        let mut tree = Tree::new();
        for key in 0..64 {
            insert(&mut tree, (key * 37) % 64);
        }
        for key in 0..64 {
            let node = tree.find(|&stored| key.cmp(&stored)).unwrap();
            assert_eq!(tree.remove_at(node), key);
            checked(&tree, (63 - key) as usize);
        }
    }

    #[test]
    fn test_in_order_is_sorted() {
        let mut tree = Tree::new();
        for key in &[5, 1, 9, 3, 7, 0, 8] {
            insert(&mut tree, *key);
        }
        let mut keys = Vec::new();
        tree.in_order(|&key| keys.push(key));
        assert_eq!(keys, vec![0, 1, 3, 5, 7, 8, 9]);
    }

    #[test]
    fn test_clear_releases_all_nodes() {
        let mut tree = Tree::new();
        for key in 0..32 {
            insert(&mut tree, key);
        }
        tree.clear();
        checked(&tree, 0);
        assert!(tree.find(|&stored| 7.cmp(&stored)).is_none());
    }

    #[test]
    fn test_try_clone_matches_source() {
        let mut tree = Tree::new();
        for key in &[4, 2, 6, 1, 3, 5, 7, 0] {
            insert(&mut tree, *key);
        }

        let clone = tree.try_clone().unwrap();
        checked(&clone, 8);

        let mut source_keys = Vec::new();
        tree.in_order(|&key| source_keys.push(key));
        let mut clone_keys = Vec::new();
        clone.in_order(|&key| clone_keys.push(key));
        assert_eq!(source_keys, clone_keys);
    }

    #[test]
    fn test_check_detects_red_root() {
        let mut tree = Tree::new();
        insert(&mut tree, 1);
        let root = tree.root.unwrap();
        tree.nodes[root].color = Color::Red;
        assert_eq!(
            tree.check(1, |x: &i32, y: &i32| x.cmp(y)),
            Err(Error::InvariantViolation("the root must be black")),
        );
    }

    #[test]
    fn test_check_detects_two_red_children() {
        let mut tree = Tree::new();
        for key in &[2, 1, 3] {
            insert(&mut tree, *key);
        }
        let root = tree.root.unwrap();
        let left = tree.nodes[root].child(Direction::Left).unwrap();
        let right = tree.nodes[root].child(Direction::Right).unwrap();
        tree.nodes[left].color = Color::Red;
        tree.nodes[right].color = Color::Red;
        assert!(tree.check(3, |x: &i32, y: &i32| x.cmp(y)).is_err());
    }

    #[test]
    fn test_check_detects_wrong_count() {
        let mut tree = Tree::new();
        insert(&mut tree, 1);
        assert_eq!(
            tree.check(2, |x: &i32, y: &i32| x.cmp(y)),
            Err(Error::InvariantViolation(
                "the reachable node count must match the tracked length",
            )),
        );
    }

    #[test]
    fn test_check_detects_misordered_keys() {
        let mut tree = Tree::new();
        for key in &[2, 1, 3] {
            insert(&mut tree, *key);
        }
        let root = tree.root.unwrap();
        let left = tree.nodes[root].child(Direction::Left).unwrap();
        *tree.payload_mut(left) = 9;
        assert_eq!(
            tree.check(3, |x: &i32, y: &i32| x.cmp(y)),
            Err(Error::InvariantViolation(
                "keys must be unique and strictly increasing in order",
            )),
        );
    }
}
