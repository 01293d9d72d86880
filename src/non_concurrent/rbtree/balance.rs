//! Structural surgery on the node graph: rotations, splicing, and the two red-black fixups.

use std::ptr::NonNull;

use super::node::{Color, Link, Node};
use super::RBTree;


// SAFETY (for the whole module): every `NonNull<Node<T>>` handed to these functions must be a
// live node owned by `self`.
impl<T> RBTree<T> {
    /// Puts `new` where `old` used to hang off `parent` (or at the root if there is no parent).
    ///
    /// `old`'s own links are left untouched.
    pub(super) unsafe fn replace_child(&mut self, parent: Link<T>, old: NonNull<Node<T>>, new: Link<T>) {
        unsafe {
            match parent {
                None => {
                    if let Some(new) = new {
                        (*new.as_ptr()).parent = None;
                    }
                    self.root = new;
                }
                Some(parent) if (*parent.as_ptr()).left == Some(old) => Node::attach_left(parent, new),
                Some(parent) => {
                    debug_assert!((*parent.as_ptr()).right == Some(old), "`old` is not a child of `parent`");
                    Node::attach_right(parent, new)
                }
            }
        }
    }

    /// ```text
    ///     node               pivot
    ///    /    \             /     \
    ///   a     pivot  =>   node     c
    ///        /     \     /    \
    ///       b       c   a      b
    /// ```
    pub(super) unsafe fn rotate_left(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let pivot = (*node.as_ptr()).right.expect("rotate_left needs a right child");
            trace!("Rotating left at {node:016x?}");

            let parent = (*node.as_ptr()).parent;
            Node::attach_right(node, (*pivot.as_ptr()).left);
            self.replace_child(parent, node, Some(pivot));
            Node::attach_left(pivot, Some(node));
        }
    }

    /// Mirror image of [`Self::rotate_left`].
    pub(super) unsafe fn rotate_right(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let pivot = (*node.as_ptr()).left.expect("rotate_right needs a left child");
            trace!("Rotating right at {node:016x?}");

            let parent = (*node.as_ptr()).parent;
            Node::attach_left(node, (*pivot.as_ptr()).right);
            self.replace_child(parent, node, Some(pivot));
            Node::attach_right(pivot, Some(node));
        }
    }

    /// Restores the red-black rules after `node` was linked in as a red leaf.
    pub(super) unsafe fn insert_fixup(&mut self, mut node: NonNull<Node<T>>) {
        unsafe {
            // a red-red violation is only possible while the parent is red
            while let Some(parent) = (*node.as_ptr()).parent {
                if (*parent.as_ptr()).color == Color::Black { break }

                let Some(grandparent) = (*parent.as_ptr()).parent else {
                    // the parent is the root
                    Node::set_color(parent, Color::Black);
                    break
                };

                let parent_is_left = Node::is_left_child_of(parent, Some(grandparent));
                let aunt = if parent_is_left {
                    (*grandparent.as_ptr()).right
                } else {
                    (*grandparent.as_ptr()).left
                };

                if let Some(aunt) = aunt.filter(|&a| (*a.as_ptr()).color == Color::Red) {
                    trace!("Insert fixup: red aunt, recoloring at {grandparent:016x?}");
                    Node::set_color(parent, Color::Black);
                    Node::set_color(aunt, Color::Black);
                    Node::set_color(grandparent, Color::Red);
                    node = grandparent;
                    continue
                }

                // black (or absent) aunt: one or two rotations settle it for good
                let mut top = parent;
                if parent_is_left {
                    if Node::is_right_child_of(node, Some(parent)) {
                        trace!("Insert fixup: left-right zig-zag at {grandparent:016x?}");
                        self.rotate_left(parent);
                        top = node;
                    }
                    self.rotate_right(grandparent);
                } else {
                    if Node::is_left_child_of(node, Some(parent)) {
                        trace!("Insert fixup: right-left zig-zag at {grandparent:016x?}");
                        self.rotate_right(parent);
                        top = node;
                    }
                    self.rotate_left(grandparent);
                }
                Node::set_color(top, Color::Black);
                Node::set_color(grandparent, Color::Red);
                break
            }

            if let Some(root) = self.root {
                Node::set_color(root, Color::Black);
            }
        }
    }

    /// Removes `node` from the tree and frees it.
    ///
    /// Returns the removed value and the node that now holds the in-order successor, if any.
    pub(super) unsafe fn erase_node(&mut self, node: NonNull<Node<T>>) -> (T, Link<T>) {
        unsafe {
            let (left, right) = ((*node.as_ptr()).left, (*node.as_ptr()).right);
            if let (Some(_), Some(right)) = (left, right) {
                // two children: trade values with the successor, which has no left child, and
                // unlink the successor's node instead. `node` ends up holding the successor value.
                let successor = Node::leftmost(right);
                std::mem::swap(&mut (*node.as_ptr()).value, &mut (*successor.as_ptr()).value);
                return (self.unlink(successor), Some(node))
            }

            let next = Node::successor(node);
            (self.unlink(node), next)
        }
    }

    /// Splices out a node with at most one child and frees it.
    unsafe fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        unsafe {
            let (left, right) = ((*node.as_ptr()).left, (*node.as_ptr()).right);
            debug_assert!(left.is_none() || right.is_none(), "unlink needs a node with at most one child");

            let child = left.or(right);
            let parent = (*node.as_ptr()).parent;
            self.replace_child(parent, node, child);
            self.len -= 1;

            // removing a red node never changes a black height
            if (*node.as_ptr()).color == Color::Black {
                self.erase_fixup(child, parent);
            }

            Node::free(node)
        }
    }

    /// Resolves the "double black" left behind at `node` (possibly absent), a child of `parent`,
    /// after a black node was removed from that position.
    unsafe fn erase_fixup(&mut self, mut node: Link<T>, mut parent: Link<T>) {
        unsafe {
            while node != self.root && !Node::is_red(node) {
                let Some(p) = parent else { break };

                if (*p.as_ptr()).left == node {
                    let mut sibling = (*p.as_ptr()).right.expect("a double black node always has a sibling");

                    if (*sibling.as_ptr()).color == Color::Red {
                        trace!("Erase fixup: red sibling at {p:016x?}");
                        Node::set_color(sibling, Color::Black);
                        Node::set_color(p, Color::Red);
                        self.rotate_left(p);
                        sibling = (*p.as_ptr()).right.expect("a double black node always has a sibling");
                    }

                    if !Node::is_red((*sibling.as_ptr()).left) && !Node::is_red((*sibling.as_ptr()).right) {
                        trace!("Erase fixup: black nephews, pushing the deficit up from {p:016x?}");
                        Node::set_color(sibling, Color::Red);
                        node = Some(p);
                        parent = (*p.as_ptr()).parent;
                        continue
                    }

                    if !Node::is_red((*sibling.as_ptr()).right) {
                        // only the near nephew is red, turn it into the far one
                        let near = (*sibling.as_ptr()).left.expect("checked red above");
                        Node::set_color(near, Color::Black);
                        Node::set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = near;
                    }

                    trace!("Erase fixup: red far nephew at {p:016x?}");
                    Node::set_color(sibling, (*p.as_ptr()).color);
                    Node::set_color(p, Color::Black);
                    if let Some(far) = (*sibling.as_ptr()).right {
                        Node::set_color(far, Color::Black);
                    }
                    self.rotate_left(p);
                } else {
                    let mut sibling = (*p.as_ptr()).left.expect("a double black node always has a sibling");

                    if (*sibling.as_ptr()).color == Color::Red {
                        trace!("Erase fixup: red sibling at {p:016x?}");
                        Node::set_color(sibling, Color::Black);
                        Node::set_color(p, Color::Red);
                        self.rotate_right(p);
                        sibling = (*p.as_ptr()).left.expect("a double black node always has a sibling");
                    }

                    if !Node::is_red((*sibling.as_ptr()).left) && !Node::is_red((*sibling.as_ptr()).right) {
                        trace!("Erase fixup: black nephews, pushing the deficit up from {p:016x?}");
                        Node::set_color(sibling, Color::Red);
                        node = Some(p);
                        parent = (*p.as_ptr()).parent;
                        continue
                    }

                    if !Node::is_red((*sibling.as_ptr()).left) {
                        let near = (*sibling.as_ptr()).right.expect("checked red above");
                        Node::set_color(near, Color::Black);
                        Node::set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = near;
                    }

                    trace!("Erase fixup: red far nephew at {p:016x?}");
                    Node::set_color(sibling, (*p.as_ptr()).color);
                    Node::set_color(p, Color::Black);
                    if let Some(far) = (*sibling.as_ptr()).left {
                        Node::set_color(far, Color::Black);
                    }
                    self.rotate_right(p);
                }

                // the rotation absorbed the deficit
                node = self.root;
                break
            }

            if let Some(node) = node {
                Node::set_color(node, Color::Black);
            }
        }
    }
}
