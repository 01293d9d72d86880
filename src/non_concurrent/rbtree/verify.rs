//! Independent checks of the tree's invariants, for tests and debugging only.

use std::fmt::{self, Display};
use std::ptr::NonNull;

use super::node::{Color, Link, Node};
use super::RBTree;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    RedRoot,
    RootHasParent,
    /// A red node with a red child.
    DoubleRed,
    /// Two paths from the same node see a different number of black nodes.
    BlackHeightMismatch,
    /// A value sits on the wrong side of one of its ancestors.
    OutOfOrder,
    /// A child's parent link does not point back at its parent.
    BrokenParentLink,
    SizeMismatch { counted: usize, recorded: usize },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot => write!(f, "the root is red"),
            Self::RootHasParent => write!(f, "the root has a parent"),
            Self::DoubleRed => write!(f, "a red node has a red child"),
            Self::BlackHeightMismatch => write!(f, "black heights differ between paths"),
            Self::OutOfOrder => write!(f, "values are out of order"),
            Self::BrokenParentLink => write!(f, "a parent link does not match its child link"),
            Self::SizeMismatch { counted, recorded } => write!(f, "counted {counted} nodes, but the tree thinks it has {recorded}"),
        }
    }
}

impl std::error::Error for InvariantViolation {}

impl<T> RBTree<T> {
    /// Counts the nodes reachable from the root.
    pub fn compute_size(&self) -> usize {
        fn count<T>(link: Link<T>) -> usize {
            let Some(node) = link else { return 0 };
            // SAFETY: the tree is borrowed for the whole walk.
            unsafe { 1 + count((*node.as_ptr()).left) + count((*node.as_ptr()).right) }
        }
        count(self.root)
    }

    /// The number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        fn height<T>(link: Link<T>) -> usize {
            let Some(node) = link else { return 0 };
            // SAFETY: the tree is borrowed for the whole walk.
            unsafe { 1 + height((*node.as_ptr()).left).max(height((*node.as_ptr()).right)) }
        }
        height(self.root)
    }

    /// The number of black nodes on every path from the root down to an absent child, counting
    /// the root.
    pub fn black_height(&self) -> Result<usize, InvariantViolation> {
        fn black_height<T>(link: Link<T>) -> Result<usize, InvariantViolation> {
            let Some(node) = link else { return Ok(0) };
            // SAFETY: the tree is borrowed for the whole walk.
            unsafe {
                let left = black_height((*node.as_ptr()).left)?;
                let right = black_height((*node.as_ptr()).right)?;
                if left != right {
                    return Err(InvariantViolation::BlackHeightMismatch)
                }
                Ok(left + ((*node.as_ptr()).color == Color::Black) as usize)
            }
        }
        black_height(self.root)
    }

    /// Checks the coloring rules: black root, no red node with a red child, equal black heights.
    pub fn verify_red_black(&self) -> Result<(), InvariantViolation> {
        fn no_double_red<T>(link: Link<T>) -> Result<(), InvariantViolation> {
            let Some(node) = link else { return Ok(()) };
            // SAFETY: the tree is borrowed for the whole walk.
            unsafe {
                let (left, right) = ((*node.as_ptr()).left, (*node.as_ptr()).right);
                if (*node.as_ptr()).color == Color::Red && (Node::is_red(left) || Node::is_red(right)) {
                    return Err(InvariantViolation::DoubleRed)
                }
                no_double_red(left)?;
                no_double_red(right)
            }
        }

        // SAFETY: the tree is borrowed.
        if unsafe { Node::is_red(self.root) } {
            return Err(InvariantViolation::RedRoot)
        }
        no_double_red(self.root)?;
        self.black_height().map(|_| ())
    }

    /// Checks that parent and child links agree everywhere.
    pub fn verify_links(&self) -> Result<(), InvariantViolation> {
        fn links<T>(link: Link<T>) -> Result<(), InvariantViolation> {
            let Some(node) = link else { return Ok(()) };
            // SAFETY: the tree is borrowed for the whole walk.
            unsafe {
                let (left, right) = ((*node.as_ptr()).left, (*node.as_ptr()).right);
                if left.is_some_and(|l| !Node::is_left_child_of(l, Some(node)))
                    || right.is_some_and(|r| !Node::is_right_child_of(r, Some(node)))
                {
                    return Err(InvariantViolation::BrokenParentLink)
                }
                links(left)?;
                links(right)
            }
        }

        // SAFETY: the tree is borrowed.
        if self.root.is_some_and(|root| unsafe { (*root.as_ptr()).parent.is_some() }) {
            return Err(InvariantViolation::RootHasParent)
        }
        links(self.root)
    }

    /// Recomputes the size and compares it with the recorded one.
    pub fn verify_size(&self) -> Result<(), InvariantViolation> {
        let counted = self.compute_size();
        if counted == self.len {
            Ok(())
        } else {
            Err(InvariantViolation::SizeMismatch { counted, recorded: self.len })
        }
    }

    /// Every check at once.
    pub fn verify(&self) -> Result<(), InvariantViolation> where T: Ord {
        self.verify_links()?;
        self.verify_order()?;
        self.verify_red_black()?;
        self.verify_size()
    }
}

impl<T: Ord> RBTree<T> {
    /// Checks the search-tree ordering: everything left of a node orders at or before it, and
    /// everything right of it at or after it.
    pub fn verify_order(&self) -> Result<(), InvariantViolation> {
        // returns the (smallest, largest) values of the subtree
        fn extremes<'a, T: Ord>(node: NonNull<Node<T>>) -> Result<(&'a T, &'a T), InvariantViolation> {
            // SAFETY: the tree is borrowed for the whole walk, and the references never escape
            //         `verify_order`.
            unsafe {
                let value = Node::value(node);
                let (mut min, mut max) = (value, value);
                if let Some(left) = (*node.as_ptr()).left {
                    let (lmin, lmax) = extremes(left)?;
                    if lmax > value { return Err(InvariantViolation::OutOfOrder) }
                    min = lmin;
                }
                if let Some(right) = (*node.as_ptr()).right {
                    let (rmin, rmax) = extremes(right)?;
                    if rmin < value { return Err(InvariantViolation::OutOfOrder) }
                    max = rmax;
                }
                Ok((min, max))
            }
        }

        match self.root {
            Some(root) => extremes(root).map(|_| ()),
            None => Ok(()),
        }
    }
}
