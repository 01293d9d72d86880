use std::alloc::Layout;
use std::ptr::NonNull;

use super::RBTreeError;


pub(super) type Link<T> = Option<NonNull<Node<T>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Color {
    Red,
    Black,
}

/// A single node of the tree.
///
/// The node knows nothing about the tree-wide invariants. `left` and `right` own the nodes they
/// point to, `parent` is a non-owning back-reference (`None` for the root).
pub(super) struct Node<T> {
    pub(super) value: T,
    pub(super) left: Link<T>,
    pub(super) right: Link<T>,
    pub(super) parent: Link<T>,
    pub(super) color: Color,
}

// NOTE: every `unsafe fn` below that takes a `NonNull<Self>` requires it to point to a live node
//       owned by a tree that is not currently borrowed elsewhere for writing.
impl<T> Node<T> {
    /// Moves `value` into a freshly allocated, unlinked, red node.
    ///
    /// On allocation failure the value is handed back to the caller.
    pub(super) fn try_alloc(value: T) -> Result<NonNull<Self>, (RBTreeError, T)> {
        let layout = Layout::new::<Self>();

        #[cfg(test)]
        if alloc_failure::should_fail() {
            warn!("Injected allocation failure for a {} byte node", layout.size());
            return Err((RBTreeError::OutOfMemory(layout), value))
        }

        // SAFETY: `Node<T>` is never zero-sized, it always holds three links and a color.
        let raw = unsafe { std::alloc::alloc(layout) }.cast::<Self>();
        let Some(ptr) = NonNull::new(raw) else {
            warn!("Failed to allocate a {} byte node", layout.size());
            return Err((RBTreeError::OutOfMemory(layout), value))
        };

        // SAFETY: the memory was just allocated with the layout of `Self`.
        unsafe {
            ptr.write(Node {
                value,
                left: None,
                right: None,
                parent: None,
                color: Color::Red,
            })
        };

        Ok(ptr)
    }

    /// Frees a node and moves its value out.
    ///
    /// SAFETY: `this` must have come from `try_alloc`, and nothing may link to it anymore.
    pub(super) unsafe fn free(this: NonNull<Self>) -> T {
        // SAFETY: guaranteed by caller. `Node` has no `Drop` impl, so reading it out and
        //         deallocating the memory without dropping it in place is fine.
        unsafe {
            let node = this.as_ptr().read();
            std::alloc::dealloc(this.as_ptr().cast(), Layout::new::<Self>());
            node.value
        }
    }

    /// Sets the left child slot, updating the incoming node's parent link.
    ///
    /// The previous left child is overwritten without being freed.
    pub(super) unsafe fn attach_left(this: NonNull<Self>, child: Link<T>) {
        unsafe {
            if let Some(child) = child {
                (*child.as_ptr()).parent = Some(this);
            }
            (*this.as_ptr()).left = child;
        }
    }

    /// Sets the right child slot, updating the incoming node's parent link.
    ///
    /// The previous right child is overwritten without being freed.
    pub(super) unsafe fn attach_right(this: NonNull<Self>, child: Link<T>) {
        unsafe {
            if let Some(child) = child {
                (*child.as_ptr()).parent = Some(this);
            }
            (*this.as_ptr()).right = child;
        }
    }

    pub(super) unsafe fn is_left_child_of(this: NonNull<Self>, candidate: Link<T>) -> bool {
        let Some(candidate) = candidate else { return false };
        unsafe { (*this.as_ptr()).parent == Some(candidate) && (*candidate.as_ptr()).left == Some(this) }
    }

    pub(super) unsafe fn is_right_child_of(this: NonNull<Self>, candidate: Link<T>) -> bool {
        let Some(candidate) = candidate else { return false };
        unsafe { (*this.as_ptr()).parent == Some(candidate) && (*candidate.as_ptr()).right == Some(this) }
    }

    pub(super) unsafe fn leftmost(mut this: NonNull<Self>) -> NonNull<Self> {
        while let Some(left) = unsafe { (*this.as_ptr()).left } {
            this = left;
        }
        this
    }

    pub(super) unsafe fn rightmost(mut this: NonNull<Self>) -> NonNull<Self> {
        while let Some(right) = unsafe { (*this.as_ptr()).right } {
            this = right;
        }
        this
    }

    /// The next node in sorted order, using only the local parent/child links.
    pub(super) unsafe fn successor(this: NonNull<Self>) -> Link<T> {
        unsafe {
            if let Some(right) = (*this.as_ptr()).right {
                return Some(Self::leftmost(right))
            }

            let mut current = this;
            while Self::is_right_child_of(current, (*current.as_ptr()).parent) {
                current = (*current.as_ptr()).parent?;
            }
            // either a left child (the parent is next) or the root (we ran off the end)
            (*current.as_ptr()).parent
        }
    }

    /// The previous node in sorted order. Mirror image of [`Self::successor`].
    pub(super) unsafe fn predecessor(this: NonNull<Self>) -> Link<T> {
        unsafe {
            if let Some(left) = (*this.as_ptr()).left {
                return Some(Self::rightmost(left))
            }

            let mut current = this;
            while Self::is_left_child_of(current, (*current.as_ptr()).parent) {
                current = (*current.as_ptr()).parent?;
            }
            (*current.as_ptr()).parent
        }
    }

    /// SAFETY: the returned reference must not outlive the node, and the node must not be
    ///         mutated while it is alive.
    pub(super) unsafe fn value<'a>(this: NonNull<Self>) -> &'a T {
        unsafe { &(*this.as_ptr()).value }
    }

    pub(super) unsafe fn color(link: Link<T>) -> Color {
        // absent children count as black
        match link {
            Some(node) => unsafe { (*node.as_ptr()).color },
            None => Color::Black,
        }
    }

    pub(super) unsafe fn is_red(link: Link<T>) -> bool {
        unsafe { Self::color(link) == Color::Red }
    }

    pub(super) unsafe fn set_color(this: NonNull<Self>, color: Color) {
        unsafe { (*this.as_ptr()).color = color };
    }
}
