//! Recency (LRU) list over an arena of blocks.
//!
//! Entries live in a slot arena and are addressed by stable `BlockHandle`s.
//! The list threads the live slots from most recently used (head) to least
//! recently used (tail). Freed slots are recycled.
//!
//! # Performance
//!
//! - **Time Complexity:** `push_front()`, `remove()`, `move_to_front()` and
//!   `back()` are O(1)
//! - **Space Complexity:** O(peak number of live entries)

/// Stable handle to an entry of a [`RecencyList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHandle(usize);

struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked MRU-to-LRU list with arena storage.
pub struct RecencyList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> RecencyList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value` at the most recently used position.
    pub fn push_front(&mut self, value: T) -> BlockHandle {
        let node = Node {
            value,
            prev: None,
            next: self.head,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(old) => self.node_mut(old).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
        BlockHandle(idx)
    }

    /// Unlinks the entry and returns its value. Stale handles yield `None`.
    pub fn remove(&mut self, handle: BlockHandle) -> Option<T> {
        let idx = handle.0;
        self.slots.get(idx)?.as_ref()?;
        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some(node.value)
    }

    /// Moves the entry to the most recently used position.
    pub fn move_to_front(&mut self, handle: BlockHandle) {
        let idx = handle.0;
        if self.head == Some(idx) || !self.contains(handle) {
            return;
        }
        self.unlink(idx);
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(old) => self.node_mut(old).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// Handle of the most recently used entry.
    pub fn front(&self) -> Option<BlockHandle> {
        self.head.map(BlockHandle)
    }

    /// Handle of the least recently used entry.
    pub fn back(&self) -> Option<BlockHandle> {
        self.tail.map(BlockHandle)
    }

    pub fn contains(&self, handle: BlockHandle) -> bool {
        matches!(self.slots.get(handle.0), Some(Some(_)))
    }

    pub fn get(&self, handle: BlockHandle) -> Option<&T> {
        self.slots.get(handle.0)?.as_ref().map(|n| &n.value)
    }

    pub fn get_mut(&mut self, handle: BlockHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0)?.as_mut().map(|n| &mut n.value)
    }

    /// Iterates from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        self.slots[idx]
            .as_mut()
            .expect("recency list link points at a free slot")
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node_mut(idx);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// MRU-to-LRU iterator over a [`RecencyList`].
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (BlockHandle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = self.list.slots[idx].as_ref()?;
        self.cursor = node.next;
        Some((BlockHandle(idx), &node.value))
    }
}
