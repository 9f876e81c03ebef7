//! Pooled, best-first move queue.
//!
//! Moves live in an arena of slots addressed by [`MoveHandle`]. Released
//! slots go on a free list and are reused before the arena grows; the arena
//! never holds more than `capacity` live moves. The queue itself is a singly
//! linked chain through the slots' `next` fields, ordered best first.

use crate::config::MoveOrder;

use super::moves::Move;

/// Index of a slot in the move arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveHandle(usize);

#[derive(Debug, Clone)]
struct Slot {
    mv: Move,
    next: Option<MoveHandle>,
}

/// Arena of move records with a free list and a hard cap.
#[derive(Debug, Clone)]
pub struct MovePool {
    slots: Vec<Slot>,
    free: Vec<MoveHandle>,
    capacity: usize,
}

impl MovePool {
    pub fn new(capacity: usize) -> Self {
        MovePool {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
        }
    }

    /// Store a move, or return `None` when the pool is exhausted.
    pub fn allocate(&mut self, mv: Move) -> Option<MoveHandle> {
        if let Some(handle) = self.free.pop() {
            self.slots[handle.0] = Slot { mv, next: None };
            return Some(handle);
        }
        if self.slots.len() >= self.capacity {
            return None;
        }
        self.slots.push(Slot { mv, next: None });
        Some(MoveHandle(self.slots.len() - 1))
    }

    /// Return a slot to the free list.
    pub fn release(&mut self, handle: MoveHandle) {
        debug_assert!(!self.free.contains(&handle));
        self.slots[handle.0].next = None;
        self.free.push(handle);
    }

    /// Number of moves currently held.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, handle: MoveHandle) -> &Move {
        &self.slots[handle.0].mv
    }

    fn get_mut(&mut self, handle: MoveHandle) -> &mut Move {
        &mut self.slots[handle.0].mv
    }

    fn next(&self, handle: MoveHandle) -> Option<MoveHandle> {
        self.slots[handle.0].next
    }

    fn set_next(&mut self, handle: MoveHandle, next: Option<MoveHandle>) {
        self.slots[handle.0].next = next;
    }
}

/// Best-first chain of pending moves.
#[derive(Debug, Clone)]
pub struct MoveQueue {
    pool: MovePool,
    order: MoveOrder,
    head: Option<MoveHandle>,
    len: usize,
    /// Moves inserted since the last [`MoveQueue::link`]
    staged: Vec<MoveHandle>,
}

impl MoveQueue {
    pub fn new(order: MoveOrder, capacity: usize) -> Self {
        MoveQueue {
            pool: MovePool::new(capacity),
            order,
            head: None,
            len: 0,
            staged: Vec::new(),
        }
    }

    /// Number of linked moves.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0 && self.staged.is_empty()
    }

    pub fn pool(&self) -> &MovePool {
        &self.pool
    }

    /// Stage a move for insertion. Returns `false` when the pool is exhausted.
    ///
    /// Staged moves join the chain on the next call to [`MoveQueue::link`].
    pub fn insert(&mut self, mv: Move) -> bool {
        match self.pool.allocate(mv) {
            Some(handle) => {
                self.staged.push(handle);
                true
            }
            None => false,
        }
    }

    /// Sort the staged moves and merge them into the chain.
    pub fn link(&mut self) {
        if self.staged.is_empty() {
            return;
        }

        let order = self.order;
        let pool = &self.pool;
        self.staged
            .sort_by(|&a, &b| pool.get(a).compare(pool.get(b), order));

        let staged = std::mem::take(&mut self.staged);
        let mut incoming = staged.iter().copied().peekable();
        let mut existing = self.head;
        let mut head = None;
        let mut tail: Option<MoveHandle> = None;

        loop {
            let take_incoming = match (incoming.peek(), existing) {
                (Some(&a), Some(b)) => self.pool.get(a).compare(self.pool.get(b), order).is_lt(),
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let handle = if take_incoming {
                incoming.next()
            } else {
                let current = existing;
                existing = existing.and_then(|h| self.pool.next(h));
                current
            };
            let Some(handle) = handle else { break };

            match tail {
                Some(t) => self.pool.set_next(t, Some(handle)),
                None => head = Some(handle),
            }
            tail = Some(handle);
        }
        if let Some(t) = tail {
            self.pool.set_next(t, None);
        }

        self.len += staged.len();
        self.head = head;
        self.staged = staged;
        self.staged.clear();
    }

    /// Remove and return the best move.
    pub fn pop_front(&mut self) -> Option<Move> {
        self.link();
        let handle = self.head?;
        self.head = self.pool.next(handle);
        self.len -= 1;
        let mv = *self.pool.get(handle);
        self.pool.release(handle);
        Some(mv)
    }

    /// The best move without removing it.
    pub fn peek(&self) -> Option<&Move> {
        self.head.map(|h| self.pool.get(h))
    }

    /// Visit every linked move once, dropping those for which `keep` returns
    /// `false`. `keep` may rewrite a move in place. The best survivor is moved
    /// to the front of the chain afterwards.
    pub fn retain_mut<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut Move) -> bool,
    {
        self.link();
        let order = self.order;
        let mut prev: Option<MoveHandle> = None;
        let mut current = self.head;
        // (best, its predecessor)
        let mut best: Option<(MoveHandle, Option<MoveHandle>)> = None;

        while let Some(handle) = current {
            let next = self.pool.next(handle);
            if keep(self.pool.get_mut(handle)) {
                let better = match best {
                    Some((b, _)) => self.pool.get(handle).compare(self.pool.get(b), order).is_lt(),
                    None => true,
                };
                if better {
                    best = Some((handle, prev));
                }
                prev = Some(handle);
            } else {
                match prev {
                    Some(p) => self.pool.set_next(p, next),
                    None => self.head = next,
                }
                self.pool.release(handle);
                self.len -= 1;
            }
            current = next;
        }

        if let Some((handle, Some(pred))) = best {
            self.pool.set_next(pred, self.pool.next(handle));
            self.pool.set_next(handle, self.head);
            self.head = Some(handle);
        }
    }

    /// Release every move, linked or staged.
    pub fn clear(&mut self) {
        let mut current = self.head;
        while let Some(handle) = current {
            current = self.pool.next(handle);
            self.pool.release(handle);
        }
        for handle in std::mem::take(&mut self.staged) {
            self.pool.release(handle);
        }
        self.head = None;
        self.len = 0;
    }

    /// Linked moves from best to worst.
    pub fn iter(&self) -> impl Iterator<Item = &Move> + '_ {
        let mut current = self.head;
        std::iter::from_fn(move || {
            let handle = current?;
            current = self.pool.next(handle);
            Some(self.pool.get(handle))
        })
    }
}
