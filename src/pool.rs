//! Index-linked lists over fixed arenas
//!
//! A pool keeps its items in a fixed array and threads them through one
//! `next` link per slot. An [`IndexList`] is a head/tail pair over those
//! links. Since every slot carries a single link, a slot can belong to at
//! most one list at a time; moving it is O(1) and never allocates.

/// Successor of a slot, `None` at the end of a list
pub type Link = Option<u16>;

/// Singly-linked FIFO list of arena indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexList {
    head: Link,
    tail: Link,
    len: usize,
}

impl IndexList {
    /// Create an empty list
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of slots threaded on this list
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the list holds no slot
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Index of the first slot
    pub fn first(&self) -> Option<usize> {
        self.head.map(usize::from)
    }

    /// Append `index` at the tail
    ///
    /// The caller guarantees `index` is not currently on any list.
    pub fn push_back(&mut self, links: &mut [Link], index: usize) {
        debug_assert!(index <= u16::MAX as usize);
        let idx = index as u16;
        links[index] = None;
        match self.tail {
            Some(tail) => links[tail as usize] = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    /// Detach and return the first slot
    pub fn pop_front(&mut self, links: &mut [Link]) -> Option<usize> {
        let head = self.head? as usize;
        self.head = links[head];
        if self.head.is_none() {
            self.tail = None;
        }
        links[head] = None;
        self.len -= 1;
        Some(head)
    }

    /// Slot following `index` on this list
    pub fn next(&self, links: &[Link], index: usize) -> Option<usize> {
        links[index].map(usize::from)
    }

    /// Unlink `index`, whose predecessor is `prev` (`None` for the head).
    ///
    /// Returns the slot that followed `index`, so a caller walking the list
    /// can keep going after removing the current slot.
    pub fn remove(&mut self, links: &mut [Link], prev: Option<usize>, index: usize) -> Option<usize> {
        let next = links[index];
        match prev {
            Some(p) => links[p] = next,
            None => self.head = next,
        }
        if self.tail == Some(index as u16) {
            self.tail = prev.map(|p| p as u16);
        }
        links[index] = None;
        self.len -= 1;
        next.map(usize::from)
    }

    /// Walk the list front to back
    pub fn iter<'a>(&self, links: &'a [Link]) -> Iter<'a> {
        Iter {
            links,
            cursor: self.first(),
        }
    }
}

/// Iterator over the indices of an [`IndexList`]
pub struct Iter<'a> {
    links: &'a [Link],
    cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.cursor?;
        self.cursor = self.links[current].map(usize::from);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_fifo_order() {
        let mut links = [None; 4];
        let mut list = IndexList::new();

        list.push_back(&mut links, 2);
        list.push_back(&mut links, 0);
        list.push_back(&mut links, 3);
        assert_eq!(list.len(), 3);

        assert_eq!(list.pop_front(&mut links), Some(2));
        assert_eq!(list.pop_front(&mut links), Some(0));
        assert_eq!(list.pop_front(&mut links), Some(3));
        assert_eq!(list.pop_front(&mut links), None);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_remove_while_walking() {
        let mut links = [None; 5];
        let mut list = IndexList::new();
        for i in 0..5 {
            list.push_back(&mut links, i);
        }

        // Drop the odd slots in one pass
        let mut prev = None;
        let mut cursor = list.first();
        while let Some(index) = cursor {
            if index % 2 == 1 {
                cursor = list.remove(&mut links, prev, index);
            } else {
                prev = Some(index);
                cursor = list.next(&links, index);
            }
        }

        assert_eq!(list.iter(&links).collect::<Vec<_>>(), vec![0, 2, 4]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_remove_tail_then_append() {
        let mut links = [None; 3];
        let mut list = IndexList::new();
        list.push_back(&mut links, 0);
        list.push_back(&mut links, 1);

        assert_eq!(list.remove(&mut links, Some(0), 1), None);
        list.push_back(&mut links, 2);
        assert_eq!(list.iter(&links).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_remove_only_element() {
        let mut links = [None; 1];
        let mut list = IndexList::new();
        list.push_back(&mut links, 0);
        list.remove(&mut links, None, 0);
        assert!(list.is_empty());
        list.push_back(&mut links, 0);
        assert_eq!(list.first(), Some(0));
    }
}
