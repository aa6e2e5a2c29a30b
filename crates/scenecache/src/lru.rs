//! Access-ordered key set
//!
//! Uses an index-linked list over a slot vector for O(1) touch and removal.
//! Unlike a classic LRU there is no capacity: callers decide what to evict.
//! A dense vector of live slots gives O(1) access by position, so a random
//! sample of `k` keys costs O(k).

use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

/// Node in the access-order list
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
    /// Position of this slot in `dense`
    pos: usize,
}

/// Set of keys ordered from least to most recently used
pub struct LruSet<K> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K>>>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    free_list: Vec<usize>,
    /// Live slots in no particular order, for positional access
    dense: Vec<usize>,
}

impl<K> LruSet<K>
where
    K: Hash + Eq + Clone,
{
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
            nodes: Vec::new(),
            head: None,
            tail: None,
            free_list: Vec::new(),
            dense: Vec::new(),
        }
    }

    /// Check whether `key` is resident
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Move `key` to the most recently used end
    ///
    /// Returns `false` if the key is not resident.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.map.get(key) {
            Some(&idx) => {
                self.move_to_front(idx);
                true
            }
            None => false,
        }
    }

    /// Insert `key` at the most recently used end
    ///
    /// Returns `false` (and only touches the key) if it was already resident.
    pub fn insert(&mut self, key: K) -> bool {
        if self.touch(&key) {
            return false;
        }

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            prev: None,
            next: self.head,
            pos: self.dense.len(),
        });
        self.dense.push(idx);

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.map.insert(key, idx);
        true
    }

    /// Remove `key`, returning whether it was resident
    pub fn remove(&mut self, key: &K) -> bool {
        if let Some(idx) = self.map.remove(key) {
            self.unlink(idx);
            if let Some(node) = self.nodes[idx].take() {
                self.dense.swap_remove(node.pos);
                if let Some(&moved) = self.dense.get(node.pos) {
                    if let Some(moved_node) = &mut self.nodes[moved] {
                        moved_node.pos = node.pos;
                    }
                }
            }
            self.free_list.push(idx);
            true
        } else {
            false
        }
    }

    /// Iterate keys from least to most recently used
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            set: self,
            cursor: self.tail,
        }
    }

    /// Key stored at dense position `pos` (`0..len`)
    ///
    /// Positions are stable until the next removal, which moves the last
    /// key into the freed position. They carry no recency meaning.
    pub fn key_at(&self, pos: usize) -> Option<&K> {
        self.dense
            .get(pos)
            .and_then(|&idx| self.nodes[idx].as_ref())
            .map(|node| &node.key)
    }

    /// Number of resident keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no keys are resident
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = if let Some(node) = &self.nodes[idx] {
            (node.prev, node.next)
        } else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }
}

impl<K> Default for LruSet<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over an [`LruSet`], least recently used first
pub struct Iter<'a, K> {
    set: &'a LruSet<K>,
    cursor: Option<usize>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let set = self.set;
        let node = set.nodes[self.cursor?].as_ref()?;
        self.cursor = node.prev;
        Some(&node.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(set: &LruSet<u32>) -> Vec<u32> {
        set.iter().copied().collect()
    }

    #[test]
    fn test_insert_order() {
        let mut set = LruSet::new();

        assert!(set.insert(1));
        assert!(set.insert(2));
        assert!(set.insert(3));

        assert_eq!(keys(&set), vec![1, 2, 3]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_touch_moves_to_end() {
        let mut set = LruSet::new();
        set.insert(1);
        set.insert(2);
        set.insert(3);

        assert!(set.touch(&1));
        assert_eq!(keys(&set), vec![2, 3, 1]);

        assert!(set.touch(&1)); // Already newest
        assert_eq!(keys(&set), vec![2, 3, 1]);

        assert!(!set.touch(&9));
    }

    #[test]
    fn test_insert_existing_touches() {
        let mut set = LruSet::new();
        set.insert(1);
        set.insert(2);

        assert!(!set.insert(1));
        assert_eq!(keys(&set), vec![2, 1]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut set = LruSet::new();
        set.insert(1);
        set.insert(2);
        set.insert(3);

        assert!(set.remove(&2));
        assert!(!set.remove(&2));
        assert_eq!(keys(&set), vec![1, 3]);

        assert!(set.remove(&1));
        assert!(set.remove(&3));
        assert!(set.is_empty());
        assert_eq!(set.key_at(0), None);
        assert_eq!(keys(&set), Vec::<u32>::new());
    }

    #[test]
    fn test_slot_reuse() {
        let mut set = LruSet::new();
        set.insert(1);
        set.insert(2);
        set.remove(&1);
        set.insert(3);

        assert_eq!(keys(&set), vec![2, 3]);
        assert!(set.contains(&3));
        assert!(!set.contains(&1));
    }

    #[test]
    fn test_key_at_positions() {
        let mut set = LruSet::new();
        set.insert(10);
        set.insert(20);
        set.insert(30);
        set.touch(&10); // Recency does not move positions

        assert_eq!(set.key_at(0), Some(&10));
        assert_eq!(set.key_at(2), Some(&30));
        assert_eq!(set.key_at(3), None);

        // Last key fills the freed position
        set.remove(&10);
        assert_eq!(set.key_at(0), Some(&30));
        assert_eq!(set.key_at(1), Some(&20));
        assert_eq!(set.key_at(2), None);

        set.insert(40);
        let mut positional: Vec<u32> = (0..set.len())
            .filter_map(|p| set.key_at(p).copied())
            .collect();
        positional.sort();
        assert_eq!(positional, vec![20, 30, 40]);
        assert_eq!(keys(&set), vec![20, 30, 40]);
    }
}
