/// A slot in the slab: either a stored value or a link in the free list.
enum Entry<T> {
    Vacant(Option<usize>),
    Occupied(T),
}

/// Indexed storage with stable keys and slot reuse.
///
/// Keys returned by [`insert`](Self::insert) stay valid until the value is
/// removed; the freed slot is then handed out again by a later insert. The
/// synchronization primitives use it to address queued waiters without
/// shifting the rest of the queue when one of them leaves early.
pub(crate) struct Slab<T> {
    entries: Vec<Entry<T>>,
    /// Head of the intrusive free list.
    next_free: Option<usize>,
}

impl<T> Slab<T> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_free: None,
        }
    }

    /// Stores `value` and returns its key.
    pub(crate) fn insert(&mut self, value: T) -> usize {
        match self.next_free {
            Some(key) => {
                let Entry::Vacant(next) = self.entries[key] else {
                    unreachable!("free list points at an occupied slot");
                };

                self.next_free = next;
                self.entries[key] = Entry::Occupied(value);
                key
            }
            None => {
                self.entries.push(Entry::Occupied(value));
                self.entries.len() - 1
            }
        }
    }

    /// Removes and returns the value stored under `key`, if any.
    pub(crate) fn remove(&mut self, key: usize) -> Option<T> {
        let entry = self.entries.get_mut(key)?;

        if matches!(entry, Entry::Vacant(_)) {
            return None;
        }

        let Entry::Occupied(value) = std::mem::replace(entry, Entry::Vacant(self.next_free)) else {
            unreachable!();
        };

        self.next_free = Some(key);

        Some(value)
    }

    pub(crate) fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        match self.entries.get_mut(key)? {
            Entry::Occupied(value) => Some(value),
            Entry::Vacant(_) => None,
        }
    }

    /// Empties the slab, yielding the stored values in key order.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> + use<T> {
        self.next_free = None;

        std::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Occupied(value) => Some(value),
                Entry::Vacant(_) => None,
            })
    }
}

impl<T> Default for Slab<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Slab;

    #[test]
    fn keys_are_reused_after_removal() {
        let mut slab = Slab::new();

        let a = slab.insert("a");
        let b = slab.insert("b");

        assert_eq!(slab.remove(a), Some("a"));
        assert_eq!(slab.remove(a), None);

        let c = slab.insert("c");
        assert_eq!(c, a);
        assert_eq!(slab.get_mut(b), Some(&mut "b"));
        assert_eq!(slab.get_mut(c), Some(&mut "c"));
    }

    #[test]
    fn drain_yields_live_values_and_resets() {
        let mut slab = Slab::new();

        let a = slab.insert(1);
        slab.insert(2);
        slab.insert(3);
        slab.remove(a);

        let drained: Vec<_> = slab.drain().collect();
        assert_eq!(drained, vec![2, 3]);
        assert_eq!(slab.drain().count(), 0);
        assert_eq!(slab.insert(4), 0);
    }

    #[test]
    fn out_of_range_keys_are_ignored() {
        let mut slab: Slab<u32> = Slab::new();

        assert!(slab.get_mut(3).is_none());
        assert!(slab.remove(3).is_none());
    }
}
