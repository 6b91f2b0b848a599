//! Sequence diffing.
//!
//! [`arrays_diff_sequence`] is the keyed sequence differ used for children
//! reconciliation. It walks the target positions left to right against a
//! working copy of the old sequence, so every operation's `index` refers to the
//! sequence as it looks after all previous operations have been applied.

/// One operation of a diff sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayDiffOp<T> {
    /// Insert `item` at `index`.
    Add { item: T, index: usize },
    /// Remove the item at `index`.
    Remove {
        item: T,
        index: usize,
        original_index: Option<usize>,
    },
    /// Move the item at `from` to `index`.
    Move {
        item: T,
        original_index: Option<usize>,
        from: usize,
        index: usize,
    },
    /// The item at `index` stays where it is.
    Noop {
        item: T,
        original_index: Option<usize>,
        index: usize,
    },
}

impl<T> ArrayDiffOp<T> {
    /// Position the operation applies to.
    pub fn index(&self) -> usize {
        match self {
            ArrayDiffOp::Add { index, .. }
            | ArrayDiffOp::Remove { index, .. }
            | ArrayDiffOp::Move { index, .. }
            | ArrayDiffOp::Noop { index, .. } => *index,
        }
    }

    /// Position of the affected item in the old sequence, when it came from there.
    pub fn original_index(&self) -> Option<usize> {
        match self {
            ArrayDiffOp::Add { .. } => None,
            ArrayDiffOp::Remove { original_index, .. }
            | ArrayDiffOp::Move { original_index, .. }
            | ArrayDiffOp::Noop { original_index, .. } => *original_index,
        }
    }

    pub fn item(&self) -> &T {
        match self {
            ArrayDiffOp::Add { item, .. }
            | ArrayDiffOp::Remove { item, .. }
            | ArrayDiffOp::Move { item, .. }
            | ArrayDiffOp::Noop { item, .. } => item,
        }
    }

    /// Replace the carried item, keeping positions.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ArrayDiffOp<U> {
        match self {
            ArrayDiffOp::Add { item, index } => ArrayDiffOp::Add {
                item: f(item),
                index,
            },
            ArrayDiffOp::Remove {
                item,
                index,
                original_index,
            } => ArrayDiffOp::Remove {
                item: f(item),
                index,
                original_index,
            },
            ArrayDiffOp::Move {
                item,
                original_index,
                from,
                index,
            } => ArrayDiffOp::Move {
                item: f(item),
                original_index,
                from,
                index,
            },
            ArrayDiffOp::Noop {
                item,
                original_index,
                index,
            } => ArrayDiffOp::Noop {
                item: f(item),
                original_index,
                index,
            },
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ArrayDiffOp::Noop { .. })
    }
}

/// Working copy of the old sequence that remembers where each item came from.
struct ArrayWithOriginalIndices<T, F> {
    array: Vec<T>,
    /// `None` for items inserted by the diff
    original_indices: Vec<Option<usize>>,
    equals: F,
}

impl<T, F> ArrayWithOriginalIndices<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    fn new(array: &[T], equals: F) -> Self {
        Self {
            array: array.to_vec(),
            original_indices: (0..array.len()).map(Some).collect(),
            equals,
        }
    }

    fn len(&self) -> usize {
        self.array.len()
    }

    /// The item at `index` appears nowhere in `new`.
    fn is_removal(&self, index: usize, new: &[T]) -> bool {
        let Some(item) = self.array.get(index) else {
            return false;
        };
        !new.iter().any(|new_item| (self.equals)(item, new_item))
    }

    fn remove_item(&mut self, index: usize) -> ArrayDiffOp<T> {
        let item = self.array.remove(index);
        let original_index = self.original_indices.remove(index);
        ArrayDiffOp::Remove {
            item,
            index,
            original_index,
        }
    }

    fn is_noop(&self, index: usize, new: &[T]) -> bool {
        match (self.array.get(index), new.get(index)) {
            (Some(item), Some(new_item)) => (self.equals)(item, new_item),
            _ => false,
        }
    }

    fn noop_item(&self, index: usize) -> ArrayDiffOp<T> {
        ArrayDiffOp::Noop {
            item: self.array[index].clone(),
            original_index: self.original_indices[index],
            index,
        }
    }

    /// First position at or after `from` holding an item equal to `item`.
    fn find_index_from(&self, item: &T, from: usize) -> Option<usize> {
        (from..self.len()).find(|&i| (self.equals)(&self.array[i], item))
    }

    fn add_item(&mut self, item: T, index: usize) -> ArrayDiffOp<T> {
        self.array.insert(index, item.clone());
        self.original_indices.insert(index, None);
        ArrayDiffOp::Add { item, index }
    }

    fn move_item(&mut self, from: usize, to: usize) -> ArrayDiffOp<T> {
        let item = self.array.remove(from);
        self.array.insert(to, item.clone());
        let original_index = self.original_indices.remove(from);
        self.original_indices.insert(to, original_index);

        ArrayDiffOp::Move {
            item,
            original_index,
            from,
            index: to,
        }
    }

    fn remove_items_after(&mut self, index: usize) -> Vec<ArrayDiffOp<T>> {
        let mut operations = Vec::new();
        while self.len() > index {
            operations.push(self.remove_item(index));
        }
        operations
    }
}

/// Compute the operations that turn `old` into `new`.
///
/// Matching uses `equals` with a forward linear scan, first match wins, so
/// indistinguishable duplicates pair up arbitrarily unless `equals` tells them
/// apart. Quadratic in the worst case.
pub fn arrays_diff_sequence<T, F>(old: &[T], new: &[T], equals: F) -> Vec<ArrayDiffOp<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut sequence = Vec::new();
    let mut array = ArrayWithOriginalIndices::new(old, equals);

    let mut index = 0;
    while index < new.len() {
        if array.is_removal(index, new) {
            // The next old item shifts into `index`; look at it again.
            sequence.push(array.remove_item(index));
            continue;
        }

        if array.is_noop(index, new) {
            sequence.push(array.noop_item(index));
            index += 1;
            continue;
        }

        let item = &new[index];
        match array.find_index_from(item, index) {
            None => sequence.push(array.add_item(item.clone(), index)),
            Some(from) => sequence.push(array.move_item(from, index)),
        }
        index += 1;
    }

    sequence.extend(array.remove_items_after(new.len()));
    sequence
}

/// Membership diff of two sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraysDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

/// Items of `new` missing from `old`, and items of `old` missing from `new`.
pub fn arrays_diff<T: PartialEq + Clone>(old: &[T], new: &[T]) -> ArraysDiff<T> {
    ArraysDiff {
        added: new.iter().filter(|item| !old.contains(item)).cloned().collect(),
        removed: old.iter().filter(|item| !new.contains(item)).cloned().collect(),
    }
}
