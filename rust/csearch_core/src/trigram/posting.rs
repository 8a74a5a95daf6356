//! Posting list operations using Roaring bitmaps.

use roaring::RoaringBitmap;

/// A posting list: the ids of every file containing one trigram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingList {
    pub bitmap: RoaringBitmap,
}

impl PostingList {
    /// Create an empty posting list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a posting list from a Roaring bitmap.
    pub fn from_bitmap(bitmap: RoaringBitmap) -> Self {
        PostingList { bitmap }
    }

    /// Every id in `0..count`.
    pub fn full(count: u32) -> Self {
        let mut bitmap = RoaringBitmap::new();
        bitmap.insert_range(0..count);
        PostingList { bitmap }
    }

    pub fn insert(&mut self, file_id: u32) {
        self.bitmap.insert(file_id);
    }

    pub fn len(&self) -> u64 {
        self.bitmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    /// Ids in ascending order.
    pub fn to_vec(&self) -> Vec<u32> {
        self.bitmap.iter().collect()
    }

    /// Translate ids through `map`; ids mapped to `None` (or out of range) are dropped.
    pub fn remap(&self, map: &[Option<u32>]) -> RoaringBitmap {
        self.bitmap
            .iter()
            .filter_map(|id| map.get(id as usize).copied().flatten())
            .collect()
    }
}

impl FromIterator<u32> for PostingList {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        PostingList {
            bitmap: iter.into_iter().collect(),
        }
    }
}

/// Intersect multiple posting lists (AND operation).
///
/// An empty input yields an empty list.
pub fn intersect(lists: &[PostingList]) -> PostingList {
    let Some((first, rest)) = lists.split_first() else {
        return PostingList::new();
    };

    let mut result = first.bitmap.clone();
    for list in rest {
        if result.is_empty() {
            break;
        }
        result &= &list.bitmap;
    }
    PostingList::from_bitmap(result)
}

/// Union multiple posting lists (OR operation).
pub fn union(lists: &[PostingList]) -> PostingList {
    let mut result = RoaringBitmap::new();
    for list in lists {
        result |= &list.bitmap;
    }
    PostingList::from_bitmap(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[u32]) -> PostingList {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_intersect_two_lists() {
        let result = intersect(&[list(&[1, 2, 3]), list(&[2, 3, 4])]);
        assert_eq!(result.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_intersect_with_empty() {
        assert!(intersect(&[list(&[1, 2]), PostingList::new()]).is_empty());
    }

    #[test]
    fn test_intersect_disjoint() {
        assert!(intersect(&[list(&[1, 2]), list(&[3, 4])]).is_empty());
    }

    #[test]
    fn test_union_posting_lists() {
        let result = union(&[list(&[1, 2]), list(&[2, 3])]);
        assert_eq!(result.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(intersect(&[]).is_empty());
        assert!(union(&[]).is_empty());
    }

    #[test]
    fn test_full() {
        assert_eq!(PostingList::full(3).to_vec(), vec![0, 1, 2]);
        assert!(PostingList::full(0).is_empty());
    }

    #[test]
    fn test_remap_drops_unmapped_ids() {
        let map = [Some(5), None, Some(0)];
        let remapped = list(&[0, 1, 2, 7]).remap(&map);
        assert_eq!(remapped.iter().collect::<Vec<_>>(), vec![0, 5]);
    }
}
