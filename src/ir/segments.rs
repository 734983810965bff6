//! Segmented lists ([`SegmentedList`]), flat lists partitioned by a list
//! of segment sizes.
//!
//! Multi-way branches keep their compare operands and successor arguments
//! in one flat operand list, and record the partition in integer vector
//! attributes. `SegmentedList` is the only place where the partition is
//! computed.

use std::fmt;

/// A flat list partitioned into consecutive segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentedList<T> {
  items: Vec<T>,
  sizes: Vec<usize>,
  starts: Vec<usize>,
}

/// Error returned when segment sizes do not cover a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentError {
  pub total: usize,
  pub covered: usize,
}

impl fmt::Display for SegmentError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "segment sizes sum to {}, but the list has {} elements",
      self.covered, self.total
    )
  }
}

impl std::error::Error for SegmentError {}

impl<T> SegmentedList<T> {
  /// Creates a new segmented list from a flat list and segment sizes.
  ///
  /// Fails if the sizes do not sum to the length of the list.
  pub fn new(items: Vec<T>, sizes: Vec<usize>) -> Result<Self, SegmentError> {
    let covered = sizes.iter().sum();
    if covered != items.len() {
      return Err(SegmentError {
        total: items.len(),
        covered,
      });
    }
    let starts = sizes
      .iter()
      .scan(0, |acc, size| {
        let start = *acc;
        *acc += size;
        Some(start)
      })
      .collect();
    Ok(Self {
      items,
      sizes,
      starts,
    })
  }

  /// Creates a new segmented list by concatenating the given segments.
  pub fn from_segments(segments: Vec<Vec<T>>) -> Self {
    let sizes = segments.iter().map(Vec::len).collect();
    let items = segments.into_iter().flatten().collect();
    // sizes are computed from the segments themselves
    match Self::new(items, sizes) {
      Ok(list) => list,
      Err(e) => unreachable!("{}", e),
    }
  }

  /// Returns the number of segments.
  pub fn len(&self) -> usize {
    self.sizes.len()
  }

  /// Checks if there are no segments.
  pub fn is_empty(&self) -> bool {
    self.sizes.is_empty()
  }

  /// Returns the flat list.
  pub fn items(&self) -> &[T] {
    &self.items
  }

  /// Returns the segment sizes.
  pub fn sizes(&self) -> &[usize] {
    &self.sizes
  }

  /// Returns the `index`th segment.
  ///
  /// # Panics
  ///
  /// Panics if `index` is out of range.
  pub fn segment(&self, index: usize) -> &[T] {
    let start = self.starts[index];
    &self.items[start..start + self.sizes[index]]
  }

  /// Returns an iterator over all segments.
  pub fn iter(&self) -> impl Iterator<Item = &[T]> {
    (0..self.len()).map(move |i| self.segment(i))
  }

  /// Converts the segmented list into the flat list and segment sizes.
  pub fn into_parts(self) -> (Vec<T>, Vec<usize>) {
    (self.items, self.sizes)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn segments() {
    let list = SegmentedList::new(vec![1, 2, 3, 4, 5], vec![2, 0, 3]).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.segment(0), &[1, 2]);
    assert!(list.segment(1).is_empty());
    assert_eq!(list.segment(2), &[3, 4, 5]);
    assert_eq!(list.iter().count(), 3);
  }

  #[test]
  fn mismatched_sizes() {
    let err = SegmentedList::new(vec![1, 2, 3], vec![1, 1]).unwrap_err();
    assert_eq!(err, SegmentError { total: 3, covered: 2 });
    assert!(SegmentedList::new(vec![1], vec![1, 1]).is_err());
  }

  #[test]
  fn concat_segments() {
    // sizes always cover the items, whatever the shape of the input
    for n in 0..6usize {
      let segments: Vec<Vec<usize>> = (0..n).map(|i| (0..i % 3).collect()).collect();
      let list = SegmentedList::from_segments(segments.clone());
      assert_eq!(list.sizes().iter().sum::<usize>(), list.items().len());
      for (i, seg) in segments.iter().enumerate() {
        assert_eq!(list.segment(i), seg.as_slice());
      }
    }
  }
}
