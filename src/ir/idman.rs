use std::cell::Cell;
use std::num::NonZeroU32;

/// Type of `Op` identifier.
pub(crate) type OpId = NonZeroU32;

/// Type of `Value` identifier.
///
/// The IDs of `Value`s are unique, placeholder values created by the
/// parser for forward references also get their own IDs.
pub(crate) type ValueId = NonZeroU32;

/// Type of `Block` identifier.
pub(crate) type BlockId = NonZeroU32;

/// Type of `Region` identifier.
pub(crate) type RegionId = NonZeroU32;

thread_local! {
  /// The next op ID.
  static NEXT_OP_ID: Cell<u32> = Cell::new(1);
  /// The next value ID.
  static NEXT_VALUE_ID: Cell<u32> = Cell::new(1);
  /// The next block ID.
  static NEXT_BLOCK_ID: Cell<u32> = Cell::new(1);
  /// The next region ID.
  static NEXT_REGION_ID: Cell<u32> = Cell::new(1);
}

/// Takes the next ID from the given counter.
fn next_id(counter: &'static std::thread::LocalKey<Cell<u32>>) -> NonZeroU32 {
  let id = counter.with(|id| id.replace(id.get() + 1));
  NonZeroU32::new(id).expect("ID counter overflowed")
}

/// Gets the next op ID.
pub(crate) fn next_op_id() -> OpId {
  next_id(&NEXT_OP_ID)
}

/// Gets the next value ID.
pub(crate) fn next_value_id() -> ValueId {
  next_id(&NEXT_VALUE_ID)
}

/// Gets the next block ID.
pub(crate) fn next_block_id() -> BlockId {
  next_id(&NEXT_BLOCK_ID)
}

/// Gets the next region ID.
pub(crate) fn next_region_id() -> RegionId {
  next_id(&NEXT_REGION_ID)
}
