//! Boundary-tag arithmetic.
//!
//! These lookups follow physical adjacency inside the heap and never consult
//! list links. Every block is laid out as:
//!
//! ```text
//!   ┌──────────────┬───────────────────────────┬────────┐
//!   │    header    │      payload (size)       │ footer │
//!   │ size, state, │                           │  size  │
//!   │ next, prev   │                           │        │
//!   └──────────────┴───────────────────────────┴────────┘
//!   ▲ block        ▲ block + HEADER_SIZE       ▲ footer_of(block)
//! ```

use crate::{
  block::{BLOCK_OVERHEAD, BlockRef, FOOTER_SIZE, HEADER_SIZE},
  region::Region,
};

impl Region {
  /// Offset of the footer belonging to `block`.
  pub fn footer_of(
    &self,
    block: BlockRef,
  ) -> usize {
    block.offset() + HEADER_SIZE + self.header(block).size
  }

  /// Header owning the footer at `footer`, or `None` if the recorded size
  /// would place it before the start of the heap.
  pub fn header_of(
    &self,
    footer: usize,
  ) -> Option<BlockRef> {
    let size = self.footer(footer);

    footer
      .checked_sub(HEADER_SIZE)
      .and_then(|offset| offset.checked_sub(size))
      .map(BlockRef::new)
  }

  /// The block physically following `block`, or `None` if `block` is the last
  /// one in the heap.
  pub fn block_above(
    &self,
    block: BlockRef,
  ) -> Option<BlockRef> {
    let higher = block.offset() + self.header(block).size + BLOCK_OVERHEAD;

    (higher < self.len()).then(|| BlockRef::new(higher))
  }

  /// The block physically preceding `block`, found through its footer.
  pub fn block_below(
    &self,
    block: BlockRef,
  ) -> Option<BlockRef> {
    let footer = block.offset().checked_sub(FOOTER_SIZE)?;

    self.header_of(footer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::{Header, State};

  /// Lays out three blocks of the given sizes back to back.
  fn three_blocks(sizes: [usize; 3]) -> (Region, [BlockRef; 3]) {
    let total = sizes.iter().sum::<usize>() + 3 * BLOCK_OVERHEAD;
    let mut region = Region::acquire(total).unwrap();

    let mut offset = 0;
    let mut blocks = [BlockRef::new(0); 3];

    for (i, size) in sizes.into_iter().enumerate() {
      let block = BlockRef::new(offset);
      region.set_header(block, Header::new(size, State::Used));
      region.set_footer(offset + HEADER_SIZE + size, size);
      blocks[i] = block;
      offset += size + BLOCK_OVERHEAD;
    }

    (region, blocks)
  }

  #[test]
  fn test_footer_and_header_are_inverse() {
    let (region, blocks) = three_blocks([128, 48, 22]);

    for block in blocks {
      let footer = region.footer_of(block);
      assert_eq!(region.footer(footer), region.header(block).size);
      assert_eq!(region.header_of(footer), Some(block));
    }
  }

  #[test]
  fn test_block_above() {
    let (region, [a, b, c]) = three_blocks([128, 48, 22]);

    assert_eq!(region.block_above(a), Some(b));
    assert_eq!(region.block_above(b), Some(c));
    assert_eq!(region.block_above(c), None);
  }

  #[test]
  fn test_block_below() {
    let (region, [a, b, c]) = three_blocks([128, 48, 22]);

    assert_eq!(region.block_below(a), None);
    assert_eq!(region.block_below(b), Some(a));
    assert_eq!(region.block_below(c), Some(b));
  }

  #[test]
  fn test_header_of_rejects_sizes_reaching_below_heap() {
    let (mut region, [_, b, _]) = three_blocks([16, 16, 16]);

    let footer = b.offset() - FOOTER_SIZE;
    region.set_footer(footer, 4096);

    assert_eq!(region.header_of(footer), None);
    assert_eq!(region.block_below(b), None);
  }
}
