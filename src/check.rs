use crate::{
  block::{BLOCK_OVERHEAD, BlockRef, HEADER_SIZE, State},
  error::HeapError,
  heap::Heap,
  list::BlockList,
};

fn corrupt(
  offset: usize,
  reason: &'static str,
) -> HeapError {
  HeapError::Corrupt { offset, reason }
}

impl Heap {
  /// Verifies the heap's structural invariants.
  ///
  /// Walks the blocks physically from the start of the heap, then compares
  /// what it found with both lists. Does not modify anything.
  pub fn check(&self) -> Result<(), HeapError> {
    let heap_bytes = self.heap_bytes();

    let mut offset = 0;
    let mut previous = None;
    let mut avail = (0, 0);
    let mut used = (0, 0);

    while offset < heap_bytes {
      if offset + BLOCK_OVERHEAD > heap_bytes {
        return Err(corrupt(offset, "block header runs past the end of the heap"));
      }

      let state = State::from_byte(self.region.state_byte(offset))
        .filter(|state| state.is_data())
        .ok_or(corrupt(offset, "invalid block state"))?;

      let block = BlockRef::new(offset);
      let size = self.region.header(block).size;
      let end = (offset + BLOCK_OVERHEAD)
        .checked_add(size)
        .filter(|&end| end <= heap_bytes)
        .ok_or(corrupt(offset, "block runs past the end of the heap"))?;

      if self.region.footer(offset + HEADER_SIZE + size) != size {
        return Err(corrupt(offset, "header and footer sizes differ"));
      }

      if state == State::Available && previous == Some(State::Available) {
        return Err(corrupt(offset, "adjacent available blocks were not coalesced"));
      }

      let totals = match state {
        State::Available => &mut avail,
        _ => &mut used,
      };
      totals.0 += 1;
      totals.1 += size + BLOCK_OVERHEAD;

      previous = Some(state);
      offset = end;
    }

    self.check_list(&self.avail, State::Available, avail)?;
    self.check_list(&self.used, State::Used, used)?;

    if self.avail.bytes() + self.used.bytes() != heap_bytes {
      return Err(corrupt(0, "list byte totals do not cover the heap"));
    }

    Ok(())
  }

  fn check_list(
    &self,
    list: &BlockList,
    state: State,
    (length, bytes): (usize, usize),
  ) -> Result<(), HeapError> {
    let mut members = 0;

    for block in list.iter(&self.region) {
      if self.region.header(block).state != state {
        return Err(corrupt(block.offset(), "list member has the wrong state"));
      }
      members += 1;
    }

    if members != list.length() || list.length() != length {
      return Err(corrupt(0, "list length disagrees with the heap"));
    }

    if list.bytes() != bytes {
      return Err(corrupt(0, "list byte total disagrees with the heap"));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{Rng, SeedableRng, rngs::StdRng};

  #[test]
  fn test_fresh_heap_is_consistent() {
    let heap = Heap::init(1024).unwrap();
    assert_eq!(heap.check(), Ok(()));
  }

  #[test]
  fn test_random_workload_keeps_invariants() {
    let mut heap = Heap::init(8192).unwrap();
    let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
    let mut live: Vec<(std::ptr::NonNull<u8>, usize)> = Vec::new();

    for step in 0..2000 {
      if live.is_empty() || rng.random_range(0..3) != 0 {
        let size = rng.random_range(0..300);

        if let Ok(ptr) = heap.allocate(size) {
          unsafe { ptr.as_ptr().write_bytes(step as u8, size) };
          live.push((ptr, size));
        }
      } else {
        let (ptr, _) = live.swap_remove(rng.random_range(0..live.len()));
        heap.free(ptr).unwrap();
      }

      heap.check().unwrap();

      let accounted: usize = heap.stats().avail.blocks.iter().map(|b| b.size).sum::<usize>()
        + heap.stats().used.blocks.iter().map(|b| b.size).sum::<usize>()
        + (heap.avail.length() + heap.used.length()) * BLOCK_OVERHEAD;
      assert_eq!(accounted, heap.heap_bytes());
    }

    let mut spans: Vec<(usize, usize)> = live
      .iter()
      .map(|&(ptr, size)| (heap.offset_of(ptr.as_ptr()).unwrap(), size))
      .collect();
    spans.sort();
    for pair in spans.windows(2) {
      assert!(pair[0].0 + pair[0].1 <= pair[1].0);
    }

    for (ptr, _) in live {
      heap.free(ptr).unwrap();
    }

    heap.check().unwrap();
    assert_eq!(heap.avail.length(), 1);
    assert_eq!(heap.used.length(), 0);
  }

  #[test]
  fn test_detects_footer_mismatch() {
    let mut heap = Heap::init(1024).unwrap();
    heap.allocate(64).unwrap();

    let footer = heap.region.footer_of(BlockRef::new(0));
    heap.region.set_footer(footer, 63);

    assert_eq!(
      heap.check(),
      Err(HeapError::Corrupt {
        offset: 0,
        reason: "header and footer sizes differ",
      })
    );
  }

  #[test]
  fn test_detects_uncoalesced_neighbors() {
    let mut heap = Heap::init(1024).unwrap();
    let a = heap.allocate(64).unwrap();
    heap.allocate(64).unwrap();
    heap.free(a).unwrap();

    // Flip the used block's state behind the lists' back.
    let second = BlockRef::new(64 + BLOCK_OVERHEAD);
    let mut header = heap.region.header(second);
    header.state = State::Available;
    heap.region.set_header(second, header);

    assert_eq!(
      heap.check(),
      Err(HeapError::Corrupt {
        offset: second.offset(),
        reason: "adjacent available blocks were not coalesced",
      })
    );
  }
}
