use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use log::{debug, error, trace};

use crate::{
  block::{BLOCK_OVERHEAD, BlockRef, HEADER_SIZE, Header, State},
  error::HeapError,
  list::BlockList,
  region::Region,
};

/// A fixed-size heap served by an explicit free list.
///
/// Blocks are first-fit from the available list, split on allocation and
/// coalesced with their physical neighbors on free. A `Heap` can only be
/// obtained from [`Heap::init`], and [`Heap::cleanup`] consumes it.
pub struct Heap {
  pub(crate) region: Region,
  pub(crate) avail: BlockList,
  pub(crate) used: BlockList,
}

impl Heap {
  /// Creates a heap managing `max_bytes` bytes, overhead included.
  ///
  /// Fails when `max_bytes` cannot hold even one empty block. If the backing
  /// region cannot be obtained the process is terminated through
  /// [`std::alloc::handle_alloc_error`].
  pub fn init(max_bytes: usize) -> Result<Self, HeapError> {
    if max_bytes < BLOCK_OVERHEAD {
      error!("init: heap size {max_bytes} too small for a block overhead {BLOCK_OVERHEAD}");
      return Err(HeapError::TooSmall {
        requested: max_bytes,
        overhead: BLOCK_OVERHEAD,
      });
    }

    let layout = Layout::array::<u8>(max_bytes).map_err(|_| {
      error!("init: heap size {max_bytes} is not a valid allocation size");
      HeapError::TooLarge { requested: max_bytes }
    })?;

    let Some(region) = Region::acquire(max_bytes) else {
      error!("init: allocating {max_bytes} bytes for the heap failed");
      alloc::handle_alloc_error(layout);
    };

    let mut heap = Self {
      region,
      avail: BlockList::new(),
      used: BlockList::new(),
    };

    let size = max_bytes - BLOCK_OVERHEAD;
    let first = BlockRef::new(0);
    heap.region.set_header(first, Header::new(size, State::Available));
    let footer = heap.region.footer_of(first);
    heap.region.set_footer(footer, size);
    heap.avail.add_front(&mut heap.region, first);

    debug!(
      "init: heap of {max_bytes} bytes at {:?}, first block holds {size} bytes",
      heap.region.start()
    );

    Ok(heap)
  }

  /// Releases the backing region.
  pub fn cleanup(self) {
    debug!("cleanup: releasing {} heap bytes", self.heap_bytes());
  }

  pub fn heap_bytes(&self) -> usize {
    self.region.len()
  }

  /// Distance of `ptr` from the start of the heap, if it points inside it.
  pub fn offset_of(
    &self,
    ptr: *const u8,
  ) -> Option<usize> {
    self.region.offset_of(ptr)
  }

  /// First block in list order that can hold `size` bytes plus a new
  /// header and footer.
  fn find_first_avail(
    &self,
    size: usize,
  ) -> Option<BlockRef> {
    let needed = size.checked_add(BLOCK_OVERHEAD)?;

    self
      .avail
      .iter(&self.region)
      .find(|&block| self.region.header(block).size >= needed)
  }

  /// Shrinks `block` to `new_size` and turns the rest of its bytes into a new
  /// available block directly above it, which is returned unlinked.
  ///
  /// Leaves `block` untouched and returns `None` when the remainder could not
  /// hold its own header and footer.
  fn split_block(
    &mut self,
    block: BlockRef,
    new_size: usize,
  ) -> Option<BlockRef> {
    let mut header = self.region.header(block);

    if header.size < new_size.checked_add(BLOCK_OVERHEAD)? {
      return None;
    }

    let old_size = header.size;
    header.size = new_size;
    self.region.set_header(block, header);
    let footer = self.region.footer_of(block);
    self.region.set_footer(footer, new_size);

    let remainder = self.region.block_above(block)?;
    let remainder_size = old_size - new_size - BLOCK_OVERHEAD;
    self
      .region
      .set_header(remainder, Header::new(remainder_size, State::Available));
    let footer = self.region.footer_of(remainder);
    self.region.set_footer(footer, remainder_size);

    trace!(
      "split: block @ {} into {new_size} + {remainder_size} (remainder @ {})",
      block.offset(),
      remainder.offset()
    );

    Some(remainder)
  }

  fn set_state(
    &mut self,
    block: BlockRef,
    state: State,
  ) {
    let mut header = self.region.header(block);
    header.state = state;
    self.region.set_header(block, header);
  }

  /// Returns a pointer to `size` usable bytes.
  ///
  /// On [`HeapError::OutOfMemory`] the heap is left unchanged.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, HeapError> {
    let Some(block) = self.find_first_avail(size) else {
      debug!("allocate: no available block fits {size} bytes");
      return Err(HeapError::OutOfMemory { requested: size });
    };

    self.avail.remove(&mut self.region, block);

    if let Some(remainder) = self.split_block(block, size) {
      self.avail.add_front(&mut self.region, remainder);
    }

    self.set_state(block, State::Used);
    self.used.add_front(&mut self.region, block);

    debug!("allocate: {size} bytes at heap offset {}", block.payload());

    let payload = unsafe { self.region.start().add(block.payload()) };

    // SAFETY: `payload` lies inside the region, whose base is non-null.
    Ok(unsafe { NonNull::new_unchecked(payload) })
  }

  /// Returns the block at `ptr` to the available list and coalesces it with
  /// available physical neighbors.
  ///
  /// Freeing an already available block does nothing. Pointers that do not
  /// lead to a block header are rejected without touching the heap.
  pub fn free(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<(), HeapError> {
    let block = self.block_for(ptr)?;

    if self.region.header(block).state == State::Available {
      debug!("free: block @ {} is already available", block.offset());
      return Ok(());
    }

    let below = self.region.block_below(block);

    self.used.remove(&mut self.region, block);
    self.set_state(block, State::Available);
    self.avail.add_front(&mut self.region, block);

    debug!(
      "free: {} bytes at heap offset {}",
      self.region.header(block).size,
      block.payload()
    );

    self.merge_with_above(block);
    if let Some(below) = below {
      self.merge_with_above(below);
    }

    Ok(())
  }

  /// Absorbs the block physically above `lower` into it when both are
  /// available. The survivor is moved to the front of the available list.
  fn merge_with_above(
    &mut self,
    lower: BlockRef,
  ) {
    if self.region.header(lower).state != State::Available {
      return;
    }

    let Some(higher) = self.region.block_above(lower) else {
      return;
    };

    let higher_header = self.region.header(higher);
    if higher_header.state != State::Available {
      return;
    }

    self.avail.remove(&mut self.region, lower);
    self.avail.remove(&mut self.region, higher);

    let mut header = self.region.header(lower);
    header.size += higher_header.size + BLOCK_OVERHEAD;
    self.region.set_header(lower, header);
    let footer = self.region.footer_of(lower);
    self.region.set_footer(footer, header.size);

    self.avail.add_front(&mut self.region, lower);

    trace!(
      "merge: block @ {} absorbed block @ {}, now {} bytes",
      lower.offset(),
      higher.offset(),
      header.size
    );
  }

  /// Resolves a payload pointer to its block, checking that a well-formed
  /// block actually sits there.
  fn block_for(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<BlockRef, HeapError> {
    let addr = ptr.as_ptr() as usize;
    let offset = self
      .region
      .offset_of(ptr.as_ptr())
      .ok_or(HeapError::ForeignPointer { addr })?;
    let not_a_block = HeapError::NotABlock { offset };

    let head = offset
      .checked_sub(HEADER_SIZE)
      .filter(|head| head + BLOCK_OVERHEAD <= self.heap_bytes())
      .ok_or(not_a_block)?;

    let state = State::from_byte(self.region.state_byte(head))
      .filter(|state| state.is_data())
      .ok_or(not_a_block)?;

    let block = BlockRef::new(head);

    // A block merged into its lower neighbor keeps its stale header, but the
    // footer now belongs to the merged block.
    if state == State::Available {
      return Ok(block);
    }

    let size = self.region.header(block).size;
    let fits = (head + BLOCK_OVERHEAD)
      .checked_add(size)
      .is_some_and(|end| end <= self.heap_bytes());

    if !fits || self.region.footer(self.region.footer_of(block)) != size {
      return Err(not_a_block);
    }

    Ok(block)
  }
}
