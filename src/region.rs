use std::{mem, ptr::NonNull};

use libc::{c_void, calloc, free};

use crate::block::{BlockRef, FOOTER_SIZE, Header, Link, RawHeader, State};

/// The single contiguous byte range a heap manages.
///
/// Obtained from the C allocator zero-filled, so every byte is initialized
/// before the first block is written. Released on drop.
pub(crate) struct Region {
  base: NonNull<u8>,
  len: usize,
}

impl Region {
  /// Returns `None` when the C allocator cannot provide `len` bytes.
  pub fn acquire(len: usize) -> Option<Self> {
    let address = unsafe { calloc(len, 1) } as *mut u8;

    NonNull::new(address).map(|base| Self { base, len })
  }

  pub fn start(&self) -> *mut u8 {
    self.base.as_ptr()
  }

  pub fn len(&self) -> usize {
    self.len
  }

  /// Offset of `address` from the start of the region, if it lies inside it.
  pub fn offset_of(
    &self,
    address: *const u8,
  ) -> Option<usize> {
    let offset = (address as usize).checked_sub(self.start() as usize)?;

    (offset < self.len).then_some(offset)
  }

  fn read<T: Copy>(
    &self,
    offset: usize,
  ) -> T {
    assert!(
      offset.checked_add(mem::size_of::<T>()).is_some_and(|end| end <= self.len),
      "heap read at offset {offset} runs past the end of the heap"
    );

    unsafe { self.start().add(offset).cast::<T>().read_unaligned() }
  }

  fn write<T: Copy>(
    &mut self,
    offset: usize,
    value: T,
  ) {
    assert!(
      offset.checked_add(mem::size_of::<T>()).is_some_and(|end| end <= self.len),
      "heap write at offset {offset} runs past the end of the heap"
    );

    unsafe { self.start().add(offset).cast::<T>().write_unaligned(value) }
  }

  /// Raw state byte of the header at `offset`, without decoding it.
  pub fn state_byte(
    &self,
    offset: usize,
  ) -> u8 {
    self.read(offset + mem::offset_of!(RawHeader, state))
  }

  pub fn header(
    &self,
    block: BlockRef,
  ) -> Header {
    let offset = block.offset();
    let state = self.state_byte(offset);
    // Callers only pass offsets of live blocks; `Heap::free` validates the
    // state byte of user-supplied pointers before decoding.
    let state = State::from_byte(state)
      .unwrap_or_else(|| unreachable!("corrupt block state {state:#04x} at offset {offset}"));

    Header {
      size: self.read(offset + mem::offset_of!(RawHeader, size)),
      state,
      next: Link::decode(self.read(offset + mem::offset_of!(RawHeader, next))),
      prev: Link::decode(self.read(offset + mem::offset_of!(RawHeader, prev))),
    }
  }

  /// Writes each field on its own so the padding bytes of the header keep
  /// whatever initialized contents they had.
  pub fn set_header(
    &mut self,
    block: BlockRef,
    header: Header,
  ) {
    let offset = block.offset();

    self.write(offset + mem::offset_of!(RawHeader, size), header.size);
    self.write(offset + mem::offset_of!(RawHeader, state), header.state.as_byte());
    self.write(offset + mem::offset_of!(RawHeader, next), header.next.encode());
    self.write(offset + mem::offset_of!(RawHeader, prev), header.prev.encode());
  }

  pub fn footer(
    &self,
    offset: usize,
  ) -> usize {
    self.read(offset)
  }

  pub fn set_footer(
    &mut self,
    offset: usize,
    size: usize,
  ) {
    debug_assert_eq!(FOOTER_SIZE, mem::size_of::<usize>());
    self.write(offset, size);
  }
}

impl Drop for Region {
  fn drop(&mut self) {
    unsafe { free(self.base.as_ptr() as *mut c_void) };
  }
}
