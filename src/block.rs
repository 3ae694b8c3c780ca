use std::{fmt, mem};

/// On-heap layout of a block header.
///
/// Links are byte offsets from the start of the heap. Nothing in the heap is
/// guaranteed to be aligned, so this record is only ever moved in and out of
/// heap bytes field by field, with unaligned reads and writes.
#[repr(C)]
#[allow(dead_code)]
pub(crate) struct RawHeader {
  pub size: usize,
  pub state: u8,
  pub next: usize,
  pub prev: usize,
}

pub const HEADER_SIZE: usize = mem::size_of::<RawHeader>();
pub const FOOTER_SIZE: usize = mem::size_of::<usize>();

/// Bytes every block spends on its header and footer.
pub const BLOCK_OVERHEAD: usize = HEADER_SIZE + FOOTER_SIZE;

/// Size carried by the list sentinels.
pub(crate) const UNINITIALIZED: usize = usize::MAX;

const LINK_BEGIN: usize = usize::MAX;
const LINK_END: usize = usize::MAX - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
  Available,
  Used,
  ListBegin,
  ListEnd,
}

impl State {
  pub fn as_byte(self) -> u8 {
    match self {
      State::Available => b'a',
      State::Used => b'u',
      State::ListBegin => b'b',
      State::ListEnd => b'e',
    }
  }

  pub fn from_byte(byte: u8) -> Option<Self> {
    match byte {
      b'a' => Some(State::Available),
      b'u' => Some(State::Used),
      b'b' => Some(State::ListBegin),
      b'e' => Some(State::ListEnd),
      _ => None,
    }
  }

  /// Available and Used are the only states a block inside the heap may carry.
  pub fn is_data(self) -> bool {
    matches!(self, State::Available | State::Used)
  }
}

impl fmt::Display for State {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}", self.as_byte() as char)
  }
}

/// Handle to a block: the offset of its header from the start of the heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef(usize);

impl BlockRef {
  pub(crate) fn new(offset: usize) -> Self {
    Self(offset)
  }

  pub fn offset(self) -> usize {
    self.0
  }

  /// Offset of the first payload byte.
  pub fn payload(self) -> usize {
    self.0 + HEADER_SIZE
  }
}

/// A list link: either one of the two sentinels of the owning list or a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
  Begin,
  End,
  Block(BlockRef),
}

impl Link {
  pub fn encode(self) -> usize {
    match self {
      Link::Begin => LINK_BEGIN,
      Link::End => LINK_END,
      Link::Block(block) => block.offset(),
    }
  }

  pub fn decode(raw: usize) -> Self {
    match raw {
      LINK_BEGIN => Link::Begin,
      LINK_END => Link::End,
      offset => Link::Block(BlockRef::new(offset)),
    }
  }
}

/// Decoded block header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
  pub size: usize,
  pub state: State,
  pub next: Link,
  pub prev: Link,
}

impl Header {
  pub fn new(
    size: usize,
    state: State,
  ) -> Self {
    Self {
      size,
      state,
      next: Link::End,
      prev: Link::Begin,
    }
  }

  pub fn sentinel(state: State) -> Self {
    Self::new(UNINITIALIZED, state)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_overhead_matches_header_and_footer() {
    assert_eq!(BLOCK_OVERHEAD, HEADER_SIZE + FOOTER_SIZE);

    if mem::size_of::<usize>() == 8 {
      assert_eq!(HEADER_SIZE, 32);
      assert_eq!(BLOCK_OVERHEAD, 40);
    }
  }

  #[test]
  fn test_state_bytes() {
    for state in [State::Available, State::Used, State::ListBegin, State::ListEnd] {
      assert_eq!(State::from_byte(state.as_byte()), Some(state));
    }

    assert_eq!(State::from_byte(0), None);
    assert_eq!(State::Available.to_string(), "a");
    assert!(State::Used.is_data());
    assert!(!State::ListEnd.is_data());
  }

  #[test]
  fn test_sentinel_links_do_not_collide_with_blocks() {
    assert_eq!(Link::decode(Link::Begin.encode()), Link::Begin);
    assert_eq!(Link::decode(Link::End.encode()), Link::End);

    let block = Link::Block(BlockRef::new(168));
    assert_eq!(Link::decode(block.encode()), block);
  }
}
