use crate::{
  block::{BLOCK_OVERHEAD, BlockRef, Header, Link, State},
  region::Region,
};

/// Intrusive doubly linked list of blocks living in a [`Region`].
///
/// The two sentinels are kept here rather than in the heap; members store
/// their links in their own headers. The list never owns block memory.
pub(crate) struct BlockList {
  beg: Header,
  end: Header,
  length: usize,
  bytes: usize,
}

impl BlockList {
  pub fn new() -> Self {
    let mut list = Self {
      beg: Header::sentinel(State::ListBegin),
      end: Header::sentinel(State::ListEnd),
      length: 0,
      bytes: 0,
    };
    list.init();
    list
  }

  /// Empties the list by wiring the sentinels to each other.
  pub fn init(&mut self) {
    self.beg = Header::sentinel(State::ListBegin);
    self.end = Header::sentinel(State::ListEnd);
    self.beg.next = Link::End;
    self.end.prev = Link::Begin;
    self.length = 0;
    self.bytes = 0;
  }

  pub fn length(&self) -> usize {
    self.length
  }

  /// Member sizes plus one block overhead per member.
  pub fn bytes(&self) -> usize {
    self.bytes
  }

  fn set_next(
    &mut self,
    region: &mut Region,
    link: Link,
    next: Link,
  ) {
    match link {
      Link::Begin => self.beg.next = next,
      Link::End => self.end.next = next,
      Link::Block(block) => {
        let mut header = region.header(block);
        header.next = next;
        region.set_header(block, header);
      }
    }
  }

  fn set_prev(
    &mut self,
    region: &mut Region,
    link: Link,
    prev: Link,
  ) {
    match link {
      Link::Begin => self.beg.prev = prev,
      Link::End => self.end.prev = prev,
      Link::Block(block) => {
        let mut header = region.header(block);
        header.prev = prev;
        region.set_header(block, header);
      }
    }
  }

  /// Inserts `block` right after the begin sentinel.
  pub fn add_front(
    &mut self,
    region: &mut Region,
    block: BlockRef,
  ) {
    let mut header = region.header(block);
    let first = self.beg.next;

    header.prev = Link::Begin;
    header.next = first;
    region.set_header(block, header);

    self.beg.next = Link::Block(block);
    self.set_prev(region, first, Link::Block(block));

    self.length += 1;
    self.bytes += header.size + BLOCK_OVERHEAD;
  }

  /// Unlinks `block`, which must currently be a member of this list.
  pub fn remove(
    &mut self,
    region: &mut Region,
    block: BlockRef,
  ) {
    let header = region.header(block);

    self.set_next(region, header.prev, header.next);
    self.set_prev(region, header.next, header.prev);

    self.length -= 1;
    self.bytes -= header.size + BLOCK_OVERHEAD;
  }

  /// Members front to back.
  pub fn iter<'a>(
    &'a self,
    region: &'a Region,
  ) -> Blocks<'a> {
    Blocks {
      region,
      cursor: self.beg.next,
      remaining: self.length,
    }
  }
}

pub(crate) struct Blocks<'a> {
  region: &'a Region,
  cursor: Link,
  remaining: usize,
}

impl Iterator for Blocks<'_> {
  type Item = BlockRef;

  fn next(&mut self) -> Option<Self::Item> {
    // `remaining` bounds the walk even if the links were corrupted into a cycle.
    if self.remaining == 0 {
      return None;
    }

    match self.cursor {
      Link::Block(block) => {
        self.cursor = self.region.header(block).next;
        self.remaining -= 1;
        Some(block)
      }
      Link::Begin | Link::End => None,
    }
  }
}
