use std::fmt;

use crate::{
  block::State,
  heap::Heap,
  list::BlockList,
  region::Region,
};

/// One list member as seen by the printer. Offsets are from the heap start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockStats {
  pub head: usize,
  pub state: State,
  pub size: usize,
  pub foot: usize,
  pub foot_size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListStats {
  pub length: usize,
  pub bytes: usize,
  /// Members in list order.
  pub blocks: Vec<BlockStats>,
}

/// Snapshot of both block lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapStats {
  pub heap_bytes: usize,
  pub avail: ListStats,
  pub used: ListStats,
}

impl ListStats {
  fn collect(
    list: &BlockList,
    region: &Region,
  ) -> Self {
    let blocks = list
      .iter(region)
      .map(|block| {
        let header = region.header(block);
        let foot = region.footer_of(block);

        BlockStats {
          head: block.offset(),
          state: header.state,
          size: header.size,
          foot,
          foot_size: region.footer(foot),
        }
      })
      .collect();

    Self {
      length: list.length(),
      bytes: list.bytes(),
      blocks,
    }
  }
}

impl Heap {
  pub fn stats(&self) -> HeapStats {
    HeapStats {
      heap_bytes: self.heap_bytes(),
      avail: ListStats::collect(&self.avail, &self.region),
      used: ListStats::collect(&self.used, &self.region),
    }
  }

  pub fn print_stats(&self) {
    print!("{}", self.stats());
  }
}

impl fmt::Display for ListStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "blocklist{{length: {:6}  bytes: {:6}}}", self.length, self.bytes)?;

    for (i, block) in self.blocks.iter().enumerate() {
      writeln!(
        f,
        "  [{:3}] head @ {:6} {{state: {}  size: {:6}}}  foot @ {:6} {{size: {:6}}}",
        i, block.head, block.state, block.size, block.foot, block.foot_size
      )?;
    }

    Ok(())
  }
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "HEAP STATS")?;
    writeln!(f, "Heap bytes: {}", self.heap_bytes)?;
    write!(f, "AVAILABLE LIST: {}", self.avail)?;
    write!(f, "USED LIST: {}", self.used)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::{BLOCK_OVERHEAD, FOOTER_SIZE};

  #[test]
  fn test_initial_stats() {
    let heap = Heap::init(1024).unwrap();
    let stats = heap.stats();

    assert_eq!(stats.heap_bytes, 1024);
    assert_eq!(stats.used, ListStats { length: 0, bytes: 0, blocks: vec![] });
    assert_eq!(
      stats.avail.blocks,
      vec![BlockStats {
        head: 0,
        state: State::Available,
        size: 1024 - BLOCK_OVERHEAD,
        foot: 1024 - FOOTER_SIZE,
        foot_size: 1024 - BLOCK_OVERHEAD,
      }]
    );
  }

  #[test]
  fn test_stats_do_not_mutate() {
    let mut heap = Heap::init(512).unwrap();
    heap.allocate(10).unwrap();
    heap.allocate(20).unwrap();

    let first = heap.stats();
    heap.print_stats();
    assert_eq!(heap.stats(), first);
  }

  #[test]
  fn test_empty_list_rendering() {
    let list = ListStats { length: 0, bytes: 0, blocks: vec![] };
    assert_eq!(list.to_string(), "blocklist{length:      0  bytes:      0}\n");
  }

  /// Replays the allocation pattern of the demo driver up to the point where
  /// pointers 3 and 1 have been reallocated.
  #[cfg(target_pointer_width = "64")]
  #[test]
  fn test_reallocation_trace_rendering() {
    let mut heap = Heap::init(1024).unwrap();

    let p1 = heap.allocate(128).unwrap();
    let _p2 = heap.allocate(48).unwrap();
    let p3 = heap.allocate(156).unwrap();
    let _p4 = heap.allocate(22).unwrap();
    let _p5 = heap.allocate(64).unwrap();

    heap.free(p1).unwrap();
    heap.free(p3).unwrap();
    heap.allocate(32).unwrap();
    heap.allocate(200).unwrap();

    let expected = "\
HEAP STATS
Heap bytes: 1024
AVAILABLE LIST: blocklist{length:      3  bytes:    458}
  [  0] head @    858 {state: a  size:    126}  foot @   1016 {size:    126}
  [  1] head @    328 {state: a  size:     84}  foot @    444 {size:     84}
  [  2] head @      0 {state: a  size:    128}  foot @    160 {size:    128}
USED LIST: blocklist{length:      5  bytes:    566}
  [  0] head @    618 {state: u  size:    200}  foot @    850 {size:    200}
  [  1] head @    256 {state: u  size:     32}  foot @    320 {size:     32}
  [  2] head @    514 {state: u  size:     64}  foot @    610 {size:     64}
  [  3] head @    452 {state: u  size:     22}  foot @    506 {size:     22}
  [  4] head @    168 {state: u  size:     48}  foot @    248 {size:     48}
";

    assert_eq!(heap.stats().to_string(), expected);
  }
}
