#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
  #[error("heap size {requested} too small for a block overhead {overhead}")]
  TooSmall { requested: usize, overhead: usize },
  #[error("heap size {requested} exceeds the largest representable allocation")]
  TooLarge { requested: usize },
  #[error("out of memory: no available block fits {requested} bytes")]
  OutOfMemory { requested: usize },
  #[error("pointer {addr:#x} does not point into the heap")]
  ForeignPointer { addr: usize },
  #[error("no block payload starts at heap offset {offset}")]
  NotABlock { offset: usize },
  #[error("heap corrupted at offset {offset}: {reason}")]
  Corrupt { offset: usize, reason: &'static str },
}
