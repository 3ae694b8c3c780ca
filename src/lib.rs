//! # elalloc - An Explicit Free-List Allocator
//!
//! This crate manages one fixed-size heap region and hands out pieces of it
//! with `malloc`/`free` semantics. Every block carries a header and a footer
//! (boundary tags) and sits on exactly one of two intrusive doubly linked
//! lists: the **available** list or the **used** list.
//!
//! ## Overview
//!
//! ```text
//!   Heap of 1024 bytes after allocating 128, 48 and 156 bytes:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ off 0        off 168      off 256            off 452                 │
//!   │ ┌──────────┬───────────┬────────────────────┬────────────────────┐   │
//!   │ │ U 128    │ U 48      │ U 156              │ A 532              │   │
//!   │ └──────────┴───────────┴────────────────────┴────────────────────┘   │
//!   │                                                                      │
//!   │   used list:  [256] -> [168] -> [0]     (newest first)               │
//!   │   avail list: [452]                                                  │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   elalloc
//!   ├── addressing - Boundary-tag arithmetic (footer, header, above, below)
//!   ├── block      - Header layout, block states, handles and links
//!   ├── check      - Heap consistency checker
//!   ├── error      - HeapError
//!   ├── heap       - Heap lifecycle, allocation and deallocation
//!   ├── list       - Sentinel-based intrusive block list (internal)
//!   ├── logger     - StderrLogger for the `log` facade
//!   ├── region     - Backing region and unaligned field access (internal)
//!   └── stats      - Statistics snapshot and printer
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use elalloc::Heap;
//!
//! let mut heap = Heap::init(1024).unwrap();
//!
//! let ptr = heap.allocate(64).unwrap();
//! unsafe { ptr.as_ptr().write_bytes(0x2A, 64) };
//!
//! heap.free(ptr).unwrap();
//! heap.print_stats();
//! heap.cleanup();
//! ```
//!
//! ## How It Works
//!
//! Each block stores its payload size twice:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┬──────────┐
//!   │    Block Header       │         User Data              │  Footer  │
//!   │  ┌─────────────────┐  │                                │ ┌──────┐ │
//!   │  │ size: N         │  │  ┌──────────────────────────┐  │ │ N    │ │
//!   │  │ state: a / u    │  │  │                          │  │ └──────┘ │
//!   │  │ next, prev      │  │  │     N bytes usable       │  │          │
//!   │  └─────────────────┘  │  └──────────────────────────┘  │          │
//!   │      32 bytes         │                                │ 8 bytes  │
//!   └───────────────────────┴────────────────────────────────┴──────────┘
//!                           ▲
//!                           └── Pointer returned to user
//! ```
//!
//! - **Allocation** takes the first available block (in list order) with at
//!   least `N + BLOCK_OVERHEAD` bytes, cuts it down to `N` bytes and pushes
//!   the remainder back on the available list.
//! - **Deallocation** moves the block to the available list and merges it
//!   with the physically adjacent blocks above and below when those are
//!   available too, so no two neighbors are ever both free.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Heap` is neither `Send` nor `Sync`
//! - **Fixed size**: the heap never grows or shrinks
//! - **No alignment**: payloads are only as aligned as the block layout
//!   happens to make them
//!
//! ## Safety
//!
//! The heap API is safe. Using the memory behind a returned pointer is not:
//! callers must stay within the requested size and stop using a pointer once
//! it has been freed.

mod addressing;
mod block;
mod check;
mod error;
mod heap;
mod list;
mod logger;
mod region;
mod stats;

pub use block::{BLOCK_OVERHEAD, FOOTER_SIZE, HEADER_SIZE, State};
pub use error::HeapError;
pub use heap::Heap;
pub use logger::StderrLogger;
pub use stats::{BlockStats, HeapStats, ListStats};
