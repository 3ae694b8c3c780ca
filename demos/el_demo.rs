use std::ptr::NonNull;

use anyhow::{Context, Result};
use clap::Parser;
use elalloc::{BLOCK_OVERHEAD, Heap, StderrLogger};
use log::LevelFilter;

/// Replays a fixed allocate/free sequence and prints the heap after each phase.
#[derive(Parser)]
#[command(name = "el_demo")]
struct Cli {
  /// Total heap size in bytes, block overhead included
  #[arg(long, default_value_t = 1024)]
  heap_bytes: usize,

  /// Log heap operations to stderr (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn print_ptr_offset(
  heap: &Heap,
  name: &str,
  ptr: NonNull<u8>,
) {
  let offset = heap.offset_of(ptr.as_ptr()).unwrap_or_default();
  println!("{name}: {offset} from heap start");
}

fn print_phase(
  heap: &Heap,
  title: &str,
) {
  println!("{title}");
  heap.print_stats();
  println!();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = match cli.verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  StderrLogger::new(level).init().context("installing logger")?;

  println!("EL_BLOCK_OVERHEAD: {BLOCK_OVERHEAD}");
  let mut heap = Heap::init(cli.heap_bytes).context("initializing heap")?;
  print_phase(&heap, "INITIAL");

  // --------------------------------------------------------------------
  // 1) Three allocations carved from the single initial block.
  // --------------------------------------------------------------------
  let p1 = heap.allocate(128)?;
  let p2 = heap.allocate(48)?;
  let p3 = heap.allocate(156)?;
  print_phase(&heap, "MALLOC 3");

  println!("POINTERS");
  print_ptr_offset(&heap, "p3", p3);
  print_ptr_offset(&heap, "p2", p2);
  print_ptr_offset(&heap, "p1", p1);
  println!();

  // --------------------------------------------------------------------
  // 2) Two more, leaving one available block at the top of the heap.
  // --------------------------------------------------------------------
  let p4 = heap.allocate(22)?;
  let p5 = heap.allocate(64)?;
  print_phase(&heap, "MALLOC 5");

  println!("POINTERS");
  print_ptr_offset(&heap, "p5", p5);
  print_ptr_offset(&heap, "p4", p4);
  print_ptr_offset(&heap, "p3", p3);
  print_ptr_offset(&heap, "p2", p2);
  print_ptr_offset(&heap, "p1", p1);
  println!();

  // --------------------------------------------------------------------
  // 3) Free two blocks whose neighbors are still in use: no coalescing.
  // --------------------------------------------------------------------
  heap.free(p1)?;
  print_phase(&heap, "FREE 1");

  heap.free(p3)?;
  print_phase(&heap, "FREE 3");

  // --------------------------------------------------------------------
  // 4) Reallocate. First fit picks the freed 156-byte block for 32 bytes
  //    and has to go to the top of the heap for 200.
  // --------------------------------------------------------------------
  let p3 = heap.allocate(32)?;
  let p1 = heap.allocate(200)?;
  print_phase(&heap, "RE-ALLOC 3,1");

  println!("POINTERS");
  print_ptr_offset(&heap, "p1", p1);
  print_ptr_offset(&heap, "p3", p3);
  print_ptr_offset(&heap, "p5", p5);
  print_ptr_offset(&heap, "p4", p4);
  print_ptr_offset(&heap, "p2", p2);
  println!();

  // --------------------------------------------------------------------
  // 5) Free everything. Each free merges with whatever is available
  //    around it until a single block spans the heap again.
  // --------------------------------------------------------------------
  heap.free(p1)?;
  print_phase(&heap, "FREE'D 1");

  heap.free(p2)?;
  print_phase(&heap, "FREE'D 2");

  heap.free(p3)?;
  heap.free(p4)?;
  heap.free(p5)?;
  print_phase(&heap, "FREE'D 3,4,5");

  heap.check()?;
  heap.cleanup();

  Ok(())
}
