// Basic capture example
//
// This example arms a scope on a simulated line, feeds it a burst of edges and
// prints the reconstructed signal.

use edgescope_rs::sim::SimulatedLine;
use edgescope_rs::{DigitalScope, Level, ScopeConfig, TriggerMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const PIN: u8 = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("EdgeScope Basic Capture Example");
    println!("===============================\n");

    let line = SimulatedLine::new(PIN, Level::High);
    let mut scope: DigitalScope<_, _, 8> =
        DigitalScope::new(line.clone(), line.clock(), PIN, ScopeConfig::linear())?;

    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    scope.set_complete_hook(move || flag.store(true, Ordering::SeqCst));

    // 1. Arm on a rising edge while the line idles high: the first edge is skipped.
    println!("1. Arming on rising edge (line is {})", line.level().as_str());
    scope.start(TriggerMode::Rising);
    println!("   Edges to skip before recording: {}", scope.pending_skips());

    // 2. Feed edges until the buffer completes.
    println!("\n2. Feeding edges...");
    let mut t = 1_000;
    while !done.load(Ordering::SeqCst) {
        t += 120 + (t % 7) * 13;
        line.toggle_at(t);
    }
    scope.stop();
    println!("   Recorded {} samples", scope.sample_count());

    // 3. Reconstructed signal
    println!("\n3. Captured signal:");
    println!("   Start time: {:?} us", scope.start_time());
    for idx in 0..scope.sample_count() {
        if let (Some(time), Some(edge), Some(level)) =
            (scope.time_of(idx), scope.edge_of(idx), scope.level_of(idx))
        {
            println!("   #{idx}: +{time:>6} us {:<8} -> {}", edge.as_str(), level.as_str());
        }
    }

    Ok(())
}
