// Wrapping buffer example
//
// This example keeps a ring of the most recent edges of a simulated square
// wave and counts how often the ring wrapped.

use edgescope_rs::sim::SimulatedLine;
use edgescope_rs::{DigitalScope, Level, ScopeConfig, TriggerMode};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const PIN: u8 = 5;
const HALF_PERIOD_US: u32 = 500;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    println!("EdgeScope Wrapping Monitor");
    println!("==========================");

    let line = SimulatedLine::new(PIN, Level::Low);
    let mut scope: DigitalScope<_, _, 16> =
        DigitalScope::new(line.clone(), line.clock(), PIN, ScopeConfig::wrapping())?;

    let wraps = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&wraps);
    scope.set_complete_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    scope.start(TriggerMode::Falling);

    for n in 1..=100u32 {
        line.toggle_at(n * HALF_PERIOD_US);
    }
    scope.stop();

    println!("Ring wrapped {} time(s)", wraps.load(Ordering::SeqCst));
    println!("Completions reported by scope: {}", scope.completions());

    let capture = scope.capture()?;
    println!("Retained {} of the most recent edges:", capture.len());
    for edge in capture.iter() {
        println!(
            "  t={:>6} us {:<7} -> {}",
            edge.timestamp,
            edge.edge.as_str(),
            edge.level.as_str()
        );
    }

    let (high, low): (Vec<_>, Vec<_>) = capture
        .pulse_widths()
        .partition(|(level, _)| *level == Level::High);
    println!(
        "High pulses: {}, low pulses: {}",
        high.len(),
        low.len()
    );

    Ok(())
}
