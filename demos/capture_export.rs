// Capture export example
//
// This example records a short pulse train and exports it as a DATA report
// line and as a polars DataFrame.

use edgescope_rs::sim::SimulatedLine;
use edgescope_rs::{DigitalScope, Level, ScopeConfig, TriggerMode};
use polars::prelude::*;

const PIN: u8 = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("EdgeScope Capture Export Example");
    println!("================================\n");

    let line = SimulatedLine::new(PIN, Level::Low);
    let config = ScopeConfig::linear().with_auto_stop(true);
    let mut scope: DigitalScope<_, _, 10> =
        DigitalScope::new(line.clone(), line.clock(), PIN, config)?;

    scope.start(TriggerMode::Change);
    line.toggle_all(&[
        2_000, 2_150, 2_900, 3_050, 3_800, 3_950, 4_700, 4_850, 5_600, 5_750, 6_500,
    ]);
    println!("Line still bound after auto-stop: {}", line.is_attached());
    scope.stop();

    let capture = scope.capture()?;

    // 1. Report line
    println!("1. Report line");
    capture.write_data_line(std::io::stdout().lock())?;

    // 2. Full DataFrame
    println!("\n2. DataFrame");
    let df = capture.to_dataframe()?;
    println!("{}", df);

    // 3. High phases only
    println!("\n3. Samples ending high");
    let high = capture
        .to_lazyframe()?
        .filter(col("level").eq(lit(1u32)))
        .select([col("time_us"), col("edge")])
        .collect()?;
    println!("{}", high);

    Ok(())
}
