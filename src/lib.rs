//! # EdgeScope RS
//!
//! A software scope that records microsecond timestamps of level transitions on
//! a single digital input line, driven by an edge interrupt.
//!
//! Only timestamps are stored. Because transitions on one line strictly
//! alternate, the edge type and the resulting level of every sample are
//! reconstructed from its index and the level reached by the first recorded
//! sample.
//!
//! ## Features
//!
//! - **Trigger modes**: start recording on any change, on a rising or on a falling edge
//! - **Two buffer policies**: linear (stop when full) and wrapping power-of-two ring
//! - **Hooks**: optional begin/complete callbacks run from interrupt context
//! - **Platform agnostic**: bring your own interrupt controller and clock via
//!   [`EdgeInterrupts`] and [`MicrosClock`]
//! - **Sample depth**: store offsets as `u32`, `u16` or `u8` to trade capture
//!   length for memory
//! - **Export**: finished captures as `DATA` report lines or, with the `export`
//!   feature (on by default), `polars` DataFrames
//!
//! This is a `std` library. Shared state is guarded with the `critical-section`
//! crate; the default `sim` feature enables its `std` implementation. Without
//! `sim`, the final binary must link an implementation for its platform.
//!
//! ## Examples
//!
//! ### Linear capture
//!
//! ```rust
//! use edgescope_rs::sim::SimulatedLine;
//! use edgescope_rs::{DigitalScope, Level, ScopeConfig, TriggerMode};
//!
//! let line = SimulatedLine::new(2, Level::Low);
//! let mut scope: DigitalScope<_, _, 4> =
//!     DigitalScope::new(line.clone(), line.clock(), 2, ScopeConfig::linear())?;
//!
//! scope.start(TriggerMode::Change);
//! line.toggle_all(&[100, 250, 400, 900]);
//! assert!(scope.is_full());
//!
//! scope.stop();
//! assert_eq!(scope.time_of(1), Some(150));
//! assert_eq!(scope.level_of(0), Some(Level::High));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Hooks and export
//!
//! ```rust
//! use edgescope_rs::sim::SimulatedLine;
//! use edgescope_rs::{DigitalScope, Level, ScopeConfig, TriggerMode};
//!
//! let line = SimulatedLine::new(2, Level::High);
//! let config = ScopeConfig::wrapping().with_auto_stop(true);
//! let mut scope: DigitalScope<_, _, 8> =
//!     DigitalScope::new(line.clone(), line.clock(), 2, config)?;
//!
//! scope.set_complete_hook(|| {
//!     // Runs in interrupt context: keep it short.
//! });
//!
//! scope.start(TriggerMode::Rising);
//! line.toggle_all(&[10, 20, 35, 50, 70, 95, 120, 150, 185]);
//! scope.stop();
//!
//! let capture = scope.capture()?;
//! let mut report = Vec::new();
//! capture.write_data_line(&mut report)?;
//! #[cfg(feature = "export")]
//! {
//!     let df = capture.to_dataframe()?;
//!     println!("{}", df);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod callbacks;
pub mod capture;
pub mod config;
pub mod digital_scope;
pub mod edge;
pub mod interrupt;
pub(crate) mod recorder;
pub mod sample;
pub(crate) mod session;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod trigger_config;

// Re-export the main types for convenience
pub use callbacks::{Hook, HookKind};

pub use capture::{Capture, CaptureError, CapturedEdge};

pub use config::{IndexingMode, ScopeConfig, ScopeConfigError};

pub use digital_scope::DigitalScope;

pub use edge::{Edge, Level};

pub use sample::SampleDepth;

pub use interrupt::{EdgeHandler, EdgeInterrupts, EdgeMode, HandlerAction, MicrosClock};

pub use trigger_config::{ArmState, TriggerMode};
