#[cfg(feature = "export")]
use polars::prelude::*;
use std::io::Write;

use crate::edge::{self, Edge, Level};

#[cfg(feature = "export")]
const TIME_COLUMN_NAME: &str = "time_us";
#[cfg(feature = "export")]
const TIMESTAMP_COLUMN_NAME: &str = "timestamp_us";
#[cfg(feature = "export")]
const LEVEL_COLUMN_NAME: &str = "level";
#[cfg(feature = "export")]
const EDGE_COLUMN_NAME: &str = "edge";

/// Returned when a snapshot is requested while the scope is still recording.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Scope is still armed; stop it before taking a capture")]
    StillArmed,
}

/// One recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedEdge {
    /// Position in the capture, 0 = oldest retained sample.
    pub index: usize,
    /// Absolute clock value in microseconds.
    pub timestamp: u32,
    /// Microseconds since the first recorded sample of the session.
    pub time: u32,
    pub edge: Edge,
    /// Level after the transition.
    pub level: Level,
}

/// Owned copy of a stopped capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    initial_level: Level,
    first_index: u32,
    start_time: Option<u32>,
    completions: u32,
    timestamps: Vec<u32>,
}

impl Capture {
    pub(crate) fn new(
        initial_level: Level,
        first_index: u32,
        start_time: Option<u32>,
        completions: u32,
        timestamps: Vec<u32>,
    ) -> Self {
        Self {
            initial_level,
            first_index,
            start_time,
            completions,
            timestamps,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Level reached by the first recorded sample of the session.
    pub fn initial_level(&self) -> Level {
        self.initial_level
    }

    /// Absolute timestamp of the first recorded sample of the session.
    pub fn start_time(&self) -> Option<u32> {
        self.start_time
    }

    /// Number of times the buffer was filled during the session.
    pub fn completions(&self) -> u32 {
        self.completions
    }

    /// Absolute timestamps, oldest first.
    pub fn timestamps(&self) -> &[u32] {
        &self.timestamps
    }

    pub fn get(&self, index: usize) -> Option<CapturedEdge> {
        let timestamp = *self.timestamps.get(index)?;
        let logical = self.first_index.wrapping_add(index as u32);
        Some(CapturedEdge {
            index,
            timestamp,
            time: timestamp.wrapping_sub(self.start_time.unwrap_or(timestamp)),
            edge: edge::edge_of(logical, self.initial_level),
            level: edge::level_of(logical, self.initial_level),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = CapturedEdge> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Time spent at each level between consecutive edges, in microseconds.
    pub fn pulse_widths(&self) -> impl Iterator<Item = (Level, u32)> + '_ {
        self.iter()
            .zip(self.iter().skip(1))
            .map(|(a, b)| (a.level, b.timestamp.wrapping_sub(a.timestamp)))
    }

    /// Write the capture as a single `DATA <time> <level> ...` line.
    ///
    /// Times are relative to the start of the session, levels are 0 or 1.
    pub fn write_data_line<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        write!(writer, "DATA")?;
        for edge in self.iter() {
            write!(writer, " {} {}", edge.time, edge.level.as_u8())?;
        }
        writeln!(writer)
    }

    #[cfg(feature = "export")]
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        #[cfg(feature = "cpu-profiling")]
        let _zone = tracy_client::Client::running()
            .map(|client| client.span(tracy_client::span_location!("Capture::to_dataframe"), 0));

        let _span = tracing::debug_span!("capture_to_dataframe", samples = self.len()).entered();

        let edges: Vec<CapturedEdge> = self.iter().collect();
        let times: Vec<u32> = edges.iter().map(|e| e.time).collect();
        let timestamps: Vec<u32> = edges.iter().map(|e| e.timestamp).collect();
        let levels: Vec<u32> = edges.iter().map(|e| u32::from(e.level.as_u8())).collect();
        let kinds: Vec<&str> = edges.iter().map(|e| e.edge.as_str()).collect();

        let columns: Vec<Column> = vec![
            Series::new(TIME_COLUMN_NAME.into(), times).into(),
            Series::new(TIMESTAMP_COLUMN_NAME.into(), timestamps).into(),
            Series::new(LEVEL_COLUMN_NAME.into(), levels).into(),
            Series::new(EDGE_COLUMN_NAME.into(), kinds).into(),
        ];

        DataFrame::new(columns)
    }

    #[cfg(feature = "export")]
    pub fn to_lazyframe(&self) -> Result<LazyFrame, PolarsError> {
        Ok(self.to_dataframe()?.lazy())
    }
}
