mod ingest;
mod interval;
mod service;
pub mod tasks;

pub use ingest::{IngestReport, Ingestor};
pub use interval::parse_interval;
pub use service::{SchedulerEvent, SchedulerService};
pub use tasks::{scrape_next_feed, CycleOutcome};
