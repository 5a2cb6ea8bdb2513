pub mod registry;
pub mod snapshot;
pub mod source;

pub use registry::{ReceiverRegistry, RefreshSummary, StationSlot};
pub use snapshot::{corrected_bearing, ReceiverSnapshot};
pub use source::{TelemetryError, TelemetrySource};
