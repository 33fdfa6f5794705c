pub mod destination;
pub mod pipeline;

pub use pipeline::{ExportAccepted, ExportInput, ExportPipeline, ExportPolicy};
