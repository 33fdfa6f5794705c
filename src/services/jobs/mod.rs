pub mod emr;
pub mod submitter;

pub use emr::EmrJobSubmitter;
pub use submitter::{ExportJob, JobSubmitError, JobSubmitter};
