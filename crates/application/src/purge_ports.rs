mod callback;
mod dispatcher;
mod queue;

pub use callback::DeletionTaskCallback;
pub use dispatcher::{DeletionJobDispatcher, JobHandle};
pub use queue::{ClaimedDeletionJob, DeletionJobFailureOutcome, DeletionJobQueue};
