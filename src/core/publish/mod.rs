//! Resilient publishing pipeline: planning, staging, and the upload state
//! machine

pub mod planner;
pub mod publisher;
pub mod staging;

pub use planner::{BatchPlan, BatchPlanner};
pub use publisher::{
    ProgressCallback, PublishConfig, PublishProgress, PublishReport, PublishState, Publisher,
};
pub use staging::StagingCoordinator;
