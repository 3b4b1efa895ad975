//! The analysis wizard: step gating, running the analysis against a
//! collaborator, and the debounced location search that feeds step 1.

pub mod search;
pub mod state;
pub mod step;

pub use search::{LocationResolver, SearchBox, SearchTicket};
pub use state::AnalysisWorkflow;
pub use step::{Step, StepStatus};
