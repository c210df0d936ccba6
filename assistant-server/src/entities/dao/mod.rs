pub mod assistant;
pub mod project;

pub use assistant::{AssistantPatch, AssistantRecord, Tool};
pub use project::{ProjectPatch, ProjectRecord};
