//! Core module - associations, workflows and their storage

pub mod association;
pub mod clock;
pub mod color;
pub mod config;
pub mod format;
pub mod identity;
pub mod project;
pub mod reference;
pub mod status;
pub mod store;
pub mod workflow;

pub use association::{Association, AssociationError, AssociationId, AttachOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use color::{ColorError, Rgb};
pub use config::{Config, ConfigError};
pub use identity::{IdParseError, RecordId, RecordPrefix};
pub use project::{Project, ProjectError};
pub use reference::{EntityKind, EntityReference, ReferenceError};
pub use status::{EffectiveState, WorkflowFamily, WorkflowStatus};
pub use store::Store;
pub use workflow::{
    ApprovalOptions, FixedPoints, ProgressOutcome, Scorer, WorkflowConfig, WorkflowEngine,
    WorkflowError, WorkflowRecord,
};
