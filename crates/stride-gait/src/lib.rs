//! Foot stepping for procedurally animated legs: per-foot step controllers,
//! a left/right gait coordinator, and a rig that drives two IK legs from them.

pub mod config;
pub mod coordinator;
pub mod home;
pub mod rig;
pub mod settings;
pub mod step;

pub use config::RigConfig;
pub use coordinator::{Foot, GaitCoordinator, GaitEvents};
pub use home::Home;
pub use rig::{LegNodes, LegRig};
pub use settings::{GaitPolicy, GroundingSettings, StepSettings};
pub use step::{FootState, FootStepController, StepTrajectory};
