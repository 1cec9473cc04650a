//! Shared types for the stride leg-IK workspace: rigid transforms, node
//! handles, the collaborator traits the solvers consume, and small reference
//! implementations of those collaborators.

pub mod error;
pub mod ground;
pub mod heightmap;
pub mod scene;
pub mod schedule;
pub mod transform;

pub use error::{Result, StrideError};
pub use ground::{FlatGround, GroundProbe, LayerMask, NoGround};
pub use heightmap::HeightfieldGround;
pub use scene::{Node, NodeId, TransformHierarchy, TransformStore};
pub use schedule::{FrameScheduler, FrameStats, TickContext, TickHandler, TickPhase};
pub use transform::Transform;
