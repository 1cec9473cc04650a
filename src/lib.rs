//! Stride - procedural leg IK and foot stepping
//!
//! A FABRIK chain solver plus a gait layer that moves each foot's IK target
//! along a stepping arc whenever it drifts too far from its home anchor.

pub use stride_core as core;
pub use stride_gait as gait;
pub use stride_ik as ik;

pub mod prelude {
    pub use crate::core::{
        FlatGround, FrameScheduler, GroundProbe, HeightfieldGround, LayerMask, NodeId, Result,
        StrideError, TickHandler, Transform, TransformHierarchy, TransformStore,
    };
    pub use crate::gait::{
        Foot, GaitCoordinator, GaitPolicy, GroundingSettings, LegNodes, LegRig, RigConfig,
        StepSettings,
    };
    pub use crate::ik::{Chain, ChainIkSolver, IkLimb, IkSettings, LimbBinding, SolveReport};
}
