pub mod chain;
pub mod ik;
pub mod limb;

pub use chain::*;
pub use ik::*;
pub use limb::*;
