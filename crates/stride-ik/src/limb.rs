use crate::chain::read_pose;
use crate::{Chain, ChainIkSolver, IkGoal, IkSettings, SolveReport};
use stride_core::{NodeId, Result, TransformStore};

/// Handles a limb is bound to at construction.
#[derive(Debug, Clone)]
pub struct LimbBinding {
    /// Root to leaf.
    pub joints: Vec<NodeId>,
    pub target: Option<NodeId>,
    pub pole: Option<NodeId>,
    /// Set for legs; drives the hips-yaw twist.
    pub hips: Option<NodeId>,
}

impl LimbBinding {
    pub fn new(joints: Vec<NodeId>, target: NodeId) -> Self {
        Self {
            joints,
            target: Some(target),
            pole: None,
            hips: None,
        }
    }

    pub fn with_pole(mut self, pole: NodeId) -> Self {
        self.pole = Some(pole);
        self
    }

    pub fn with_hips(mut self, hips: NodeId) -> Self {
        self.hips = Some(hips);
        self
    }
}

/// A chain bound to nodes in a transform store, solved in place each tick.
pub struct IkLimb {
    pub name: String,
    chain: Chain,
    target: Option<NodeId>,
    pole: Option<NodeId>,
    hips: Option<NodeId>,
    solver: ChainIkSolver,
    last_report: Option<SolveReport>,
}

impl IkLimb {
    pub fn new(
        name: impl Into<String>,
        binding: LimbBinding,
        settings: IkSettings,
        store: &dyn TransformStore,
    ) -> Result<Self> {
        let solver = ChainIkSolver::new(settings)?;
        let chain = Chain::from_store(binding.joints, store, binding.target, binding.hips)?;
        let name = name.into();
        log::debug!(
            "IK limb '{}': {} joints, reach {:.3}",
            name,
            chain.len(),
            chain.total_reach()
        );
        Ok(Self {
            name,
            chain,
            target: binding.target,
            pole: binding.pole,
            hips: binding.hips,
            solver,
            last_report: None,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<NodeId>) {
        self.target = target;
    }

    pub fn set_pole(&mut self, pole: Option<NodeId>) {
        self.pole = pole;
    }

    /// Rebinds the joints; the rest cache is rebuilt on the next update.
    pub fn set_joints(&mut self, joints: Vec<NodeId>) {
        self.chain.set_joints(joints);
    }

    pub fn settings(&self) -> &IkSettings {
        &self.solver.settings
    }

    pub fn last_report(&self) -> Option<SolveReport> {
        self.last_report
    }

    /// Solves toward the target and writes the joints back into `store`.
    /// Without a target this is a no-op and the joints keep their pose.
    pub fn update(&mut self, store: &mut dyn TransformStore) -> Option<SolveReport> {
        let target = store.world(self.target?)?;

        if let Err(err) = self.chain.ensure_rest(&*store, self.target, self.hips) {
            log::warn!("IK limb '{}': cannot rebuild rest pose: {}", self.name, err);
            return None;
        }

        let seed = match read_pose(self.chain.joints(), &*store) {
            Ok(seed) => seed,
            Err(err) => {
                log::warn!("IK limb '{}': {}", self.name, err);
                return None;
            }
        };

        let mut goal = IkGoal::new(target);
        if let Some(pole) = self.pole.and_then(|p| store.world_position(p)) {
            goal = goal.with_pole(pole);
        }
        if self.solver.settings.compensate_hips_yaw {
            if let Some(hips) = self.hips.and_then(|h| store.world(h)) {
                goal = goal.with_hips_yaw_delta(hips.yaw() - self.chain.rest().hips_yaw);
            }
        }

        let solution = match self.solver.solve(&self.chain, &seed, &goal) {
            Ok(solution) => solution,
            Err(err) => {
                log::warn!("IK limb '{}': {}", self.name, err);
                return None;
            }
        };

        for (&joint, pose) in self.chain.joints().iter().zip(&solution.poses) {
            if let Err(err) = store.set_world(joint, *pose) {
                log::warn!("IK limb '{}': write-back failed: {}", self.name, err);
                return None;
            }
        }

        self.last_report = Some(solution.report);
        Some(solution.report)
    }
}
