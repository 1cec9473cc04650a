use crate::{Foot, FootStepController, GaitCoordinator, GaitEvents, Home, RigConfig};
use stride_core::{NodeId, Result, TickContext, TickHandler, TransformStore};
use stride_ik::{IkLimb, LimbBinding, SolveReport};

/// Node handles for one leg of a rig.
#[derive(Debug, Clone)]
pub struct LegNodes {
    /// Hip to foot.
    pub joints: Vec<NodeId>,
    /// IK target the stepping controller moves.
    pub target: NodeId,
    /// Anchor parented under the pelvis.
    pub home: NodeId,
    pub pole: Option<NodeId>,
}

/// Two IK legs driven by a gait coordinator, behind a single enable switch.
pub struct LegRig {
    gait: GaitCoordinator,
    limbs: [IkLimb; 2],
    ik_enabled: bool,
    last_events: GaitEvents,
}

impl LegRig {
    pub fn new(gait: GaitCoordinator, left: IkLimb, right: IkLimb) -> Self {
        Self {
            gait,
            limbs: [left, right],
            ik_enabled: true,
            last_events: GaitEvents::default(),
        }
    }

    pub fn from_config(
        config: &RigConfig,
        left: LegNodes,
        right: LegNodes,
        hips: Option<NodeId>,
        store: &dyn TransformStore,
    ) -> Result<Self> {
        config.validate()?;
        let (left_limb, left_foot) = build_leg("l", config, left, hips, store)?;
        let (right_limb, right_foot) = build_leg("r", config, right, hips, store)?;
        let gait = GaitCoordinator::new(left_foot, right_foot, config.gait);
        log::debug!("Leg rig built with {:?} gait", config.gait);
        Ok(Self::new(gait, left_limb, right_limb))
    }

    pub fn gait(&self) -> &GaitCoordinator {
        &self.gait
    }

    pub fn gait_mut(&mut self) -> &mut GaitCoordinator {
        &mut self.gait
    }

    pub fn limb(&self, foot: Foot) -> &IkLimb {
        &self.limbs[foot.index()]
    }

    pub fn limb_mut(&mut self, foot: Foot) -> &mut IkLimb {
        &mut self.limbs[foot.index()]
    }

    pub fn is_ik_enabled(&self) -> bool {
        self.ik_enabled
    }

    /// Turning IK off cancels any step in flight and freezes both legs until
    /// it is turned back on.
    pub fn set_ik_enabled(&mut self, enabled: bool) {
        if self.ik_enabled == enabled {
            return;
        }
        self.ik_enabled = enabled;
        if !enabled {
            self.gait.cancel_all();
        }
        log::info!("Leg IK {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn last_events(&self) -> GaitEvents {
        self.last_events
    }

    /// Steps then solves both legs. Does nothing while IK is disabled.
    pub fn update(
        &mut self,
        store: &mut dyn TransformStore,
        dt: f32,
    ) -> Option<[Option<SolveReport>; 2]> {
        if !self.ik_enabled {
            self.last_events = GaitEvents::default();
            return None;
        }
        self.last_events = self.gait.tick(store, dt);
        let [left, right] = &mut self.limbs;
        let reports = [left.update(store), right.update(store)];
        log::trace!("Leg rig solved: {:?}", reports);
        Some(reports)
    }
}

impl TickHandler for LegRig {
    fn on_frame(&mut self, ctx: &mut TickContext<'_>) {
        self.update(ctx.scene, ctx.dt);
    }

    fn on_fixed_tick(&mut self, ctx: &mut TickContext<'_>) {
        if self.ik_enabled {
            self.gait.reground(&*ctx.scene, ctx.ground);
        }
    }
}

fn build_leg(
    side: &str,
    config: &RigConfig,
    nodes: LegNodes,
    hips: Option<NodeId>,
    store: &dyn TransformStore,
) -> Result<(IkLimb, FootStepController)> {
    let mut binding = LimbBinding::new(nodes.joints, nodes.target);
    if let Some(pole) = nodes.pole {
        binding = binding.with_pole(pole);
    }
    if let Some(hips) = hips {
        binding = binding.with_hips(hips);
    }
    let limb = IkLimb::new(format!("leg_{side}"), binding, config.ik, store)?;

    let mut home = Home::new(nodes.home);
    if let Some(grounding) = config.grounding {
        home = home.with_grounding(grounding);
    }
    let foot = FootStepController::new(format!("foot_{side}"), nodes.target, home, config.step)?;
    Ok((limb, foot))
}
