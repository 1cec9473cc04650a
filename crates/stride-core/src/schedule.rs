//! Per-frame and fixed-timestep invocation points.
//!
//! The host owns the loop; `FrameScheduler::advance` is called once per
//! rendered frame and fans out into zero or more fixed ticks followed by one
//! frame callback.

use crate::{GroundProbe, Result, StrideError, TransformStore};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickPhase {
    Frame,
    Fixed,
}

/// Everything a handler may touch during one tick.
pub struct TickContext<'a> {
    pub dt: f32,
    pub phase: TickPhase,
    pub frame: u64,
    pub scene: &'a mut dyn TransformStore,
    pub ground: &'a dyn GroundProbe,
}

pub trait TickHandler {
    /// Runs once per rendered frame with the frame delta.
    fn on_frame(&mut self, ctx: &mut TickContext<'_>);

    /// Runs at the fixed physics rate, before the frame callback.
    fn on_fixed_tick(&mut self, _ctx: &mut TickContext<'_>) {}
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub fixed_ticks: u32,
    /// Seconds discarded because `max_substeps` was hit.
    pub dropped: f32,
}

pub struct FrameScheduler {
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f32,
    frame: u64,
}

impl FrameScheduler {
    pub fn new(fixed_dt: f32, max_substeps: u32) -> Result<Self> {
        if fixed_dt <= 0.0 || fixed_dt.is_nan() {
            return Err(StrideError::InvalidConfiguration(format!(
                "fixed timestep must be positive, got {fixed_dt}"
            )));
        }
        if max_substeps == 0 {
            return Err(StrideError::InvalidConfiguration(
                "max_substeps must be at least 1".into(),
            ));
        }
        Ok(Self {
            fixed_dt,
            max_substeps,
            accumulator: 0.0,
            frame: 0,
        })
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn advance(
        &mut self,
        frame_dt: f32,
        handler: &mut dyn TickHandler,
        scene: &mut dyn TransformStore,
        ground: &dyn GroundProbe,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        self.accumulator += frame_dt.max(0.0);

        while self.accumulator >= self.fixed_dt {
            if stats.fixed_ticks == self.max_substeps {
                stats.dropped = self.accumulator;
                log::warn!(
                    "Frame {}: dropping {:.4}s after {} fixed ticks",
                    self.frame,
                    self.accumulator,
                    stats.fixed_ticks
                );
                self.accumulator = 0.0;
                break;
            }
            let mut ctx = TickContext {
                dt: self.fixed_dt,
                phase: TickPhase::Fixed,
                frame: self.frame,
                scene: &mut *scene,
                ground,
            };
            handler.on_fixed_tick(&mut ctx);
            self.accumulator -= self.fixed_dt;
            stats.fixed_ticks += 1;
        }

        let mut ctx = TickContext {
            dt: frame_dt.max(0.0),
            phase: TickPhase::Frame,
            frame: self.frame,
            scene,
            ground,
        };
        handler.on_frame(&mut ctx);

        log::trace!("Frame {} ran {} fixed ticks", self.frame, stats.fixed_ticks);
        self.frame += 1;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoGround, TransformHierarchy};

    #[derive(Default)]
    struct Counter {
        frames: u32,
        fixed: u32,
        last_frame_dt: f32,
    }

    impl TickHandler for Counter {
        fn on_frame(&mut self, ctx: &mut TickContext<'_>) {
            assert_eq!(ctx.phase, TickPhase::Frame);
            self.frames += 1;
            self.last_frame_dt = ctx.dt;
        }

        fn on_fixed_tick(&mut self, ctx: &mut TickContext<'_>) {
            assert_eq!(ctx.phase, TickPhase::Fixed);
            self.fixed += 1;
        }
    }

    #[test]
    fn accumulates_fixed_ticks() {
        let mut sched = FrameScheduler::new(0.02, 8).unwrap();
        let mut counter = Counter::default();
        let mut scene = TransformHierarchy::new();

        let stats = sched.advance(0.05, &mut counter, &mut scene, &NoGround);
        assert_eq!(stats.fixed_ticks, 2);
        let stats = sched.advance(0.015, &mut counter, &mut scene, &NoGround);
        assert_eq!(stats.fixed_ticks, 1);

        assert_eq!(counter.frames, 2);
        assert_eq!(counter.fixed, 3);
        assert_eq!(counter.last_frame_dt, 0.015);
        assert_eq!(sched.frame_count(), 2);
    }

    #[test]
    fn caps_substeps_and_drops_backlog() {
        let mut sched = FrameScheduler::new(0.01, 3).unwrap();
        let mut counter = Counter::default();
        let mut scene = TransformHierarchy::new();

        let stats = sched.advance(0.1, &mut counter, &mut scene, &NoGround);
        assert_eq!(stats.fixed_ticks, 3);
        assert!(stats.dropped > 0.06);

        let stats = sched.advance(0.0, &mut counter, &mut scene, &NoGround);
        assert_eq!(stats.fixed_ticks, 0);
        assert_eq!(counter.frames, 2);
    }

    #[test]
    fn rejects_bad_timestep() {
        assert!(FrameScheduler::new(0.0, 4).is_err());
        assert!(FrameScheduler::new(0.01, 0).is_err());
    }
}
