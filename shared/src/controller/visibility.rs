//! Sleep while the view is hidden; wake after a short delay once it is shown again.

use rapier3d::prelude::RigidBodyHandle;

use crate::physics::PhysicsWorld;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Visibility {
    hidden: bool,
    /// Seconds left before the pending wake-up fires.
    wake_in: Option<f32>,
}

impl Visibility {
    /// Hidden, or shown but still waiting for the delayed wake-up.
    pub fn is_suspended(&self) -> bool {
        self.hidden || self.wake_in.is_some()
    }

    pub fn set_visible<W: PhysicsWorld + ?Sized>(
        &mut self,
        visible: bool,
        delay: f32,
        body: RigidBodyHandle,
        world: &mut W,
    ) {
        if visible {
            if self.hidden {
                self.hidden = false;
                self.wake_in = Some(delay.max(0.0));
                log::info!("view visible, waking {body:?} in {delay}s");
            }
        } else {
            self.hidden = true;
            self.wake_in = None;
            world.sleep(body);
            log::info!("view hidden, {body:?} asleep");
        }
    }

    /// Advance the wake-up timer. Returns true on the tick the body is woken.
    pub fn advance<W: PhysicsWorld + ?Sized>(
        &mut self,
        dt: f32,
        body: RigidBodyHandle,
        world: &mut W,
    ) -> bool {
        let Some(left) = self.wake_in.as_mut() else {
            return false;
        };
        *left -= dt;
        if *left > 0.0 {
            return false;
        }
        self.wake_in = None;
        world.wake_up(body);
        true
    }
}
