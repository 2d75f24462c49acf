//! Animation slot selection.
//!
//! The controller reasons about a fixed set of [`AnimationSlot`]s; an [`AnimationSet`] maps
//! them to clip names. Transitions are guarded so one-shot actions are not interrupted by
//! locomotion requests.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::ControllerError,
    store::{Store, SubscriptionId},
    types::Vec3,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationSlot {
    #[default]
    Idle,
    Walk,
    Run,
    Jump,
    JumpIdle,
    JumpLand,
    Fall,
    Action1,
    Action2,
    Action3,
    Action4,
}

impl AnimationSlot {
    #[inline]
    pub fn is_action(self) -> bool {
        matches!(
            self,
            Self::Action1 | Self::Action2 | Self::Action3 | Self::Action4
        )
    }

    /// Clips that play once, hold their last frame and then report completion.
    #[inline]
    pub fn is_one_shot(self) -> bool {
        matches!(self, Self::Jump | Self::JumpLand) || self.is_action()
    }
}

/// Clip names per slot. Slots without a name cannot be entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSet {
    pub idle: Option<String>,
    pub walk: Option<String>,
    pub run: Option<String>,
    pub jump: Option<String>,
    pub jump_idle: Option<String>,
    pub jump_land: Option<String>,
    pub fall: Option<String>,
    pub action1: Option<String>,
    pub action2: Option<String>,
    pub action3: Option<String>,
    pub action4: Option<String>,
    /// Alternate clips; one is picked at random every time Action1 is entered.
    pub action1_pool: Vec<String>,
}

impl Default for AnimationSet {
    fn default() -> Self {
        let name = |s: &str| Some(s.to_owned());
        let pool = [
            "F_Dances_001",
            "F_Dances_004",
            "F_Dances_007",
            "F_Dances_006",
            "M_Dances_006",
            "M_Dances_001",
            "M_Dances_011",
            "M_Dances_004",
        ];
        Self {
            idle: name("F_Standing_Idle_001"),
            walk: name("F_Walk_003"),
            run: name("F_Run_001"),
            jump: name("F_Standing_Idle_001"),
            jump_idle: name("F_Standing_Idle_001"),
            jump_land: name("F_Standing_Idle_001"),
            fall: name("F_Falling_Idle_000"),
            action1: name(pool[0]),
            action2: None,
            action3: None,
            action4: None,
            action1_pool: pool.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl AnimationSet {
    pub fn clip_name(&self, slot: AnimationSlot) -> Option<&str> {
        let name = match slot {
            AnimationSlot::Idle => &self.idle,
            AnimationSlot::Walk => &self.walk,
            AnimationSlot::Run => &self.run,
            AnimationSlot::Jump => &self.jump,
            AnimationSlot::JumpIdle => &self.jump_idle,
            AnimationSlot::JumpLand => &self.jump_land,
            AnimationSlot::Fall => &self.fall,
            AnimationSlot::Action1 => &self.action1,
            AnimationSlot::Action2 => &self.action2,
            AnimationSlot::Action3 => &self.action3,
            AnimationSlot::Action4 => &self.action4,
        };
        name.as_deref()
    }

    pub fn resolve(&self, slot: AnimationSlot) -> Result<&str, ControllerError> {
        self.clip_name(slot)
            .ok_or(ControllerError::AnimationClipNotFound(slot))
    }

    /// Every clip name this set may ask the driver to play.
    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        [
            &self.idle,
            &self.walk,
            &self.run,
            &self.jump,
            &self.jump_idle,
            &self.jump_land,
            &self.fall,
            &self.action1,
            &self.action2,
            &self.action3,
            &self.action4,
        ]
        .into_iter()
        .filter_map(|n| n.as_deref())
        .chain(self.action1_pool.iter().map(String::as_str))
    }
}

/// Shared game state observed by the animation driver and UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameState {
    pub slot: AnimationSlot,
    /// Clip currently selected for `slot`.
    pub clip: Option<String>,
    /// Active point-to-move destination.
    pub move_to_point: Option<Vec3>,
}

/// A clip the driver should start playing.
#[derive(Debug)]
pub struct ClipPlayback {
    pub slot: AnimationSlot,
    pub clip: String,
    /// Play once and clamp on the last frame.
    pub one_shot: bool,
    /// Send once when a one-shot clip finishes. Dropped receivers make this a no-op.
    pub finished: Option<Sender<()>>,
}

pub struct AnimationStateMachine {
    set: AnimationSet,
    store: Store<GameState>,
    rng: StdRng,
    finished: Option<Receiver<()>>,
    pending: Option<ClipPlayback>,
}

impl std::fmt::Debug for AnimationStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationStateMachine")
            .field("state", self.store.get())
            .field("awaiting_finish", &self.finished.is_some())
            .finish()
    }
}

impl AnimationStateMachine {
    pub fn new(set: AnimationSet) -> Self {
        Self::with_rng(set, StdRng::from_entropy())
    }

    /// Deterministic Action1 rolls.
    pub fn with_seed(set: AnimationSet, seed: u64) -> Self {
        Self::with_rng(set, StdRng::seed_from_u64(seed))
    }

    fn with_rng(set: AnimationSet, rng: StdRng) -> Self {
        let clip = set.clip_name(AnimationSlot::Idle).map(str::to_owned);
        let mut machine = Self {
            set,
            store: Store::new(GameState {
                slot: AnimationSlot::Idle,
                clip: None,
                move_to_point: None,
            }),
            rng,
            finished: None,
            pending: None,
        };
        if let Some(clip) = clip {
            machine.store.update(|s| s.clip = Some(clip.clone()));
            machine.pending = Some(ClipPlayback {
                slot: AnimationSlot::Idle,
                clip,
                one_shot: false,
                finished: None,
            });
        }
        machine
    }

    #[inline]
    pub fn current(&self) -> AnimationSlot {
        self.store.get().slot
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        self.store.get()
    }

    pub fn animation_set(&self) -> &AnimationSet {
        &self.set
    }

    pub fn subscribe<T, Sel, L>(&mut self, select: Sel, listener: L) -> SubscriptionId
    where
        T: PartialEq + 'static,
        Sel: Fn(&GameState) -> T + 'static,
        L: FnMut(&T) + 'static,
    {
        self.store.subscribe(select, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Request `slot`, applying the transition guards. Returns whether the state changed.
    pub fn request(&mut self, slot: AnimationSlot) -> bool {
        use AnimationSlot::*;

        let current = self.current();
        let target = match slot {
            Idle if current == JumpIdle => Some(JumpLand),
            Idle if !current.is_action() => Some(Idle),
            Walk | Run if current != Action4 => Some(slot),
            Jump | Fall => Some(slot),
            JumpIdle if current == Jump => Some(JumpIdle),
            JumpLand if current == JumpIdle => Some(JumpLand),
            Action1 | Action2 | Action3 if current == Idle => Some(slot),
            Action4 if matches!(current, Idle | Walk | Run) => Some(Action4),
            _ => None,
        };

        match target {
            Some(target) => self.enter(target),
            None => {
                log::debug!("animation request {slot:?} refused from {current:?}");
                false
            }
        }
    }

    pub fn idle(&mut self) -> bool {
        self.request(AnimationSlot::Idle)
    }

    pub fn walk(&mut self) -> bool {
        self.request(AnimationSlot::Walk)
    }

    pub fn run(&mut self) -> bool {
        self.request(AnimationSlot::Run)
    }

    pub fn jump(&mut self) -> bool {
        self.request(AnimationSlot::Jump)
    }

    pub fn jump_idle(&mut self) -> bool {
        self.request(AnimationSlot::JumpIdle)
    }

    pub fn jump_land(&mut self) -> bool {
        self.request(AnimationSlot::JumpLand)
    }

    pub fn fall(&mut self) -> bool {
        self.request(AnimationSlot::Fall)
    }

    /// Unconditional return to Idle.
    pub fn reset(&mut self) -> bool {
        self.enter(AnimationSlot::Idle)
    }

    fn enter(&mut self, slot: AnimationSlot) -> bool {
        if slot == self.current() {
            return false;
        }

        let clip = match self.pick_clip(slot) {
            Ok(clip) => clip,
            Err(err) => {
                log::debug!("{err}");
                return false;
            }
        };

        let changed = self.store.update(|s| {
            s.slot = slot;
            s.clip = Some(clip.clone());
        });
        if !changed {
            return false;
        }

        // Dropping the previous receiver detaches the previous clip's completion.
        self.finished = None;
        let one_shot = slot.is_one_shot();
        let finished = if one_shot {
            let (tx, rx) = crossbeam_channel::bounded(1);
            self.finished = Some(rx);
            Some(tx)
        } else {
            None
        };
        self.pending = Some(ClipPlayback {
            slot,
            clip,
            one_shot,
            finished,
        });
        true
    }

    fn pick_clip(&mut self, slot: AnimationSlot) -> Result<String, ControllerError> {
        if slot == AnimationSlot::Action1 {
            self.set.resolve(slot)?;
            if let Some(alt) = self.set.action1_pool.choose(&mut self.rng) {
                return Ok(alt.clone());
            }
        }
        self.set.resolve(slot).map(str::to_owned)
    }

    /// Next clip the driver should start, if the selection changed since the last call.
    pub fn take_playback(&mut self) -> Option<ClipPlayback> {
        self.pending.take()
    }

    /// Consume a clip-finished notification for the active one-shot clip and reset to Idle.
    pub fn poll_finished(&mut self) -> bool {
        let Some(rx) = &self.finished else {
            return false;
        };
        match rx.try_recv() {
            Ok(()) => {
                self.finished = None;
                self.reset()
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.finished = None;
                false
            }
        }
    }

    pub fn set_move_to_point(&mut self, point: Option<Vec3>) -> bool {
        self.store.update(|s| s.move_to_point = point)
    }

    #[inline]
    pub fn move_to_point(&self) -> Option<Vec3> {
        self.store.get().move_to_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};
    use AnimationSlot::*;

    fn full_set() -> AnimationSet {
        AnimationSet {
            action2: Some("Dance".into()),
            action3: Some("Cheer".into()),
            action4: Some("Attack".into()),
            ..AnimationSet::default()
        }
    }

    fn machine() -> AnimationStateMachine {
        AnimationStateMachine::with_seed(full_set(), 7)
    }

    fn force(m: &mut AnimationStateMachine, path: &[AnimationSlot]) {
        for &slot in path {
            assert!(m.request(slot), "could not enter {slot:?}");
        }
    }

    #[test]
    fn run_is_refused_during_action4() {
        let mut m = machine();
        force(&mut m, &[Walk, Action4]);
        assert!(!m.run());
        assert!(!m.walk());
        assert_eq!(m.current(), Action4);
    }

    #[test]
    fn action1_needs_idle() {
        let mut m = machine();
        m.walk();
        assert!(!m.request(Action1));
        assert_eq!(m.current(), Walk);
        m.idle();
        assert!(m.request(Action1));
    }

    #[test]
    fn idle_does_not_interrupt_actions() {
        let mut m = machine();
        force(&mut m, &[Action3]);
        assert!(!m.idle());
        assert_eq!(m.current(), Action3);
    }

    #[test]
    fn jump_chain_guards() {
        let mut m = machine();
        assert!(!m.jump_idle());
        assert!(!m.jump_land());
        force(&mut m, &[Jump, JumpIdle]);
        assert!(m.idle());
        assert_eq!(m.current(), JumpLand);

        let mut m = machine();
        force(&mut m, &[Jump, JumpIdle, JumpLand]);
        assert_eq!(m.current(), JumpLand);
    }

    #[test]
    fn reset_from_anywhere_is_idle() {
        for path in [
            &[Walk][..],
            &[Run, Action4],
            &[Jump, JumpIdle],
            &[Fall],
            &[Action1],
        ] {
            let mut m = machine();
            force(&mut m, path);
            m.reset();
            assert_eq!(m.current(), Idle);
        }
    }

    #[test]
    fn same_slot_notifies_once() {
        let mut m = machine();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        m.subscribe(|s: &GameState| s.slot, move |_| *sink.borrow_mut() += 1);

        assert!(m.walk());
        assert!(!m.walk());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unmapped_slot_is_a_no_op() {
        let mut m = AnimationStateMachine::with_seed(AnimationSet::default(), 1);
        assert!(!m.request(Action2));
        assert_eq!(m.current(), Idle);
        assert!(matches!(
            m.animation_set().resolve(Action2),
            Err(ControllerError::AnimationClipNotFound(Action2))
        ));
    }

    #[test]
    fn action1_rolls_from_pool_each_time() {
        let mut m = machine();
        let pool = m.animation_set().action1_pool.clone();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            m.request(Action1);
            let clip = m.state().clip.clone().unwrap();
            assert!(pool.contains(&clip));
            seen.insert(clip);
            m.reset();
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn finished_clip_resets_and_stale_senders_are_ignored() {
        let mut m = machine();
        m.take_playback();

        m.jump();
        let playback = m.take_playback().unwrap();
        assert!(playback.one_shot);
        let stale = playback.finished.unwrap();

        m.fall();
        let fall = m.take_playback().unwrap();
        assert!(fall.finished.is_none());
        // The jump clip's receiver was dropped with the slot change.
        assert!(stale.send(()).is_err());
        assert!(!m.poll_finished());
        assert_eq!(m.current(), Fall);

        m.request(Jump);
        let tx = m.take_playback().unwrap().finished.unwrap();
        assert!(!m.poll_finished());
        tx.send(()).unwrap();
        assert!(m.poll_finished());
        assert_eq!(m.current(), Idle);
    }
}
