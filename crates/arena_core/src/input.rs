//! Player key input: bindings, per-key latches, and the entwined-key
//! state machines that resolve opposite keys into one acceleration.
//!
//! Keys arrive as press/release events from the host and are latched
//! per key, so a tap shorter than one tick still registers for that
//! tick. Every tick each bound key feeds its latched state into the
//! pilot's per-key phase machine, then the accelerate/reverse and
//! left/right pairs are resolved through a fixed verdict table. The
//! table is what makes opposite keys behave: pressing reverse while
//! already accelerating overrides to reverse, and releasing one of
//! two held keys resumes the other without a dropped tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::messages::ActionCommand;

/// Linear acceleration applied while the accelerate key wins.
pub const ACCEL_RATE: f32 = 1.0;

/// Angular acceleration applied while a steering key wins.
pub const TURN_RATE: f32 = 1.0;

/// Turn rate written straight into `v_alpha` under invasive steering.
pub const INVASIVE_TURN_RATE: f64 = 10.0;

/// Host-toolkit-agnostic key code.
///
/// The engine never interprets codes; they only have to match between
/// the host's event feed and the control scheme. Letter keys use
/// their ASCII codes, navigation keys engine-private codes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Key(pub u32);

impl Key {
    pub const A: Self = Self(0x41);
    pub const D: Self = Self(0x44);
    pub const I: Self = Self(0x49);
    pub const J: Self = Self(0x4A);
    pub const K: Self = Self(0x4B);
    pub const L: Self = Self(0x4C);
    pub const M: Self = Self(0x4D);
    pub const P: Self = Self(0x50);
    pub const R: Self = Self(0x52);
    pub const S: Self = Self(0x53);
    pub const W: Self = Self(0x57);
    pub const PERIOD: Self = Self(0x2E);
    pub const SPACE: Self = Self(0x20);
    pub const RETURN: Self = Self(0x0D);
    pub const UP: Self = Self(0x1000);
    pub const DOWN: Self = Self(0x1001);
    pub const LEFT: Self = Self(0x1002);
    pub const RIGHT: Self = Self(0x1003);
    pub const END: Self = Self(0x1004);
}

/// A key press or release reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key the event is about.
    pub key: Key,
    /// `true` for press, `false` for release.
    pub pressed: bool,
}

/// Actions a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Accelerate forward.
    Accelerate,
    /// Accelerate backward.
    Reverse,
    /// Turn counter-clockwise.
    TurnLeft,
    /// Turn clockwise.
    TurnRight,
    /// Request a shot.
    Shoot,
    /// Hand control to the other side.
    ToggleAutopilot,
}

impl PlayerAction {
    /// Stateless actions fire once per press event instead of
    /// following the key's held state.
    #[must_use]
    pub const fn is_stateless(self) -> bool {
        matches!(self, Self::ToggleAutopilot)
    }
}

/// Key-to-action bindings for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlScheme {
    bindings: BTreeMap<Key, PlayerAction>,
}

impl ControlScheme {
    /// WASD movement, J to shoot, P to toggle the autopilot.
    #[must_use]
    pub fn wasd() -> Self {
        Self::default()
            .bind(Key::W, PlayerAction::Accelerate)
            .bind(Key::S, PlayerAction::Reverse)
            .bind(Key::A, PlayerAction::TurnLeft)
            .bind(Key::D, PlayerAction::TurnRight)
            .bind(Key::J, PlayerAction::Shoot)
            .bind(Key::P, PlayerAction::ToggleAutopilot)
    }

    /// WASD movement with space to shoot and R to toggle.
    #[must_use]
    pub fn player_one() -> Self {
        Self::default()
            .bind(Key::W, PlayerAction::Accelerate)
            .bind(Key::S, PlayerAction::Reverse)
            .bind(Key::A, PlayerAction::TurnLeft)
            .bind(Key::D, PlayerAction::TurnRight)
            .bind(Key::SPACE, PlayerAction::Shoot)
            .bind(Key::R, PlayerAction::ToggleAutopilot)
    }

    /// Arrow-key movement with return to shoot and end to toggle.
    #[must_use]
    pub fn player_two() -> Self {
        Self::default()
            .bind(Key::UP, PlayerAction::Accelerate)
            .bind(Key::DOWN, PlayerAction::Reverse)
            .bind(Key::LEFT, PlayerAction::TurnLeft)
            .bind(Key::RIGHT, PlayerAction::TurnRight)
            .bind(Key::RETURN, PlayerAction::Shoot)
            .bind(Key::END, PlayerAction::ToggleAutopilot)
    }

    /// IJKL movement with period to shoot and M to toggle.
    #[must_use]
    pub fn player_four() -> Self {
        Self::default()
            .bind(Key::I, PlayerAction::Accelerate)
            .bind(Key::K, PlayerAction::Reverse)
            .bind(Key::J, PlayerAction::TurnLeft)
            .bind(Key::L, PlayerAction::TurnRight)
            .bind(Key::PERIOD, PlayerAction::Shoot)
            .bind(Key::M, PlayerAction::ToggleAutopilot)
    }

    /// Bind a key, replacing any previous binding for it.
    #[must_use]
    pub fn bind(mut self, key: Key, action: PlayerAction) -> Self {
        self.bindings.insert(key, action);
        self
    }

    /// Action bound to a key, if any.
    #[must_use]
    pub fn action(&self, key: Key) -> Option<PlayerAction> {
        self.bindings.get(&key).copied()
    }

    /// All bindings in key order.
    pub fn bindings(&self) -> impl Iterator<Item = (Key, PlayerAction)> + '_ {
        self.bindings.iter().map(|(&k, &a)| (k, a))
    }
}

/// Press latch for one stateful key.
///
/// `was_pressed` stays set from a press until the next tick consumes
/// it, so a press-and-release between two ticks still counts as one
/// active tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyLatch {
    is_pressed: bool,
    was_pressed: bool,
}

impl KeyLatch {
    /// Record a press edge.
    pub fn press(&mut self) {
        self.is_pressed = true;
        self.was_pressed = true;
    }

    /// Record a release edge.
    pub fn release(&mut self) {
        self.is_pressed = false;
    }

    /// Effective state for this tick. Clears the tap latch.
    pub fn take_active(&mut self) -> bool {
        let active = self.is_pressed || self.was_pressed;
        self.was_pressed = false;
        active
    }
}

/// Per-key phase of the entwined-key machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPhase {
    /// Not held.
    #[default]
    Inactive,
    /// First active tick after a press.
    JustPushed,
    /// Held beyond its first tick.
    Active,
}

impl KeyPhase {
    /// Advance with this tick's latched key state.
    #[must_use]
    pub const fn advanced(self, active: bool) -> Self {
        match (self, active) {
            (Self::Inactive, true) => Self::JustPushed,
            (_, true) => Self::Active,
            (_, false) => Self::Inactive,
        }
    }
}

/// How an opposite-key pair resolves for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairVerdict {
    /// Neither key wins; the controlled value resets to zero.
    Clear,
    /// The pair's first key wins.
    First,
    /// The pair's second key wins.
    Second,
    /// Both keys held; whatever is applied stays applied.
    Keep,
}

/// Phase pair for two logically opposite keys.
///
/// The lone asymmetric cell is both keys freshly pushed on the same
/// tick: an accelerator pair lets the forward key win, a steering
/// pair cancels out.
#[derive(Debug, Clone, Copy)]
pub struct EntwinedPair {
    first: KeyPhase,
    second: KeyPhase,
    both_pushed: PairVerdict,
}

impl EntwinedPair {
    /// Pair for accelerate/reverse.
    #[must_use]
    pub const fn accelerator() -> Self {
        Self {
            first: KeyPhase::Inactive,
            second: KeyPhase::Inactive,
            both_pushed: PairVerdict::First,
        }
    }

    /// Pair for left/right.
    #[must_use]
    pub const fn steering() -> Self {
        Self {
            first: KeyPhase::Inactive,
            second: KeyPhase::Inactive,
            both_pushed: PairVerdict::Clear,
        }
    }

    /// Feed this tick's latched state of the pair's first key.
    pub fn advance_first(&mut self, active: bool) {
        self.first = self.first.advanced(active);
    }

    /// Feed this tick's latched state of the pair's second key.
    pub fn advance_second(&mut self, active: bool) {
        self.second = self.second.advanced(active);
    }

    /// Resolve the pair for this tick.
    #[must_use]
    pub const fn verdict(&self) -> PairVerdict {
        use KeyPhase::{Active as A, Inactive as I, JustPushed as J};
        match (self.first, self.second) {
            (I, I) => PairVerdict::Clear,
            (I, A | J) | (A, J) => PairVerdict::Second,
            (A | J, I) | (J, A) => PairVerdict::First,
            (A, A) => PairVerdict::Keep,
            (J, J) => self.both_pushed,
        }
    }
}

/// Player-side command state produced by `finish_tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotTick {
    /// Whether the shoot key was active this tick.
    pub fire: bool,
    /// Direct `v_alpha` write requested by invasive steering.
    pub invasive_turn: Option<f64>,
}

/// Key-driven command source for one agent.
///
/// The pilot keeps running even while the autopilot drives; its
/// published command is simply ignored until control comes back. Only
/// the world applies its output, gated by control authority.
#[derive(Debug, Clone)]
pub struct PlayerPilot {
    scheme: ControlScheme,
    accel: EntwinedPair,
    steer: EntwinedPair,
    a: f32,
    a_alpha: f32,
    fire_requested: bool,
    invasive: bool,
    turn_rate: f64,
    toggle_cooldown: u32,
    cooldown_left: u32,
}

impl PlayerPilot {
    /// Pilot with standard acceleration-based steering.
    #[must_use]
    pub fn new(scheme: ControlScheme, toggle_cooldown_ticks: u32) -> Self {
        Self {
            scheme,
            accel: EntwinedPair::accelerator(),
            steer: EntwinedPair::steering(),
            a: 0.0,
            a_alpha: 0.0,
            fire_requested: false,
            invasive: false,
            turn_rate: f64::from(TURN_RATE),
            toggle_cooldown: toggle_cooldown_ticks,
            cooldown_left: 0,
        }
    }

    /// Pilot that steers by writing `v_alpha` directly.
    #[must_use]
    pub fn invasive(scheme: ControlScheme, turn_rate: f64, toggle_cooldown_ticks: u32) -> Self {
        Self {
            invasive: true,
            turn_rate,
            ..Self::new(scheme, toggle_cooldown_ticks)
        }
    }

    /// The pilot's key bindings.
    #[must_use]
    pub const fn scheme(&self) -> &ControlScheme {
        &self.scheme
    }

    /// Feed one bound key's latched state for this tick.
    pub fn key_state(&mut self, action: PlayerAction, active: bool) {
        match action {
            PlayerAction::Accelerate => self.accel.advance_first(active),
            PlayerAction::Reverse => self.accel.advance_second(active),
            PlayerAction::TurnLeft => self.steer.advance_first(active),
            PlayerAction::TurnRight => self.steer.advance_second(active),
            PlayerAction::Shoot => {
                if active {
                    self.fire_requested = true;
                }
            }
            PlayerAction::ToggleAutopilot => {}
        }
    }

    /// Resolve both entwined pairs and hand back this tick's side
    /// effects. Call once per tick after all key states are fed.
    pub fn finish_tick(&mut self) -> PilotTick {
        match self.accel.verdict() {
            PairVerdict::Clear => self.a = 0.0,
            PairVerdict::First => self.a = ACCEL_RATE,
            PairVerdict::Second => self.a = -ACCEL_RATE,
            PairVerdict::Keep => {}
        }

        let mut invasive_turn = None;
        let turn = self.turn_rate;
        match self.steer.verdict() {
            PairVerdict::Clear => {
                if self.invasive {
                    invasive_turn = Some(0.0);
                } else {
                    self.a_alpha = 0.0;
                }
            }
            PairVerdict::First => {
                if self.invasive {
                    invasive_turn = Some(-turn);
                } else {
                    self.a_alpha = -(turn as f32);
                }
            }
            PairVerdict::Second => {
                if self.invasive {
                    invasive_turn = Some(turn);
                } else {
                    self.a_alpha = turn as f32;
                }
            }
            PairVerdict::Keep => {}
        }

        PilotTick {
            fire: std::mem::take(&mut self.fire_requested),
            invasive_turn,
        }
    }

    /// The command the pilot currently publishes.
    #[must_use]
    pub const fn command(&self) -> ActionCommand {
        ActionCommand::new(self.a, self.a_alpha)
    }

    /// Consume the toggle cooldown. Returns whether the toggle may
    /// proceed. The cooldown restarts on every accepted attempt, even
    /// when the toggle itself ends up ignored.
    pub fn try_toggle(&mut self) -> bool {
        if self.cooldown_left > 0 {
            return false;
        }
        self.cooldown_left = self.toggle_cooldown;
        true
    }

    /// Count the toggle cooldown down by one tick.
    pub fn tick_cooldown(&mut self) {
        self.cooldown_left = self.cooldown_left.saturating_sub(1);
    }
}
