//! Agent weapons: fire request queueing, reload tracking and burst fire.
//!
//! A weapon accepts fire requests from two sides. The agent's
//! controller worker enqueues through a [`GunHandle`] from its own
//! thread; the player path enqueues on the scheduler thread. Requests
//! meet in a bounded channel and the world resolves at most the shots
//! a [`FireResolver`] releases each tick.
//!
//! Which side may enqueue at all is an access question decided by the
//! control handoff, not by the weapon itself: the world flips the
//! access flags whenever steering authority changes hands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Upper bound of queued fire requests per weapon.
pub const FIRE_QUEUE_SIZE: usize = 20;

/// Construction parameters of a weapon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    /// Base bullet speed in field units per tick, added to the
    /// shooter's forward velocity at fire time.
    pub bullet_speed: f64,
    /// Seconds between a shot and the next accepted request.
    pub reload_secs: f64,
    /// Whether a successful shot is amplified into a burst of three.
    pub burst: bool,
}

impl Default for WeaponSpec {
    fn default() -> Self {
        Self {
            bullet_speed: 12.0,
            reload_secs: 1.0,
            burst: false,
        }
    }
}

impl WeaponSpec {
    /// Spec with the standard parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base bullet speed.
    #[must_use]
    pub const fn with_bullet_speed(mut self, speed: f64) -> Self {
        self.bullet_speed = speed;
        self
    }

    /// Set the reload duration in seconds.
    #[must_use]
    pub const fn with_reload_secs(mut self, secs: f64) -> Self {
        self.reload_secs = secs;
        self
    }

    /// Enable burst fire.
    #[must_use]
    pub const fn with_burst(mut self) -> Self {
        self.burst = true;
        self
    }
}

struct FireRequest;

/// Reload state and request queue shared by all resolvers.
pub struct GunCore {
    bullet_speed: f64,
    reload_ticks: u32,
    reload_left: u32,
    fire_rx: Receiver<FireRequest>,
    reloading_flag: Arc<AtomicBool>,
}

impl GunCore {
    /// Whether the weapon is currently reloading.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.reload_left > 0
    }

    /// Dequeue one fire request if available.
    pub fn take_request(&mut self) -> bool {
        self.fire_rx.try_recv().is_ok()
    }

    /// Enter the reload period.
    pub fn begin_reload(&mut self) {
        self.reload_left = self.reload_ticks;
        self.reloading_flag
            .store(self.reload_left > 0, Ordering::Release);
    }

    /// Base bullet speed of this weapon.
    #[must_use]
    pub fn bullet_speed(&self) -> f64 {
        self.bullet_speed
    }

    fn tick_reload(&mut self) {
        if self.reload_left > 0 {
            self.reload_left -= 1;
            if self.reload_left == 0 {
                self.reloading_flag.store(false, Ordering::Release);
            }
        }
    }

    fn flush(&self) {
        while self.fire_rx.try_recv().is_ok() {}
    }
}

/// Decides whether a queued fire request becomes a shot this tick.
///
/// Returns the base bullet speed of a released shot. Implementations
/// may release shots without consuming a request, which is how burst
/// fire works.
pub trait FireResolver: Send {
    /// Resolve one tick of fire.
    fn resolve(&mut self, gun: &mut GunCore) -> Option<f64>;
}

/// Plain single-shot behavior: one request, one shot, then reload.
pub struct StandardFire;

impl FireResolver for StandardFire {
    fn resolve(&mut self, gun: &mut GunCore) -> Option<f64> {
        if gun.is_reloading() {
            return None;
        }
        if !gun.take_request() {
            return None;
        }
        gun.begin_reload();
        Some(gun.bullet_speed())
    }
}

/// Amplifies a successful shot into three consecutive shots.
///
/// The two follow-up shots are released on the next ticks while the
/// reload runs, free of charge: no request is consumed and the reload
/// is not restarted.
pub struct BurstFire<R> {
    inner: R,
    pending: u32,
}

impl<R> BurstFire<R> {
    /// Wrap an inner resolver with burst behavior.
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self { inner, pending: 0 }
    }
}

impl<R: FireResolver> FireResolver for BurstFire<R> {
    fn resolve(&mut self, gun: &mut GunCore) -> Option<f64> {
        if gun.is_reloading() {
            if self.pending > 0 {
                self.pending -= 1;
                return Some(gun.bullet_speed());
            }
            return None;
        }
        let shot = self.inner.resolve(gun)?;
        self.pending = 2;
        Some(shot)
    }
}

/// Worker-side view of a weapon.
///
/// Cheap to clone; lives inside the controller context so a movement
/// policy can query reload state and enqueue fire requests from its
/// own thread.
#[derive(Clone)]
pub struct GunHandle {
    fire_tx: Sender<FireRequest>,
    reloading: Arc<AtomicBool>,
    access: Arc<AtomicBool>,
}

impl GunHandle {
    /// Whether the weapon is reloading.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.reloading.load(Ordering::Acquire)
    }

    /// Whether fire requests are already queued.
    #[must_use]
    pub fn is_preparing(&self) -> bool {
        !self.fire_tx.is_empty()
    }

    /// Enqueue a fire request.
    ///
    /// Returns false when the controller currently has no gun access
    /// or the queue is full.
    pub fn request_fire(&self) -> bool {
        if !self.access.load(Ordering::Acquire) {
            return false;
        }
        self.fire_tx.try_send(FireRequest).is_ok()
    }
}

/// Scheduler-side weapon state.
pub struct Weapon {
    core: GunCore,
    resolver: Box<dyn FireResolver>,
    fire_tx: Sender<FireRequest>,
    ai_access: Arc<AtomicBool>,
    player_access: bool,
    enabled: bool,
}

impl Weapon {
    /// Build a weapon from its spec. `ticks_per_second` converts the
    /// reload duration into whole ticks.
    #[must_use]
    pub fn new(spec: WeaponSpec, ticks_per_second: u32) -> Self {
        let (fire_tx, fire_rx) = bounded(FIRE_QUEUE_SIZE);
        let resolver: Box<dyn FireResolver> = if spec.burst {
            Box::new(BurstFire::new(StandardFire))
        } else {
            Box::new(StandardFire)
        };
        Self {
            core: GunCore {
                bullet_speed: spec.bullet_speed,
                reload_ticks: (spec.reload_secs * f64::from(ticks_per_second)).round() as u32,
                reload_left: 0,
                fire_rx,
                reloading_flag: Arc::new(AtomicBool::new(false)),
            },
            resolver,
            fire_tx,
            ai_access: Arc::new(AtomicBool::new(false)),
            player_access: false,
            enabled: false,
        }
    }

    /// Create a worker-side handle for the controller thread.
    #[must_use]
    pub fn handle(&self) -> GunHandle {
        GunHandle {
            fire_tx: self.fire_tx.clone(),
            reloading: Arc::clone(&self.core.reloading_flag),
            access: Arc::clone(&self.ai_access),
        }
    }

    /// Advance the reload countdown by one tick.
    pub fn tick_reload(&mut self) {
        self.core.tick_reload();
    }

    /// Resolve this tick's fire. Returns the base bullet speed of a
    /// released shot.
    pub fn resolve_fire(&mut self) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        self.resolver.resolve(&mut self.core)
    }

    /// Enqueue a fire request on behalf of the player.
    ///
    /// Only accepted while the player has gun access and the weapon
    /// could fire immediately; buffering ahead would make the key feel
    /// unresponsive.
    pub fn request_fire_player(&mut self) -> bool {
        if !self.player_access {
            return false;
        }
        if self.is_preparing() || self.is_reloading() {
            return false;
        }
        self.fire_tx.try_send(FireRequest).is_ok()
    }

    /// Enqueue a fire request bypassing access checks. Used by
    /// scripted drivers and tests.
    pub fn enqueue_request(&self) -> bool {
        self.fire_tx.try_send(FireRequest).is_ok()
    }

    /// Whether fire requests are queued.
    #[must_use]
    pub fn is_preparing(&self) -> bool {
        !self.core.fire_rx.is_empty()
    }

    /// Whether the weapon is reloading.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.core.is_reloading()
    }

    /// Whether the weapon fires at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the weapon as a whole.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Grant or withdraw the controller worker's right to enqueue.
    /// Pending requests are flushed either way so no side inherits the
    /// other's queued shots.
    pub fn set_ai_access(&mut self, granted: bool) {
        if granted {
            self.core.flush();
            self.ai_access.store(true, Ordering::Release);
        } else {
            self.ai_access.store(false, Ordering::Release);
            self.core.flush();
        }
    }

    /// Grant or withdraw the player's right to enqueue.
    pub fn set_player_access(&mut self, granted: bool) {
        if granted {
            self.core.flush();
            self.player_access = true;
        } else {
            self.player_access = false;
            self.core.flush();
        }
    }

    /// Drop all queued fire requests.
    pub fn flush(&self) {
        self.core.flush();
    }
}
