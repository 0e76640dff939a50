//! Controller workers: one mailbox-fed thread per autopiloted agent.
//!
//! The world pushes sensor messages into the mailbox and reads the
//! latest command from the shared [`CommandSlot`]; the worker drains
//! the mailbox in arrival order and runs the agent's policy. The two
//! sides never wait for each other, so a stalled policy slows down
//! nothing but its own agent.
//!
//! When a worker falls behind, its mailbox backlog grows. Workers
//! spawned with auto-resync drain the backlog in batches and skip
//! positional messages two or more ticks older than the newest message
//! in the batch. Alert broadcasts are never skipped.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::agent::{AgentBody, AgentId};
use crate::error::{ArenaError, Result};
use crate::messages::{ActionCommand, CommandSlot, SensorMessage};
use crate::policy::{MovementPolicy, PolicyCtx};
use crate::weapon::GunHandle;

/// Backlog age, in ticks, at which auto-resync drops a positional
/// message.
const RESYNC_LAG_TICKS: u64 = 2;

enum Inbound {
    Sensor(SensorMessage),
    Reset,
}

/// Scheduler-side handle of a controller worker.
///
/// Dropping the handle closes the mailbox and joins the worker.
pub struct ControllerHandle {
    tx: Option<Sender<Inbound>>,
    flush_rx: Receiver<Inbound>,
    slot: Arc<CommandSlot>,
    thread: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Spawn a worker thread running `policy` for the given agent.
    pub fn spawn(
        agent: AgentId,
        policy: Box<dyn MovementPolicy>,
        body: AgentBody,
        gun: Option<GunHandle>,
        auto_resync: bool,
    ) -> Result<Self> {
        let (tx, rx) = unbounded();
        let flush_rx = rx.clone();
        let slot = Arc::new(CommandSlot::new());
        let worker_slot = Arc::clone(&slot);
        let ctx = PolicyCtx::new(body, gun);

        let thread = std::thread::Builder::new()
            .name(format!("agent-{agent}-controller"))
            .spawn(move || worker_loop(agent, &rx, &worker_slot, policy, ctx, auto_resync))
            .map_err(|e| ArenaError::ControllerSpawn {
                agent,
                message: e.to_string(),
            })?;

        Ok(Self {
            tx: Some(tx),
            flush_rx,
            slot,
            thread: Some(thread),
        })
    }

    /// Enqueue a sensor message. Never blocks.
    pub fn send(&self, msg: SensorMessage) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Inbound::Sensor(msg));
        }
    }

    /// Latest command published by the worker.
    #[must_use]
    pub fn command(&self) -> ActionCommand {
        self.slot.load()
    }

    /// Drop everything queued in the mailbox.
    pub fn flush(&self) {
        while self.flush_rx.try_recv().is_ok() {}
    }

    /// Flush the mailbox, zero the published command and tell the
    /// worker to forget its issued command and destination.
    pub fn reset(&self) {
        self.flush();
        if let Some(tx) = &self.tx {
            let _ = tx.send(Inbound::Reset);
        }
        self.slot.clear();
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        // Disconnect the mailbox so the worker's recv returns.
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop(
    agent: AgentId,
    rx: &Receiver<Inbound>,
    slot: &CommandSlot,
    mut policy: Box<dyn MovementPolicy>,
    mut ctx: PolicyCtx,
    auto_resync: bool,
) {
    loop {
        let first = match rx.recv() {
            Ok(msg) => msg,
            Err(_) => break,
        };
        let mut batch = vec![first];
        while let Ok(more) = rx.try_recv() {
            batch.push(more);
        }

        let horizon = batch
            .iter()
            .filter_map(|m| match m {
                Inbound::Sensor(s) => Some(s.tick()),
                Inbound::Reset => None,
            })
            .max()
            .unwrap_or(0);

        for item in batch {
            match item {
                Inbound::Reset => {
                    ctx.reset();
                    slot.clear();
                }
                Inbound::Sensor(msg) => {
                    if auto_resync && !msg.is_alert() && msg.tick() + RESYNC_LAG_TICKS <= horizon {
                        continue;
                    }
                    let cmd = match &msg {
                        SensorMessage::Position { reading, .. } => {
                            policy.position(reading, &mut ctx)
                        }
                        SensorMessage::Vision { reading, .. } => policy.vision(reading, &mut ctx),
                        SensorMessage::Alert { reading, .. } => policy.alert(reading, &mut ctx),
                    };
                    ctx.set_previous(cmd);
                    slot.store(cmd);
                    if msg.is_alert() {
                        ctx.memorize(msg);
                    }
                }
            }
        }
    }
    tracing::debug!(agent, "controller worker stopped");
}
