//! Async driver for a [`PlaybackMachine`].
//!
//! One tokio task owns the machine and processes user commands, expired
//! preview tickets and entitlement-change notifications strictly one at a
//! time. After every input the current [`PlaybackSnapshot`] is published on
//! a `watch` channel for presentation layers.

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;
use vaultplay_model::{
    ContentDescriptor, MediaEvent, PlanId, PlaybackSnapshot, PurchaseReceipt,
};

use super::machine::PlaybackMachine;
use super::timer::PreviewTicket;
use crate::error::{GateError, Result};

const COMMAND_BUFFER: usize = 64;

/// Inputs accepted by a running session.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Open(ContentDescriptor),
    Play,
    Pause,
    Toggle,
    Seek(f64),
    Skip(f64),
    Media(MediaEvent),
    SelectPlan(PlanId),
    BackToPlans,
    Purchase(PurchaseReceipt),
    DismissGate,
    Close,
}

#[derive(Debug)]
struct Envelope {
    command: SessionCommand,
    reply: oneshot::Sender<Result<()>>,
}

/// Cloneable handle to a running [`PlaybackSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
}

impl SessionHandle {
    /// Send a command and wait for the machine to process it.
    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| GateError::SessionClosed)?;
        rx.await.map_err(|_| GateError::SessionClosed)?
    }

    pub async fn open(&self, descriptor: ContentDescriptor) -> Result<()> {
        self.send(SessionCommand::Open(descriptor)).await
    }

    pub async fn play(&self) -> Result<()> {
        self.send(SessionCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn media_event(&self, event: MediaEvent) -> Result<()> {
        self.send(SessionCommand::Media(event)).await
    }

    pub async fn purchase(&self, receipt: PurchaseReceipt) -> Result<()> {
        self.send(SessionCommand::Purchase(receipt)).await
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }
}

#[derive(Debug)]
pub struct PlaybackSession {
    machine: PlaybackMachine,
    commands: mpsc::Receiver<Envelope>,
    fired: mpsc::UnboundedReceiver<PreviewTicket>,
    entitlement_changes: watch::Receiver<u64>,
    snapshots: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackSession {
    /// Spawn the driver task. `fired` is the ticket channel of the
    /// scheduler the machine was built with.
    ///
    /// The task ends once every handle is dropped and hands the machine
    /// back through the join handle.
    pub fn spawn(
        machine: PlaybackMachine,
        fired: mpsc::UnboundedReceiver<PreviewTicket>,
    ) -> (SessionHandle, JoinHandle<PlaybackMachine>) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, snapshots_rx) = watch::channel(machine.snapshot());
        let entitlement_changes = machine.entitlements().subscribe();

        let session = Self {
            machine,
            commands,
            fired,
            entitlement_changes,
            snapshots,
        };
        let span = info_span!("playback_session", id = %Uuid::now_v7());
        let task = tokio::spawn(session.run().instrument(span));

        (
            SessionHandle {
                commands: commands_tx,
                snapshots: snapshots_rx,
            },
            task,
        )
    }

    async fn run(mut self) -> PlaybackMachine {
        debug!("session started");
        loop {
            tokio::select! {
                envelope = self.commands.recv() => {
                    let Some(Envelope { command, reply }) = envelope else {
                        break;
                    };
                    let result = self.dispatch(command);
                    if let Err(err) = &result {
                        debug!(error = %err, "command failed");
                    }
                    self.publish();
                    // Caller may have stopped waiting.
                    let _ = reply.send(result);
                }
                Some(ticket) = self.fired.recv() => {
                    self.machine.on_preview_timer_fired(ticket);
                    self.publish();
                }
                Ok(()) = self.entitlement_changes.changed() => {
                    self.machine.on_entitlement_changed();
                    self.publish();
                }
            }
        }
        self.machine.close();
        debug!("session ended");
        self.machine
    }

    fn dispatch(&mut self, command: SessionCommand) -> Result<()> {
        let machine = &mut self.machine;
        match command {
            SessionCommand::Open(descriptor) => {
                machine.open(descriptor);
            }
            SessionCommand::Play => {
                machine.play()?;
            }
            SessionCommand::Pause => machine.pause()?,
            SessionCommand::Toggle => {
                machine.toggle()?;
            }
            SessionCommand::Seek(offset) => {
                machine.seek(offset)?;
            }
            SessionCommand::Skip(delta) => {
                machine.skip(delta)?;
            }
            SessionCommand::Media(event) => machine.handle_media_event(event)?,
            SessionCommand::SelectPlan(plan_id) => machine.select_plan(&plan_id)?,
            SessionCommand::BackToPlans => machine.back_to_plans(),
            SessionCommand::Purchase(receipt) => {
                machine.on_purchase_succeeded(&receipt)?;
            }
            SessionCommand::DismissGate => machine.dismiss_gate(),
            SessionCommand::Close => machine.close(),
        }
        Ok(())
    }

    fn publish(&self) {
        let snapshot = self.machine.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
