// THEORY:
// The bin actor is the one place a `BinDashboard` lives once the dashboard is
// served. It is a single tokio task that owns the dashboard and handles control
// messages one at a time, so two drops can never interleave on the same bin.
//
// The core has no notion of time. This is where frames get paced: each frame of a
// drop is encoded, published on the `FrameBus`, then the actor sleeps for
// `frame_delay` before pulling the next one.

use crate::{ActorConfig, FrameBus, FramePacket, Meta, RESET_NOTICE};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use trashlink::{BinDashboard, ControlEvent, Frame, StatusReport, WasteKind, encode};

const CONTROL_QUEUE_DEPTH: usize = 16;

/// Message type for the bin actor.
enum ControlMessage {
    Event(ControlEvent, oneshot::Sender<StatusReport>),
    Status(oneshot::Sender<StatusReport>),
    Shutdown,
}

/// Cheap, cloneable handle to a running bin actor.
#[derive(Clone)]
pub struct BinHandle {
    tx: mpsc::Sender<ControlMessage>,
}

impl BinHandle {
    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<StatusReport>) -> ControlMessage,
    ) -> anyhow::Result<StatusReport> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| anyhow::anyhow!("bin actor has stopped"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("bin actor dropped the request"))
    }

    /// Plays a full drop and resolves once the new level is committed.
    pub async fn drop_waste(&self, kind: WasteKind) -> anyhow::Result<StatusReport> {
        self.send_event(ControlEvent::Drop(kind)).await
    }

    pub async fn reset(&self) -> anyhow::Result<StatusReport> {
        self.send_event(ControlEvent::Reset).await
    }

    pub async fn send_event(&self, event: ControlEvent) -> anyhow::Result<StatusReport> {
        self.request(|reply| ControlMessage::Event(event, reply)).await
    }

    pub async fn status(&self) -> anyhow::Result<StatusReport> {
        self.request(ControlMessage::Status).await
    }

    /// Asks the actor to stop after the message it is currently handling.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(ControlMessage::Shutdown).await;
    }
}

struct BinActor {
    dashboard: BinDashboard,
    bus: FrameBus,
    config: ActorConfig,
    next_seq: u64,
}

/// Spawns the actor owning `dashboard`. It publishes the current bin once on start.
pub fn spawn_bin_actor(
    dashboard: BinDashboard,
    bus: FrameBus,
    config: ActorConfig,
) -> (BinHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CONTROL_QUEUE_DEPTH);
    let actor = BinActor {
        dashboard,
        bus,
        config,
        next_seq: 0,
    };
    let task = tokio::spawn(actor.run(rx));
    (BinHandle { tx }, task)
}

impl BinActor {
    async fn run(mut self, mut rx: mpsc::Receiver<ControlMessage>) {
        info!("bin actor started with {:?}", self.dashboard.state());
        let snapshot = self.dashboard.snapshot();
        self.publish_frame(&snapshot);
        self.publish_meta(Meta::from_status(&self.dashboard.status(), false));

        while let Some(msg) = rx.recv().await {
            match msg {
                ControlMessage::Event(event, reply) => {
                    let status = self.handle(event).await;
                    let _ = reply.send(status);
                }
                ControlMessage::Status(reply) => {
                    let _ = reply.send(self.dashboard.status());
                }
                ControlMessage::Shutdown => break,
            }
        }
        info!("bin actor stopped");
    }

    async fn handle(&mut self, event: ControlEvent) -> StatusReport {
        debug!("control event: {event}");
        let notice = match event {
            ControlEvent::Drop(kind) => {
                self.publish_meta(Meta::from_status(&self.dashboard.status(), true));
                self.play_drop(kind).await;
                None
            }
            ControlEvent::Reset => {
                self.dashboard.reset();
                Some(RESET_NOTICE)
            }
        };
        let snapshot = self.dashboard.snapshot();
        self.publish_frame(&snapshot);
        let status = self.dashboard.status();
        let meta = Meta::from_status(&status, false);
        self.publish_meta(match notice {
            Some(notice) => meta.with_notice(notice),
            None => meta,
        });
        status
    }

    async fn play_drop(&mut self, kind: WasteKind) {
        let delay = self.config.frame_delay;
        let bus = self.bus.clone();
        let config = self.config.clone();
        let mut seq = self.next_seq;

        let mut sequence = self.dashboard.begin_drop(kind);
        while let Some(frame) = sequence.next() {
            if let Some(packet) = packetize(&frame, seq, &config) {
                bus.publish_frame(packet);
            }
            seq += 1;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        self.next_seq = seq;
    }

    fn publish_frame(&mut self, frame: &Frame) {
        if let Some(packet) = packetize(frame, self.next_seq, &self.config) {
            self.bus.publish_frame(packet);
        }
        self.next_seq += 1;
    }

    fn publish_meta(&self, meta: Meta) {
        let _ = self.bus.meta_tx.send(meta);
    }
}

/// Encodes a frame for the bus. Encoding failures drop the frame.
fn packetize(frame: &Frame, seq: u64, config: &ActorConfig) -> Option<FramePacket> {
    match encode(frame, config.format, config.jpeg_quality) {
        Ok(bytes) => Some(FramePacket {
            seq,
            width: frame.width(),
            height: frame.height(),
            format: config.format,
            data: Arc::from(bytes),
        }),
        Err(e) => {
            warn!("dropping frame {seq}: {e}");
            None
        }
    }
}
