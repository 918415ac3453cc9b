use std::sync::Arc;

use rosc::OscPacket;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::{CommandQueue, PushOutcome};
use crate::error::EngineError;

/// Inbound OSC actor: receives UDP datagrams, validates each message, and
/// pushes the resulting commands onto the shared queue. Never blocks on the
/// render loop; backpressure is absorbed by the queue's coalescing policy.
pub struct OscReceiver {
    socket: UdpSocket,
    queue: Arc<CommandQueue>,
    strip_len: u32,
}

impl OscReceiver {
    pub async fn bind(
        addr: &str,
        queue: Arc<CommandQueue>,
        strip_len: u32,
    ) -> Result<Self, EngineError> {
        let socket = UdpSocket::bind(addr).await?;
        info!(addr, "OSC receiver listening");
        Ok(Self {
            socket,
            queue,
            strip_len,
        })
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0_u8; rosc::decoder::MTU];
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                received = self.socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, peer)) => {
                            let Some(datagram) = buf.get(..len) else {
                                continue;
                            };
                            match rosc::decoder::decode_udp(datagram) {
                                Ok((_, packet)) => self.handle_packet(packet),
                                Err(e) => {
                                    warn!(%peer, error = %e, "undecodable OSC datagram");
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "OSC socket receive failed");
                        }
                    }
                }
            }
        }
        info!("OSC receiver stopped");
    }

    fn handle_packet(&self, packet: OscPacket) {
        match packet {
            OscPacket::Message(msg) => {
                let addr = msg.addr.clone();
                match super::translate(&msg, self.strip_len) {
                    Ok(command) => match self.queue.push(command) {
                        PushOutcome::Queued => {}
                        PushOutcome::CoalescedSameKind(kind) => {
                            debug!(%addr, coalesced = ?kind, "command queue full, coalesced");
                        }
                        PushOutcome::DroppedOldest(kind) => {
                            warn!(%addr, dropped = ?kind, "command queue full, dropped oldest");
                        }
                    },
                    Err(e) => {
                        warn!(%addr, error = %e, "rejected OSC message");
                    }
                }
            }
            OscPacket::Bundle(bundle) => {
                for inner in bundle.content {
                    self.handle_packet(inner);
                }
            }
        }
    }
}
