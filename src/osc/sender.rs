use rosc::{encoder, OscMessage, OscPacket, OscType};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::EngineError;

use super::FRAME_ADDRESS;

/// Outbound frame publisher: packs each rendered frame into a single OSC
/// blob message and fans it out to every configured destination.
pub struct OscSender {
    socket: UdpSocket,
    destinations: Vec<String>,
    frames: mpsc::Receiver<Vec<u8>>,
}

impl OscSender {
    pub async fn bind(
        destinations: Vec<String>,
        frames: mpsc::Receiver<Vec<u8>>,
    ) -> Result<Self, EngineError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        info!(?destinations, "OSC sender ready");
        Ok(Self {
            socket,
            destinations,
            frames,
        })
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                frame = self.frames.recv() => {
                    let Some(bytes) = frame else {
                        break;
                    };
                    if let Err(e) = self.publish(bytes).await {
                        warn!(error = %e, "frame publish failed");
                    }
                }
            }
        }
        info!("OSC sender stopped");
    }

    async fn publish(&self, bytes: Vec<u8>) -> Result<(), EngineError> {
        let packet = OscPacket::Message(OscMessage {
            addr: FRAME_ADDRESS.to_owned(),
            args: vec![OscType::Blob(bytes)],
        });
        let encoded = encoder::encode(&packet).map_err(|e| EngineError::Transport {
            message: format!("OSC encode failed: {e:?}"),
        })?;

        for dest in &self.destinations {
            if let Err(e) = self.socket.send_to(&encoded, dest).await {
                // One unreachable destination must not starve the others.
                debug!(%dest, error = %e, "send failed");
            }
        }
        Ok(())
    }
}
