// src/traccar/t55.rs
//! T55 protocol over TCP
//!
//! Every fix gets its own connection: an identification frame, a short pause,
//! the raw RMC sentence, then the connection is held open until the server
//! closes it. The link is write-only; anything the server sends is logged.

use super::RetryPolicy;
use crate::config::TcpEndpoint;
use crate::distributor::FixReceiver;
use crate::error::{Result, TrackerError};
use crate::gps::Fix;
use socket2::{SockRef, TcpKeepalive};
use std::io;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::oneshot,
    time::{sleep, timeout},
};

pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(60);
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const FRAME_GAP: Duration = Duration::from_secs(1);

pub struct T55Client {
    endpoint: TcpEndpoint,
    retry: RetryPolicy,
    frame_gap: Duration,
    idle_timeout: Duration,
}

/// `$PGID,<id>*0F` device identification frame
pub fn identification_frame(client_id: &str) -> String {
    format!("$PGID,{}*0F\r\n", client_id)
}

pub fn position_frame(fix: &Fix) -> String {
    format!("{}\r\n", fix.raw_position)
}

impl T55Client {
    pub const NAME: &'static str = "t55";

    pub fn new(endpoint: TcpEndpoint, retry: RetryPolicy) -> Self {
        Self {
            endpoint,
            retry,
            frame_gap: FRAME_GAP,
            idle_timeout: IDLE_TIMEOUT,
        }
    }

    /// Override the pause between frames and the idle log interval
    pub fn with_timing(mut self, frame_gap: Duration, idle_timeout: Duration) -> Self {
        self.frame_gap = frame_gap;
        self.idle_timeout = idle_timeout;
        self
    }

    /// Send one fix and hold the session until the server closes it
    pub async fn deliver(&self, fix: &Fix) -> Result<()> {
        let identification = identification_frame(&self.endpoint.client_id);
        let position = position_frame(fix);
        log::debug!("$GPRMC to send is: {}", fix.raw_position);

        let (identification, position) = (identification.as_str(), position.as_str());
        let stream = self
            .retry
            .run("T55 session", move || self.open_session(identification, position))
            .await?;

        self.supervise(stream).await;
        Ok(())
    }

    pub async fn run(self, mut receiver: FixReceiver) {
        while let Some(fix) = receiver.recv().await {
            if let Err(e) = self.deliver(&fix).await {
                log::error!("Cannot establish connection with Traccar server (T55): {}", e);
                return;
            }
        }
    }

    async fn open_session(&self, identification: &str, position: &str) -> Result<TcpStream> {
        let mut stream = self.connect().await?;

        stream.write_all(identification.as_bytes()).await?;
        sleep(self.frame_gap).await;
        stream.write_all(position.as_bytes()).await?;
        log::info!("Sent position message to Traccar over protocol T55");

        Ok(stream)
    }

    async fn connect(&self) -> Result<TcpStream> {
        let address = format!("{}:{}", self.endpoint.host, self.endpoint.port);
        let stream = TcpStream::connect(&address).await.map_err(|e| {
            TrackerError::Connection(format!("Failed to connect to {}: {}", address, e))
        })?;
        configure_socket(&stream)?;

        log::debug!(
            "Traccar client {} connected to server {}",
            stream.local_addr()?,
            stream.peer_addr()?
        );
        Ok(stream)
    }

    /// Drain the inbound side on a separate task and wait for it to report
    /// that the server closed the connection.
    async fn supervise(&self, stream: TcpStream) {
        let (mut reader, writer) = stream.into_split();
        let (closed_tx, mut closed_rx) = oneshot::channel::<io::Result<()>>();

        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            let outcome = loop {
                match reader.read(&mut buf).await {
                    Ok(0) => break Ok(()),
                    Ok(n) => log::warn!("Unexpected data: {}", String::from_utf8_lossy(&buf[..n])),
                    Err(e) => break Err(e),
                }
            };
            let _ = closed_tx.send(outcome);
        });

        loop {
            match timeout(self.idle_timeout, &mut closed_rx).await {
                Ok(Ok(Ok(()))) => {
                    log::warn!("Connection to Traccar server was closed");
                    break;
                }
                Ok(Ok(Err(e))) => {
                    log::warn!("Traccar server connection dropped: {}", e);
                    break;
                }
                Ok(Err(_)) => break,
                Err(_) => log::debug!(
                    "Traccar server connection idle for {:?}, still alive",
                    self.idle_timeout
                ),
            }
        }

        drop(writer);
    }
}

/// Keep-alive on with a 60 s period, Nagle left on, no linger on close
fn configure_socket(stream: &TcpStream) -> Result<()> {
    stream.set_nodelay(false)?;

    let socket = SockRef::from(stream);
    socket.set_keepalive(true)?;
    socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(KEEPALIVE_PERIOD))?;
    socket.set_linger(Some(Duration::ZERO))?;
    Ok(())
}
