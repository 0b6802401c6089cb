// src/traccar/mod.rs
//! Forwarders for the Traccar tracking server
//!
//! Each adapter owns one [`FixReceiver`](crate::distributor::FixReceiver) and
//! loops until its transport fails for good: receive a fix, translate it to
//! the protocol, transmit it.

pub mod http;
pub mod opengts;
pub mod osmand;
pub mod retry;
pub mod t55;

pub use opengts::OpenGtsClient;
pub use osmand::OsmAndClient;
pub use retry::RetryPolicy;
pub use t55::T55Client;

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stand-ins for the Traccar endpoints

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::mpsc,
    };

    /// Minimal HTTP server answering every request with `status` and `body`.
    /// Each request line (`GET /?... HTTP/1.1`) is forwarded on the channel.
    pub async fn spawn_http_stub(
        status: &'static str,
        body: &'static str,
    ) -> (u16, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        let n = socket.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        head.extend_from_slice(&chunk[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let head = String::from_utf8_lossy(&head).to_string();
                    let _ = tx.send(head.lines().next().unwrap_or_default().to_string());

                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (port, rx)
    }

    /// A port nothing is listening on
    pub async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Client that ignores proxy settings from the environment
    pub fn direct_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }
}
