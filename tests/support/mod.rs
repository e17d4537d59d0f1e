use std::{net::SocketAddr, sync::OnceLock, sync::mpsc, time::Duration};

static HOST_URL: OnceLock<String> = OnceLock::new();

/// Starts one arena host for the whole test binary and returns its `ws://` url.
///
/// The host runs on its own thread and runtime so it outlives each `#[tokio::test]`.
/// The listener is bound before the address is sent back, so callers can connect at once.
pub fn ensure_server() -> &'static str {
    HOST_URL.get_or_init(|| {
        let (tx, rx) = mpsc::channel::<SocketAddr>();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("host runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind loopback");
                tx.send(listener.local_addr().expect("bound address"))
                    .expect("test thread waiting for the address");
                arena_host::run(listener).await.expect("host stopped");
            });
        });
        let addr = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("host bound a listener in time");
        format!("ws://{addr}")
    })
}
