use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Shared client for every Akool call
///
/// Deadlines are set per request, so the client itself only bounds
/// connection setup.
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .expect("Failed to build face-swap HTTP client")
        })
        .clone()
}
