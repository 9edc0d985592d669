use std::{sync::OnceLock, time::Duration};

use reqwest::{Client, redirect};

/// Client for upstream media fetches
///
/// Follows redirects; reqwest drops `Authorization` when a redirect leaves
/// the original host.
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .redirect(redirect::Policy::limited(10))
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_nodelay(true)
                .build()
                .expect("Failed to build relay HTTP client")
        })
        .clone()
}
