use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;

const PING_INTERVAL: Duration = Duration::from_secs(14 * 60);

/// URL to ping, if the keep-alive job should run at all.
pub fn target(config: &Config) -> Option<String> {
    if !config.environment.is_production() {
        return None;
    }
    config.keepalive_url.clone()
}

/// Ping `url` every 14 minutes for the life of the process.
pub fn spawn(client: reqwest::Client, url: String) -> JoinHandle<()> {
    info!(%url, interval_secs = PING_INTERVAL.as_secs(), "keep-alive enabled");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PING_INTERVAL);
        // The first tick completes immediately; the server is warm at startup.
        interval.tick().await;
        loop {
            interval.tick().await;
            ping(&client, &url).await;
        }
    })
}

/// One GET against `url`. Returns whether it answered with a 2xx.
pub async fn ping(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            info!(status = resp.status().as_u16(), "keep-alive ping ok");
            true
        }
        Ok(resp) => {
            warn!(status = resp.status().as_u16(), "keep-alive ping failed");
            false
        }
        Err(e) => {
            warn!(error = %e, "keep-alive ping failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{Router, routing::get};

    use crate::upstream::http_client;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_target_requires_production_and_url() {
        let url = "https://sous.example/api/health";

        let prod = config_from(&[
            ("DATABASE_URL", "sous.db"),
            ("APP_ENV", "production"),
            ("API_URL", url),
        ]);
        assert_eq!(target(&prod).as_deref(), Some(url));

        let dev = config_from(&[("DATABASE_URL", "sous.db"), ("API_URL", url)]);
        assert!(target(&dev).is_none());

        let no_url = config_from(&[("DATABASE_URL", "sous.db"), ("APP_ENV", "production")]);
        assert!(target(&no_url).is_none());
    }

    #[tokio::test]
    async fn test_ping_local_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/health", get(|| async { "ok" }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = http_client().unwrap();
        assert!(ping(&client, &format!("http://{addr}/api/health")).await);
        assert!(!ping(&client, &format!("http://{addr}/missing")).await);
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = http_client().unwrap();
        assert!(!ping(&client, &format!("http://{addr}/api/health")).await);
    }
}
