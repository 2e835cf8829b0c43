use std::time::Duration;

/// Tunables of a [`crate::FetchService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Simulated time the fetch worker blocks for.
    pub latency: Duration,
    /// Upper bound on the fetch; `None` waits for the full latency.
    pub timeout: Option<Duration>,
    /// Name of the worker unit performing the fetch.
    pub fetch_worker: String,
    /// Name of the worker unit delivering the completion.
    pub completion_worker: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            latency: Duration::from_millis(300),
            timeout: None,
            fetch_worker: "work".to_string(),
            completion_worker: "ui".to_string(),
        }
    }
}

impl Config {
    pub fn with_latency(mut self, latency: Duration) -> Config {
        self.latency = latency;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Config {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_worker_names(mut self, fetch: &str, completion: &str) -> Config {
        self.fetch_worker = fetch.to_string();
        self.completion_worker = completion.to_string();
        self
    }

    /// When a fetch gives up, if the timeout is shorter than the latency.
    pub fn cutoff(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| self.latency > *timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let config = Config::default();

        assert_eq!(config.latency, Duration::from_millis(300));
        assert_eq!(config.timeout, None);
        assert_eq!(config.fetch_worker, "work");
        assert_eq!(config.completion_worker, "ui");
    }

    #[test]
    fn cuts_off_only_when_latency_exceeds_timeout() {
        let config = Config::default().with_latency(Duration::from_millis(50));

        assert_eq!(config.cutoff(), None);
        assert_eq!(config.clone().with_timeout(Duration::from_millis(50)).cutoff(), None);
        assert_eq!(
            config.with_timeout(Duration::from_millis(10)).cutoff(),
            Some(Duration::from_millis(10))
        );
    }
}
