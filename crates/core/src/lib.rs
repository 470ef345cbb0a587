pub mod domain;
pub mod pipeline;
pub mod remote;
pub mod store;

pub mod config {
    use anyhow::Context;

    const DEFAULT_SIMULATION_API_BASE_URL: &str = "http://localhost:5000";
    const DEFAULT_SIMULATE_TIMEOUT_SECS: u64 = 120;
    const DEFAULT_TICKERINFO_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub simulation_api_base_url: String,
        pub simulate_timeout_secs: u64,
        pub tickerinfo_timeout_secs: u64,
        pub sentry_dsn: Option<String>,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let simulation_api_base_url = std::env::var("SIMULATION_API_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SIMULATION_API_BASE_URL.to_string());

            Ok(Self {
                simulation_api_base_url,
                simulate_timeout_secs: env_parse("SIMULATION_API_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_SIMULATE_TIMEOUT_SECS),
                tickerinfo_timeout_secs: env_parse("TICKERINFO_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_TICKERINFO_TIMEOUT_SECS),
                sentry_dsn: std::env::var("SENTRY_DSN").ok().filter(|s| !s.is_empty()),
                port: env_parse("PORT")?,
            })
        }

        pub fn port_or_default(&self) -> u16 {
            self.port.unwrap_or(3000)
        }
    }

    fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => {
                let v = s
                    .trim()
                    .parse::<T>()
                    .with_context(|| format!("{key} is not a valid value: {s}"))?;
                Ok(Some(v))
            }
            _ => Ok(None),
        }
    }
}
