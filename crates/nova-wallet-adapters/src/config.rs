#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    /// No deterministic fallback: a missing wallet runtime disables the provider.
    Production,
}

impl RuntimeProfile {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    /// JSON-RPC endpoint forwarding EIP-1193 calls to a wallet (native builds).
    pub eip1193_proxy_url: Option<String>,
    pub provider_timeout_ms: u64,
    pub balance_refresh_delay_ms: u64,
    pub event_poll_interval_ms: u64,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            provider_timeout_ms: 15_000,
            balance_refresh_delay_ms: 2_000,
            event_poll_interval_ms: 1_000,
        }
    }
}

impl WalletAdapterConfig {
    pub const ENV_PROFILE: &'static str = "NOVA_WALLET_PROFILE";
    pub const ENV_PROXY_URL: &'static str = "NOVA_WALLET_EIP1193_PROXY_URL";
    pub const ENV_PROVIDER_TIMEOUT_MS: &'static str = "NOVA_WALLET_PROVIDER_TIMEOUT_MS";
    pub const ENV_BALANCE_REFRESH_DELAY_MS: &'static str = "NOVA_WALLET_BALANCE_REFRESH_DELAY_MS";
    pub const ENV_EVENT_POLL_INTERVAL_MS: &'static str = "NOVA_WALLET_EVENT_POLL_INTERVAL_MS";

    /// Defaults overridden by `NOVA_WALLET_*` variables. Browsers have no
    /// environment: wasm builds get the defaults, with the production profile
    /// in release builds so a missing `window.ethereum` is reported instead
    /// of simulated.
    pub fn from_env() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            Self {
                runtime_profile: if cfg!(debug_assertions) {
                    RuntimeProfile::Development
                } else {
                    RuntimeProfile::Production
                },
                ..Self::default()
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::from_lookup(|key| std::env::var(key).ok())
        }
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, fallback: u64| {
            lookup(key)
                .and_then(|raw| match raw.trim().parse::<u64>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(key, value = %raw, error = %e, "ignoring invalid setting");
                        None
                    }
                })
                .unwrap_or(fallback)
        };

        Self {
            runtime_profile: lookup(Self::ENV_PROFILE)
                .and_then(|raw| RuntimeProfile::parse(&raw))
                .unwrap_or(defaults.runtime_profile),
            eip1193_proxy_url: lookup(Self::ENV_PROXY_URL)
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
            provider_timeout_ms: millis(Self::ENV_PROVIDER_TIMEOUT_MS, defaults.provider_timeout_ms),
            balance_refresh_delay_ms: millis(
                Self::ENV_BALANCE_REFRESH_DELAY_MS,
                defaults.balance_refresh_delay_ms,
            ),
            event_poll_interval_ms: millis(
                Self::ENV_EVENT_POLL_INTERVAL_MS,
                defaults.event_poll_interval_ms,
            ),
        }
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }
}
