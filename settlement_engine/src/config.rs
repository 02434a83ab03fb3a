use std::env;

use fgs_common::{parse_boolean_flag, CommissionRate, Secret};
use log::*;

const DEFAULT_FGS_DATABASE_URL: &str = "sqlite://data/fgs_store.db";
const DEFAULT_COMMISSION_PERCENT: f64 = 5.0;
const DEFAULT_HOLDING_PERIOD_DAYS: u32 = 7;

/// Engine configuration, assembled from `FGS_*` environment variables.
///
/// Invalid values are logged and replaced with the defaults rather than aborting startup — a
/// settlement engine with the default 5% rate beats one that will not boot.
#[derive(Clone, Debug)]
pub struct SettlementConfig {
    pub database_url: String,
    /// The platform commission applied to *new* payout requests. Changing this never touches
    /// payouts that already exist.
    pub commission_rate: CommissionRate,
    /// The default dispute window between a payout request and the earliest allowed
    /// disbursement.
    pub holding_period_days: u32,
    pub provider: ProviderConfig,
}

/// Connection details for the external disbursement provider.
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: Secret<String>,
    /// When true, instructions are routed to the provider's sandbox environment.
    pub sandbox: bool,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_FGS_DATABASE_URL.to_string(),
            commission_rate: CommissionRate::from_percent(DEFAULT_COMMISSION_PERCENT)
                .expect("default commission rate is valid"),
            holding_period_days: DEFAULT_HOLDING_PERIOD_DAYS,
            provider: ProviderConfig::default(),
        }
    }
}

impl SettlementConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("FGS_DATABASE_URL").unwrap_or_else(|_| {
            info!("🪛️ FGS_DATABASE_URL is not set. Using the default, {DEFAULT_FGS_DATABASE_URL}.");
            DEFAULT_FGS_DATABASE_URL.to_string()
        });
        let percent = env::var("FGS_COMMISSION_RATE")
            .map(|s| {
                s.parse::<f64>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid commission rate for FGS_COMMISSION_RATE. {e} Using the default, \
                         {DEFAULT_COMMISSION_PERCENT}%, instead."
                    );
                    DEFAULT_COMMISSION_PERCENT
                })
            })
            .unwrap_or(DEFAULT_COMMISSION_PERCENT);
        let commission_rate = CommissionRate::from_percent(percent).unwrap_or_else(|e| {
            error!("🪛️ {e}. Using the default, {DEFAULT_COMMISSION_PERCENT}%, instead.");
            CommissionRate::from_percent(DEFAULT_COMMISSION_PERCENT).expect("default commission rate is valid")
        });
        let holding_period_days = env::var("FGS_HOLDING_PERIOD_DAYS")
            .map(|s| {
                s.parse::<u32>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid holding period for FGS_HOLDING_PERIOD_DAYS. {e} Using the default, \
                         {DEFAULT_HOLDING_PERIOD_DAYS} days, instead."
                    );
                    DEFAULT_HOLDING_PERIOD_DAYS
                })
            })
            .unwrap_or(DEFAULT_HOLDING_PERIOD_DAYS);
        let provider = ProviderConfig {
            endpoint: env::var("FGS_PROVIDER_URL").unwrap_or_default(),
            api_key: Secret::new(env::var("FGS_PROVIDER_API_KEY").unwrap_or_default()),
            sandbox: parse_boolean_flag(env::var("FGS_PROVIDER_SANDBOX").ok(), false),
        };
        if provider.endpoint.is_empty() {
            warn!("🪛️ FGS_PROVIDER_URL is not set. Disbursement instructions cannot be delivered to a live provider.");
        }
        Self { database_url, commission_rate, holding_period_days, provider }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SettlementConfig::default();
        assert_eq!(config.database_url, DEFAULT_FGS_DATABASE_URL);
        assert_eq!(config.commission_rate.as_percent(), DEFAULT_COMMISSION_PERCENT);
        assert_eq!(config.holding_period_days, DEFAULT_HOLDING_PERIOD_DAYS);
        assert!(!config.provider.sandbox);
    }
}
