//! Environment loading and service wiring.

use std::sync::Arc;

use kd_core::domain::entities::QuestionBank;
use kd_core::services::{
    AuthService, Clock, CompatibilityScorer, MatchingOrchestrator, OrchestratorConfig,
    PasswordVerifier, QuotaConfig, QuotaTracker, TokenService, TokenServiceConfig,
};
use kd_shared::{telemetry::init_tracing, AppConfig};

use crate::memory::MemoryStore;
use crate::security::BcryptPasswordVerifier;
use crate::InfrastructureError;

/// Load configuration from `.env` files and the process environment
///
/// The environment-specific file (`.env.development`, `.env.production`, ...)
/// is tried first, then a plain `.env`. Variables already set in the process
/// win over both.
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    let environment = kd_shared::Environment::from_env();
    if dotenvy::from_filename(environment.env_file()).is_err() {
        dotenvy::dotenv().ok();
    }

    let config = AppConfig::from_env();
    check_jwt_secret(&config)?;
    Ok(config)
}

/// Refuse the built-in or a blank JWT secret outside development and staging
fn check_jwt_secret(config: &AppConfig) -> Result<(), InfrastructureError> {
    if !config.jwt.is_using_default_secret() {
        return Ok(());
    }
    if config.environment.is_production() {
        return Err(InfrastructureError::Config(
            "JWT_SECRET must be set in production".to_string(),
        ));
    }
    tracing::warn!(environment = %config.environment, "Using the default JWT secret");
    Ok(())
}

/// Install the tracing subscriber described by `config.logging`
pub fn init_logging(config: &AppConfig) {
    init_tracing(&config.logging);
}

/// Every core service wired over a single in-process store
pub struct MemoryServices<P: PasswordVerifier = BcryptPasswordVerifier> {
    pub store: Arc<MemoryStore>,
    pub tokens: Arc<TokenService<MemoryStore>>,
    pub quota: Arc<QuotaTracker<MemoryStore>>,
    pub auth: AuthService<MemoryStore, MemoryStore, P>,
    pub matching: MatchingOrchestrator<MemoryStore, MemoryStore, MemoryStore, MemoryStore>,
}

impl MemoryServices<BcryptPasswordVerifier> {
    /// Wire the services with bcrypt password verification
    pub fn build(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        bank: Arc<QuestionBank>,
    ) -> Result<Self, InfrastructureError> {
        Self::with_verifier(config, clock, bank, BcryptPasswordVerifier::new())
    }
}

impl<P: PasswordVerifier> MemoryServices<P> {
    /// Wire the services with a caller-supplied password verifier
    ///
    /// # Arguments
    ///
    /// * `config` - Token and matching settings
    /// * `clock` - Time source shared by every service
    /// * `bank` - Question bank used for scoring
    /// * `verifier` - Password hash checker used at login
    pub fn with_verifier(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        bank: Arc<QuestionBank>,
        verifier: P,
    ) -> Result<Self, InfrastructureError> {
        let store = Arc::new(MemoryStore::new().with_question_bank(bank.clone()));

        let token_config = TokenServiceConfig::try_from(&config.jwt)?;
        let tokens = Arc::new(TokenService::new(store.clone(), clock.clone(), token_config)?);

        let quota_config = QuotaConfig::try_from(&config.matching)?;
        let quota = Arc::new(QuotaTracker::new(store.clone(), clock, quota_config));

        let auth = AuthService::new(tokens.clone(), store.clone(), Arc::new(verifier));
        let matching = MatchingOrchestrator::new(
            tokens.clone(),
            quota.clone(),
            store.clone(),
            store.clone(),
            CompatibilityScorer::new(bank),
            OrchestratorConfig::from(&config.matching),
        );

        tracing::info!(
            free_daily_limit = config.matching.free_daily_limit,
            premium_daily_limit = config.matching.premium_daily_limit,
            "In-memory services ready"
        );

        Ok(Self {
            store,
            tokens,
            quota,
            auth,
            matching,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kd_core::services::ManualClock;

    #[test]
    fn test_build_with_development_config() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()));
        let services = MemoryServices::with_verifier(
            &AppConfig::development(),
            clock,
            Arc::new(QuestionBank::default()),
            BcryptPasswordVerifier::with_cost(4),
        )
        .unwrap();

        assert_eq!(services.quota.config().free_daily_limit, 2);
        assert_eq!(services.tokens.access_token_ttl(), chrono::Duration::minutes(15));
    }

    #[test]
    fn test_production_preset_secret_is_refused() {
        let config = AppConfig::production();
        assert!(matches!(
            check_jwt_secret(&config),
            Err(InfrastructureError::Config(_))
        ));

        let mut configured = AppConfig::production();
        configured.jwt.secret = "a-real-production-secret".to_string();
        assert!(check_jwt_secret(&configured).is_ok());

        let mut blank = AppConfig::production();
        blank.jwt.secret = "   ".to_string();
        assert!(check_jwt_secret(&blank).is_err());
    }

    #[test]
    fn test_default_secret_allowed_in_development() {
        assert!(check_jwt_secret(&AppConfig::development()).is_ok());
    }

    #[test]
    fn test_load_config_in_production_without_secret_fails() {
        std::env::set_var("ENVIRONMENT", "production");
        std::env::remove_var("JWT_SECRET");

        let result = load_config();

        std::env::remove_var("ENVIRONMENT");
        assert!(matches!(result, Err(InfrastructureError::Config(_))));
    }

    #[test]
    fn test_invalid_offset_is_rejected() {
        let mut config = AppConfig::development();
        config.matching.utc_offset_minutes = 24 * 60;
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let result = MemoryServices::build(&config, clock, Arc::new(QuestionBank::default()));
        assert!(matches!(result, Err(InfrastructureError::Domain(_))));
    }
}
