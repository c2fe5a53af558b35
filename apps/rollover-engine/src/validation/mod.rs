//! Contract validation against broker details with offline fallback.
//!
//! The validator prefers a live contract-details query when a connected
//! broker is supplied, and silently degrades to spec-only (offline)
//! validation on any broker absence, error, or timeout. Live validation
//! failure is never fatal to the caller.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;

use crate::broker::{BrokerAdapter, ContractDetails};
use crate::models::{ContractSpec, ValidationResult, parse_expiration};

/// Validates contract specs, live-first with offline fallback.
///
/// Holds no broker state and no shared mutable state; concurrent
/// invocation is safe by construction.
#[derive(Debug, Clone)]
pub struct ContractValidator {
    warn_days_before_expiry: i64,
    query_timeout: Duration,
}

impl ContractValidator {
    /// Create a validator.
    ///
    /// `warn_days_before_expiry` is the near-expiry advisory threshold;
    /// `query_timeout` bounds every live broker query.
    #[must_use]
    pub const fn new(warn_days_before_expiry: i64, query_timeout: Duration) -> Self {
        Self {
            warn_days_before_expiry,
            query_timeout,
        }
    }

    /// Near-expiry advisory threshold in days.
    #[must_use]
    pub const fn warn_days_before_expiry(&self) -> i64 {
        self.warn_days_before_expiry
    }

    /// Validate one contract spec.
    ///
    /// Attempts a live broker query when `broker` is supplied and
    /// connected; otherwise (or on any query failure) validates
    /// offline from the spec's own expiration date.
    pub async fn validate(
        &self,
        broker: Option<&dyn BrokerAdapter>,
        spec: &ContractSpec,
    ) -> ValidationResult {
        if let Some(broker) = broker {
            if broker.is_connected() {
                match timeout(self.query_timeout, broker.contract_details(spec.symbol())).await {
                    Ok(Ok(details)) if !details.is_empty() => {
                        return self.classify_live(spec, &details[0]);
                    }
                    Ok(Ok(_)) => {
                        tracing::debug!(
                            symbol = %spec.symbol(),
                            broker = broker.broker_name(),
                            "no_contract_details"
                        );
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            symbol = %spec.symbol(),
                            broker = broker.broker_name(),
                            error = %e,
                            "broker_query_failed"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            symbol = %spec.symbol(),
                            broker = broker.broker_name(),
                            timeout_ms = self.query_timeout.as_millis() as u64,
                            "broker_query_timeout"
                        );
                    }
                }
            }
        }

        self.validate_offline(spec)
    }

    /// Validate a keyed batch of specs.
    ///
    /// Results are co-keyed with the input. Contracts are independent:
    /// a failure classification for one symbol never affects another.
    pub async fn validate_batch(
        &self,
        broker: Option<&dyn BrokerAdapter>,
        specs: &HashMap<String, ContractSpec>,
    ) -> HashMap<String, ValidationResult> {
        let mut results = HashMap::with_capacity(specs.len());
        for (key, spec) in specs {
            results.insert(key.clone(), self.validate(broker, spec).await);
        }
        results
    }

    /// Classify from the first broker-returned detail record.
    fn classify_live(&self, spec: &ContractSpec, details: &ContractDetails) -> ValidationResult {
        self.classify(
            spec.symbol(),
            details.expiration(),
            details.con_id.or(spec.con_id()),
            "No expiration data from broker; contract cannot be validated further (may be cash-settled)",
        )
    }

    /// Classify from the spec's own expiration date.
    fn validate_offline(&self, spec: &ContractSpec) -> ValidationResult {
        self.classify(
            spec.symbol(),
            spec.expiration_date(),
            spec.con_id(),
            "No expiration date on spec; live validation recommended",
        )
    }

    /// Three-way expiry classification shared by both paths.
    ///
    /// An unparsable date yields "unknown" days-to-expiry: valid, no
    /// error, no expiry classification.
    fn classify(
        &self,
        symbol: &str,
        raw_expiration: Option<&str>,
        con_id: Option<i64>,
        advisory: &str,
    ) -> ValidationResult {
        let mut result = ValidationResult::valid(symbol);
        result.con_id = con_id;

        let Some(raw) = raw_expiration else {
            result.warning = Some(advisory.to_string());
            return result;
        };
        result.expiration_date = Some(raw.to_string());

        let Some(expiry) = parse_expiration(raw) else {
            return result;
        };

        let today = Utc::now().date_naive();
        let days = (expiry - today).num_days();
        result.days_to_expiry = Some(days);

        if days < 0 {
            result.valid = false;
            result.expired = true;
            result.error = Some(format!("Contract {symbol} expired {} days ago", -days));
        } else if days <= self.warn_days_before_expiry {
            result.warning = Some(format!(
                "Contract {symbol} expires in {days} days - rollover recommended"
            ));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use rust_decimal_macros::dec;

    const QUERY_TIMEOUT: Duration = Duration::from_millis(200);

    /// Mock broker with a canned contract-details response.
    struct MockBroker {
        connected: bool,
        response: Result<Vec<ContractDetails>, BrokerError>,
    }

    impl MockBroker {
        fn with_details(details: Vec<ContractDetails>) -> Self {
            Self {
                connected: true,
                response: Ok(details),
            }
        }

        fn erroring() -> Self {
            Self {
                connected: true,
                response: Err(BrokerError::Api("boom".to_string())),
            }
        }

        fn disconnected() -> Self {
            Self {
                connected: false,
                response: Ok(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BrokerAdapter for MockBroker {
        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn contract_details(
            &self,
            _symbol: &str,
        ) -> Result<Vec<ContractDetails>, BrokerError> {
            match &self.response {
                Ok(details) => Ok(details.clone()),
                Err(_) => Err(BrokerError::Api("boom".to_string())),
            }
        }

        fn broker_name(&self) -> &'static str {
            "Mock"
        }
    }

    /// Broker whose query never completes within the validator timeout.
    struct HangingBroker;

    #[async_trait]
    impl BrokerAdapter for HangingBroker {
        fn is_connected(&self) -> bool {
            true
        }

        async fn contract_details(
            &self,
            _symbol: &str,
        ) -> Result<Vec<ContractDetails>, BrokerError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        fn broker_name(&self) -> &'static str {
            "Hanging"
        }
    }

    fn validator() -> ContractValidator {
        ContractValidator::new(7, QUERY_TIMEOUT)
    }

    fn expiring_spec(days_out: i64) -> ContractSpec {
        let expiry = Utc::now().date_naive() + ChronoDuration::days(days_out);
        ContractSpec::futures("ESH26", "CME", dec!(50))
            .unwrap()
            .with_expiration(expiry.format("%Y%m%d").to_string())
    }

    fn date_string(days_out: i64) -> String {
        (Utc::now().date_naive() + ChronoDuration::days(days_out))
            .format("%Y%m%d")
            .to_string()
    }

    #[tokio::test]
    async fn test_offline_expired_contract_blocks() {
        let result = validator().validate(None, &expiring_spec(-6)).await;
        assert!(!result.valid);
        assert!(result.expired);
        assert_eq!(result.days_to_expiry, Some(-6));
        assert!(result.error.as_deref().unwrap().contains("expired 6 days ago"));
        assert!(result.warning.is_none());
    }

    #[tokio::test]
    async fn test_offline_near_expiry_warns() {
        let result = validator().validate(None, &expiring_spec(3)).await;
        assert!(result.valid);
        assert!(!result.expired);
        assert!(result.error.is_none());
        assert!(result.warning.as_deref().unwrap().contains("rollover recommended"));
    }

    #[tokio::test]
    async fn test_offline_far_expiry_clean() {
        let result = validator().validate(None, &expiring_spec(90)).await;
        assert!(result.valid);
        assert!(result.error.is_none());
        assert!(result.warning.is_none());
    }

    #[tokio::test]
    async fn test_offline_no_expiration_is_advisory() {
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50)).unwrap();
        let result = validator().validate(None, &spec).await;
        assert!(result.valid);
        assert!(result.error.is_none());
        assert!(result.warning.as_deref().unwrap().contains("live validation"));
        assert_eq!(result.days_to_expiry, None);
    }

    #[tokio::test]
    async fn test_offline_unparsable_expiration_is_valid_unknown() {
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50))
            .unwrap()
            .with_expiration("garbage");
        let result = validator().validate(None, &spec).await;
        assert!(result.valid);
        assert!(result.error.is_none());
        assert_eq!(result.days_to_expiry, None);
    }

    #[tokio::test]
    async fn test_live_query_used_when_connected() {
        let broker = MockBroker::with_details(vec![ContractDetails {
            real_expiration_date: Some(date_string(30)),
            con_id: Some(12345),
            ..Default::default()
        }]);
        // Spec has no expiration; only the live path can resolve days.
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50)).unwrap();

        let result = validator().validate(Some(&broker), &spec).await;
        assert!(result.valid);
        assert_eq!(result.days_to_expiry, Some(30));
        assert_eq!(result.con_id, Some(12345));
    }

    #[tokio::test]
    async fn test_live_month_granularity_date() {
        let month = (Utc::now().date_naive() + ChronoDuration::days(90))
            .format("%Y%m")
            .to_string();
        let broker = MockBroker::with_details(vec![ContractDetails {
            contract_month: Some(month),
            ..Default::default()
        }]);
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50)).unwrap();

        let result = validator().validate(Some(&broker), &spec).await;
        assert!(result.valid);
        assert!(result.days_to_expiry.is_some());
    }

    #[tokio::test]
    async fn test_live_no_expiration_data_is_advisory() {
        let broker = MockBroker::with_details(vec![ContractDetails {
            con_id: Some(99),
            ..Default::default()
        }]);
        let spec = ContractSpec::futures("ESH26", "CME", dec!(50)).unwrap();

        let result = validator().validate(Some(&broker), &spec).await;
        assert!(result.valid);
        assert!(result.warning.as_deref().unwrap().contains("cash-settled"));
        assert_eq!(result.con_id, Some(99));
    }

    #[tokio::test]
    async fn test_empty_details_falls_back_to_offline() {
        let broker = MockBroker::with_details(Vec::new());
        let result = validator().validate(Some(&broker), &expiring_spec(3)).await;
        // Offline path classified the spec's own date.
        assert!(result.valid);
        assert!(result.warning.is_some());
        assert_eq!(result.days_to_expiry, Some(3));
    }

    #[tokio::test]
    async fn test_broker_error_falls_back_to_offline() {
        let broker = MockBroker::erroring();
        let result = validator().validate(Some(&broker), &expiring_spec(-2)).await;
        assert!(result.expired);
        assert_eq!(result.days_to_expiry, Some(-2));
    }

    #[tokio::test]
    async fn test_disconnected_broker_falls_back_to_offline() {
        let broker = MockBroker::disconnected();
        let result = validator().validate(Some(&broker), &expiring_spec(90)).await;
        assert!(result.valid);
        assert!(result.warning.is_none());
    }

    #[tokio::test]
    async fn test_broker_timeout_falls_back_to_offline() {
        let broker = HangingBroker;
        let result = validator().validate(Some(&broker), &expiring_spec(90)).await;
        assert!(result.valid);
        assert_eq!(result.days_to_expiry, Some(90));
    }

    #[tokio::test]
    async fn test_validate_batch_is_co_keyed_and_independent() {
        let mut specs = HashMap::new();
        specs.insert("ES".to_string(), expiring_spec(-1));
        specs.insert(
            "NQ".to_string(),
            ContractSpec::futures("NQH26", "CME", dec!(20))
                .unwrap()
                .with_expiration(date_string(90)),
        );

        let results = validator().validate_batch(None, &specs).await;
        assert_eq!(results.len(), 2);
        assert!(results["ES"].expired);
        assert!(results["NQ"].valid);
        assert!(!results["NQ"].expired);
    }
}
