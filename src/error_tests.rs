//! Tests for error kinds and payloads

#[cfg(test)]
mod tests {
    use super::super::error::*;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(ForecastError::InvalidModel("foo".into()).kind(), "InvalidModelError");
        assert_eq!(ForecastError::InvalidHorizon(-5).kind(), "InvalidHorizonError");
        assert_eq!(
            ForecastError::InvalidFrequency("weekly".into()).kind(),
            "InvalidFrequencyError"
        );
        assert_eq!(
            ForecastError::EmptyPartition { partition: "train", rows: 1 }.kind(),
            "EmptyPartitionError"
        );
        assert_eq!(
            ForecastError::InsufficientData { required: 7, actual: 0 }.kind(),
            "InsufficientDataError"
        );
        assert_eq!(
            ForecastError::unavailable("ZZZZ", "empty result").kind(),
            "DataUnavailableError"
        );
    }

    #[test]
    fn test_payload_carries_message() {
        let payload = ForecastError::InvalidHorizon(-5).payload();
        assert_eq!(payload.kind, "InvalidHorizonError");
        assert!(payload.message.contains("-5"));
    }

    #[test]
    fn test_payload_serializes_as_kind_and_message() {
        let payload = ForecastError::InvalidModel("foo".into()).payload();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "InvalidModelError");
        assert_eq!(json["message"], "Invalid model choice: foo");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ForecastError::InvalidModel("x".into()).is_client_error());
        assert!(ForecastError::unavailable("X", "none").is_client_error());
        assert!(ForecastError::InvalidLookback("7w".into()).is_client_error());
        assert!(!ForecastError::Numerical("nan".into()).is_client_error());
        assert!(!ForecastError::Internal("join".into()).is_client_error());
    }
}
