use std::sync::Arc;

use chrono::Duration;

use super::common::*;
use crate::workflows::availability::access::{
    check_expiry, AccessError, AccessKeyValidator, KeyCheck, KeyError, EXPIRED_KEY_MESSAGE,
    UNKNOWN_KEY_MESSAGE,
};
use crate::workflows::availability::repository::RepositoryError;

fn validator_with(
    records: Vec<crate::workflows::availability::Intervenant>,
) -> (AccessKeyValidator<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::with(records));
    (AccessKeyValidator::new(repository.clone()), repository)
}

#[test]
fn unknown_key_is_classified_unknown() {
    let (validator, _) = validator_with(vec![intervenant(
        "int-1",
        "abc",
        instant(2030, 1, 1),
        partial_availability(),
    )]);

    match validator.validate("xyz", instant(2024, 1, 1)) {
        Err(AccessError::Key(KeyError::Unknown)) => {}
        other => panic!("expected unknown key, got {other:?}"),
    }
}

#[test]
fn key_expired_before_now_is_classified_expired() {
    let (validator, _) = validator_with(vec![intervenant(
        "int-1",
        "abc",
        instant(2023, 1, 1),
        partial_availability(),
    )]);

    match validator.validate("abc", instant(2024, 1, 1)) {
        Err(AccessError::Key(KeyError::Expired)) => {}
        other => panic!("expected expired key, got {other:?}"),
    }
}

#[test]
fn valid_key_returns_record_unchanged() {
    let record = intervenant("int-1", "abc", instant(2030, 1, 1), partial_availability());
    let (validator, _) = validator_with(vec![record.clone()]);

    let resolved = validator
        .validate("abc", instant(2024, 1, 1))
        .expect("key accepted");

    assert_eq!(resolved, record);
}

#[test]
fn expiration_instant_is_still_valid() {
    let expires_at = instant(2024, 6, 30);
    let (validator, _) = validator_with(vec![intervenant(
        "int-1",
        "abc",
        expires_at,
        partial_availability(),
    )]);

    assert!(validator.validate("abc", expires_at).is_ok());
    assert!(matches!(
        validator.validate("abc", expires_at + Duration::seconds(1)),
        Err(AccessError::Key(KeyError::Expired))
    ));
}

#[test]
fn expiry_is_monotonic_once_passed() {
    let expires_at = instant(2024, 6, 30);
    let record = intervenant("int-1", "abc", expires_at, partial_availability());

    assert!(check_expiry(record.clone(), expires_at - Duration::days(10)).is_ok());
    for days_after in [1, 2, 30, 365, 3650] {
        assert_eq!(
            check_expiry(record.clone(), expires_at + Duration::days(days_after)),
            Err(KeyError::Expired)
        );
    }
}

#[test]
fn keys_match_exactly_without_case_folding_or_trimming() {
    let (validator, _) = validator_with(vec![intervenant(
        "int-1",
        "AbC",
        instant(2030, 1, 1),
        partial_availability(),
    )]);
    let now = instant(2024, 1, 1);

    assert!(validator.validate("AbC", now).is_ok());
    for variant in ["abc", "ABC", " AbC", "AbC "] {
        assert!(
            matches!(
                validator.validate(variant, now),
                Err(AccessError::Key(KeyError::Unknown))
            ),
            "{variant:?} should not match"
        );
    }
}

#[test]
fn empty_key_is_unknown_without_touching_repository() {
    let (validator, repository) = validator_with(Vec::new());

    assert!(matches!(
        validator.validate("", instant(2024, 1, 1)),
        Err(AccessError::Key(KeyError::Unknown))
    ));
    assert_eq!(repository.lookups(), 0);
}

#[test]
fn repository_failure_propagates() {
    let validator = AccessKeyValidator::new(Arc::new(UnavailableRepository));

    match validator.validate("abc", instant(2024, 1, 1)) {
        Err(AccessError::Repository(RepositoryError::Unavailable(reason))) => {
            assert_eq!(reason, "database offline");
        }
        other => panic!("expected repository failure, got {other:?}"),
    }
}

#[test]
fn key_errors_carry_distinct_user_messages() {
    assert_eq!(KeyError::Unknown.message(), "Clé inconnue");
    assert_eq!(KeyError::Expired.message(), "Clé expirée");
    assert_eq!(KeyError::Unknown.to_string(), UNKNOWN_KEY_MESSAGE);
    assert_eq!(KeyError::Expired.to_string(), EXPIRED_KEY_MESSAGE);
}

#[test]
fn key_check_mirrors_lookup_outcome() {
    let record = intervenant("int-1", "abc", instant(2030, 1, 1), partial_availability());

    let accepted = serde_json::to_value(KeyCheck::from_outcome(Ok(record))).expect("serializes");
    assert_eq!(accepted["valid"], true);
    assert_eq!(accepted["intervenant"]["id"], "int-1");
    assert!(accepted.get("message").is_none());

    let refused =
        serde_json::to_value(KeyCheck::from_outcome(Err(KeyError::Expired))).expect("serializes");
    assert_eq!(refused["valid"], false);
    assert_eq!(refused["message"], "Clé expirée");
    assert!(refused.get("intervenant").is_none());
}
