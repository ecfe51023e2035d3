use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        password::verify_password,
        repo_types::{ContactBackfill, UserCredentials},
    },
    error::ApiError,
};

const GENDERS: [&str; 3] = ["male", "female", "other"];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_opt(value: &mut Option<String>) {
    if let Some(v) = value.take() {
        let trimmed = v.trim();
        if !trimmed.is_empty() {
            *value = Some(trimmed.to_string());
        }
    }
}

/// Trim and bounds-check the registration body. Password presence is not
/// checked here; whether one is required depends on the duplicate branch.
pub(crate) fn validate_register(payload: &mut RegisterRequest) -> Result<(), ApiError> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_string();
    normalize_opt(&mut payload.phone);
    normalize_opt(&mut payload.gender);

    if payload.name.is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if let Some(pw) = &payload.password {
        if pw.len() < 8 {
            return Err(ApiError::Validation("Password too short".into()));
        }
    }
    if let Some(age) = payload.age {
        if !(1..=130).contains(&age) {
            return Err(ApiError::Validation("Invalid age".into()));
        }
    }
    if let Some(gender) = &payload.gender {
        if !GENDERS.contains(&gender.as_str()) {
            return Err(ApiError::Validation("Invalid gender".into()));
        }
    }
    Ok(())
}

/// Fail fast on absent login fields; returns the trimmed email and password.
pub(crate) fn validate_login(payload: LoginRequest) -> Result<(String, String), ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::Validation("Email is required".into()))?
        .to_string();
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::Validation("Password is required".into()))?;
    Ok((email, password))
}

/// Outcome of a registration attempt that hit an existing account.
#[derive(Debug, PartialEq)]
pub enum DuplicateOutcome {
    /// No credential supplied; the caller must go through login.
    MissingPassword,
    /// Credential supplied but it does not match the stored hash.
    WrongPassword,
    /// Credential matches; the request is treated as a returning registrant
    /// and may fill in contact fields the record is still missing.
    Recognized(ContactBackfill),
}

/// Decide how to answer a duplicate registration. Backfill is monotonic:
/// only fields absent on the record and present in the request are included.
pub fn evaluate_duplicate(
    existing: &UserCredentials,
    payload: &RegisterRequest,
) -> anyhow::Result<DuplicateOutcome> {
    let Some(password) = payload.password.as_deref() else {
        return Ok(DuplicateOutcome::MissingPassword);
    };
    if !verify_password(password, &existing.password_hash)? {
        return Ok(DuplicateOutcome::WrongPassword);
    }

    let backfill = ContactBackfill {
        phone: match existing.user.phone {
            None => payload.phone.clone(),
            Some(_) => None,
        },
        age: match existing.user.age {
            None => payload.age,
            Some(_) => None,
        },
        gender: match existing.user.gender {
            None => payload.gender.clone(),
            Some(_) => None,
        },
    };
    Ok(DuplicateOutcome::Recognized(backfill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{password::hash_password, repo_types::{Role, User}};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn register_body(password: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: password.map(String::from),
            phone: None,
            age: None,
            gender: None,
        }
    }

    fn existing_with(
        password: &str,
        phone: Option<&str>,
        age: Option<i32>,
        gender: Option<&str>,
    ) -> UserCredentials {
        UserCredentials {
            user: User {
                id: Uuid::new_v4(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                role: Role::Patient,
                phone: phone.map(String::from),
                age,
                gender: gender.map(String::from),
                created_at: OffsetDateTime::now_utc(),
            },
            password_hash: hash_password(password).unwrap(),
        }
    }

    #[test]
    fn missing_password_is_a_login_challenge() {
        let existing = existing_with("hunter22hunter22", None, None, None);
        let outcome = evaluate_duplicate(&existing, &register_body(None)).unwrap();
        assert_eq!(outcome, DuplicateOutcome::MissingPassword);
    }

    #[test]
    fn wrong_password_is_rejected_without_backfill() {
        let existing = existing_with("hunter22hunter22", None, None, None);
        let outcome = evaluate_duplicate(&existing, &register_body(Some("not-the-one"))).unwrap();
        assert_eq!(outcome, DuplicateOutcome::WrongPassword);
    }

    #[test]
    fn matching_password_backfills_only_absent_fields() {
        let existing = existing_with("hunter22hunter22", Some("555-0101"), None, None);
        let mut body = register_body(Some("hunter22hunter22"));
        body.phone = Some("555-9999".into());
        body.age = Some(41);
        body.gender = Some("other".into());

        let outcome = evaluate_duplicate(&existing, &body).unwrap();
        let DuplicateOutcome::Recognized(backfill) = outcome else {
            panic!("expected recognized outcome");
        };
        // phone already set on the record; must not be overwritten
        assert_eq!(backfill.phone, None);
        assert_eq!(backfill.age, Some(41));
        assert_eq!(backfill.gender, Some("other".into()));
    }

    #[test]
    fn fully_populated_record_yields_empty_backfill() {
        let existing = existing_with(
            "hunter22hunter22",
            Some("555-0101"),
            Some(36),
            Some("female"),
        );
        let mut body = register_body(Some("hunter22hunter22"));
        body.phone = Some("555-9999".into());
        body.age = Some(99);
        body.gender = Some("male".into());

        let DuplicateOutcome::Recognized(backfill) =
            evaluate_duplicate(&existing, &body).unwrap()
        else {
            panic!("expected recognized outcome");
        };
        assert!(backfill.is_empty());
    }

    #[test]
    fn validate_register_trims_and_bounds_checks() {
        let mut body = register_body(Some("longenough"));
        body.name = "  Ada  ".into();
        body.email = " ada@example.com ".into();
        body.phone = Some("   ".into());
        assert!(validate_register(&mut body).is_ok());
        assert_eq!(body.name, "Ada");
        assert_eq!(body.email, "ada@example.com");
        assert_eq!(body.phone, None);

        let mut bad_age = register_body(Some("longenough"));
        bad_age.age = Some(0);
        assert!(validate_register(&mut bad_age).is_err());

        let mut bad_gender = register_body(Some("longenough"));
        bad_gender.gender = Some("robot".into());
        assert!(validate_register(&mut bad_gender).is_err());

        let mut short_pw = register_body(Some("short"));
        assert!(validate_register(&mut short_pw).is_err());
    }

    #[test]
    fn validate_login_requires_both_fields() {
        let missing_pw = LoginRequest {
            email: Some("ada@example.com".into()),
            password: None,
        };
        assert!(validate_login(missing_pw).is_err());

        let missing_email = LoginRequest {
            email: None,
            password: Some("hunter22hunter22".into()),
        };
        assert!(validate_login(missing_email).is_err());

        let ok = LoginRequest {
            email: Some(" ada@example.com ".into()),
            password: Some("hunter22hunter22".into()),
        };
        let (email, password) = validate_login(ok).unwrap();
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, "hunter22hunter22");
    }
}
