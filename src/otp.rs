use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rocket::http::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PENDING_SIGNUP_COOKIE: &str = "pending_signup";
pub const OTP_TTL_MINUTES: i64 = 5;
pub const MAX_OTP_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupRole {
    Customer,
    Trainer,
}

/// A signup waiting for its email code. Lives only in the encrypted session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingSignup {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: SignupRole,
    pub address: Option<String>,
    pub otp: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("OTP expired. Please resend OTP.")]
    Expired,
    #[error("Too many failed attempts. Please start again.")]
    TooManyAttempts,
    #[error("Invalid OTP. Please try again.")]
    Invalid,
}

pub fn generate_otp() -> String {
    rand::rng().random_range(100000..=999999).to_string()
}

impl PendingSignup {
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        phone: String,
        role: SignupRole,
        address: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            username,
            email,
            password_hash,
            phone,
            role,
            address,
            otp: generate_otp(),
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
            attempts: 0,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Checks a submitted code. Expiry is checked first, then the attempt limit;
    /// a wrong code counts as an attempt.
    pub fn verify(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        if self.is_expired_at(now) {
            return Err(OtpError::Expired);
        }

        if self.attempts >= MAX_OTP_ATTEMPTS {
            return Err(OtpError::TooManyAttempts);
        }

        if code.trim() == self.otp {
            Ok(())
        } else {
            self.attempts += 1;
            Err(OtpError::Invalid)
        }
    }

    /// New code, fresh expiry, attempts reset.
    pub fn regenerate(&mut self, now: DateTime<Utc>) {
        self.otp = generate_otp();
        self.expires_at = now + Duration::minutes(OTP_TTL_MINUTES);
        self.attempts = 0;
    }

    pub fn load(cookies: &CookieJar<'_>) -> Option<Self> {
        let cookie = cookies.get_private(PENDING_SIGNUP_COOKIE)?;
        match serde_json::from_str(cookie.value()) {
            Ok(pending) => Some(pending),
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable pending signup");
                None
            }
        }
    }

    pub fn store(&self, cookies: &CookieJar<'_>) -> Result<(), serde_json::Error> {
        let value = serde_json::to_string(self)?;
        cookies.add_private(
            Cookie::build((PENDING_SIGNUP_COOKIE, value))
                .same_site(SameSite::Lax)
                .http_only(true)
                .max_age(rocket::time::Duration::minutes(30)),
        );
        Ok(())
    }

    pub fn clear(cookies: &CookieJar<'_>) {
        cookies.remove_private(Cookie::build(PENDING_SIGNUP_COOKIE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(now: DateTime<Utc>) -> PendingSignup {
        PendingSignup::new(
            "sam".to_string(),
            "sam@example.com".to_string(),
            "hash".to_string(),
            "+12345678901".to_string(),
            SignupRole::Customer,
            None,
            now,
        )
    }

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100000..=999999).contains(&n));
        }
    }

    #[test]
    fn test_correct_code_accepted() {
        let now = Utc::now();
        let mut p = pending(now);
        let code = p.otp.clone();
        assert_eq!(p.verify(&code, now + Duration::minutes(4)), Ok(()));
    }

    #[test]
    fn test_expired_code_rejected_even_if_correct() {
        let now = Utc::now();
        let mut p = pending(now);
        let code = p.otp.clone();
        assert_eq!(
            p.verify(&code, now + Duration::minutes(5) + Duration::seconds(1)),
            Err(OtpError::Expired)
        );
        assert_eq!(p.attempts, 0);
    }

    #[test]
    fn test_attempt_limit() {
        let now = Utc::now();
        let mut p = pending(now);
        let code = p.otp.clone();
        let wrong = if code == "100000" { "100001" } else { "100000" };

        for attempt in 1..=MAX_OTP_ATTEMPTS {
            assert_eq!(p.verify(wrong, now), Err(OtpError::Invalid));
            assert_eq!(p.attempts, attempt);
        }

        assert_eq!(p.verify(&code, now), Err(OtpError::TooManyAttempts));
    }

    #[test]
    fn test_regenerate_resets_state() {
        let now = Utc::now();
        let mut p = pending(now);
        p.attempts = 5;

        let later = now + Duration::minutes(10);
        p.regenerate(later);
        assert_eq!(p.attempts, 0);
        assert!(!p.is_expired_at(later + Duration::minutes(4)));
        let code = p.otp.clone();
        assert_eq!(p.verify(&code, later), Ok(()));
    }
}
