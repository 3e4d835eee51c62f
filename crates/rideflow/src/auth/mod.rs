//! Mock OTP sign-in shared by both clients.
//!
//! Nothing here talks to a server. "Sending" a code always succeeds and
//! verification is a local [`CodePolicy`]. The two forms differ only in which
//! profile fields they collect:
//!
//! - [`DriverSignIn`] supports login and register modes
//! - [`RiderSignUp`] locks the mobile number once verified, then asks for an area

pub mod driver;
pub mod rider;

pub use driver::{AuthMode, DriverSignIn};
pub use rider::{RiderSignUp, AREAS};

use regex::Regex;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// How an entered sign-in code is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePolicy {
    /// Any numeric code of the configured length verifies.
    AnyOfLength,
    /// Only this code verifies.
    Exact(String),
}

/// Input rules for the mobile number and sign-in code.
#[derive(Debug, Clone)]
pub struct AuthRules {
    mobile_pattern: Regex,
    code_pattern: Regex,
    mobile_length: usize,
    code_length: usize,
    country_code: String,
    policy: CodePolicy,
}

impl AuthRules {
    /// Build the rules from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured lengths cannot form a pattern.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let policy = match &config.fixed_code {
            Some(code) => CodePolicy::Exact(code.clone()),
            None => CodePolicy::AnyOfLength,
        };
        Ok(Self {
            mobile_pattern: digits_pattern(config.mobile_length)?,
            code_pattern: digits_pattern(config.code_length)?,
            mobile_length: config.mobile_length,
            code_length: config.code_length,
            country_code: config.country_code.clone(),
            policy,
        })
    }

    /// Whether `mobile` is exactly the configured number of digits.
    #[must_use]
    pub fn is_valid_mobile(&self, mobile: &str) -> bool {
        self.mobile_pattern.is_match(mobile)
    }

    /// Whether `code` has the shape of a sign-in code.
    #[must_use]
    pub fn is_complete_code(&self, code: &str) -> bool {
        self.code_pattern.is_match(code)
    }

    /// Whether `code` verifies under the policy.
    #[must_use]
    pub fn accepts(&self, code: &str) -> bool {
        if !self.is_complete_code(code) {
            return false;
        }
        match &self.policy {
            CodePolicy::AnyOfLength => true,
            CodePolicy::Exact(expected) => expected == code,
        }
    }

    /// Clean typed mobile input.
    ///
    /// A leading country code is dropped. Extra digits are kept rather than
    /// truncated, so an over-long number stays invalid instead of turning
    /// into a different one.
    #[must_use]
    pub fn sanitize_mobile(&self, input: &str) -> String {
        let trimmed = input.trim_start();
        let local = trimmed
            .strip_prefix(self.country_code.as_str())
            .unwrap_or(trimmed);
        local.chars().filter(char::is_ascii_digit).collect()
    }

    /// Clean typed code input the way the number pad would.
    #[must_use]
    pub fn sanitize_code(&self, input: &str) -> String {
        digits_only(input, self.code_length)
    }

    /// Required mobile length.
    #[must_use]
    pub fn mobile_length(&self) -> usize {
        self.mobile_length
    }

    /// Required code length.
    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Prefix stored with rider mobile numbers.
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// The verification policy in force.
    #[must_use]
    pub fn policy(&self) -> &CodePolicy {
        &self.policy
    }
}

fn digits_pattern(len: usize) -> Result<Regex> {
    Regex::new(&format!(r"^[0-9]{{{len}}}$"))
        .map_err(|e| Error::internal(format!("bad digit pattern for length {len}: {e}")))
}

/// Strip everything but ASCII digits and keep at most `max` of them.
#[must_use]
pub fn digits_only(input: &str, max: usize) -> String {
    input.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// The code-entry step both forms share.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CodeEntry {
    sent: bool,
    code: String,
}

impl CodeEntry {
    pub(crate) fn is_sent(&self) -> bool {
        self.sent
    }

    pub(crate) fn code(&self) -> &str {
        &self.code
    }

    pub(crate) fn send(&mut self, mobile: &str) {
        debug!("Mock code sent to {}", mobile);
        self.sent = true;
        self.code.clear();
    }

    pub(crate) fn set_code(&mut self, rules: &AuthRules, input: &str) {
        self.code = rules.sanitize_code(input);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn can_verify(&self, rules: &AuthRules) -> bool {
        self.sent && rules.is_complete_code(&self.code)
    }

    /// Check the entered code, leaving the entry untouched on failure.
    pub(crate) fn verify(&self, rules: &AuthRules) -> Result<()> {
        if !self.sent {
            return Err(Error::unavailable("verify", "no code has been sent"));
        }
        if !rules.is_complete_code(&self.code) {
            return Err(Error::unavailable(
                "verify",
                format!("code must be {} digits", rules.code_length()),
            ));
        }
        if !rules.accepts(&self.code) {
            warn!("Sign-in code rejected");
            return Err(Error::invalid_input("code", "code does not match"));
        }
        Ok(())
    }
}
