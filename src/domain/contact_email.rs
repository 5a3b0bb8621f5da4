use once_cell::sync::Lazy;
use regex::Regex;

// deliberately loose: no whitespace or `@` in either half, and at least one dot
// in the domain. the browser form checks the exact same pattern, so a message
// that passes the client will never be bounced here for its shape
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Check `email` (after trimming) against the shared `local@domain.tld`
/// pattern.
pub fn is_valid_email(email: &str) -> bool { EMAIL_PATTERN.is_match(email.trim()) }

/// The address of whoever submitted the form. It ends up in the `Reply-To`
/// header, so replies go straight back to them.
///
/// Must be instantiated with `ContactEmail::parse`; the stored value is always
/// trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEmail(String);

impl ContactEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        let trimmed = email.trim();
        is_valid_email(trimmed)
            .then(|| Self(trimmed.to_string()))
            .ok_or(format!("Invalid email: {email:?}"))
    }
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
