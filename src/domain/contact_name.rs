/// Optional display name of the sender. Unlike the email and message, a name
/// is never rejected: blank input simply means "no name".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactName(Option<String>);

impl ContactName {
    pub fn parse(name: Option<String>) -> Self {
        Self(
            name.map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        )
    }

    /// What goes into the subject line
    pub fn or_anonymous(&self) -> &str { self.0.as_deref().unwrap_or("Anonymous") }
}

/// Empty string when no name was given
impl AsRef<str> for ContactName {
    fn as_ref(&self) -> &str { self.0.as_deref().unwrap_or_default() }
}
