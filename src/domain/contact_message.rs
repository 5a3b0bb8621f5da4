/// The body of a contact submission. Rejects empty and whitespace-only input;
/// otherwise the text is kept exactly as it was typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage(String);

impl ContactMessage {
    pub fn parse(message: String) -> Result<Self, String> {
        match message.trim().is_empty() {
            true => Err("Message cannot be empty".to_string()),
            false => Ok(Self(message)),
        }
    }
}

impl AsRef<str> for ContactMessage {
    fn as_ref(&self) -> &str { &self.0 }
}
