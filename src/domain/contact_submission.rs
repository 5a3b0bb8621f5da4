use super::ContactEmail;
use super::ContactMessage;
use super::ContactName;

/// A parsed contact form submission. It only lives for the duration of one
/// request, and is never persisted.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: ContactName,
    pub email: ContactEmail,
    pub message: ContactMessage,
}
