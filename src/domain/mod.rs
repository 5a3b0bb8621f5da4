mod contact_email;
mod contact_message;
mod contact_name;
mod contact_submission;
// allow external `use` statements to skip `contact_email` etc
pub use contact_email::is_valid_email;
pub use contact_email::ContactEmail;
pub use contact_message::ContactMessage;
pub use contact_name::ContactName;
pub use contact_submission::ContactSubmission;
