pub mod loan_store;
pub mod mailer;
pub mod member_directory;

pub use loan_store::InMemoryLoanStore;
pub use mailer::{LoggingMailer, RecordingMailer, SentMail};
pub use member_directory::InMemoryMemberDirectory;
