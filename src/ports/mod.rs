pub mod loan_store;
pub mod mailer;
pub mod member_directory;

pub use loan_store::{LoanStore, LoanStoreError};
pub use mailer::{Mailer, MailerError};
pub use member_directory::MemberDirectory;
