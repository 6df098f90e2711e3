pub mod loan_store;
pub mod member_directory;

pub use loan_store::PgLoanStore;
pub use member_directory::PgMemberDirectory;
