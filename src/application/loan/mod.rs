mod errors;
mod loan_service;
mod overdue_scan;

pub use errors::{LoanApplicationError, Result};
pub use loan_service::{
    CreateLoan, ExtendDueDate, ReturnLoan, ServiceDependencies, create_loan, extend_due_date,
    return_loan,
};
pub use overdue_scan::{OverdueScanError, OverdueScanReport, run_overdue_scan};
