pub mod accounts;
pub mod reports;

pub use accounts::AccountService;
pub use reports::ReportService;
