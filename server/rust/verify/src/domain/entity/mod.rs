pub mod slip;
pub mod staff;
pub mod verification_log;

pub use slip::Slip;
pub use staff::AuthenticatedStaff;
pub use verification_log::VerificationLog;
