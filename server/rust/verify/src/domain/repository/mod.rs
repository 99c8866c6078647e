pub mod slip_repository;
pub mod verification_log_repository;

pub use slip_repository::SlipRepository;
pub use verification_log_repository::VerificationLogRepository;
