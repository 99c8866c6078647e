pub mod slip_memory;
pub mod slip_postgres;
pub mod verification_log_memory;
pub mod verification_log_postgres;

pub use slip_memory::InMemorySlipRepository;
pub use slip_postgres::SlipPostgresRepository;
pub use verification_log_memory::InMemoryVerificationLogRepository;
pub use verification_log_postgres::VerificationLogPostgresRepository;
