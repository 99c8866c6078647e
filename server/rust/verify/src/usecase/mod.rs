pub mod record_verification;
pub mod redeem_slip;
pub mod validate_token;

pub use record_verification::VerificationRecorder;
pub use redeem_slip::{RedeemError, RedeemSlipUseCase, RedemptionOutcome};
pub use validate_token::{ValidateTokenError, ValidateTokenUseCase};
