// Registration domain entities and their SQL

pub mod otp_code;
pub mod session;
pub mod user;

pub use otp_code::OtpCode;
pub use session::RegistrationSession;
pub use user::User;
