pub mod log;
pub mod relay;

pub use self::log::LogEmailSender;
pub use self::relay::RelayEmailSender;
