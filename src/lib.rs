pub mod severity;
pub mod normalize;
pub mod stringify;
pub mod fields;
pub mod record;
pub mod payload;
pub mod formatter;

pub mod sink;
pub mod layer;
pub mod rocketchat;

pub mod config;
pub mod env;
pub mod init;
pub mod noop_sink;

pub use payload::{Attachment, MessageFormatter, Payload, PayloadBuilder};
pub use record::LogRecord;
pub use severity::{color_for, Severity, UnknownSeverity};
