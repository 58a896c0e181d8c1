use crate::record::LogRecord;
use crate::rocketchat::DeliveryError;
use crate::severity::UnknownSeverity;
use async_trait::async_trait;
use std::error::Error;

/// Error returned by [`LogSink::send`].
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// The record's level code has no known severity; nothing was sent.
    #[error(transparent)]
    Severity(#[from] UnknownSeverity),

    /// The payload was built but one or more webhooks did not accept it.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Failure reported by a custom sink implementation.
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync>),
}

impl SinkError {
    pub fn other(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        SinkError::Other(err.into())
    }
}

/// Asynchronous destination for [`LogRecord`]s produced by the logging layer.
///
/// Implementations are responsible for turning a record into whatever the
/// destination expects and transporting it there. The layer calls `send`
/// from a background task and never awaits it on the application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Send a single log record to the destination.
    ///
    /// **Parameters**
    /// - `record`: fully-populated [`LogRecord`] produced by the layer or
    ///   constructed by hand.
    ///
    /// **Returns**
    /// - `Ok(())` if every destination accepted the record.
    /// - `Err(..)` otherwise. The layer logs the error and moves on to the
    ///   next record; it does not retry.
    async fn send(&self, record: &LogRecord) -> Result<(), SinkError>;

    /// Flush any buffered records, if the sink implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
