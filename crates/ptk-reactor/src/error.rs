use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReactorError {
    #[error("operation deadline elapsed")]
    Timeout,
    #[error("interrupted by ABORT")]
    Abort,
    #[error("interrupted by a non-ABORT signal")]
    Signal,
    #[error("peer closed the connection")]
    Closed,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("host unreachable")]
    HostUnreachable,
    #[error("address already in use")]
    AddressInUse,
    #[error("network error: {0}")]
    NetworkError(std::io::Error),
    #[error("buffer too small")]
    BufferTooSmall,
}

impl From<std::io::Error> for ReactorError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::AddrInUse => ReactorError::AddressInUse,
            std::io::ErrorKind::ConnectionRefused => ReactorError::ConnectionRefused,
            std::io::ErrorKind::HostUnreachable | std::io::ErrorKind::NetworkUnreachable => ReactorError::HostUnreachable,
            _ => ReactorError::NetworkError(err),
        }
    }
}

impl From<ptk_buffer::BufferError> for ReactorError {
    fn from(_: ptk_buffer::BufferError) -> Self {
        ReactorError::BufferTooSmall
    }
}
