/// An error type for the grid module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GridError {
    /// Error when the data length does not match the grid size.
    #[error("Data length ({0}) does not match the grid size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index ({0}) is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a value cannot be represented in the target pixel type.
    #[error("Failed to cast grid data")]
    CastError,
}
