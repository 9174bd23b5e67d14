/// Errors that can occur while reading or writing CDR data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CdrError {
    /// The buffer ended before a value could be read.
    #[error("unexpected end of data: needed {needed} bytes at offset {offset}, had {available}")]
    UnexpectedEof {
        needed: usize,
        offset: usize,
        available: usize,
    },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A length does not fit in the 32-bit CDR length prefix.
    #[error("length {0} exceeds the CDR u32 length prefix")]
    LengthOverflow(usize),
}

pub type Result<T> = std::result::Result<T, CdrError>;
