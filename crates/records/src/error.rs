use thiserror::Error;

/// Errors raised while decoding an export.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed CSV near line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },
}
