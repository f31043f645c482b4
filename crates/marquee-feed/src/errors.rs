use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("payload is not delimited text: {reason}")]
    NotTabular { reason: String },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}
