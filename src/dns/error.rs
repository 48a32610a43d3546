use std::fmt;

/// A value that cannot be represented in the wire format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("domain name is empty")]
    EmptyName,
    #[error("label `{label}` is {len} bytes long, at most 63 are allowed")]
    LabelTooLong { label: String, len: usize },
    #[error("domain name needs {0} bytes on the wire, at most 255 are allowed")]
    NameTooLong(usize),
    #[error("record data is {0} bytes long, at most 65535 are allowed")]
    RdataTooLong(usize),
    #[error("{field} value {value} does not fit into 4 bits")]
    CodeOutOfRange { field: &'static str, value: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownMnemonic {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Question => "question",
            Section::Answer => "answer",
            Section::Authority => "authority",
            Section::Additional => "additional",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("failed to encode DNS message: {0}")]
    Encoding(#[from] EncodingError),
    #[error("DNS message is truncated")]
    TruncatedMessage,
    #[error("invalid DNS header: {0}")]
    InvalidHeader(String),
    #[error("header declares {declared} {section} entries, but the message holds {actual}")]
    InvalidState {
        section: Section,
        declared: u16,
        actual: usize,
    },
    #[error("malformed domain name: {0}")]
    MalformedName(String),
    #[error("compressed domain names are not supported")]
    UnsupportedCompression,
    #[error("DNS message of {len} bytes exceeds the limit of {max} bytes")]
    MessageTooLarge { len: usize, max: usize },
}
