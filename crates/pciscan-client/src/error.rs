use pciscan_protocol::WireError;
use thiserror::Error;

/// Steps that make the scanner endpoint reachable, shown when it cannot be opened.
pub const REMEDIATION_STEPS: &[&str] = &[
    r#"sc create PCIScanner binPath= "C:\path\pci_scanner.sys" type= kernel"#,
    "sc start PCIScanner",
    "make sure you have administrator privileges",
];

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot open {path} (error code {code})")]
    OpenFailed { path: String, code: u32 },

    #[error("device control request failed (error code {code})")]
    RequestFailed { code: u32 },

    #[error("device returned {actual} bytes, expected {expected}")]
    ShortResponse { expected: usize, actual: usize },

    #[error("malformed device list: {0}")]
    Malformed(#[from] WireError),
}

impl ClientError {
    /// Platform error code carried by the error, if any.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::OpenFailed { code, .. } | Self::RequestFailed { code } => Some(*code),
            Self::ShortResponse { .. } | Self::Malformed(_) => None,
        }
    }

    /// What the user can do about the error, when there is something to do.
    pub fn remediation(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::OpenFailed { .. } => Some(REMEDIATION_STEPS),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
