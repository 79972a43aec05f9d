//! Plot lifecycle and download states with their wire representation.
//!
//! The order service encodes the plot lifecycle as single-letter codes and
//! the download lifecycle as small integers. Both mappings are explicit and
//! bidirectional; unknown codes are rejected at decode time instead of being
//! silently defaulted.

use std::fmt;

use thiserror::Error;

/// Errors raised when a wire value does not map to a known state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateCodeError {
    /// The plot state code is not one of the known single-letter codes.
    #[error("unknown plot state code {0:?}")]
    UnknownPlotState(String),

    /// The download state code is not one of the known integer codes.
    #[error("unknown download state code {0}")]
    UnknownDownloadState(u8),
}

/// Lifecycle stage of a plot, as reported by the order service.
///
/// The remote service is the only authority for this value. The client never
/// invents transitions; it mirrors what the service reports, except that it
/// sets the terminal [`PlotState::Expired`] locally after the service has
/// confirmed the deletion of a fully downloaded plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotState {
    /// Plotting has not started yet.
    Pending,
    /// The plot is currently being produced.
    Plotting,
    /// The plot file is ready for download.
    Published,
    /// The plot was cancelled remotely (terminal).
    Cancelled,
    /// The plot was deleted after download (terminal).
    Expired,
}

impl PlotState {
    /// Decodes a wire code into a state.
    pub fn from_wire(code: &str) -> Result<Self, StateCodeError> {
        match code {
            "P" => Ok(Self::Pending),
            "R" => Ok(Self::Plotting),
            "D" => Ok(Self::Published),
            "C" => Ok(Self::Cancelled),
            "X" => Ok(Self::Expired),
            other => Err(StateCodeError::UnknownPlotState(other.to_string())),
        }
    }

    /// Returns the wire code for this state.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Pending => "P",
            Self::Plotting => "R",
            Self::Published => "D",
            Self::Cancelled => "C",
            Self::Expired => "X",
        }
    }

    /// Returns true for states the plot can never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }
}

impl fmt::Display for PlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Plotting => "plotting",
            Self::Published => "published",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        write!(f, "{}", name)
    }
}

/// Locally-tracked transfer lifecycle of a plot's backing file.
///
/// Advances `NotStarted → Downloading → Downloaded` and never regresses,
/// except that a restart may re-enter `Downloading` once the previous
/// transfer task has exited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadState {
    /// No transfer has been started by any client.
    NotStarted,
    /// A transfer is (or was) in progress; a partial file may exist.
    Downloading,
    /// The local file length matched the expected plot size.
    Downloaded,
}

impl DownloadState {
    /// Decodes a wire code into a download state.
    pub fn from_wire(code: u8) -> Result<Self, StateCodeError> {
        match code {
            0 => Ok(Self::NotStarted),
            1 => Ok(Self::Downloading),
            2 => Ok(Self::Downloaded),
            other => Err(StateCodeError::UnknownDownloadState(other)),
        }
    }

    /// Returns the wire code for this download state.
    pub fn as_wire(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Downloading => 1,
            Self::Downloaded => 2,
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_state_round_trip() {
        for code in ["P", "R", "D", "C", "X"] {
            let state = PlotState::from_wire(code).unwrap();
            assert_eq!(state.as_wire(), code);
        }
    }

    #[test]
    fn test_plot_state_rejects_unknown_code() {
        let err = PlotState::from_wire("Z").unwrap_err();
        assert_eq!(err, StateCodeError::UnknownPlotState("Z".to_string()));
    }

    #[test]
    fn test_plot_state_rejects_lowercase() {
        assert!(PlotState::from_wire("p").is_err());
        assert!(PlotState::from_wire("").is_err());
    }

    #[test]
    fn test_download_state_round_trip() {
        for code in [0u8, 1, 2] {
            let state = DownloadState::from_wire(code).unwrap();
            assert_eq!(state.as_wire(), code);
        }
    }

    #[test]
    fn test_download_state_rejects_unknown_code() {
        let err = DownloadState::from_wire(3).unwrap_err();
        assert_eq!(err, StateCodeError::UnknownDownloadState(3));
    }

    #[test]
    fn test_terminal_states() {
        assert!(PlotState::Cancelled.is_terminal());
        assert!(PlotState::Expired.is_terminal());
        assert!(!PlotState::Published.is_terminal());
        assert!(!PlotState::Pending.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(PlotState::Published.to_string(), "published");
        assert_eq!(DownloadState::Downloading.to_string(), "downloading");
    }
}
