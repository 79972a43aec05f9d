//! Wire representations of the order API payloads.

use serde::{Deserialize, Serialize};

use crate::plot::{DownloadState, Plot, PlotState, StateCodeError};

/// `GET plot_orders/` response.
#[derive(Debug, Deserialize)]
pub(crate) struct OrderListResponse {
    #[serde(default)]
    pub results: Vec<OrderRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderRecord {
    pub id: String,
}

/// `GET plot_orders/{id}/` response.
#[derive(Debug, Deserialize)]
pub(crate) struct PlotListResponse {
    #[serde(default)]
    pub plots: Vec<PlotRecord>,
}

/// One plot record as returned by the service.
#[derive(Debug, Deserialize)]
pub(crate) struct PlotRecord {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub download_state: Option<u8>,
}

impl PlotRecord {
    /// Converts the wire record into a domain plot, rejecting unknown state
    /// codes.
    pub(crate) fn into_plot(self) -> Result<Plot, StateCodeError> {
        let state = PlotState::from_wire(&self.state)?;
        let download_state = match self.download_state {
            Some(code) => DownloadState::from_wire(code)?,
            None => DownloadState::NotStarted,
        };
        Ok(Plot::new(
            self.id,
            state,
            self.progress.unwrap_or(0),
            self.url,
            download_state,
        ))
    }
}

/// `PUT plots/{id}/` request body; `state` is only sent for expiry.
#[derive(Debug, Serialize)]
pub(crate) struct UpdatePlotRequest<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'a str>,
    pub download_state: u8,
}
