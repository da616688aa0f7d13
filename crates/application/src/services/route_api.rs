//! Route comparison.

use std::sync::Arc;

use ecoroute_domain::{ApiRequest, RouteCalculationRequest, RouteCalculationResponse};

use crate::auth::AuthenticatedClient;
use crate::endpoints;
use crate::error::ApplicationResult;

/// Calculates shortest and most efficient routes.
#[derive(Debug, Clone)]
pub struct RouteApi {
    client: Arc<AuthenticatedClient>,
}

impl RouteApi {
    /// Create the service.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Compare routes between two points.
    ///
    /// The request is checked before sending and both returned geometries
    /// are checked before returning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApplicationError::Domain`] for an invalid request or
    /// response, otherwise the error class matching the response status.
    pub async fn calculate(
        &self,
        request: &RouteCalculationRequest,
    ) -> ApplicationResult<RouteCalculationResponse> {
        request.validate()?;
        tracing::info!(
            origin = %request.origin.name,
            destination = %request.destination.name,
            mode = %request.transport_mode,
            "Calculating routes"
        );

        let api_request = ApiRequest::post(endpoints::CALCULATE_ROUTES).with_json(request)?;
        let response: RouteCalculationResponse = self.client.send_json(api_request).await?;
        response.validate()?;
        Ok(response)
    }
}
