use reqwest::header::CONTENT_TYPE;
use trip_broadcaster_lib::update::{update_location_url, DeliveryError, LocationSink, LocationUpdate};

/// Posts each update to `<api_url>/api/update-location`. The response is not
/// read, and a non-2xx status is not treated as a failure.
pub struct HttpLocationSink {
    client: reqwest::Client,
    url: String,
}

impl HttpLocationSink {
    pub fn new(api_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: update_location_url(api_url),
        }
    }
}

#[async_trait::async_trait]
impl LocationSink for HttpLocationSink {
    async fn send_location(&self, update: LocationUpdate) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(&update).map_err(|err| DeliveryError::Encode(err.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!("Sent {:?}", update);
        } else {
            tracing::warn!("Location server answered {} for {:?}", status, update);
        }

        Ok(())
    }
}
