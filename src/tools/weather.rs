//! Weather tool - Open-Meteo forecast for the device's GPS position

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::agent::Context;

use super::{Arguments, Tool, ToolError, ToolResult, Toolkit};

const DAILY: &str =
    "precipitation_sum,sunrise,sunset,precipitation_hours,temperature_2m_min,temperature_2m_max";
const CURRENT: &str = "temperature_2m,precipitation,is_day";

pub struct WeatherTool {
    base_url: String,
    client: Client,
}

impl WeatherTool {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<Value, String> {
        let url = format!("{}/v1/forecast", self.base_url);
        let query = [
            ("latitude", format!("{latitude:.2}")),
            ("longitude", format!("{longitude:.2}")),
            ("daily", DAILY.to_string()),
            ("timezone", "auto".to_string()),
            ("current", CURRENT.to_string()),
        ];
        debug!(%url, latitude, longitude, "Fetching forecast");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| format!("Could not determine weather - the weather service is unreachable ({e})."))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "Could not determine weather - the weather service returned HTTP {}.",
                status.as_u16()
            ));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Could not determine weather - unreadable forecast ({e})."))
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str { "get_weather" }
    fn description(&self) -> &str { "Gets the weather, given the user's position." }

    async fn execute(&self, _args: Arguments, ctx: &Context) -> ToolResult {
        let Some(gps) = &ctx.metadata().gps_position else {
            return Err(ToolError::new(
                self.name(),
                "Could not determine weather - no GPS position was found on the user's device.",
            ));
        };

        let Some((latitude, longitude)) = gps.coordinates() else {
            return Err(ToolError::new(
                self.name(),
                "Could not determine weather - no latitude/longitude was found on the user's device.",
            ));
        };

        self.fetch(latitude, longitude)
            .await
            .map_err(|message| ToolError::new(self.name(), message))
    }
}

pub fn toolkit(tool: WeatherTool) -> Toolkit {
    Toolkit::new("weather").with(tool)
}
