//! Weather forecast client (tomorrow.io v4 forecast API).
//!
//! One GET per activation.  The first timeline step is "now", the second
//! the look-ahead point.  Any value missing from the response keeps its
//! previous value; the rain flag is recomputed from scratch each time.

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::{ForecastPort, HttpGet};
use crate::error::NetworkError;
use crate::state::{ForecastPoint, ForecastUpdate};

const FORECAST_BASE_URL: &str = "https://api.tomorrow.io/v4/weather/forecast";
pub const DEFAULT_LOCATION: &str = "Hanoi";

/// Rain thresholds on the "now" step.
const RAIN_PROBABILITY_PERCENT: f32 = 20.0;
const RAIN_INTENSITY_MM_H: f32 = 0.1;

#[derive(Deserialize)]
struct Response {
    timelines: Option<Timelines>,
}

#[derive(Deserialize)]
struct Timelines {
    hourly: Option<Vec<Step>>,
    minutely: Option<Vec<Step>>,
}

#[derive(Deserialize)]
struct Step {
    values: Option<Values>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Values {
    temperature: Option<f32>,
    humidity: Option<f32>,
    visibility: Option<f32>,
    uv_index: Option<f32>,
    precipitation_probability: Option<f32>,
    rain_intensity: Option<f32>,
    rain_accumulation: Option<f32>,
}

impl Values {
    fn apply(&self, prev: ForecastPoint) -> ForecastPoint {
        ForecastPoint {
            temp_c: self.temperature.unwrap_or(prev.temp_c),
            humidity: self.humidity.unwrap_or(prev.humidity),
            light: self.visibility.or(self.uv_index).unwrap_or(prev.light),
        }
    }

    fn rain_likely(&self) -> bool {
        self.precipitation_probability
            .is_some_and(|p| p.trunc() > RAIN_PROBABILITY_PERCENT)
            || self.rain_intensity.is_some_and(|r| r > RAIN_INTENSITY_MM_H)
            || self.rain_accumulation.is_some_and(|a| a > 0.0)
    }
}

pub fn forecast_url(api_key: &str, location: &str) -> String {
    format!("{FORECAST_BASE_URL}?location={location}&apikey={api_key}&units=metric&timesteps=1")
}

/// Decode a forecast response on top of the previous values.
///
/// The hourly timeline is preferred; the minutely one is used only when
/// hourly is absent.  A body without a usable first step is an error.
pub fn parse_forecast(body: &[u8], previous: &ForecastUpdate) -> Result<ForecastUpdate, NetworkError> {
    let resp: Response = serde_json::from_slice(body).map_err(|_| NetworkError::Decode)?;
    let timelines = resp.timelines.ok_or(NetworkError::Decode)?;
    let steps = timelines
        .hourly
        .or(timelines.minutely)
        .ok_or(NetworkError::Decode)?;

    let now = steps
        .first()
        .and_then(|s| s.values.as_ref())
        .ok_or(NetworkError::Decode)?;
    let ahead = steps.get(1).and_then(|s| s.values.as_ref());

    Ok(ForecastUpdate {
        current: now.apply(previous.current),
        ahead: ahead.map_or(previous.ahead, |v| v.apply(previous.ahead)),
        rain_soon: now.rain_likely(),
    })
}

pub struct ForecastClient<H> {
    http: H,
    api_key: Option<&'static str>,
    location: &'static str,
}

impl<H: HttpGet> ForecastClient<H> {
    pub fn new(http: H, api_key: Option<&'static str>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.is_empty()),
            location: option_env!("AGRONODE_FORECAST_LOCATION").unwrap_or(DEFAULT_LOCATION),
        }
    }
}

impl<H: HttpGet> ForecastPort for ForecastClient<H> {
    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn fetch(&mut self, previous: &ForecastUpdate) -> Result<ForecastUpdate, NetworkError> {
        let Some(key) = self.api_key else {
            return Err(NetworkError::RequestFailed);
        };
        if !self.http.link_up() {
            return Err(NetworkError::LinkDown);
        }
        let (status, body) = self.http.get(&forecast_url(key, self.location))?;
        info!("[Forecast] HTTP {status} len={}", body.len());
        if status != 200 {
            warn!("[Forecast] {}", String::from_utf8_lossy(&body));
            return Err(NetworkError::Status(status));
        }
        parse_forecast(&body, previous)
    }
}
