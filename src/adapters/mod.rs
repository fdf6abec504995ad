//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements                  | Connects to                 |
//! |------------------|-----------------------------|-----------------------------|
//! | `display`        | DisplayPort                 | 20x4 I2C LCD / serial log   |
//! | `forecast`       | ForecastPort                | tomorrow.io over `HttpGet`  |
//! | `hardware`       | OutputPort, ActuatorHealth  | relay board, feedback GPIO  |
//! |                  | SoilProbe, AmbientPort      | ADC1, simulated DHT         |
//! | `http_transport` | TelemetryTransport, HttpGet | ESP-IDF HTTPS client        |
//! | `log_file`       | DiagnosticSink              | SPIFFS text file + backup   |
//! | `nvs`            | ConfigPort                  | NVS / in-memory store       |
//! | `time`           | Clock, DelayNs              | ESP32 system timer          |
//! | `web_server`     | (inbound)                   | ESP-IDF HTTP server         |
//! | `wifi`           | link status                 | ESP-IDF WiFi STA            |

pub mod display;
pub mod forecast;
pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod http_transport;
pub mod log_file;
pub mod nvs;
pub mod time;
pub mod web_server;
pub mod wifi;
