//! HTTPS client over `esp_idf_svc::http::client::EspHttpConnection`.
//!
//! Implements [`TelemetryTransport`] (JSON POST with the collector's key
//! headers) and [`HttpGet`] (forecast fetch).  Each request opens a fresh
//! connection; certificates come from the ESP-IDF bundle.

use core::time::Duration;

use embedded_svc::http::{Method, Status};
use embedded_svc::http::client::Client;
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use log::debug;

use crate::app::ports::{HttpGet, TelemetryTransport};
use crate::error::NetworkError;

use super::wifi;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Forecast bodies beyond this are truncated (and then fail to decode).
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct EspHttpTransport;

impl EspHttpTransport {
    pub fn new() -> Self {
        Self
    }

    fn client() -> Result<Client<EspHttpConnection>, NetworkError> {
        let conf = Configuration {
            timeout: Some(REQUEST_TIMEOUT),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|_| NetworkError::RequestFailed)?;
        Ok(Client::wrap(conn))
    }
}

impl TelemetryTransport for EspHttpTransport {
    fn link_up(&self) -> bool {
        wifi::link_up()
    }

    fn post(&mut self, url: &str, api_key: &str, body: &[u8]) -> Result<u16, NetworkError> {
        let mut client = Self::client()?;
        let bearer = format!("Bearer {api_key}");
        let len = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", len.as_str()),
            ("apikey", api_key),
            ("Authorization", bearer.as_str()),
            ("Prefer", "return=representation"),
        ];
        let mut req = client
            .request(Method::Post, url, &headers)
            .map_err(|_| NetworkError::RequestFailed)?;
        req.write_all(body).map_err(|_| NetworkError::IoFailed)?;
        req.flush().map_err(|_| NetworkError::IoFailed)?;
        let resp = req.submit().map_err(|_| NetworkError::IoFailed)?;
        let status = resp.status();
        debug!("http: POST {url} -> {status}");
        Ok(status)
    }
}

impl HttpGet for EspHttpTransport {
    fn link_up(&self) -> bool {
        wifi::link_up()
    }

    fn get(&mut self, url: &str) -> Result<(u16, Vec<u8>), NetworkError> {
        let mut client = Self::client()?;
        let req = client
            .request(Method::Get, url, &[("Accept", "application/json")])
            .map_err(|_| NetworkError::RequestFailed)?;
        let mut resp = req.submit().map_err(|_| NetworkError::IoFailed)?;
        let status = resp.status();

        let mut body = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = resp.read(&mut chunk).map_err(|_| NetworkError::IoFailed)?;
            if n == 0 || body.len() + n > MAX_BODY_BYTES {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok((status, body))
    }
}
