//! Operator web UI over `esp_idf_svc::http::server::EspHttpServer`.
//!
//! | Route          | Method | Result                                   |
//! |----------------|--------|------------------------------------------|
//! | `/`            | GET    | `/spiffs/www/index.html`                 |
//! | `/api/status`  | GET    | status document                          |
//! | `/api/control` | POST   | `{"ok":1}` or 400 `{"error":"invalid json"}` |

use crate::error::CommandError;

/// Longest accepted control body.
pub const MAX_CONTROL_BODY: usize = 512;
pub const WWW_ROOT: &str = "/spiffs/www";

pub const CONTROL_OK: &str = "{\"ok\":1}";
pub const CONTROL_REJECTED: &str = "{\"error\":\"invalid json\"}";

/// HTTP status and body answering a control request.
pub fn control_response(result: Result<(), CommandError>) -> (u16, &'static str) {
    match result {
        Ok(()) => (200, CONTROL_OK),
        Err(_) => (400, CONTROL_REJECTED),
    }
}

#[cfg(target_os = "espidf")]
pub use device::start;

#[cfg(target_os = "espidf")]
mod device {
    use std::sync::Arc;

    use embedded_svc::http::{Headers, Method};
    use embedded_svc::io::{Read, Write};
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use log::info;

    use super::{control_response, MAX_CONTROL_BODY, WWW_ROOT};
    use crate::app::ports::{Clock, OutputPort};
    use crate::app::service::AppService;

    const JSON: (&str, &str) = ("Content-Type", "application/json");

    pub fn start<O, C>(app: Arc<AppService<O>>, clock: C) -> anyhow::Result<EspHttpServer<'static>>
    where
        O: OutputPort + Send + 'static,
        C: Clock + Clone + Send + Sync + 'static,
    {
        let conf = Configuration {
            stack_size: 8 * 1024,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf)?;

        server.fn_handler::<anyhow::Error, _>("/", Method::Get, |req| {
            match std::fs::read(format!("{WWW_ROOT}/index.html")) {
                Ok(page) => {
                    req.into_response(200, None, &[("Content-Type", "text/html")])?
                        .write_all(&page)?;
                }
                Err(_) => {
                    req.into_status_response(404)?.write_all(b"not found")?;
                }
            }
            Ok(())
        })?;

        {
            let app = Arc::clone(&app);
            let clock = clock.clone();
            server.fn_handler::<anyhow::Error, _>("/api/status", Method::Get, move |req| {
                match app.status_json(clock.now_ms()) {
                    Some(body) => {
                        req.into_response(200, None, &[JSON])?.write_all(body.as_bytes())?;
                    }
                    None => {
                        req.into_status_response(500)?;
                    }
                }
                Ok(())
            })?;
        }

        server.fn_handler::<anyhow::Error, _>("/api/control", Method::Post, move |mut req| {
            let len = req.content_len().unwrap_or(0) as usize;
            let result = if len == 0 || len > MAX_CONTROL_BODY {
                Err(crate::error::CommandError::InvalidJson)
            } else {
                let mut body = vec![0u8; len];
                req.read_exact(&mut body)
                    .map_err(|_| crate::error::CommandError::InvalidJson)
                    .and_then(|()| app.handle_control(&body, clock.now_ms()))
            };
            let (status, body) = control_response(result);
            req.into_response(status, None, &[JSON])?
                .write_all(body.as_bytes())?;
            Ok(())
        })?;

        info!("[web] server started on port 80");
        Ok(server)
    }
}
