//! FRED API integration for the credit-card delinquency and charge-off series.

use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{DateRange, Observation, SeriesId};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// Per-request timeout for the blocking client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of fetching a single series.
///
/// Failures are soft: the fetch comes back empty with a user-facing warning
/// instead of an error, so one failed series never aborts the other.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesFetch {
    pub observations: Vec<Observation>,
    pub warning: Option<String>,
}

impl SeriesFetch {
    pub fn ok(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            warning: None,
        }
    }

    pub fn failed(warning: impl Into<String>) -> Self {
        Self {
            observations: Vec::new(),
            warning: Some(warning.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Anything that can produce observations for one series over a date range.
pub trait SeriesFetcher {
    fn fetch_series(&self, series: SeriesId, range: &DateRange, api_key: Option<&str>) -> SeriesFetch;
}

pub struct FredClient {
    client: Client,
    base_url: String,
}

impl FredClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different observations endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn request_series(
        &self,
        series: SeriesId,
        range: &DateRange,
        api_key: Option<&str>,
    ) -> Result<Vec<Observation>, String> {
        let start = range.start().format("%Y-%m-%d").to_string();
        let end = range.end().format("%Y-%m-%d").to_string();

        let mut req = self.client.get(&self.base_url).query(&[("series_id", series.fred_id())]);
        // Without a key FRED still answers, subject to anonymous rate limits.
        if let Some(key) = api_key {
            req = req.query(&[("api_key", key)]);
        }
        req = req.query(&[
            ("file_type", "json"),
            ("observation_start", start.as_str()),
            ("observation_end", end.as_str()),
        ]);

        debug!("fetching {} for {start}..{end}", series.fred_id());

        // `without_url` keeps the api key out of user-facing messages.
        let resp = req
            .send()
            .map_err(|e| format!("FRED request for {} failed: {}", series.fred_id(), e.without_url()))?;

        if !resp.status().is_success() {
            return Err(format!(
                "FRED request for {} failed with status {}.",
                series.fred_id(),
                resp.status()
            ));
        }

        let body = resp
            .text()
            .map_err(|e| format!("Failed to read FRED response for {}: {}", series.fred_id(), e.without_url()))?;

        parse_observations(&body).map_err(|e| format!("{} ({})", e, series.fred_id()))
    }
}

impl SeriesFetcher for FredClient {
    fn fetch_series(&self, series: SeriesId, range: &DateRange, api_key: Option<&str>) -> SeriesFetch {
        match self.request_series(series, range, api_key) {
            Ok(observations) => {
                debug!("{}: {} observations", series.fred_id(), observations.len());
                SeriesFetch::ok(observations)
            }
            Err(message) => {
                warn!("{message}");
                SeriesFetch::failed(message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Option<Vec<RawObservation>>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Decode an observations body into dated values.
///
/// Values that are not numbers (FRED uses `"."` for "no data") become `None`
/// and keep their row. A bad date fails the whole series.
pub fn parse_observations(body: &str) -> Result<Vec<Observation>, String> {
    let parsed: ObservationsResponse =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse FRED response: {e}"))?;

    let raw = parsed
        .observations
        .ok_or_else(|| "FRED response has no observations".to_string())?;

    let mut out = Vec::with_capacity(raw.len());
    for obs in raw {
        let date = NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d")
            .map_err(|e| format!("Invalid FRED date '{}': {e}", obs.date))?;
        let value = match &obs.value {
            serde_json::Value::String(s) => parse_value(s),
            serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            _ => None,
        };
        out.push(Observation::new(date, value));
    }

    Ok(out)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    const SAMPLE_BODY: &str = r#"{"observations":[{"date":"2020-01-01","value":"3.5"},{"date":"2020-02-01","value":"."}]}"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range_2020() -> DateRange {
        DateRange::new(ymd(2020, 1, 1), ymd(2020, 12, 31)).unwrap()
    }

    /// Serve exactly one canned HTTP response on a random local port.
    ///
    /// Returns the endpoint URL and a receiver for the raw request head.
    fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&head).to_string());
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        });

        (format!("http://{addr}/fred/series/observations"), rx)
    }

    #[test]
    fn parse_value_handles_fred_placeholders() {
        assert_eq!(parse_value("3.25"), Some(3.25));
        assert_eq!(parse_value(" 4 "), Some(4.0));
        assert_eq!(parse_value("."), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("n/a"), None);
        assert_eq!(parse_value("inf"), None);
    }

    #[test]
    fn parse_observations_keeps_missing_rows() {
        let obs = parse_observations(SAMPLE_BODY).unwrap();
        assert_eq!(
            obs,
            vec![
                Observation::new(ymd(2020, 1, 1), Some(3.5)),
                Observation::new(ymd(2020, 2, 1), None),
            ]
        );
    }

    #[test]
    fn parse_observations_accepts_numeric_values() {
        let obs = parse_observations(r#"{"observations":[{"date":"2021-04-01","value":2.75}]}"#).unwrap();
        assert_eq!(obs, vec![Observation::new(ymd(2021, 4, 1), Some(2.75))]);
    }

    #[test]
    fn parse_observations_rejects_bad_shapes() {
        assert!(parse_observations(r#"{"error_code":400}"#).is_err());
        assert!(parse_observations("not json").is_err());
        assert!(parse_observations(r#"{"observations":[{"date":"01/02/2020","value":"1"}]}"#).is_err());
    }

    #[test]
    fn fetch_series_parses_successful_response() {
        let (url, requests) = serve_once("200 OK", SAMPLE_BODY);
        let client = FredClient::with_base_url(url).unwrap();

        let fetch = client.fetch_series(SeriesId::Delinquency, &range_2020(), Some("secret"));

        assert_eq!(fetch.warning, None);
        assert_eq!(fetch.observations.len(), 2);
        assert_eq!(fetch.observations[0].value, Some(3.5));
        assert_eq!(fetch.observations[1].date, ymd(2020, 2, 1));
        assert_eq!(fetch.observations[1].value, None);

        let head = requests.recv().unwrap();
        let request_line = head.lines().next().unwrap_or("");
        assert!(request_line.contains("series_id=DRCCLACBS"), "{request_line}");
        assert!(request_line.contains("api_key=secret"), "{request_line}");
        assert!(request_line.contains("file_type=json"), "{request_line}");
        assert!(request_line.contains("observation_start=2020-01-01"), "{request_line}");
        assert!(request_line.contains("observation_end=2020-12-31"), "{request_line}");
    }

    #[test]
    fn fetch_series_without_key_omits_the_parameter() {
        let (url, requests) = serve_once("200 OK", SAMPLE_BODY);
        let client = FredClient::with_base_url(url).unwrap();

        let fetch = client.fetch_series(SeriesId::ChargeOff, &range_2020(), None);
        assert_eq!(fetch.observations.len(), 2);

        let head = requests.recv().unwrap();
        let request_line = head.lines().next().unwrap_or("");
        assert!(request_line.contains("series_id=CORCCACBS"), "{request_line}");
        assert!(!request_line.contains("api_key"), "{request_line}");
    }

    #[test]
    fn fetch_series_non_success_status_is_soft_failure() {
        let (url, _requests) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);
        let client = FredClient::with_base_url(url).unwrap();

        let fetch = client.fetch_series(SeriesId::Delinquency, &range_2020(), Some("secret"));

        assert!(fetch.is_empty());
        let warning = fetch.warning.unwrap();
        assert!(warning.contains("500"), "{warning}");
        assert!(!warning.contains("secret"), "{warning}");
    }

    #[test]
    fn fetch_series_transport_error_is_soft_failure() {
        // Bind then drop to get a port nobody is listening on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let client = FredClient::with_base_url(format!("http://127.0.0.1:{port}/obs")).unwrap();

        let fetch = client.fetch_series(SeriesId::ChargeOff, &range_2020(), Some("secret"));

        assert!(fetch.is_empty());
        let warning = fetch.warning.unwrap();
        assert!(warning.contains("CORCCACBS"), "{warning}");
        assert!(!warning.contains("secret"), "{warning}");
    }
}
