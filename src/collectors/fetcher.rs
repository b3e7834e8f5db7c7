use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Blocking JSON-over-HTTP GET. Implemented by [`HttpFetcher`] and by stubs in tests.
pub trait Fetcher: Send + Sync {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        (**self).get_json(url, query)
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("channel-pulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self.client.get(url).query(query).send()?;
        let status = response.status();
        let body = response.text()?;
        parse_response(status, &body)
    }
}

/// Server errors and rate limiting are transient and map to `Error::Network`.
/// Otherwise both platforms put error details in a JSON body, so a parseable
/// body is handed back even for other non-2xx statuses.
fn parse_response(status: StatusCode, body: &str) -> Result<Value> {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::Network(format!("HTTP status {}", status)));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(json) => Ok(json),
        Err(_) if !status.is_success() => {
            Err(Error::api("HTTP", format!("status {}", status)))
        }
        Err(e) => Err(Error::Parse(format!("Response is not JSON: {}", e))),
    }
}

#[cfg(test)]
pub mod stub {
    use super::*;
    use std::sync::Mutex;

    enum Reply {
        Json(Value),
        NetworkDown,
    }

    struct Route {
        suffix: String,
        param: Option<(String, String)>,
        reply: Reply,
    }

    impl Route {
        fn matches(&self, url: &str, query: &[(&str, &str)]) -> bool {
            url.ends_with(self.suffix.as_str())
                && match &self.param {
                    Some((key, value)) => query.iter().any(|(k, v)| *k == key.as_str() && *v == value.as_str()),
                    None => true,
                }
        }
    }

    /// Answers requests whose URL ends with a registered suffix. Routes bound
    /// to a query parameter win over plain ones.
    #[derive(Default)]
    pub struct StubFetcher {
        routes: Vec<Route>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, suffix: &str, body: Value) -> Self {
            self.routes.push(Route { suffix: suffix.to_string(), param: None, reply: Reply::Json(body) });
            self
        }

        pub fn route_param(mut self, suffix: &str, key: &str, value: &str, body: Value) -> Self {
            self.routes.push(Route {
                suffix: suffix.to_string(),
                param: Some((key.to_string(), value.to_string())),
                reply: Reply::Json(body),
            });
            self
        }

        pub fn fail(mut self, suffix: &str) -> Self {
            self.routes.push(Route { suffix: suffix.to_string(), param: None, reply: Reply::NetworkDown });
            self
        }

        pub fn calls_to(&self, suffix: &str) -> Vec<Vec<(String, String)>> {
            self.calls.lock().unwrap().iter()
                .filter(|(url, _)| url.ends_with(suffix))
                .map(|(_, q)| q.clone())
                .collect()
        }
    }

    impl Fetcher for StubFetcher {
        fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ));

            let route = self.routes.iter()
                .filter(|r| r.param.is_some())
                .chain(self.routes.iter().filter(|r| r.param.is_none()))
                .find(|r| r.matches(url, query));

            match route.map(|r| &r.reply) {
                Some(Reply::Json(body)) => Ok(body.clone()),
                Some(Reply::NetworkDown) => Err(Error::Network("connection refused".to_string())),
                None => Err(Error::Network(format!("no route for {}", url))),
            }
        }
    }
}
