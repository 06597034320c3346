use super::Client;
use crate::config::FetchConfig;
use crate::error::{ClientError, Result};
use http::{
    header::{HeaderMap, HeaderName, USER_AGENT},
    HeaderValue,
};
use rquest::{Client as RquestClient, Impersonate, Proxy};
use std::str::FromStr;
use std::time::Duration;

#[derive(Default)]
pub struct ClientBuilder {
    proxy: Option<String>,
    timeout: Option<Duration>,
    chrome_impersonation: bool,
    max_retries: u32,
    retry_delay: Duration,
    headers: HeaderMap,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            ..Default::default()
        }
    }

    /// Seeds a builder from the `[fetch]` config section.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let mut builder = Self::new()
            .user_agent(&config.user_agent)?
            .header("accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")?
            .header("accept-language", "en-US,en;q=0.7")?
            .timeout(config.timeout())
            .chrome_impersonation(config.chrome_impersonation)
            .retries(config.max_retries, config.retry_delay());

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(proxy);
        }

        Ok(builder)
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn chrome_impersonation(mut self, enabled: bool) -> Self {
        self.chrome_impersonation = enabled;
        self
    }

    pub fn retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn user_agent(self, value: impl AsRef<str>) -> Result<Self> {
        self.header(USER_AGENT.as_str(), value)
    }

    pub fn header<K, V>(mut self, key: K, value: V) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let header_name = HeaderName::from_str(key.as_ref())
            .map_err(|e| ClientError::BuildError(format!("Invalid header name: {}", e)))?;

        let header_value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| ClientError::BuildError(format!("Invalid header value: {}", e)))?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn build(self) -> Result<Client> {
        let mut client_builder = RquestClient::builder();

        if let Some(proxy_url) = self.proxy {
            client_builder = client_builder.proxy(Proxy::all(&proxy_url).map_err(|e| {
                ClientError::BuildError(format!("Failed to configure proxy: {}", e))
            })?);
        }

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if self.chrome_impersonation {
            client_builder = client_builder.impersonate(Impersonate::Chrome131);
        }

        let mut inner = client_builder
            .build()
            .map_err(|e| ClientError::BuildError(format!("Failed to build client: {}", e)))?;

        // Impersonation installs its own defaults; ours replace them wholesale.
        *inner.as_mut().headers() = self.headers;

        Ok(Client {
            inner,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn rejects_invalid_header_name() {
        let result = ClientBuilder::new().header("bad header", "x");
        assert!(matches!(
            result,
            Err(AppError::Client(ClientError::BuildError(_)))
        ));
    }

    #[test]
    fn rejects_invalid_header_value() {
        let result = ClientBuilder::new().user_agent("line\nbreak");
        assert!(matches!(
            result,
            Err(AppError::Client(ClientError::BuildError(_)))
        ));
    }

    #[test]
    fn seeds_from_config() {
        let config = FetchConfig {
            max_retries: 4,
            ..FetchConfig::default()
        };
        let builder = ClientBuilder::from_config(&config).unwrap();
        assert_eq!(builder.max_retries, 4);
        assert_eq!(builder.timeout, Some(Duration::from_secs(40)));
        assert!(builder.headers.contains_key(USER_AGENT));
    }
}
