use reqwest::{
	Method,
	header::{HeaderMap, HeaderValue},
};
use serde_json::Value;
use url::Url;

use crate::{
	config::SettingKey,
	error::{ClockifyError, ConfigError},
};

pub static BASE_URL: &str = "https://api.clockify.me/api/v1";

/// A single call against the Clockify API, relative to the base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	pub method: Method,
	/// Path starting with `/`, e.g. `/workspaces`
	pub endpoint: String,
	pub query: Vec<(String, String)>,
	pub body: Option<Value>,
}

impl ApiRequest {
	fn new(method: Method, endpoint: impl Into<String>, body: Option<Value>) -> Self {
		Self {
			method,
			endpoint: endpoint.into(),
			query: Vec::new(),
			body,
		}
	}

	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::GET, endpoint, None)
	}

	pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
		Self::new(Method::POST, endpoint, Some(body))
	}

	pub fn patch(endpoint: impl Into<String>, body: Value) -> Self {
		Self::new(Method::PATCH, endpoint, Some(body))
	}

	pub fn query(mut self, key: &str, value: impl ToString) -> Self {
		self.query.push((key.to_owned(), value.to_string()));
		self
	}

	pub fn query_value(&self, key: &str) -> Option<&str> {
		self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}
}

#[derive(Clone, Debug, Eq, PartialEq, derive_new::new)]
pub struct ApiResponse {
	pub status: u16,
	pub body: String,
}

impl ApiResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Sends requests without interpreting the status; that is [`ClockifyClient`](super::ClockifyClient)'s job.
pub trait Transport {
	fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClockifyError>;
}

impl<T: Transport + ?Sized> Transport for &T {
	fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClockifyError> {
		(**self).send(request)
	}
}

/// Blocking HTTP transport authenticated with an API key.
#[derive(Clone, Debug)]
pub struct HttpTransport {
	client: reqwest::blocking::Client,
	base_url: Url,
}

impl HttpTransport {
	pub fn new(api_key: &str) -> Result<Self, ClockifyError> {
		Self::with_base_url(api_key, BASE_URL)
	}

	pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, ClockifyError> {
		Self::from_client(client_builder(api_key)?.build()?, base_url)
	}

	fn from_client(client: reqwest::blocking::Client, base_url: &str) -> Result<Self, ClockifyError> {
		Ok(Self {
			client,
			base_url: Url::parse(base_url)?,
		})
	}

	fn url_for(&self, request: &ApiRequest) -> Result<Url, ClockifyError> {
		let mut url = Url::parse(&format!("{}{}", self.base_url.as_str().trim_end_matches('/'), request.endpoint))?;
		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}
		Ok(url)
	}
}

impl Transport for HttpTransport {
	fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClockifyError> {
		let url = self.url_for(request)?;
		let mut builder = self.client.request(request.method.clone(), url);
		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let res = builder.send()?;
		let status = res.status().as_u16();
		let body = res.text()?;
		Ok(ApiResponse::new(status, body))
	}
}

fn client_builder(api_key: &str) -> Result<reqwest::blocking::ClientBuilder, ConfigError> {
	Ok(reqwest::blocking::Client::builder().default_headers(make_headers(api_key)?))
}

fn make_headers(api_key: &str) -> Result<HeaderMap, ConfigError> {
	let mut h = HeaderMap::new();
	let mut key = HeaderValue::from_str(api_key).map_err(|_| ConfigError::InvalidValue {
		key: SettingKey::ClockifyApiKey,
		reason: "not usable as an HTTP header value".to_owned(),
	})?;
	key.set_sensitive(true);
	h.insert("X-Api-Key", key);
	h.insert(reqwest::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
	Ok(h)
}
