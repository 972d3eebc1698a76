use std::rc::Rc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::core::retry::{RetryPolicy, Sleeper};
use crate::error::{MigrateError, Result};
use crate::models::Credential;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

/// 플랫폼 API로 보내는 요청 하나. 인증 헤더는 Transport가 붙인다.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(Method::Post, url)
        }
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value of the first query parameter named `key`.
    #[cfg(test)]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 요청 한 번을 보내고 응답을 받는다. 재시도는 하지 않는다.
/// 연결 실패는 `MigrateError::Transport { status: None, .. }`로 반환한다.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// blocking reqwest 기반 Transport. 생성 시 받은 자격증명을 소유한다.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    credential: Credential,
}

impl ReqwestTransport {
    pub fn new(credential: Credential, timeout: Duration) -> Result<Self> {
        if credential.is_empty() {
            return Err(MigrateError::InvalidArgument(
                "bearer token is required".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, credential })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .bearer_auth(self.credential.expose())
            .query(&request.query);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().map_err(|e| MigrateError::network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| MigrateError::network(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

/// Both Spotify and Google wrap failures as `{"error": {"message": ...}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

/// 플랫폼 클라이언트를 만들 때 공통으로 쓰는 설정.
#[derive(Clone)]
pub struct ClientOptions {
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub sleeper: Rc<dyn Sleeper>,
}

/// Transport 위에 재시도 정책과 JSON 디코딩을 얹은 클라이언트.
pub struct ApiClient {
    transport: Box<dyn Transport>,
    retry: RetryPolicy,
    sleeper: Rc<dyn Sleeper>,
}

impl ApiClient {
    pub fn new(
        transport: impl Transport + 'static,
        retry: RetryPolicy,
        sleeper: Rc<dyn Sleeper>,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            retry,
            sleeper,
        }
    }

    /// reqwest Transport로 연결된 클라이언트를 만든다.
    pub fn connect(credential: Credential, options: &ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::new(credential, options.timeout)?;
        Ok(Self::new(
            transport,
            options.retry.clone(),
            options.sleeper.clone(),
        ))
    }

    /// 2xx가 아닌 응답은 오류로 바꾸고, 재시도 가능한 오류는 정책에 따라 다시 보낸다.
    pub fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.retry.run(self.sleeper.as_ref(), || {
            debug!(method = ?request.method, url = %request.url, "http.request");
            let resp = self.transport.send(request)?;
            if resp.is_success() {
                Ok(resp)
            } else {
                Err(MigrateError::http(resp.status, error_message(&resp.body)))
            }
        })
    }

    pub fn json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let resp = self.execute(request)?;
        serde_json::from_str(&resp.body).map_err(|e| {
            MigrateError::Decode(format!("{} {}: {e}", method_name(request.method), request.url))
        })
    }
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Put => "PUT",
    }
}
