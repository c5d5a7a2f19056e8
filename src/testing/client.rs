use reqwest::{
    Method, RequestBuilder,
    header::{AUTHORIZATION, HeaderValue, InvalidHeaderValue},
};

/// Stamps an `Authorization` header onto outgoing requests.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
    header: HeaderValue,
}

impl BearerAuth {
    pub fn new(scheme: &str, token: impl Into<String>) -> Result<Self, InvalidHeaderValue> {
        let token = token.into();
        let mut header = HeaderValue::from_str(&format!("{scheme} {token}"))?;
        header.set_sensitive(true);
        Ok(Self { token, header })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.header.clone())
    }
}

/// HTTP client bound to a [`TestHost`](super::TestHost). Paths are relative
/// to the API base, e.g. `client.get("/todos")`.
#[derive(Debug, Clone)]
pub struct TestClient {
    http: reqwest::Client,
    base_url: String,
    auth: Option<BearerAuth>,
}

impl TestClient {
    pub(crate) fn new(http: reqwest::Client, base_url: String, auth: Option<BearerAuth>) -> Self {
        Self {
            http,
            base_url,
            auth,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().map(BearerAuth::token)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, self.url(path));
        match &self.auth {
            Some(auth) => auth.intercept(request),
            None => request,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }
}
