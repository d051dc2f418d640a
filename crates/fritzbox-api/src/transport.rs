// Transport: form encoding, multipart bodies and the blocking HTTP client.
//
// Every request carries the session id as its first field when a session
// is active. The legacy firmware has no direct routes for its `../html/`
// pages; those are tunnelled through `/cgi-bin/webcm?getpage=...`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, LoginMethod, SessionId};
use crate::decode::scrape::error_message;
use crate::error::Error;

const WEBCM: &str = "/cgi-bin/webcm";

// ── Form ─────────────────────────────────────────────────────────────

/// Ordered form fields. The router cares about field order, so this is a
/// list rather than a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (builder style).
    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl ToString) {
        self.fields.push((name.into(), value.to_string()));
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy of this form with `name=value` in front.
    fn prepend(&self, name: &str, value: &str) -> Self {
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        fields.push((name.to_owned(), value.to_owned()));
        fields.extend(self.fields.iter().cloned());
        Self { fields }
    }

    /// `application/x-www-form-urlencoded` encoding with `sid` first.
    pub fn encode(&self, sid: &SessionId) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        if !sid.is_none() {
            ser.append_pair("sid", sid.as_str());
        }
        for (name, value) in self.iter() {
            ser.append_pair(name, value);
        }
        ser.finish()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Form {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (k, v) in iter {
            form.push(k, v);
        }
        form
    }
}

// ── Multipart ────────────────────────────────────────────────────────

/// A file to upload in a multipart request.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name.
    pub name: String,
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// A fresh boundary token for one multipart request.
pub fn multipart_boundary() -> String {
    format!("-------------{}", uuid::Uuid::new_v4().simple())
}

/// Build a `multipart/form-data` body: `sid` first, then the plain fields,
/// then the files, then the closing boundary.
pub fn multipart_body(
    boundary: &str,
    sid: &SessionId,
    fields: &Form,
    files: &[FilePart],
) -> Vec<u8> {
    let mut body = Vec::new();
    let fields = if sid.is_none() {
        fields.clone()
    } else {
        fields.prepend("sid", sid.as_str())
    };

    for (name, value) in fields.iter() {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                urlencode(name)
            )
            .as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for file in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                urlencode(&file.name),
                file.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        body.extend_from_slice(&file.content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn urlencode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

// ── Transport trait ──────────────────────────────────────────────────

/// The three request shapes the web UI needs.
///
/// The session id is owned by [`Session`](crate::Session) and passed in
/// on every call; a transport never stores or changes it.
pub trait Transport {
    /// GET `path` with query parameters, returning the raw body.
    fn get(&self, sid: &SessionId, path: &str, params: &Form) -> Result<String, Error>;

    /// POST url-encoded `fields` to `path`, returning the raw body.
    fn post(&self, sid: &SessionId, path: &str, fields: &Form) -> Result<String, Error>;

    /// POST a multipart body. An `ErrorMsg` paragraph in the answer is
    /// raised as [`Error::Application`].
    fn post_multipart(
        &self,
        sid: &SessionId,
        path: &str,
        fields: &Form,
        files: &[FilePart],
    ) -> Result<String, Error>;
}

// ── Endpoint ─────────────────────────────────────────────────────────

/// Where the router lives and which login page it speaks.
#[derive(Debug, Clone)]
pub struct Endpoint {
    host: String,
    base_url: Url,
    login_method: LoginMethod,
}

impl Endpoint {
    /// `https://{host}` in remote mode, `http://{host}` on the local network.
    pub fn new(host: &str, remote: bool, login_method: LoginMethod) -> Result<Self, Error> {
        let scheme = if remote { "https" } else { "http" };
        let base_url = Url::parse(&format!("{scheme}://{host}"))?;
        Ok(Self {
            host: host.to_owned(),
            base_url,
            login_method,
        })
    }

    /// Use an explicit base URL (e.g. a test server).
    pub fn with_base_url(base_url: Url, login_method: LoginMethod) -> Self {
        let host = base_url.host_str().unwrap_or_default().to_owned();
        Self {
            host,
            base_url,
            login_method,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn login_method(&self) -> LoginMethod {
        self.login_method
    }

    /// Resolve a page path to a request URL plus the fields to send.
    ///
    /// Legacy `../html/` pages go through `webcm` with a `getpage` field.
    fn route(&self, path: &str, form: &Form) -> Result<(Url, Form), Error> {
        if self.login_method == LoginMethod::LegacyXml && path.starts_with("../") {
            let url = self.base_url.join(WEBCM)?;
            return Ok((url, form.prepend("getpage", path)));
        }
        Ok((self.base_url.join(path)?, form.clone()))
    }
}

/// Path of the certificate pinned for a remote host: the host name
/// without port, under `cert_dir`.
pub fn pinned_cert_path(cert_dir: &Path, host: &str) -> PathBuf {
    let name = host.split(':').next().unwrap_or(host);
    cert_dir.join(format!("{name}.pem"))
}

// ── HttpTransport ────────────────────────────────────────────────────

/// Tuning for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Directory holding `<host>.pem` certificates for remote mode.
    pub cert_dir: PathBuf,
    /// Log every GET URL (including the query) before sending it.
    pub log_requests: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cert_dir: PathBuf::from("/etc/ssl/certs"),
            log_requests: false,
        }
    }
}

/// Blocking `reqwest` transport.
///
/// In remote mode GET requests skip certificate verification while POST
/// requests verify against the pinned `<host>.pem`. This mirrors what
/// the router's own scripts have always done.
pub struct HttpTransport {
    endpoint: Endpoint,
    get_client: Client,
    post_client: Client,
    basic_auth: Option<(String, String)>,
    log_requests: bool,
}

impl HttpTransport {
    pub fn new(
        endpoint: Endpoint,
        credentials: &Credentials,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let remote = credentials.remote_enabled;
        let get_client = build_client(config, remote.then_some(TlsPolicy::AcceptInvalid))?;
        let post_client = if remote {
            let cert = pinned_cert_path(&config.cert_dir, endpoint.host());
            build_client(config, Some(TlsPolicy::Pinned(cert)))?
        } else {
            build_client(config, None)?
        };
        if remote {
            warn!("remote mode: GET requests do not verify the router certificate");
        }

        let basic_auth = credentials
            .basic_auth(endpoint.login_method())
            .map(|(u, p)| (u.to_owned(), p.to_owned()));

        Ok(Self {
            endpoint,
            get_client,
            post_client,
            basic_auth,
            log_requests: config.log_requests,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.basic_auth {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }
}

enum TlsPolicy {
    AcceptInvalid,
    Pinned(PathBuf),
}

fn build_client(config: &TransportConfig, tls: Option<TlsPolicy>) -> Result<Client, Error> {
    let mut builder = Client::builder()
        .timeout(config.timeout)
        .user_agent(concat!("fritzbox-api/", env!("CARGO_PKG_VERSION")));

    match tls {
        None => {}
        Some(TlsPolicy::AcceptInvalid) => {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Some(TlsPolicy::Pinned(path)) => {
            let cert_pem = std::fs::read(&path).map_err(|e| {
                Error::Tls(format!(
                    "failed to read pinned certificate {}: {e}",
                    path.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid pinned certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }
    }

    builder
        .build()
        .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
}

fn read_body(resp: Response) -> Result<String, Error> {
    Ok(resp.error_for_status()?.text()?)
}

impl Transport for HttpTransport {
    fn get(&self, sid: &SessionId, path: &str, params: &Form) -> Result<String, Error> {
        let (mut url, params) = self.endpoint.route(path, params)?;
        let query = params.encode(sid);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        if self.log_requests {
            info!("{url}");
        }
        debug!("GET {path}");

        let resp = self.authorize(self.get_client.get(url)).send()?;
        read_body(resp)
    }

    fn post(&self, sid: &SessionId, path: &str, fields: &Form) -> Result<String, Error> {
        let (url, fields) = self.endpoint.route(path, fields)?;
        debug!("POST {path}");

        let builder = self
            .post_client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(fields.encode(sid));
        let resp = self.authorize(builder).send()?;
        read_body(resp)
    }

    fn post_multipart(
        &self,
        sid: &SessionId,
        path: &str,
        fields: &Form,
        files: &[FilePart],
    ) -> Result<String, Error> {
        let (url, fields) = self.endpoint.route(path, fields)?;
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, sid, &fields, files);
        debug!(files = files.len(), "POST multipart {path}");

        let builder = self
            .post_client
            .post(url)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(body);
        let output = read_body(self.authorize(builder).send()?)?;

        if let Some(message) = error_message(&output) {
            return Err(Error::Application { message });
        }
        Ok(output)
    }
}
