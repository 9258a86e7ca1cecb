use crate::error::{Error, Result};
use crate::key::PublicKey;
use http::{header, HeaderMap, HeaderName, HeaderValue};

/// Name of the legacy header carrying the VAPID public key.
pub const CRYPTO_KEY: HeaderName = HeaderName::from_static("crypto-key");

const AUTHORIZATION_LABEL: &str = "authorization:";
const P256ECDSA: &str = "p256ecdsa";

/// How a token and public key are laid out in HTTP headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderStyle {
    /// `Authorization: WebPush <token>` plus `Crypto-Key: p256ecdsa=<key>`,
    /// as used by earlier VAPID drafts.
    Split,
    /// `Authorization: vapid t=<token>, k=<key>` (RFC8292).
    #[default]
    Combined,
}

/// Header values identifying a push sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VapidHeaders {
    pub authorization: String,
    pub crypto_key: Option<String>,
}

impl VapidHeaders {
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let authorization = HeaderValue::from_str(&self.authorization)
            .map_err(|_| Error::MalformedToken("authorization is not a valid header value"))?;
        headers.insert(header::AUTHORIZATION, authorization);

        if let Some(crypto_key) = &self.crypto_key {
            let crypto_key = HeaderValue::from_str(crypto_key)
                .map_err(|_| Error::MalformedKey("crypto-key is not a valid header value"))?;
            headers.insert(CRYPTO_KEY, crypto_key);
        }

        Ok(headers)
    }
}

/// Attaches authentication headers to an outgoing HTTP request.
pub trait AddHeaders {
    type Error: Into<Box<dyn std::error::Error + Sync + Send + 'static>>;

    fn add_headers(
        &self,
        builder: http::request::Builder,
    ) -> std::result::Result<http::request::Builder, Self::Error>;
}

impl AddHeaders for VapidHeaders {
    type Error = std::convert::Infallible;

    fn add_headers(
        &self,
        builder: http::request::Builder,
    ) -> std::result::Result<http::request::Builder, Self::Error> {
        let builder = builder.header(header::AUTHORIZATION, self.authorization.as_str());
        Ok(match &self.crypto_key {
            Some(crypto_key) => builder.header(CRYPTO_KEY, crypto_key.as_str()),
            None => builder,
        })
    }
}

/// Formats a signed token and its public key into [`VapidHeaders`].
#[derive(Clone, Debug, Default)]
pub struct HeaderBuilder {
    style: HeaderStyle,
    crypto_key: Option<String>,
}

impl HeaderBuilder {
    pub fn new(style: HeaderStyle) -> Self {
        Self {
            style,
            crypto_key: None,
        }
    }

    pub fn with_style(self, style: HeaderStyle) -> Self {
        let mut this = self;
        this.style = style;
        this
    }

    /// Sets prior `Crypto-Key` content (e.g. a `dh=` entry) that the VAPID
    /// key is appended to.
    pub fn with_crypto_key<T: Into<String>>(self, crypto_key: T) -> Self {
        let mut this = self;
        this.crypto_key = Some(crypto_key.into()).filter(|it| !it.trim().is_empty());
        this
    }

    pub fn style(&self) -> HeaderStyle {
        self.style
    }

    pub fn build(&self, token: &str, public_key: &PublicKey) -> Result<VapidHeaders> {
        if token.split('.').count() != 3 || token.split('.').any(str::is_empty) {
            return Err(Error::MalformedToken("expected three non-empty segments"));
        }
        let key = public_key.to_base64();

        Ok(match self.style {
            HeaderStyle::Split => VapidHeaders {
                authorization: format!("WebPush {}", token),
                crypto_key: Some(match &self.crypto_key {
                    Some(prior) => format!("{},{}={}", prior, P256ECDSA, key),
                    None => format!("{}={}", P256ECDSA, key),
                }),
            },
            HeaderStyle::Combined => VapidHeaders {
                authorization: format!("vapid t={}, k={}", token, key),
                crypto_key: self.crypto_key.clone(),
            },
        })
    }
}

/// Extracts the token and public key from an `Authorization` header value
/// and, for the `WebPush` scheme, the accompanying `Crypto-Key` value.
///
/// A leading `Authorization:` label is ignored.
pub fn parse_authorization(
    authorization: &str,
    crypto_key: Option<&str>,
) -> Result<(String, PublicKey)> {
    let value = authorization.trim();
    let value = match value.get(..AUTHORIZATION_LABEL.len()) {
        Some(label) if label.eq_ignore_ascii_case(AUTHORIZATION_LABEL) => {
            value[AUTHORIZATION_LABEL.len()..].trim_start()
        }
        _ => value,
    };
    let (scheme, params) = value
        .split_once(char::is_whitespace)
        .ok_or(Error::MalformedToken("missing authorization scheme"))?;
    let params = params.trim();

    match scheme.to_ascii_lowercase().as_str() {
        "vapid" => {
            let (mut token, mut key) = (None, None);
            for param in params.split(',') {
                let (name, value) = param
                    .split_once('=')
                    .ok_or(Error::MalformedToken("malformed vapid parameter"))?;
                match name.trim().to_ascii_lowercase().as_str() {
                    "t" => token = Some(value.trim()),
                    "k" => key = Some(value.trim()),
                    _ => {}
                }
            }
            let token = token.ok_or(Error::MalformedToken("missing t= parameter"))?;
            let key = key.ok_or(Error::MalformedKey("missing k= parameter"))?;
            Ok((token.to_owned(), PublicKey::from_base64(key)?))
        }
        "webpush" | "bearer" => {
            let key = crypto_key
                .and_then(find_p256ecdsa)
                .ok_or(Error::MalformedKey("missing p256ecdsa= in Crypto-Key"))?;
            Ok((params.to_owned(), PublicKey::from_base64(key)?))
        }
        _ => Err(Error::MalformedToken("unknown authorization scheme")),
    }
}

/// Like [`parse_authorization`], reading both headers from `headers`.
pub fn parse_header_map(headers: &HeaderMap) -> Result<(String, PublicKey)> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .ok_or(Error::MalformedToken("missing Authorization header"))?
        .to_str()
        .map_err(|_| Error::MalformedToken("Authorization header is not visible ASCII"))?;
    let crypto_key = headers
        .get(CRYPTO_KEY)
        .and_then(|value| value.to_str().ok());

    parse_authorization(authorization, crypto_key)
}

fn find_p256ecdsa(crypto_key: &str) -> Option<&str> {
    crypto_key
        .split(|c| c == ',' || c == ';')
        .filter_map(|entry| entry.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(P256ECDSA))
        .map(|(_, value)| value.trim())
}
