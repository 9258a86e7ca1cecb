use crate::error::{Error, Result, ValidationError};
use http::Uri;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime};

/// Upper bound on how far in the future `exp` may lie (RFC8292 section 2).
pub const MAX_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Unvalidated claims as supplied by a caller.
pub type RawClaims = Map<String, Value>;

/// Validated VAPID claims.
///
/// Fields other than `aud`, `sub` and `exp` are carried along untouched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Claims {
    aud: String,
    sub: String,
    exp: u64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Claims {
    pub fn aud(&self) -> &str {
        &self.aud
    }

    pub fn sub(&self) -> &str {
        &self.sub
    }

    /// Expiration as Unix seconds.
    pub fn exp(&self) -> u64 {
        self.exp
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Returns all claims as one flat JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = self.extra;
        map.insert("aud".into(), Value::from(self.aud));
        map.insert("sub".into(), Value::from(self.sub));
        map.insert("exp".into(), Value::from(self.exp));
        map
    }

    /// Rebuilds claims from a verified token payload. The stored `exp` is
    /// authoritative; only its expiry against `now` is checked.
    pub(crate) fn recover(mut payload: Map<String, Value>, now: u64) -> Result<Self> {
        let aud = take_string(&mut payload, "aud")
            .ok_or(Error::MalformedToken("payload lacks a string \"aud\""))?;
        let sub = take_string(&mut payload, "sub")
            .ok_or(Error::MalformedToken("payload lacks a string \"sub\""))?;
        let exp = payload
            .remove("exp")
            .as_ref()
            .and_then(numeric_exp)
            .ok_or(Error::MalformedToken("payload lacks a numeric \"exp\""))?;

        if exp < i128::from(now) {
            return Err(ValidationError::ExpiredClaim { exp, now }.into());
        }
        let exp = u64::try_from(exp)
            .map_err(|_| Error::MalformedToken("\"exp\" exceeds the 64-bit range"))?;

        Ok(Self {
            aud,
            sub,
            exp,
            extra: payload,
        })
    }
}

/// What to do with an `exp` beyond [`MAX_EXPIRATION`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// Fail with [`ValidationError::ExcessiveExpiration`].
    #[default]
    Reject,
    /// Lower `exp` to the latest permitted value.
    Clamp,
}

/// Checks and normalizes claims according to RFC8292.
#[derive(Clone, Debug)]
pub struct ClaimsValidator {
    policy: ExpirationPolicy,
    valid_duration: Duration,
}

impl Default for ClaimsValidator {
    fn default() -> Self {
        Self {
            policy: ExpirationPolicy::Reject,
            valid_duration: MAX_EXPIRATION,
        }
    }
}

impl ClaimsValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how an `exp` past the 24 hour ceiling is handled.
    pub fn with_expiration_policy(self, policy: ExpirationPolicy) -> Self {
        let mut this = self;
        this.policy = policy;
        this
    }

    /// Sets the lifetime given to claims without `exp`. Durations above
    /// [`MAX_EXPIRATION`] are lowered to it.
    pub fn with_valid_duration(self, valid_duration: Duration) -> Self {
        let mut this = self;
        this.valid_duration = valid_duration.min(MAX_EXPIRATION);
        this
    }

    pub fn expiration_policy(&self) -> ExpirationPolicy {
        self.policy
    }

    /// Validates `raw` against the current time, reporting the first failure.
    pub fn validate(&self, raw: &RawClaims) -> std::result::Result<Claims, ValidationError> {
        self.validate_at(raw, unix_now())
    }

    /// Validates `raw` as of `now` (Unix seconds), reporting the first
    /// failure in the order `aud`, `sub`, `exp`.
    pub fn validate_at(
        &self,
        raw: &RawClaims,
        now: u64,
    ) -> std::result::Result<Claims, ValidationError> {
        let (aud, sub, exp) = self.check_fields(raw, now);
        Ok(Claims {
            aud: aud?,
            sub: sub?,
            exp: exp?,
            extra: extra_claims(raw),
        })
    }

    /// Validates `raw` against the current time, reporting every failure.
    pub fn validate_all(&self, raw: &RawClaims) -> std::result::Result<Claims, Vec<ValidationError>> {
        self.validate_all_at(raw, unix_now())
    }

    pub fn validate_all_at(
        &self,
        raw: &RawClaims,
        now: u64,
    ) -> std::result::Result<Claims, Vec<ValidationError>> {
        match self.check_fields(raw, now) {
            (Ok(aud), Ok(sub), Ok(exp)) => Ok(Claims {
                aud,
                sub,
                exp,
                extra: extra_claims(raw),
            }),
            (aud, sub, exp) => Err([aud.err(), sub.err(), exp.err()]
                .into_iter()
                .flatten()
                .collect()),
        }
    }

    fn check_fields(
        &self,
        raw: &RawClaims,
        now: u64,
    ) -> (
        std::result::Result<String, ValidationError>,
        std::result::Result<String, ValidationError>,
        std::result::Result<u64, ValidationError>,
    ) {
        (
            check_audience(raw.get("aud")),
            check_subscriber(raw.get("sub")),
            self.check_expiration(raw.get("exp"), now),
        )
    }

    fn check_expiration(
        &self,
        exp: Option<&Value>,
        now: u64,
    ) -> std::result::Result<u64, ValidationError> {
        let limit = now.saturating_add(MAX_EXPIRATION.as_secs());
        let exp = match exp.and_then(numeric_exp) {
            Some(exp) => exp,
            None => return Ok(now.saturating_add(self.valid_duration.as_secs())),
        };

        if exp < i128::from(now) {
            Err(ValidationError::ExpiredClaim { exp, now })
        } else if exp > i128::from(limit) {
            match self.policy {
                ExpirationPolicy::Reject => Err(ValidationError::ExcessiveExpiration { exp, limit }),
                ExpirationPolicy::Clamp => Ok(limit),
            }
        } else {
            Ok(exp as u64)
        }
    }
}

/// Derives the `aud` claim, the origin of a push service, from a
/// subscription endpoint.
pub fn audience_from_endpoint(endpoint: &Uri) -> Result<String> {
    let invalid = || ValidationError::InvalidAudience(endpoint.to_string());
    let scheme = endpoint.scheme_str().ok_or_else(invalid)?;
    let host = endpoint.host().ok_or_else(invalid)?;
    let audience = match endpoint.port_u16() {
        Some(port) => format!("{}://{}:{}", scheme, host, port),
        None => format!("{}://{}", scheme, host),
    };

    if !is_http_origin(&audience) {
        return Err(invalid().into());
    }
    Ok(audience)
}

fn check_audience(aud: Option<&Value>) -> std::result::Result<String, ValidationError> {
    match aud {
        Some(Value::String(aud)) if is_http_origin(aud) => Ok(aud.clone()),
        other => Err(ValidationError::InvalidAudience(describe(other))),
    }
}

fn check_subscriber(sub: Option<&Value>) -> std::result::Result<String, ValidationError> {
    match sub {
        Some(Value::String(sub)) if is_contact(sub) => Ok(sub.clone()),
        other => Err(ValidationError::InvalidSubscriber(describe(other))),
    }
}

fn is_http_origin(value: &str) -> bool {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return false;
    }
    value
        .parse::<Uri>()
        .map(|uri| uri.host().map_or(false, |host| !host.is_empty()))
        .unwrap_or(false)
}

fn is_contact(value: &str) -> bool {
    if let Some(address) = value.strip_prefix("mailto:") {
        // `.+@.+`: any `@` with at least one character on either side.
        address
            .char_indices()
            .any(|(i, c)| c == '@' && i > 0 && i + 1 < address.len())
    } else {
        value.starts_with("https://") && is_http_origin(value)
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
    }
}

/// Reads `exp` as a JSON number or a decimal string. Widened to `i128` so
/// every `u64` and negative `i64` value survives unchanged.
pub(crate) fn numeric_exp(value: &Value) -> Option<i128> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(i128::from)
            .or_else(|| number.as_i64().map(i128::from))
            .or_else(|| number.as_f64().filter(|exp| exp.is_finite()).map(|exp| exp as i128)),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }
}

fn extra_claims(raw: &RawClaims) -> Map<String, Value> {
    raw.iter()
        .filter(|(key, _)| !matches!(key.as_str(), "aud" | "sub" | "exp"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn take_string(payload: &mut Map<String, Value>, key: &str) -> Option<String> {
    match payload.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
