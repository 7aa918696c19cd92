//! Transaction types for the attendance ledger
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Free-form attestation data. Sorted keys keep its serialization stable.
pub type Metadata = BTreeMap<String, Value>;

/// Largest magnitude, in tenths, accepted for an amount. Below 2^51 tenths the
/// one-digit decimal form survives a trip through an `f64` unchanged.
pub const MAX_AMOUNT_TENTHS: i64 = 1 << 51;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AmountError {
    #[error("amount must be a finite number")]
    NotFinite,
    #[error("amount {0} is out of range")]
    OutOfRange(f64),
}

/// A quantity with one fractional digit, stored as a whole number of tenths.
///
/// Serialized as a JSON number (`12.5`). An incoming number is rounded the way
/// `format!("{:.1}")` rounds it: from its exact binary value, ties to even, so
/// `0.25` becomes `0.2` and `0.35` (really `0.34999...`) becomes `0.3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_tenths(tenths: i64) -> Self {
        Amount(tenths)
    }

    pub fn from_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if (value * 10.0).abs() > MAX_AMOUNT_TENTHS as f64 {
            return Err(AmountError::OutOfRange(value));
        }

        let formatted = format!("{:.1}", value);
        let (negative, digits) = match formatted.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, formatted.as_str()),
        };
        let (whole, fraction) = digits
            .split_once('.')
            .ok_or(AmountError::OutOfRange(value))?;
        let whole: i64 = whole.parse().map_err(|_| AmountError::OutOfRange(value))?;
        let fraction: i64 = fraction.parse().map_err(|_| AmountError::OutOfRange(value))?;

        let tenths = whole * 10 + fraction;
        if tenths > MAX_AMOUNT_TENTHS {
            return Err(AmountError::OutOfRange(value));
        }
        Ok(Amount(if negative { -tenths } else { tenths }))
    }

    pub fn tenths(&self) -> i64 {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Amount {
    /// Always exactly one fractional digit, e.g. `0.0`, `12.5`, `-3.1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::from_f64(value).map_err(serde::de::Error::custom)
    }
}

/// A ledger entry. Immutable once built; `signature` and `public_key` may be empty.
///
/// The serde form is the persisted transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
    /// Hex of the compact ECDSA signature over [`Transaction::canonical_signed_payload`].
    #[serde(default)]
    pub signature: String,
    /// PEM-encoded verifying key.
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Exactly the signed fields, declared in sorted key order.
#[derive(Serialize)]
struct SignedPayload<'a> {
    amount: String,
    recipient: &'a str,
    sender: &'a str,
}

/// Full transaction record as hashed inside a block, declared in sorted key order.
#[derive(Serialize)]
struct ContentRecord<'a> {
    amount: Amount,
    metadata: &'a Metadata,
    public_key: &'a str,
    recipient: &'a str,
    sender: &'a str,
    signature: &'a str,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: Amount) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            signature: String::new(),
            public_key: String::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>, public_key: impl Into<String>) -> Self {
        self.signature = signature.into();
        self.public_key = public_key.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The byte string that gets signed: compact JSON of sender, recipient and
    /// the amount as a one-digit decimal string, keys sorted.
    ///
    /// `{"amount":"12.5","recipient":"bob","sender":"alice"}`
    pub fn canonical_signed_payload(&self) -> String {
        let payload = SignedPayload {
            amount: self.amount.to_string(),
            recipient: &self.recipient,
            sender: &self.sender,
        };
        // Strings and a sorted struct cannot fail to serialize.
        serde_json::to_string(&payload).unwrap_or_default()
    }

    /// The full record (signature, key and metadata included) as a JSON value with
    /// sorted keys. This is what a block hashes.
    pub fn content_record(&self) -> Value {
        let record = ContentRecord {
            amount: self.amount,
            metadata: &self.metadata,
            public_key: &self.public_key,
            recipient: &self.recipient,
            sender: &self.sender,
            signature: &self.signature,
        };
        serde_json::to_value(record).unwrap_or(Value::Null)
    }
}
