use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{FingerprintError, Result};

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 16;

/// Placeholder for hints the browser does not expose.
const UNKNOWN: &str = "unknown";

/// Attributes a client reports about its device.
///
/// `hardware_concurrency` and `device_memory_gb` are optional browser hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    pub user_agent: String,
    pub language: String,
    /// Minutes offset from UTC as reported by the client (UTC+1 is `-60`).
    pub timezone_offset_minutes: i32,
    pub hardware_concurrency: Option<u32>,
    pub device_memory_gb: Option<f64>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
}

impl DeviceAttributes {
    pub fn new(
        user_agent: impl Into<String>,
        language: impl Into<String>,
        timezone_offset_minutes: i32,
        screen_width: u32,
        screen_height: u32,
        color_depth: u32,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            language: language.into(),
            timezone_offset_minutes,
            hardware_concurrency: None,
            device_memory_gb: None,
            screen_width,
            screen_height,
            color_depth,
        }
    }

    pub fn with_hardware_concurrency(mut self, cores: u32) -> Self {
        self.hardware_concurrency = Some(cores);
        self
    }

    pub fn with_device_memory_gb(mut self, gigabytes: f64) -> Self {
        self.device_memory_gb = Some(gigabytes);
        self
    }

    /// The `|`-joined attribute string that gets hashed.
    fn components(&self) -> String {
        let cores = self
            .hardware_concurrency
            .map_or_else(|| UNKNOWN.to_string(), |c| c.to_string());
        let memory = self
            .device_memory_gb
            .map_or_else(|| UNKNOWN.to_string(), |m| m.to_string());

        [
            self.user_agent.clone(),
            self.language.clone(),
            self.timezone_offset_minutes.to_string(),
            cores,
            memory,
            self.screen_width.to_string(),
            self.screen_height.to_string(),
            self.color_depth.to_string(),
        ]
        .join("|")
    }

    pub fn fingerprint(&self) -> DeviceFingerprint {
        fingerprint(self)
    }
}

/// A 16-character lowercase hex device token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    /// Validates a token previously stored for a user.
    pub fn parse(token: &str) -> Result<Self> {
        if token.len() != FINGERPRINT_LEN {
            return Err(FingerprintError::InvalidLength {
                expected: FINGERPRINT_LEN,
                actual: token.len(),
            });
        }
        if !token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(FingerprintError::InvalidCharacter(token.to_string()));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceFingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceFingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<DeviceFingerprint> for String {
    fn from(value: DeviceFingerprint) -> Self {
        value.0
    }
}

/// SHA-256 of the joined attributes, truncated to [`FINGERPRINT_LEN`] hex chars.
pub fn fingerprint(attributes: &DeviceAttributes) -> DeviceFingerprint {
    let digest = Sha256::digest(attributes.components().as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    DeviceFingerprint(hex[..FINGERPRINT_LEN].to_string())
}

/// True when no token is stored for the user or the stored token differs.
pub fn is_new_device(stored: Option<&DeviceFingerprint>, current: &DeviceFingerprint) -> bool {
    let new = stored != Some(current);
    if new {
        debug!(fingerprint = %current, "device not previously seen");
    }
    new
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn laptop() -> DeviceAttributes {
        DeviceAttributes::new("Mozilla/5.0", "en-US", -60, 1920, 1080, 24)
    }

    #[test]
    fn known_answer_with_all_hints() {
        let attrs = laptop()
            .with_hardware_concurrency(8)
            .with_device_memory_gb(8.0);
        assert_eq!(attrs.components(), "Mozilla/5.0|en-US|-60|8|8|1920|1080|24");
        assert_eq!(attrs.fingerprint().as_str(), "65a81e76c63994ca");
    }

    #[test]
    fn missing_hints_render_as_unknown() {
        let attrs = laptop();
        assert_eq!(
            attrs.components(),
            "Mozilla/5.0|en-US|-60|unknown|unknown|1920|1080|24"
        );
        assert_eq!(attrs.fingerprint().as_str(), "ef1f57189eb6a981");
    }

    #[test]
    fn fractional_memory_keeps_decimal() {
        let attrs = laptop()
            .with_hardware_concurrency(4)
            .with_device_memory_gb(0.5);
        assert_eq!(attrs.fingerprint().as_str(), "b79bfcd3f9ec2e9d");
    }

    #[test]
    fn changed_attribute_is_new_device() {
        let known = laptop().fingerprint();
        let mut moved = laptop();
        moved.timezone_offset_minutes = 300;

        assert!(!is_new_device(Some(&known), &laptop().fingerprint()));
        assert!(is_new_device(Some(&known), &moved.fingerprint()));
        assert!(is_new_device(None, &known));
    }

    fn workstation() -> DeviceAttributes {
        laptop()
            .with_hardware_concurrency(8)
            .with_device_memory_gb(8.0)
    }

    #[test_case(laptop(), |d: &mut DeviceAttributes| d.user_agent.push_str(" Edg/120"); "user agent")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.language = "de-DE".into(); "language")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.timezone_offset_minutes = 300; "timezone")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.hardware_concurrency = Some(8); "cores exposed")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.device_memory_gb = Some(4.0); "memory exposed")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.screen_width = 2560; "width")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.screen_height = 1440; "height")]
    #[test_case(laptop(), |d: &mut DeviceAttributes| d.color_depth = 30; "color depth")]
    #[test_case(workstation(), |d: &mut DeviceAttributes| d.hardware_concurrency = Some(16); "cores changed")]
    #[test_case(workstation(), |d: &mut DeviceAttributes| d.device_memory_gb = Some(16.0); "memory changed")]
    #[test_case(workstation(), |d: &mut DeviceAttributes| d.hardware_concurrency = None; "cores hidden")]
    #[test_case(workstation(), |d: &mut DeviceAttributes| d.device_memory_gb = None; "memory hidden")]
    fn any_attribute_change_is_new_device(base: DeviceAttributes, change: fn(&mut DeviceAttributes)) {
        let known = base.fingerprint();
        let mut current = base.clone();
        change(&mut current);

        assert_ne!(current.components(), base.components());
        assert_ne!(current.fingerprint(), known);
        assert!(!is_new_device(Some(&known), &base.fingerprint()));
        assert!(is_new_device(Some(&known), &current.fingerprint()));
    }

    #[test_case("65a81e76c63994ca" => true; "valid token")]
    #[test_case("65a81e76c63994c" => false; "too short")]
    #[test_case("65a81e76c63994ca00" => false; "too long")]
    #[test_case("65A81E76C63994CA" => false; "uppercase")]
    #[test_case("65a81e76c63994cz" => false; "non hex")]
    fn parse_validates(token: &str) -> bool {
        DeviceFingerprint::parse(token).is_ok()
    }

    #[test]
    fn parse_reports_length() {
        assert_eq!(
            DeviceFingerprint::parse("abc"),
            Err(FingerprintError::InvalidLength {
                expected: 16,
                actual: 3
            })
        );
    }

    #[test]
    fn serde_rejects_malformed_token() {
        let token: DeviceFingerprint = serde_json::from_str("\"65a81e76c63994ca\"").unwrap();
        assert_eq!(token.as_str(), "65a81e76c63994ca");
        assert!(serde_json::from_str::<DeviceFingerprint>("\"nope\"").is_err());
    }

    proptest! {
        #[test]
        fn fingerprint_is_stable_and_well_formed(
            ua in ".{0,64}",
            lang in "[a-z]{2}(-[A-Z]{2})?",
            tz in -720i32..=840,
            cores in proptest::option::of(1u32..128),
            width in 320u32..8000,
            height in 240u32..8000,
        ) {
            let mut attrs = DeviceAttributes::new(ua, lang, tz, width, height, 24);
            attrs.hardware_concurrency = cores;

            let first = attrs.fingerprint();
            prop_assert_eq!(&first, &attrs.fingerprint());
            prop_assert!(DeviceFingerprint::parse(first.as_str()).is_ok());
        }
    }
}
