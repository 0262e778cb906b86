use core::fmt;

/// Key usage number scoping the derivation of sub-keys.
///
/// [RFC 4120 7.5.1](https://www.rfc-editor.org/rfc/rfc4120#section-7.5.1),
/// [RFC 6113 5.4](https://www.rfc-editor.org/rfc/rfc6113#section-5.4) and the token
/// pre-authentication extension. A key used under two different usages yields two
/// independent sub-keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyUsage(i32);

macro_rules! key_usages {
    ($( $(#[$meta:meta])* $name:ident = $value:literal ),+ $(,)?) => {
        impl KeyUsage {
            $(
                $(#[$meta])*
                pub const $name: Self = Self($value);
            )+

            /// Every usage of the registry, in ascending order.
            pub const ALL: &'static [Self] = &[$(Self::$name),+];

            /// Name of the registered usage, if any.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)+
                    _ => None,
                }
            }
        }
    };
}

key_usages! {
    /// PA-ENC-TIMESTAMP padata timestamp, encrypted with the client key
    AS_REQ_PA_ENC_TIMESTAMP = 1,
    /// AS-REP and TGS-REP ticket, encrypted with the service key
    KDC_REP_TICKET = 2,
    AS_REP_ENC_PART = 3,
    TGS_REQ_AUTH_DATA_SESSION_KEY = 4,
    TGS_REQ_AUTH_DATA_SUBKEY = 5,
    TGS_REQ_PA_TGS_REQ_AUTHENTICATOR_CKSUM = 6,
    TGS_REQ_PA_TGS_REQ_AUTHENTICATOR = 7,
    TGS_REP_ENC_PART_SESSION_KEY = 8,
    TGS_REP_ENC_PART_SUBKEY = 9,
    AP_REQ_AUTHENTICATOR_CKSUM = 10,
    AP_REQ_AUTHENTICATOR = 11,
    AP_REP_ENC_PART = 12,
    KRB_PRIV_ENC_PART = 13,
    KRB_CRED_ENC_PART = 14,
    KRB_SAFE_CKSUM = 15,
    KEY_USAGE_FAST_REQ_CHKSUM = 50,
    KEY_USAGE_FAST_ENC = 51,
    KEY_USAGE_FAST_REP = 52,
    KEY_USAGE_FAST_FINISHED = 53,
    KEY_USAGE_ENC_CHALLENGE_CLIENT = 54,
    KEY_USAGE_ENC_CHALLENGE_KDC = 55,
    AS_REQ = 56,
    /// Transport of a PA-TOKEN-REQUEST, encrypted with the armor key
    PA_TOKEN = 57,
}

/// Which of the three simplified-profile sub-keys is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivationPurpose {
    /// Kc
    Checksum,
    /// Ke
    Encryption,
    /// Ki
    Integrity,
}

impl KeyDerivationPurpose {
    fn suffix(self) -> u8 {
        match self {
            Self::Checksum => 0x99,
            Self::Encryption => 0xAA,
            Self::Integrity => 0x55,
        }
    }
}

impl KeyUsage {
    /// Any usage number, registered or not.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Registered usage matching this number.
    pub fn registered(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|usage| usage.0 == value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Well-known constant fed to DK(key, constant) for this usage.
    ///
    /// [RFC 3961 5.3](https://www.rfc-editor.org/rfc/rfc3961#section-5.3)
    pub fn derivation_constant(self, purpose: KeyDerivationPurpose) -> [u8; 5] {
        let [b0, b1, b2, b3] = self.0.to_be_bytes();
        [b0, b1, b2, b3, purpose.suffix()]
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "usage {}", self.0),
        }
    }
}

impl From<KeyUsage> for i32 {
    fn from(usage: KeyUsage) -> Self {
        usage.0
    }
}
