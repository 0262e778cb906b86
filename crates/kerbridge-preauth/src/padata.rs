use core::fmt;

use kerbridge_crypto::integer::{i32_to_integer, integer_to_i32};
use picky_asn1::wrapper::{ExplicitContextTag1, ExplicitContextTag2, OctetStringAsn1};
use picky_krb::data_types::PaData;

use crate::{PreauthError, PreauthResult};

/// Pre-authentication data type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaDataType(i32);

impl PaDataType {
    pub const PA_TGS_REQ: Self = Self(1);
    pub const PA_ENC_TIMESTAMP: Self = Self(2);
    pub const PA_ETYPE_INFO2: Self = Self(19);
    pub const PA_FX_FAST: Self = Self(136);
    pub const TOKEN_REQUEST: Self = Self(148);
    pub const TOKEN_CHALLENGE: Self = Self(149);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Self::PA_TGS_REQ => Some("PA-TGS-REQ"),
            Self::PA_ENC_TIMESTAMP => Some("PA-ENC-TIMESTAMP"),
            Self::PA_ETYPE_INFO2 => Some("PA-ETYPE-INFO2"),
            Self::PA_FX_FAST => Some("PA-FX-FAST"),
            Self::TOKEN_REQUEST => Some("PA-TOKEN-REQUEST"),
            Self::TOKEN_CHALLENGE => Some("PA-TOKEN-CHALLENGE"),
            _ => None,
        }
    }
}

impl fmt::Display for PaDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({})", self.0),
            None => write!(f, "padata({})", self.0),
        }
    }
}

/// One (type, opaque payload) item of a request's PA-DATA sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreauthDataEntry {
    pa_type: PaDataType,
    data: Vec<u8>,
}

impl PreauthDataEntry {
    pub fn new(pa_type: PaDataType, data: Vec<u8>) -> Self {
        Self { pa_type, data }
    }

    pub fn pa_type(&self) -> PaDataType {
        self.pa_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_asn1(&self) -> PaData {
        PaData {
            padata_type: ExplicitContextTag1::from(i32_to_integer(self.pa_type.0)),
            padata_data: ExplicitContextTag2::from(OctetStringAsn1::from(self.data.clone())),
        }
    }
}

impl TryFrom<&PaData> for PreauthDataEntry {
    type Error = PreauthError;

    fn try_from(padata: &PaData) -> PreauthResult<Self> {
        let pa_type = integer_to_i32(&padata.padata_type.0).ok_or_else(|| general_err!("padata-type"))?;

        Ok(Self {
            pa_type: PaDataType(pa_type),
            data: padata.padata_data.0.0.clone(),
        })
    }
}
