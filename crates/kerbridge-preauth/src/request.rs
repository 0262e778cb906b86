use picky_krb::messages::{AsReq, KdcReq, KdcReqBody, TgsReq};

use crate::{PreauthDataEntry, PreauthError, PreauthErrorExt as _, PreauthErrorKind, PreauthResult, PrincipalName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    As,
    Tgs,
}

/// Initial authentication request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsRequest {
    req: KdcReq,
}

/// Ticket-granting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TgsRequest {
    req: KdcReq,
}

impl TgsRequest {
    /// Target service principal, with the realm taken from the same request body.
    pub fn server_principal(&self) -> PreauthResult<PrincipalName> {
        let body = &self.req.req_body.0;

        let sname = body
            .sname
            .0
            .as_ref()
            .ok_or_else(|| PreauthError::new("TGS-REQ sname", PreauthErrorKind::Decode))?;

        PrincipalName::from_asn1(&sname.0, Some(body.realm.0.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdcRequest {
    As(AsRequest),
    Tgs(TgsRequest),
}

impl KdcRequest {
    /// Decodes an AS-REQ or a TGS-REQ.
    pub fn decode(bytes: &[u8]) -> PreauthResult<Self> {
        match picky_asn1_der::from_bytes::<AsReq>(bytes) {
            Ok(as_req) => Ok(Self::from(as_req)),
            Err(as_error) => match picky_asn1_der::from_bytes::<TgsReq>(bytes) {
                Ok(tgs_req) => Ok(Self::from(tgs_req)),
                Err(tgs_error) => {
                    debug!(%as_error, "Not an AS-REQ");
                    Err(PreauthError::decode("KDC-REQ", tgs_error))
                }
            },
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Self::As(_) => RequestKind::As,
            Self::Tgs(_) => RequestKind::Tgs,
        }
    }

    pub fn kdc_req(&self) -> &KdcReq {
        match self {
            Self::As(AsRequest { req }) | Self::Tgs(TgsRequest { req }) => req,
        }
    }

    pub fn body(&self) -> &KdcReqBody {
        &self.kdc_req().req_body.0
    }

    pub fn realm(&self) -> String {
        self.body().realm.0.to_string()
    }

    /// PA-DATA entries in the order the client sent them.
    pub fn preauth_entries(&self) -> PreauthResult<Vec<PreauthDataEntry>> {
        match &self.kdc_req().padata.0 {
            Some(padata) => padata.0.0.iter().map(PreauthDataEntry::try_from).collect(),
            None => Ok(Vec::new()),
        }
    }
}

impl From<AsReq> for KdcRequest {
    fn from(as_req: AsReq) -> Self {
        Self::As(AsRequest { req: as_req.0 })
    }
}

impl From<TgsReq> for KdcRequest {
    fn from(tgs_req: TgsReq) -> Self {
        Self::Tgs(TgsRequest { req: tgs_req.0 })
    }
}
