use kerbridge_crypto::{unseal, KeyUsage};
use picky_krb::data_types::{EncryptedData, PaEncTsEnc};
use time::OffsetDateTime;

use crate::{
    ContextUpdate, KdcRequestContext, PaDataType, PluginMeta, PreauthDataEntry, PreauthError, PreauthErrorExt as _,
    PreauthErrorKind, PreauthPlugin, PreauthResult,
};

const CONTEXT: &str = "encrypted timestamp";

/// PA-ENC-TIMESTAMP: the client proves knowledge of its long-term key by encrypting the current
/// time with it.
///
/// The client key must be placed into the request context by the caller, after the principal
/// lookup.
pub struct EncTsPreauth {
    meta: PluginMeta,
}

impl EncTsPreauth {
    pub const NAME: &'static str = "enc-timestamp";

    pub fn new() -> Self {
        Self {
            meta: PluginMeta::new(Self::NAME, 1, &[PaDataType::PA_ENC_TIMESTAMP]),
        }
    }
}

impl Default for EncTsPreauth {
    fn default() -> Self {
        Self::new()
    }
}

impl PreauthPlugin for EncTsPreauth {
    fn meta(&self) -> &PluginMeta {
        &self.meta
    }

    fn verify(&self, ctx: &mut KdcRequestContext, entry: &PreauthDataEntry) -> PreauthResult<bool> {
        if entry.pa_type() != PaDataType::PA_ENC_TIMESTAMP {
            return Ok(false);
        }

        let client_key = ctx
            .client_key()
            .cloned()
            .ok_or_else(|| PreauthError::new(CONTEXT, PreauthErrorKind::MissingClientKey))?;

        let encrypted: EncryptedData =
            picky_asn1_der::from_bytes(entry.data()).map_err(|e| PreauthError::decode(CONTEXT, e))?;

        let enc_ts: PaEncTsEnc = unseal(&encrypted, &client_key, KeyUsage::AS_REQ_PA_ENC_TIMESTAMP)
            .map_err(|e| PreauthError::crypto(CONTEXT, e))?;

        let timestamp =
            OffsetDateTime::try_from(enc_ts.patimestamp.0.0.clone()).map_err(|e| PreauthError::decode(CONTEXT, e))?;

        let skew = (OffsetDateTime::now_utc() - timestamp).whole_seconds();

        if skew.unsigned_abs() > ctx.config().allowable_clock_skew().as_secs() {
            warn!(skew_secs = skew, "Encrypted timestamp outside of the allowed clock skew");
            return Err(PreauthError::new(CONTEXT, PreauthErrorKind::ClockSkew { skew_secs: skew }));
        }

        ctx.apply(ContextUpdate::new(Self::NAME).with_client_key(client_key))?;

        Ok(true)
    }

    fn provide_padata(&self, _: &KdcRequestContext) -> Vec<PreauthDataEntry> {
        vec![PreauthDataEntry::new(PaDataType::PA_ENC_TIMESTAMP, Vec::new())]
    }
}
