use crate::{KdcRequestContext, PaDataType, PreauthDataEntry, PreauthResult};

/// Descriptor of a pre-authentication mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMeta {
    name: &'static str,
    version: u32,
    pa_types: Vec<PaDataType>,
    required: bool,
}

impl PluginMeta {
    pub fn new(name: &'static str, version: u32, pa_types: &[PaDataType]) -> Self {
        Self {
            name,
            version,
            pa_types: pa_types.to_vec(),
            required: false,
        }
    }

    /// Marks the mechanism as one every request must satisfy.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn pa_types(&self) -> &[PaDataType] {
        &self.pa_types
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// A pre-authentication mechanism.
///
/// Implementations are shared by every worker and must not keep per-request state: everything
/// request-scoped lives in the [`KdcRequestContext`].
pub trait PreauthPlugin: Send + Sync {
    fn meta(&self) -> &PluginMeta;

    /// Verifies one entry. `Ok(false)` means the entry is not for this mechanism.
    ///
    /// The context must be left untouched unless the verification succeeds.
    fn verify(&self, ctx: &mut KdcRequestContext, entry: &PreauthDataEntry) -> PreauthResult<bool>;

    /// Hints advertised to the client in a KDC_ERR_PREAUTH_REQUIRED error.
    fn provide_padata(&self, ctx: &KdcRequestContext) -> Vec<PreauthDataEntry> {
        let _ = ctx;
        Vec::new()
    }
}
