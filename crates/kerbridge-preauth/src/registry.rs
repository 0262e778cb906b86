use std::collections::HashMap;
use std::sync::Arc;

use picky_krb::constants::error_codes::KDC_ERR_PREAUTH_REQUIRED;

use crate::{
    KdcRequestContext, PaDataType, PreauthDataEntry, PreauthError, PreauthErrorExt as _, PreauthErrorKind,
    PreauthPlugin, PreauthResult,
};

/// Result of routing one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreauthOutcome {
    /// No mechanism owns the entry type, or the owner declined it
    NotApplicable,
    Processed { mechanism: &'static str },
}

#[derive(Default)]
pub struct PreauthRegistryBuilder {
    plugins: Vec<Arc<dyn PreauthPlugin>>,
    by_type: HashMap<PaDataType, Arc<dyn PreauthPlugin>>,
}

impl PreauthRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mechanism for every PA type it declares.
    ///
    /// # Errors
    ///
    /// Fails if another mechanism already owns one of these PA types.
    pub fn register(mut self, plugin: Arc<dyn PreauthPlugin>) -> PreauthResult<Self> {
        let meta = plugin.meta();

        if let Some(pa_type) = meta.pa_types().iter().find(|pa_type| self.by_type.contains_key(pa_type)) {
            return Err(PreauthError::new(
                "register pre-authentication mechanism",
                PreauthErrorKind::DuplicateMechanism(*pa_type),
            ));
        }

        debug!(mechanism = meta.name(), pa_types = ?meta.pa_types(), "Registering pre-authentication mechanism");

        for pa_type in meta.pa_types() {
            self.by_type.insert(*pa_type, Arc::clone(&plugin));
        }

        self.plugins.push(plugin);

        Ok(self)
    }

    pub fn build(self) -> PreauthRegistry {
        PreauthRegistry {
            plugins: self.plugins,
            by_type: self.by_type,
        }
    }
}

/// Immutable mapping from PA type to mechanism, shared by all workers.
///
/// Changing the mechanism set means building a new registry and swapping the `Arc`.
pub struct PreauthRegistry {
    plugins: Vec<Arc<dyn PreauthPlugin>>,
    by_type: HashMap<PaDataType, Arc<dyn PreauthPlugin>>,
}

impl PreauthRegistry {
    pub fn builder() -> PreauthRegistryBuilder {
        PreauthRegistryBuilder::new()
    }

    pub fn lookup(&self, pa_type: PaDataType) -> Option<&dyn PreauthPlugin> {
        self.by_type.get(&pa_type).map(|plugin| plugin.as_ref())
    }

    pub fn mechanisms(&self) -> impl Iterator<Item = &dyn PreauthPlugin> {
        self.plugins.iter().map(|plugin| plugin.as_ref())
    }

    /// Routes one entry to its mechanism.
    pub fn dispatch(&self, entry: &PreauthDataEntry, ctx: &mut KdcRequestContext) -> PreauthResult<PreauthOutcome> {
        let Some(plugin) = self.lookup(entry.pa_type()) else {
            debug!(pa_type = %entry.pa_type(), "No mechanism for pre-authentication entry");
            return Ok(PreauthOutcome::NotApplicable);
        };

        let mechanism = plugin.meta().name();

        debug!(pa_type = %entry.pa_type(), mechanism, "Dispatching pre-authentication entry");

        if plugin.verify(ctx, entry)? {
            Ok(PreauthOutcome::Processed { mechanism })
        } else {
            Ok(PreauthOutcome::NotApplicable)
        }
    }

    /// Dispatches every PA-DATA entry of the request and reports each outcome.
    ///
    /// Admission is left to the caller.
    pub fn verify_all(&self, ctx: &mut KdcRequestContext) -> PreauthResult<PreauthReport> {
        let entries = ctx.request().preauth_entries()?;

        let outcomes = entries
            .iter()
            .map(|entry| {
                let outcome = self.dispatch(entry, ctx);

                if let Err(error) = &outcome {
                    warn!(pa_type = %entry.pa_type(), error = %error.report(), "Pre-authentication entry rejected");
                }

                EntryOutcome {
                    pa_type: entry.pa_type(),
                    outcome,
                }
            })
            .collect();

        Ok(PreauthReport { outcomes })
    }

    /// Entries to advertise in a KDC_ERR_PREAUTH_REQUIRED error.
    pub fn advertised_padata(&self, ctx: &KdcRequestContext) -> Vec<PreauthDataEntry> {
        self.plugins.iter().flat_map(|plugin| plugin.provide_padata(ctx)).collect()
    }
}

#[derive(Debug)]
pub struct EntryOutcome {
    pub pa_type: PaDataType,
    pub outcome: PreauthResult<PreauthOutcome>,
}

/// Per-entry outcomes of [`PreauthRegistry::verify_all`].
#[derive(Debug)]
pub struct PreauthReport {
    outcomes: Vec<EntryOutcome>,
}

impl PreauthReport {
    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    /// Names of the mechanisms that accepted an entry.
    pub fn processed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outcomes.iter().filter_map(|entry| match entry.outcome {
            Ok(PreauthOutcome::Processed { mechanism }) => Some(mechanism),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (PaDataType, &PreauthError)> {
        self.outcomes
            .iter()
            .filter_map(|entry| entry.outcome.as_ref().err().map(|error| (entry.pa_type, error)))
    }

    pub fn first_failure(&self) -> Option<&PreauthError> {
        self.failures().next().map(|(_, error)| error)
    }

    pub fn has_failure(&self) -> bool {
        self.first_failure().is_some()
    }

    /// At least one entry was accepted and none was rejected.
    pub fn is_authenticated(&self) -> bool {
        !self.has_failure() && self.processed().next().is_some()
    }

    /// Required mechanisms that did not accept any entry.
    pub fn missing_required(&self, registry: &PreauthRegistry) -> Vec<&'static str> {
        registry
            .mechanisms()
            .map(|plugin| plugin.meta())
            .filter(|meta| meta.is_required())
            .map(|meta| meta.name())
            .filter(|name| !self.processed().any(|processed| processed == *name))
            .collect()
    }

    /// Kerberos error code to reject the request with, `None` when pre-authentication succeeded.
    ///
    /// The first rejected entry decides the code. A request no mechanism accepted, or that misses
    /// a required mechanism, gets `KDC_ERR_PREAUTH_REQUIRED`.
    pub fn rejection_code(&self, registry: &PreauthRegistry) -> Option<u32> {
        if let Some(error) = self.first_failure() {
            return Some(error.krb_error_code());
        }

        if !self.is_authenticated() || !self.missing_required(registry).is_empty() {
            return Some(KDC_ERR_PREAUTH_REQUIRED);
        }

        None
    }
}
