use core::fmt;

use kerbridge_crypto::integer::integer_to_i32;
use picky_krb::data_types;

use crate::PreauthResult;

/// Kerberos principal name along the realm it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalName {
    name_type: i32,
    components: Vec<String>,
    realm: Option<String>,
}

impl PrincipalName {
    pub const NT_PRINCIPAL: i32 = 1;
    pub const NT_SRV_INST: i32 = 2;
    pub const NT_SRV_HST: i32 = 3;

    pub fn new(name_type: i32, components: Vec<String>, realm: Option<String>) -> Self {
        Self {
            name_type,
            components,
            realm,
        }
    }

    /// Converts a decoded `PrincipalName`, attaching the given realm.
    pub fn from_asn1(name: &data_types::PrincipalName, realm: Option<String>) -> PreauthResult<Self> {
        let name_type = integer_to_i32(&name.name_type.0).ok_or_else(|| general_err!("principal name-type"))?;

        let components: Vec<String> = name.name_string.0.0.iter().map(|part| part.to_string()).collect();

        if components.is_empty() {
            return Err(reason_err!("principal name", "name-string is empty"));
        }

        Ok(Self {
            name_type,
            components,
            realm,
        })
    }

    pub fn name_type(&self) -> i32 {
        self.name_type
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Full name, `comp1/comp2@REALM`. The realm suffix is only present when known.
    pub fn name(&self) -> String {
        let name = self.components.join("/");

        match &self.realm {
            Some(realm) => format!("{name}@{realm}"),
            None => name,
        }
    }
}

impl fmt::Display for PrincipalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
