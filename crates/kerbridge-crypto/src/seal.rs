use picky_asn1::wrapper::{ExplicitContextTag0, ExplicitContextTag2, OctetStringAsn1, Optional};
use picky_krb::data_types::EncryptedData;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;
use zeroize::Zeroizing;

use crate::integer::{i32_to_integer, integer_to_i32};
use crate::{decrypt, encrypt, CryptoError, CryptoResult, EncryptionKey, EncryptionType, IntegrityFailure, KeyUsage};

/// DER-encodes `value` and encrypts it into an `EncryptedData` under `usage`.
pub fn seal<T>(value: &T, key: &EncryptionKey, usage: KeyUsage) -> CryptoResult<EncryptedData>
where
    T: Serialize,
{
    let plaintext = Zeroizing::new(picky_asn1_der::to_vec(value).map_err(CryptoError::Encode)?);

    let cipher = encrypt(key.etype(), key.value(), usage, &plaintext)?;

    Ok(EncryptedData {
        etype: ExplicitContextTag0::from(i32_to_integer(key.etype().etype())),
        kvno: Optional::from(None),
        cipher: ExplicitContextTag2::from(OctetStringAsn1::from(cipher)),
    })
}

/// Decrypts an `EncryptedData` under `usage` and decodes the plaintext as `T`.
///
/// The declared etype must be supported and must match the key.
pub fn unseal<T>(data: &EncryptedData, key: &EncryptionKey, usage: KeyUsage) -> CryptoResult<T>
where
    T: DeserializeOwned,
{
    let declared = integer_to_i32(&data.etype.0).ok_or(CryptoError::Integrity(IntegrityFailure::Malformed))?;
    let etype = EncryptionType::from_etype(declared)?;

    if etype != key.etype() {
        return Err(CryptoError::EtypeMismatch {
            key: key.etype().etype(),
            data: declared,
        });
    }

    trace!(%etype, %usage, len = data.cipher.0.0.len(), "Unsealing");

    let plaintext = Zeroizing::new(decrypt(etype, key.value(), usage, &data.cipher.0.0)?);

    picky_asn1_der::from_bytes(&plaintext).map_err(CryptoError::Decode)
}
