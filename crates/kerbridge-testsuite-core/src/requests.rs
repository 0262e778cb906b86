use kerbridge_preauth::PreauthDataEntry;
use picky_asn1::bit_string::BitString;
use picky_asn1::date::Date;
use picky_asn1::restricted_string::Ia5String;
use picky_asn1::wrapper::{
    Asn1SequenceOf, BitStringAsn1, ExplicitContextTag0, ExplicitContextTag1, ExplicitContextTag2,
    ExplicitContextTag3, ExplicitContextTag4, ExplicitContextTag5, ExplicitContextTag7, ExplicitContextTag8,
    IntegerAsn1, Optional,
};
use picky_krb::data_types::{KerberosStringAsn1, KerberosTime, PrincipalName};
use picky_krb::messages::{AsReq, KdcReq, KdcReqBody, TgsReq};

use crate::REALM;

fn kerberos_string(value: &str) -> KerberosStringAsn1 {
    KerberosStringAsn1::from(Ia5String::from_string(value.to_owned()).expect("IA5 string"))
}

pub fn principal(name_type: u8, components: &[&str]) -> PrincipalName {
    PrincipalName {
        name_type: ExplicitContextTag0::from(IntegerAsn1(vec![name_type])),
        name_string: ExplicitContextTag1::from(Asn1SequenceOf::from(
            components.iter().map(|component| kerberos_string(component)).collect::<Vec<_>>(),
        )),
    }
}

fn kdc_req(msg_type: u8, sname: Option<PrincipalName>, padata: &[PreauthDataEntry]) -> KdcReq {
    let padata = if padata.is_empty() {
        None
    } else {
        Some(ExplicitContextTag3::from(Asn1SequenceOf::from(
            padata.iter().map(PreauthDataEntry::to_asn1).collect::<Vec<_>>(),
        )))
    };

    KdcReq {
        pvno: ExplicitContextTag1::from(IntegerAsn1(vec![5])),
        msg_type: ExplicitContextTag2::from(IntegerAsn1(vec![msg_type])),
        padata: Optional::from(padata),
        req_body: ExplicitContextTag4::from(KdcReqBody {
            kdc_options: ExplicitContextTag0::from(BitStringAsn1::from(BitString::with_bytes(vec![0, 0, 0, 16]))),
            cname: Optional::from(Some(ExplicitContextTag1::from(principal(1, &["alice"])))),
            realm: ExplicitContextTag2::from(kerberos_string(REALM)),
            sname: Optional::from(sname.map(ExplicitContextTag3::from)),
            from: Optional::from(None),
            till: ExplicitContextTag5::from(KerberosTime::from(
                Date::new(2037, 9, 13, 2, 48, 5).expect("valid date"),
            )),
            rtime: Optional::from(None),
            nonce: ExplicitContextTag7::from(IntegerAsn1(vec![29, 32, 235, 11])),
            etype: ExplicitContextTag8::from(Asn1SequenceOf::from(vec![IntegerAsn1(vec![18]), IntegerAsn1(vec![17])])),
            addresses: Optional::from(None),
            enc_authorization_data: Optional::from(None),
            additional_tickets: Optional::from(None),
        }),
    }
}

/// AS-REQ for alice@EXAMPLE.COM targeting krbtgt/EXAMPLE.COM.
pub fn as_req(padata: &[PreauthDataEntry]) -> AsReq {
    AsReq::from(kdc_req(10, Some(principal(2, &["krbtgt", REALM])), padata))
}

/// TGS-REQ for the service whose name components are `service`, in the request body realm.
pub fn tgs_req(service: &[&str], padata: &[PreauthDataEntry]) -> TgsReq {
    TgsReq::from(kdc_req(12, Some(principal(2, service)), padata))
}

pub fn tgs_req_without_sname(padata: &[PreauthDataEntry]) -> TgsReq {
    TgsReq::from(kdc_req(12, None, padata))
}
