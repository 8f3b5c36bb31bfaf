//! Shared key generation so every caller lays blobs out the same way.

use coursely_core::constants::DEFAULT_TENANT_ID;
use uuid::Uuid;

fn scoped(prefix: &str, tenant_id: Option<Uuid>, filename: &str) -> String {
    match tenant_id {
        Some(tenant_id) if tenant_id != DEFAULT_TENANT_ID => {
            format!("{}/{}/{}", prefix, tenant_id, filename)
        }
        _ => format!("{}/{}", prefix, filename),
    }
}

pub fn certificate_key(tenant_id: Option<Uuid>, certificate_number: &str) -> String {
    scoped("certificates", tenant_id, &format!("{}.pdf", certificate_number))
}

pub fn signature_key(tenant_id: Option<Uuid>, signature_id: Uuid, extension: &str) -> String {
    scoped("signatures", tenant_id, &format!("{}.{}", signature_id, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tenant_uses_short_keys() {
        assert_eq!(
            certificate_key(Some(DEFAULT_TENANT_ID), "CERT-2024-ABCDEFGH"),
            "certificates/CERT-2024-ABCDEFGH.pdf"
        );
        assert_eq!(certificate_key(None, "CERT-1"), "certificates/CERT-1.pdf");
    }

    #[test]
    fn test_other_tenants_are_namespaced() {
        let tenant = Uuid::new_v4();
        let id = Uuid::new_v4();
        assert_eq!(
            signature_key(Some(tenant), id, "png"),
            format!("signatures/{}/{}.png", tenant, id)
        );
    }
}
