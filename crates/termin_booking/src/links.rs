// --- File: crates/termin_booking/src/links.rs ---

//! Signed confirm/cancel links for admin notifications.

use crate::lifecycle::LifecycleAction;
use constant_time_eq::constant_time_eq;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct LinkSigner {
    mac: HmacSha256,
    base_url: String,
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LinkSigner {
    /// `base_url` is the public origin the links point to, without trailing slash.
    pub fn new(secret: &str, base_url: &str) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.as_bytes())?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Hex HMAC-SHA256 over `"{action}:{id}"`.
    pub fn sign(&self, action: LifecycleAction, appointment_id: i64) -> String {
        let mut mac = self.mac.clone();
        mac.update(format!("{}:{}", action.as_str(), appointment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(&self, action: LifecycleAction, appointment_id: i64, signature: &str) -> bool {
        let expected = self.sign(action, appointment_id);
        constant_time_eq(expected.as_bytes(), signature.to_ascii_lowercase().as_bytes())
    }

    pub fn url(&self, action: LifecycleAction, appointment_id: i64) -> String {
        format!(
            "{}/api/links/{}/{}?sig={}",
            self.base_url,
            action.as_str(),
            appointment_id,
            self.sign(action, appointment_id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_bind_action_and_id() {
        let signer = LinkSigner::new("s3cret", "https://termin.example/").unwrap();
        let sig = signer.sign(LifecycleAction::Confirm, 42);

        assert_eq!(sig.len(), 64);
        assert!(signer.verify(LifecycleAction::Confirm, 42, &sig));
        assert!(signer.verify(LifecycleAction::Confirm, 42, &sig.to_uppercase()));
        assert!(!signer.verify(LifecycleAction::Cancel, 42, &sig));
        assert!(!signer.verify(LifecycleAction::Confirm, 43, &sig));
        assert!(!signer.verify(LifecycleAction::Confirm, 42, "deadbeef"));
    }

    #[test]
    fn different_secrets_disagree() {
        let a = LinkSigner::new("one", "http://localhost").unwrap();
        let b = LinkSigner::new("two", "http://localhost").unwrap();
        assert_ne!(a.sign(LifecycleAction::Cancel, 1), b.sign(LifecycleAction::Cancel, 1));
    }

    #[test]
    fn url_points_at_link_endpoint() {
        let signer = LinkSigner::new("k", "https://termin.example/").unwrap();
        let url = signer.url(LifecycleAction::Cancel, 7);
        assert!(url.starts_with("https://termin.example/api/links/cancel/7?sig="));
    }
}
