//! Push protocol transport seam.

use crate::store::Subscription;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;

/// One delivery attempt to a push service endpoint.
///
/// Implementations return the remote HTTP status so the dispatcher can
/// classify the outcome. Transport-level failures (connect errors, timeouts,
/// unusable subscription material) surface as errors and are treated as
/// transient by the dispatcher.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        ttl_secs: u32,
    ) -> Result<u16>;
}

/// RFC 8030 web push with VAPID authentication (RFC 8292) and aes128gcm
/// payload encryption (RFC 8291).
///
/// The `web-push` crate only does the encryption and signing; the HTTP
/// request itself goes through a pooled reqwest client.
pub struct WebPushTransport {
    client: reqwest::Client,
    vapid_private_b64: String,
    vapid_subject: String,
}

impl WebPushTransport {
    /// `vapid_private_b64` is the raw 32-byte P-256 private key scalar,
    /// base64url-encoded - the format `VapidSignatureBuilder::from_base64`
    /// expects.
    pub fn new(vapid_private_b64: String, vapid_subject: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            vapid_private_b64,
            vapid_subject,
        }
    }

    fn subscription_info(subscription: &Subscription) -> Result<web_push::SubscriptionInfo> {
        let p256dh = credential_field(subscription, "p256dh")?;
        let auth = credential_field(subscription, "auth")?;
        Ok(web_push::SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            p256dh,
            auth,
        ))
    }
}

fn credential_field<'a>(subscription: &'a Subscription, field: &str) -> Result<&'a str> {
    match subscription.keys.get(field).and_then(|v| v.as_str()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!(
            "subscription {} is missing credential field '{}'",
            subscription.endpoint,
            field
        ),
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &[u8],
        ttl_secs: u32,
    ) -> Result<u16> {
        use web_push::{ContentEncoding, VapidSignatureBuilder, WebPushMessageBuilder};

        let sub_info = Self::subscription_info(subscription)?;

        // The audience claim is derived from the subscription endpoint by the
        // signature builder, binding the JWT to this specific push service.
        let mut sig_builder =
            VapidSignatureBuilder::from_base64(&self.vapid_private_b64, &sub_info)
                .context("Failed to build VAPID signature")?;
        sig_builder.add_claim("sub", self.vapid_subject.as_str());
        let signature = sig_builder.build().context("Failed to sign VAPID claims")?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(ttl_secs);
        let message = builder.build().context("Failed to build web push message")?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request
            .send()
            .await
            .context("Web push HTTP request failed")?;
        Ok(response.status().as_u16())
    }
}
