use sf_api_types::{Channel, ConsentProfile, ProfileRequest};
use sf_backend_client::StorefrontBackend;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::identity::IdentityStore;
use crate::in_flight::Action;
use crate::messaging::PreviewState;
use crate::notice::Notice;
use crate::storefront::Storefront;
use crate::timer::Timer;

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    pub fn profile(&self) -> Option<ConsentProfile> {
        self.with(|session| session.profile.clone())
    }

    /// A missing profile counts as "not opted in".
    pub fn is_opted_in(&self) -> bool {
        self.with(|session| session.profile.as_ref().is_some_and(|p| p.opt_in))
    }

    pub async fn opt_in(&self, phone_number: &str, channel: Channel) -> Notice {
        let _busy = self.busy(Action::OptIn);
        match self.submit_opt_in(phone_number, channel).await {
            Ok(()) => Notice::success(format!("Opted in via {}", channel.shout())),
            Err(err) => Notice::from_failure("Failed to opt in", err),
        }
    }

    async fn submit_opt_in(&self, phone_number: &str, channel: Channel) -> Result<(), SessionError> {
        // Blank input is rejected; anything else is sent as typed.
        if phone_number.trim().is_empty() {
            return Err(SessionError::Validation("Please enter your phone number"));
        }
        let anon_id = self.require_identity()?;

        let request = ProfileRequest::opt_in(anon_id, phone_number.to_owned(), channel);
        let profile = self.backend().upsert_profile(&request).await?;
        info!(channel = %channel, "opted in");
        self.update(|session| session.profile = Some(profile));
        Ok(())
    }

    /// Sets `opt_in=false`, then re-reads the profile so the view shows the
    /// server's masked state.
    pub async fn revoke_consent(&self) -> Notice {
        let _busy = self.busy(Action::RevokeConsent);
        match self.submit_revoke().await {
            Ok(()) => Notice::success("Consent revoked"),
            Err(err) => Notice::from_failure("Failed to revoke consent", err),
        }
    }

    async fn submit_revoke(&self) -> Result<(), SessionError> {
        let anon_id = self.require_identity()?;
        self.backend()
            .upsert_profile(&ProfileRequest::revoke(anon_id))
            .await?;
        self.refresh_profile().await
    }

    /// Deletes everything the backend holds for this identity and forgets
    /// the identity locally. The session is left with `reload_pending` set.
    pub async fn delete_all_data(&self) -> Notice {
        let _busy = self.busy(Action::DeleteData);
        match self.submit_delete().await {
            Ok(()) => Notice::success("All data deleted"),
            Err(err) => Notice::from_failure("Failed to delete data", err),
        }
    }

    async fn submit_delete(&self) -> Result<(), SessionError> {
        let anon_id = self.require_identity()?;
        let response = self.backend().delete_profile(&anon_id).await?;
        if !response.success {
            return Err(SessionError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Failed to delete data".to_owned()),
            ));
        }

        if let Err(err) = self.identity_store().clear(&self.config().identity_key) {
            warn!(error = %err, "could not clear stored identity");
        }
        self.update(|session| {
            session.profile = None;
            session.cart.clear();
            session.outbox.clear();
            session.preview = PreviewState::Closed;
            session.identity = None;
            session.reload_pending = true;
        });
        info!(%anon_id, "all data deleted");
        Ok(())
    }
}
