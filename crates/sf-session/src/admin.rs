use sf_api_types::{AdminChannelSettings, AdminSettingsUpdate, Channel};
use sf_backend_client::StorefrontBackend;
use tracing::info;

use crate::error::SessionError;
use crate::identity::IdentityStore;
use crate::in_flight::Action;
use crate::notice::Notice;
use crate::storefront::Storefront;
use crate::timer::Timer;

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    pub fn admin_settings(&self) -> Option<AdminChannelSettings> {
        self.with(|session| session.admin_settings)
    }

    /// Fetched when the admin panel opens and after every toggle.
    pub async fn load_admin_settings(&self) -> Result<AdminChannelSettings, SessionError> {
        let settings = self.backend().admin_settings().await?;
        self.update(|session| session.admin_settings = Some(settings));
        Ok(settings)
    }

    /// Flips one channel flag. Last write wins: the new value is computed
    /// from the settings this session last saw.
    pub async fn toggle_channel(&self, channel: Channel) -> Notice {
        let _busy = self.busy(Action::ToggleChannel(channel));
        match self.flip_channel(channel).await {
            Ok(active) => {
                let verb = if active { "activated" } else { "paused" };
                Notice::success(format!("{} {verb}", channel.shout()))
            }
            Err(err) => Notice::from_failure(&format!("Failed to toggle {channel}"), err),
        }
    }

    async fn flip_channel(&self, channel: Channel) -> Result<bool, SessionError> {
        let current = match self.admin_settings() {
            Some(settings) => settings,
            None => self.load_admin_settings().await?,
        };
        let active = !current.is_active(channel);

        self.backend()
            .update_admin_settings(&AdminSettingsUpdate::single(channel, active))
            .await?;
        self.load_admin_settings().await?;
        info!(channel = %channel, active, "channel toggled");
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::storefront;
    use sf_backend_client::InMemoryBackend;
    use sf_backend_client::memory::Endpoint;

    #[tokio::test]
    async fn toggle_loads_settings_first() {
        let store = storefront(InMemoryBackend::new());
        assert_eq!(store.admin_settings(), None);

        let notice = store.toggle_channel(Channel::Instagram).await;
        assert_eq!(notice, Notice::success("INSTAGRAM paused"));
        assert_eq!(store.backend().calls(Endpoint::AdminSettings), 2);
        assert!(!store.admin_settings().unwrap().instagram_active);

        let notice = store.toggle_channel(Channel::Instagram).await;
        assert_eq!(notice, Notice::success("INSTAGRAM activated"));
        assert!(store.admin_settings().unwrap().instagram_active);
    }

    #[tokio::test]
    async fn failed_toggle_names_channel_and_releases_marker() {
        let backend = InMemoryBackend::new();
        backend.fail(Endpoint::UpdateAdminSettings);
        let store = storefront(backend);
        store.load_admin_settings().await.unwrap();

        let notice = store.toggle_channel(Channel::Sms).await;
        assert_eq!(notice, Notice::error("Failed to toggle sms"));
        assert!(!store.is_busy(Action::ToggleChannel(Channel::Sms)));
        assert!(store.admin_settings().unwrap().sms_active);
    }
}
