use sf_api_types::{AdminChannelSettings, AnonId, ConsentProfile, Product};
use sf_backend_client::StorefrontBackend;
use std::cell::RefCell;
use tracing::{debug, info, warn};

use crate::cart::Cart;
use crate::config::SessionConfig;
use crate::dashboard::{DashboardState, PollHandle};
use crate::error::SessionError;
use crate::identity::{IdentityStore, generate_identity};
use crate::in_flight::{Action, Busy, InFlight};
use crate::messaging::PreviewState;
use crate::timer::Timer;
use crate::tracker::EventOutbox;

/// Everything a front end renders. Owned by one [`Storefront`] and only
/// mutated through its operations.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub identity: Option<AnonId>,
    pub products: Vec<Product>,
    pub cart: Cart,
    pub profile: Option<ConsentProfile>,
    pub preview: PreviewState,
    pub admin_settings: Option<AdminChannelSettings>,
    pub dashboard: DashboardState,
    pub in_flight: InFlight,
    /// Set after a data deletion; the front end calls
    /// [`Storefront::reload_after_delay`] to start over with a new identity.
    pub reload_pending: bool,
    pub(crate) outbox: EventOutbox,
}

/// Controller for one storefront session.
///
/// Every operation takes `&self` and releases its borrow of the session
/// before awaiting, so one `Rc<Storefront>` can serve all UI handlers and
/// the dashboard poller at once.
pub struct Storefront<B, S, T> {
    backend: B,
    identity_store: S,
    timer: T,
    config: SessionConfig,
    pub(crate) state: RefCell<Session>,
    pub(crate) poller: RefCell<Option<PollHandle>>,
}

impl<B, S, T> Storefront<B, S, T>
where
    B: StorefrontBackend,
    S: IdentityStore,
    T: Timer,
{
    pub fn new(backend: B, identity_store: S, timer: T) -> Self {
        Self::with_config(backend, identity_store, timer, SessionConfig::default())
    }

    pub fn with_config(backend: B, identity_store: S, timer: T, config: SessionConfig) -> Self {
        Self {
            backend,
            identity_store,
            timer,
            config,
            state: RefCell::new(Session::default()),
            poller: RefCell::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn identity_store(&self) -> &S {
        &self.identity_store
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read the session without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&Session) -> R) -> R {
        read(&self.state.borrow())
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub(crate) fn update<R>(&self, write: impl FnOnce(&mut Session) -> R) -> R {
        write(&mut self.state.borrow_mut())
    }

    pub(crate) fn busy(&self, action: Action) -> Busy<'_> {
        Busy::begin(&self.state, action)
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.with(|session| session.in_flight.contains(action))
    }

    pub fn identity(&self) -> Option<AnonId> {
        self.with(|session| session.identity.clone())
    }

    pub(crate) fn require_identity(&self) -> Result<AnonId, SessionError> {
        self.identity().ok_or(SessionError::NotInitialized)
    }

    /// Resolve (or create) the anonymous identity, then load the consent
    /// profile and the catalog. Backend failures are logged and leave the
    /// corresponding state empty.
    pub async fn initialize(&self) -> AnonId {
        let anon_id = self.resolve_identity();
        self.update(|session| {
            session.identity = Some(anon_id.clone());
            session.reload_pending = false;
        });
        info!(%anon_id, "session initialised");

        if let Err(err) = self.refresh_profile().await {
            warn!(error = %err, "could not load consent profile");
        }
        if let Err(err) = self.load_catalog().await {
            warn!(error = %err, "could not load products");
        }
        anon_id
    }

    fn resolve_identity(&self) -> AnonId {
        let key = &self.config.identity_key;
        if let Some(existing) = self.identity_store.load(key) {
            return AnonId(existing);
        }

        let anon_id = generate_identity(self.timer.now_ms(), &mut rand::thread_rng());
        if let Err(err) = self.identity_store.save(key, anon_id.as_str()) {
            warn!(error = %err, "identity will not survive a reload");
        }
        debug!(%anon_id, "generated new identity");
        anon_id
    }

    /// Drop all in-memory state and start over, as a page reload would.
    pub async fn reload(&self) -> AnonId {
        self.close_dashboard();
        self.update(|session| *session = Session::default());
        self.initialize().await
    }

    /// Wait out the post-deletion pause, then reload. Returns `None` when no
    /// reload was pending.
    pub async fn reload_after_delay(&self) -> Option<AnonId> {
        if !self.needs_reload() {
            return None;
        }
        self.timer.sleep(self.config.reload_delay).await;
        Some(self.reload().await)
    }

    pub fn needs_reload(&self) -> bool {
        self.with(|session| session.reload_pending)
    }

    pub async fn load_catalog(&self) -> Result<usize, SessionError> {
        let products = self.backend.list_products().await?;
        let count = products.len();
        self.update(|session| session.products = products);
        debug!(count, "catalog loaded");
        Ok(count)
    }

    pub fn products(&self) -> Vec<Product> {
        self.with(|session| session.products.clone())
    }

    pub fn product(&self, id: &str) -> Option<Product> {
        self.with(|session| session.products.iter().find(|p| p.id == id).cloned())
    }

    pub(crate) async fn refresh_profile(&self) -> Result<(), SessionError> {
        let anon_id = self.require_identity()?;
        let profile = self.backend.get_profile(&anon_id).await?;
        self.update(|session| session.profile = profile);
        Ok(())
    }
}
