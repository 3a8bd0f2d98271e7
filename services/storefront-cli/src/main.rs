//! ShopFlow terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog served by the backend
//! shopflow products
//!
//! # Opt in to cart reminders over SMS
//! shopflow profile opt-in --phone "+1 234 567 8900" --channel sms
//!
//! # Pause WhatsApp delivery
//! shopflow admin toggle whatsapp
//!
//! # Watch analytics (Ctrl-C to stop)
//! shopflow dashboard
//!
//! # Interactive session against the built-in simulated backend
//! shopflow --offline shell
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use anyhow::bail;
use clap::{Parser, Subcommand};
use sf_api_types::Channel;
use sf_backend_client::{InMemoryBackend, StorefrontBackend};
use sf_backend_http::HttpBackend;
use sf_session::{FileIdentityStore, Notice, Storefront};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod render;
mod shell;
mod timer;

use timer::TokioTimer;

pub(crate) type Shop<B> = Storefront<B, FileIdentityStore, TokioTimer>;

#[derive(Parser)]
#[command(name = "shopflow")]
#[command(author, version, about = "ShopFlow demo storefront client")]
struct Cli {
    /// Backend base URL; `/api` is appended
    #[arg(long, env = "SHOPFLOW_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// File the anonymous identity is kept in
    #[arg(
        long,
        env = "SHOPFLOW_IDENTITY_FILE",
        default_value = ".shopflow_anon_id",
        global = true
    )]
    identity_file: PathBuf,

    /// Storefront origin used in message links
    #[arg(
        long,
        env = "SHOPFLOW_STOREFRONT_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    storefront_url: String,

    /// Use the built-in simulated backend instead of HTTP
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Products,
    /// Show one product
    View { id: String },
    /// Show or change messaging consent
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Channel switches
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Poll analytics and activity logs until Ctrl-C
    Dashboard {
        /// Stop after this many refreshes (0 = run until interrupted)
        #[arg(long, default_value_t = 0)]
        ticks: u32,
    },
    /// Messages or tracked events recorded for this identity
    History {
        #[command(subcommand)]
        kind: HistoryKind,
    },
    /// Report a click-through conversion for a message link
    Convert { message_id: String },
    /// Interactive storefront session (cart, preview, dashboard)
    Shell,
    /// Scripted walk through the abandoned-cart flow
    Demo {
        #[arg(long, default_value = "+15551234567")]
        phone: String,
        #[arg(long, default_value = "whatsapp", value_parser = parse_channel)]
        channel: Channel,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show identity and consent state
    Show,
    /// Opt in to cart reminders
    OptIn {
        #[arg(short, long)]
        phone: String,
        /// `whatsapp`, `sms` or `instagram`
        #[arg(short, long, default_value = "whatsapp", value_parser = parse_channel)]
        channel: Channel,
    },
    /// Revoke messaging consent
    Revoke,
    /// Delete every record for this identity and start a new one
    Delete,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Show channel switches
    Show,
    /// Pause or activate a channel
    Toggle {
        #[arg(value_parser = parse_channel)]
        channel: Channel,
    },
}

#[derive(Subcommand)]
enum HistoryKind {
    Messages,
    Events,
}

pub(crate) fn parse_channel(value: &str) -> Result<Channel, String> {
    Channel::parse(value).ok_or_else(|| format!("unknown channel `{value}`"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.offline {
        run(cli, InMemoryBackend::new().with_simulated_webhooks()).await
    } else {
        let backend = HttpBackend::new(cli.backend_url.clone());
        info!(base_url = backend.base_url(), "using HTTP backend");
        run(cli, backend).await
    }
}

async fn run<B: StorefrontBackend>(cli: Cli, backend: B) -> anyhow::Result<()> {
    let store: Shop<B> = Storefront::new(
        backend,
        FileIdentityStore::new(&cli.identity_file),
        TokioTimer,
    );
    let anon_id = store.initialize().await;
    info!(%anon_id, "session ready");

    match cli.command {
        Commands::Products => render::products(&store.products()),
        Commands::View { id } => match store.product(&id) {
            Some(product) => render::product_detail(&product),
            None => bail!("no product with id {id}"),
        },
        Commands::Profile { action } => match action {
            ProfileAction::Show => show_profile(&store),
            ProfileAction::OptIn { phone, channel } => {
                report(store.opt_in(&phone, channel).await)?;
                show_profile(&store);
            }
            ProfileAction::Revoke => report(store.revoke_consent().await)?,
            ProfileAction::Delete => {
                report(store.delete_all_data().await)?;
                if let Some(fresh) = store.reload_after_delay().await {
                    println!("New identity: {fresh}");
                }
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Show => {
                let settings = store.load_admin_settings().await?;
                render::admin(&settings);
            }
            AdminAction::Toggle { channel } => {
                report(store.toggle_channel(channel).await)?;
                if let Some(settings) = store.admin_settings() {
                    render::admin(&settings);
                }
            }
        },
        Commands::Dashboard { ticks } => watch_dashboard(&store, ticks).await?,
        Commands::History { kind } => match kind {
            HistoryKind::Messages => render::messages(&store.message_history().await?),
            HistoryKind::Events => render::events(&store.event_history().await?),
        },
        Commands::Convert { message_id } => report(store.record_conversion(&message_id).await)?,
        Commands::Shell => shell::run(&store, &cli.storefront_url).await?,
        Commands::Demo { phone, channel } => demo(&store, &cli.storefront_url, &phone, channel).await?,
    }
    Ok(())
}

/// Print a notice; error notices fail the command.
fn report(notice: Notice) -> anyhow::Result<()> {
    render::notice(&notice);
    if notice.is_error() {
        bail!(notice.message);
    }
    Ok(())
}

pub(crate) fn show_profile<B: StorefrontBackend>(store: &Shop<B>) {
    let anon_id = store.identity();
    render::profile(anon_id.as_ref().map(|id| id.as_str()), store.profile().as_ref());
}

/// Drive the poller and print each refresh until `ticks` renders or Ctrl-C.
pub(crate) async fn watch_dashboard<B: StorefrontBackend>(
    store: &Shop<B>,
    ticks: u32,
) -> anyhow::Result<()> {
    let token = store.open_dashboard();
    let interval = store.config().poll_interval;
    let settle = Duration::from_millis(250);

    let printer = async {
        let mut rendered = 0;
        loop {
            tokio::time::sleep(settle).await;
            render::dashboard(store.analytics().as_ref(), &store.recent_logs());
            rendered += 1;
            if ticks != 0 && rendered >= ticks {
                break;
            }
            tokio::time::sleep(interval.saturating_sub(settle)).await;
            println!();
        }
    };

    let outcome = tokio::select! {
        _ = store.run_dashboard_polling(token) => Ok(()),
        _ = printer => Ok(()),
        interrupted = tokio::signal::ctrl_c() => interrupted,
    };
    store.close_dashboard();
    Ok(outcome?)
}

async fn demo<B: StorefrontBackend>(
    store: &Shop<B>,
    origin: &str,
    phone: &str,
    channel: Channel,
) -> anyhow::Result<()> {
    let catalog = store.products();
    if catalog.len() < 2 {
        bail!("the demo needs at least two products, found {}", catalog.len());
    }
    render::products(&catalog);

    println!("\n== cart");
    report(store.add_to_cart(&catalog[0]))?;
    report(store.add_to_cart(&catalog[1]))?;
    store.flush_events().await;
    render::cart(&store.cart());

    println!("\n== consent");
    report(store.opt_in(phone, channel).await)?;
    show_profile(store);

    println!("\n== abandoned cart");
    report(store.trigger_abandoned_cart().await)?;
    if let Some(preview) = store.preview().as_preview() {
        render::preview(preview, origin);
    }
    report(store.send_message().await)?;

    println!("\n== dashboard");
    watch_dashboard(store, 2).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shopflow",
            "profile",
            "opt-in",
            "--phone",
            "+15551234567",
            "--channel",
            "SMS",
            "--offline",
        ])
        .unwrap();
        assert!(cli.offline);
        match cli.command {
            Commands::Profile {
                action: ProfileAction::OptIn { phone, channel },
            } => {
                assert_eq!(phone, "+15551234567");
                assert_eq!(channel, Channel::Sms);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn unknown_channel_is_rejected() {
        assert!(Cli::try_parse_from(["shopflow", "admin", "toggle", "fax"]).is_err());
    }

    #[tokio::test]
    async fn demo_runs_offline() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("shopflow-demo-{}", std::process::id()));
        let store: Shop<InMemoryBackend> = Storefront::new(
            InMemoryBackend::new(),
            FileIdentityStore::new(&path),
            TokioTimer,
        );
        store.initialize().await;

        demo(&store, "http://localhost:3000", "+15551234567", Channel::Sms).await?;
        assert_eq!(store.cart().len(), 2);
        assert_eq!(store.analytics().map(|a| a.sent), Some(1));
        assert!(!store.with(|s| s.dashboard.open));

        std::fs::remove_file(&path)?;
        Ok(())
    }
}
