use sf_api_types::Channel;
use sf_backend_client::StorefrontBackend;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::{Shop, parse_channel, render, show_profile, watch_dashboard};

const HELP: &str = "\
commands:
  products                  list the catalog
  view <id>                 product detail
  add <id> | remove <id>    change the cart
  cart | checkout           show or check out the cart
  opt-in <phone> [channel]  give consent (whatsapp, sms, instagram)
  profile | revoke | delete consent state
  trigger | preview         abandoned-cart message and its preview
  send | close              simulate sending, or dismiss the preview
  admin | toggle <channel>  channel switches
  dashboard [ticks]         poll analytics (Ctrl-C stops)
  messages | events         history for this identity
  convert <message_id>      report a click-through
  help | quit";

/// Line-oriented storefront session on stdin. Cart changes are tracked in
/// the background of each command: events are flushed before the next prompt.
pub async fn run<B: StorefrontBackend>(store: &Shop<B>, origin: &str) -> anyhow::Result<()> {
    println!("ShopFlow shell. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let report = store.flush_events().await;
        if report.dropped > 0 {
            debug!(dropped = report.dropped, "tracking events lost");
        }

        print!("shopflow> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        match (command, arg) {
            ("quit" | "exit", _) => break,
            ("help", _) => println!("{HELP}"),
            ("products", _) => render::products(&store.products()),
            ("view", Some(id)) => match store.product(id) {
                Some(product) => render::product_detail(&product),
                None => println!("no product with id {id}"),
            },
            ("add", Some(id)) => match store.product(id) {
                Some(product) => render::notice(&store.add_to_cart(&product)),
                None => println!("no product with id {id}"),
            },
            ("remove", Some(id)) => render::notice(&store.remove_from_cart(id)),
            ("cart", _) => render::cart(&store.cart()),
            ("checkout", _) => render::notice(&store.checkout()),
            ("opt-in", Some(phone)) => {
                let channel = match words.next().map(parse_channel).transpose() {
                    Ok(channel) => channel.unwrap_or(Channel::Whatsapp),
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                render::notice(&store.opt_in(phone, channel).await);
            }
            ("profile", _) => show_profile(store),
            ("revoke", _) => render::notice(&store.revoke_consent().await),
            ("delete", _) => {
                render::notice(&store.delete_all_data().await);
                if let Some(fresh) = store.reload_after_delay().await {
                    println!("New identity: {fresh}");
                }
            }
            ("trigger", _) => {
                render::notice(&store.trigger_abandoned_cart().await);
                if let Some(preview) = store.preview().as_preview() {
                    render::preview(preview, origin);
                }
            }
            ("preview", _) => match store.preview().as_preview() {
                Some(preview) => render::preview(preview, origin),
                None => println!("no message preview open"),
            },
            ("send", _) => render::notice(&store.send_message().await),
            ("close", _) => store.close_preview(),
            ("admin", _) => match store.load_admin_settings().await {
                Ok(settings) => render::admin(&settings),
                Err(err) => println!("could not load admin settings: {err}"),
            },
            ("toggle", Some(channel)) => match parse_channel(channel) {
                Ok(channel) => render::notice(&store.toggle_channel(channel).await),
                Err(message) => println!("{message}"),
            },
            ("dashboard", ticks) => {
                let ticks = ticks.and_then(|t| t.parse().ok()).unwrap_or(0);
                watch_dashboard(store, ticks).await?;
            }
            ("messages", _) => match store.message_history().await {
                Ok(messages) => render::messages(&messages),
                Err(err) => println!("could not load messages: {err}"),
            },
            ("events", _) => match store.event_history().await {
                Ok(events) => render::events(&events),
                Err(err) => println!("could not load events: {err}"),
            },
            ("convert", Some(message_id)) => render::notice(&store.record_conversion(message_id).await),
            _ => println!("unrecognised command; type `help`"),
        }
    }
    Ok(())
}
