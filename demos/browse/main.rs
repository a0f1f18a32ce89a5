//! Browse a store listing from the terminal
//!
//! This example demonstrates:
//! - Starting a session over the in-memory source, or over a REST
//!   collection when a YAML config path is given
//! - Changing filters and the category
//! - Scrolling with the sentinel trigger until the list ends
//! - Location reflection and navigating to an external location
//!
//! ```text
//! cargo run --example browse
//! cargo run --example browse -- listing.yaml
//! RUST_LOG=store_feed=debug cargo run --example browse
//! ```

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use store_feed::prelude::*;
use tracing_subscriber::EnvFilter;

fn seed() -> InMemoryStoreSource {
    let names = [
        "Acme Outfitters", "Bluebird Books", "Bright Lamps", "Cedar Coffee", "Dune Travel",
        "Ember Kitchen", "Fjord Sports", "Garnet Jewels", "Harbor Shoes", "Juniper Garden",
        "Kestrel Optics", "Lumen Tech", "Maple Toys", "Nomad Luggage", "Orchid Beauty",
        "Pebble Pets", "Raven Audio", "Tundra Outdoor", "Violet Florist", "Willow Home",
        "Xenon Games", "Yarrow Tea", "Zephyr Bikes", "2Go Travel", "9Lives Cats",
    ];
    let now = Utc::now();
    let stores = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let id = i as u64 + 1;
            let mut store = Store::new(id, *name);
            store.clicks = (id * 37) % 101;
            store.is_promoted = id % 4 == 0;
            store.is_sharable = id % 3 == 0;
            store.published_at = Some(now - ChronoDuration::days(60));
            store.updated_at = Some(now - ChronoDuration::days(id as i64));
            store.cats = vec![if name.contains("Travel") { "travel" } else { "shopping" }.to_string()];
            if id % 2 == 1 {
                store = store.with_cashback(id as f64 / 2.0, RateType::Upto, AmountType::Percent);
            }
            store
        })
        .collect();
    InMemoryStoreSource::with_stores(stores)
}

async fn settle(session: &ListingSession, generation: u64) -> Result<PageSnapshot> {
    let snapshot = session
        .wait_for(|s| s.generation >= generation && !s.loading)
        .await?;
    Ok(snapshot)
}

fn render(title: &str, snapshot: &PageSnapshot) {
    println!("\n📋 {} ({})", title, snapshot.query);
    if let Some(error) = &snapshot.error {
        println!("   ⚠️  {}", error);
    }
    for store in &snapshot.items {
        println!("   - {:<18} {}", store.name, store.cashback_label());
    }
    if snapshot.end_of_list() {
        println!("   (end of list)");
    } else if snapshot.is_empty() && snapshot.error.is_none() {
        println!("   No stores found");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🛍️  store-feed browse example");
    println!("============================");

    let history = InMemoryHistory::new("?_sort=name");
    let mut builder = SessionBuilder::new().with_location(history.clone());

    builder = match std::env::args().nth(1) {
        Some(path) => {
            let config = ListingConfig::from_yaml_file(&path)?;
            println!("✅ Using {}", config.collection_url());
            builder.with_config(config)
        }
        None => {
            let mut config = ListingConfig::default_config();
            config.page_size = 10;
            config.loading_delay_ms = 200;
            config.settle_delay_ms = 50;
            println!("✅ Using the in-memory catalogue");
            builder.with_config(config).with_source(seed())
        }
    };

    let session = builder.start()?;
    let mut events = session.events();
    tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            tracing::info!(action = envelope.event.action(), at = %envelope.timestamp, "listing event");
        }
    });

    let snapshot = settle(&session, 1).await?;
    render("First page", &snapshot);

    // Scroll until the sentinel stops triggering.
    let mut trigger = session.scroll_trigger();
    let mut snapshot = snapshot;
    while let Some(last) = snapshot.items.last() {
        trigger.attach(last.id.clone(), snapshot.has_more);
        let visible = VisibilityEntry {
            target: last.id.clone(),
            element: Bounds::new(720.0, 80.0),
            viewport: Bounds::new(0.0, 800.0),
        };
        if !trigger.observe(&visible) {
            break;
        }
        let page = snapshot.page_number + 1;
        snapshot = session
            .wait_for(|s| (s.page_number == page || s.error.is_some()) && !s.loading)
            .await?;
    }
    render("After scrolling", &snapshot);

    session.apply_filters(
        FilterSelection::new()
            .with_cashback_only(true)
            .with_sort(SortOrder::Cashback),
    )?;
    render("Cashback first", &settle(&session, snapshot.generation + 1).await?);
    println!("   🔗 location: ?{}", history.current());

    session.select_category(Some("travel".to_string()))?;
    let travel = settle(&session, snapshot.generation + 2).await?;
    render("Travel", &travel);

    session.apply_filters(FilterSelection::new().with_letter("D"))?;
    let letter_d = settle(&session, travel.generation + 1).await?;
    render("Travel, letter D", &letter_d);

    session.navigate("?_sort=clicks&_order=desc")?;
    render("Most popular", &settle(&session, letter_d.generation + 1).await?);

    let bookmarks = BookmarkSet::new();
    if let Some(first) = letter_d.items.first() {
        bookmarks.toggle(&first.id);
    }
    println!("\n❤️  {} = {}", BOOKMARKS_KEY, bookmarks.to_json());

    drop(trigger);
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.shutdown().await;
    println!("\n👋 Done");
    Ok(())
}
