//! Command-line demo of the to-do list.
//!
//! Runs the whole sync loop against the in-memory remote store: an identity
//! provider signs a user in, the store subscribes to that user's items, and
//! every command round-trips through a transaction and a pushed snapshot.

use anyhow::Context;
use livelist_core::environment::{SystemClock, UuidGenerator};
use livelist_core::identity::IdentityProvider;
use livelist_runtime::metrics::MetricsServer;
use livelist_runtime::{Store, StoreConfig};
use livelist_testing::{InMemoryIdentityProvider, InMemoryRemoteStore};
use std::sync::Arc;
use std::time::Duration;
use todo::{Config, Screen, TodoAction, TodoEnvironment, TodoReducer, TodoState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.observability.log_filter)
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(app_id = %config.store.app_id, "Starting to-do demo");

    let mut metrics = config.observability.metrics_addr.map(MetricsServer::new);
    if let Some(server) = metrics.as_mut() {
        server.start().context("starting metrics server")?;
    }

    let remote = Arc::new(InMemoryRemoteStore::new());
    let identity = InMemoryIdentityProvider::new();

    let env = TodoEnvironment::new(Arc::new(SystemClock), Arc::new(UuidGenerator), remote.clone());
    let store_config = StoreConfig::default();
    let shutdown_timeout = store_config.default_shutdown_timeout;
    let store = Store::with_config(TodoState::new(), TodoReducer::new(), env, store_config);

    // Sessions flow into the store as SignIn / SignOut
    let _session_feed = store.observe(identity.watch(), TodoAction::from);

    println!("{}\n", render(&store).await);

    identity.sign_in("u1");
    wait_for_list(&store).await?;
    println!("{}\n", render(&store).await);

    for text in ["buy milk", "write docs", "ship it"] {
        store.send(TodoAction::AddTodo { text: text.to_string() }).await?;
    }
    wait_until(&store, |s| s.items().len() == 3).await?;
    println!("{}\n", render(&store).await);

    let first = store.state(|s| s.items().first().map(|item| item.id)).await;
    if let Some(id) = first {
        store.send(TodoAction::ToggleTodo { id }).await?;
        wait_until(&store, |s| s.remaining() == 2).await?;
        println!("{}\n", render(&store).await);
    }

    store.send(TodoAction::DeleteCompleted).await?;
    wait_until(&store, |s| s.items().len() == 2).await?;
    println!("{}\n", render(&store).await);

    store.send(TodoAction::ToggleAll).await?;
    wait_until(&store, |s| s.remaining() == 0).await?;
    println!("{}\n", render(&store).await);

    identity.sign_out();
    wait_until(&store, |s| s.owner().is_none()).await?;
    println!("{}\n", render(&store).await);

    tracing::info!(
        transactions = remote.transaction_count(),
        "Demo complete, shutting down"
    );
    store.shutdown(shutdown_timeout).await?;

    if let Some(rendered) = metrics.as_ref().and_then(MetricsServer::render) {
        tracing::debug!("{rendered}");
    }
    Ok(())
}

async fn render(store: &TodoStore) -> Screen {
    store.state(Screen::from_state).await
}

async fn wait_for_list(store: &TodoStore) -> anyhow::Result<()> {
    wait_until(store, |s| s.owner().is_some() && !s.query.loading).await
}

/// Polls state until `done` holds; snapshots arrive asynchronously
async fn wait_until<F>(store: &TodoStore, done: F) -> anyhow::Result<()>
where
    F: Fn(&TodoState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !store.state(&done).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("timed out waiting for the list to update")
}
