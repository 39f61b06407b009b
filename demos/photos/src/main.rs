//! Photos example binary
//!
//! Drives the photo list store with a scripted session on the real-time
//! scheduler and prints every state it delivers.

use futures::StreamExt;
use photos::{
    BannerUpdateAction, MockItemProvider, PhotoListAction, PhotoListState, PhotoListStore, PhotoStatus,
};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use viewstore_core::Store;
use viewstore_runtime::Scheduler;

fn describe(state: &PhotoListState) -> String {
    let status = match &state.status {
        PhotoStatus::Loading => "loading".to_string(),
        PhotoStatus::Content(photos) => {
            let titles: Vec<&str> = photos.iter().map(|photo| photo.title.as_str()).collect();
            format!("[{}]", titles.join(", "))
        },
        PhotoStatus::Error(error) => format!("error: {error}"),
    };

    format!(
        "{title} | banner: {banner} ({network:?}) | search: {search:?} | {status}",
        title = state.navigation_title,
        banner = state.banner().title,
        network = state.banner_state.network_state,
        search = state.search_text,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photos=debug,viewstore_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Photos Example: ViewStore Architecture ===\n");

    let scheduler = Scheduler::real_time()?;
    let provider = MockItemProvider::with_count(5).with_latency(scheduler.clone(), Duration::from_millis(300));
    let store = PhotoListStore::new(&provider, scheduler);

    let mut states = store.state_changes().into_stream();
    let printer = tokio::spawn(async move {
        while let Some(state) = states.next().await {
            println!("  state: {}", describe(&state));
        }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\n>>> Showing photo count");
    store.shows_photo_count().set(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n>>> Typing \"2\" then \"Hello-4\" into search");
    store.send(PhotoListAction::Search("2".to_string()));
    tokio::time::sleep(Duration::from_millis(200)).await;
    store.search_text().set("Hello-4".to_string());
    tokio::time::sleep(Duration::from_millis(1_200)).await;

    println!("\n>>> Opening banner update screen and submitting \"Summer sale\"");
    store.show_update_view().set(true);
    let editor = store.banner_update_store();
    editor.working_title().set("Summer sale".to_string());
    editor.send(BannerUpdateAction::Submit);
    tokio::time::sleep(Duration::from_millis(2_200)).await;

    if editor.is_error_presented().get() {
        println!("\n>>> Upload failed, dismissing the error");
        editor.is_error_presented().set(false);
    }
    store.show_update_view().set(false);
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\nFinal state: {}", describe(&store.state()));

    drop(editor);
    drop(store);
    printer.abort();

    println!("\n=== Demonstration Complete ===");
    println!("\nKey concepts demonstrated:");
    println!("  • Derived state: six inputs combined into PhotoListState");
    println!("  • Debounce: search filters only after typing pauses");
    println!("  • Scheduling: states delivered on the real-time scheduler");
    println!("  • Scoping: the banner editor talks to a store scoped out of the list");
    println!("  • Bindings: toggle, search field and error alert");

    Ok(())
}
