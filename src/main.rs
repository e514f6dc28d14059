#![deny(unused_crate_dependencies)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod cache;
mod config;
mod error;
mod fetch;
mod holiday;
mod kst;
mod notify;
mod og_image;
mod parse;
mod resolve;

use std::{env, net::SocketAddr, str::FromStr};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::{MenuCache, Store};
use crate::config::Config;
use crate::fetch::make_client;
use crate::holiday::HolidayCalendar;
use crate::notify::{format_menu_message, Notifier};
use crate::resolve::{MenuEntry, Resolver};

pub use error::Result;

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Clone)]
struct AppState {
    cache: MenuCache,
    public_base_url: Option<String>,
}

#[derive(Deserialize)]
struct DailyParams {
    d: Option<String>,
}

async fn daily(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
) -> Json<serde_json::Value> {
    let date = params
        .d
        .as_deref()
        .and_then(|raw| raw.parse::<NaiveDate>().ok())
        .unwrap_or_else(kst::today);
    let entry = state.cache.menu_for(date).await;
    Json(day_payload(date, &entry, state.public_base_url.as_deref()))
}

async fn weekly(State(state): State<AppState>) -> Json<serde_json::Value> {
    let today = kst::today();
    let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
    let mut days = serde_json::Map::new();
    for offset in 0..5 {
        let date = monday + Days::new(offset);
        let entry = state.cache.menu_for(date).await;
        days.insert(kst::weekday_ko(date).to_owned(), weekly_day(date, &entry));
    }
    Json(json!({ "week_of": monday.to_string(), "days": days }))
}

async fn og_card(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let stem = name.strip_suffix(".png").unwrap_or(&name);
    let Ok(date) = stem.parse::<NaiveDate>() else {
        return (StatusCode::BAD_REQUEST, "Invalid date").into_response();
    };
    match state.cache.image_for(date).await {
        Some(png) => Response::builder()
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(png))
            .unwrap(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn day_payload(date: NaiveDate, entry: &MenuEntry, base_url: Option<&str>) -> serde_json::Value {
    let (status, items) = match entry {
        MenuEntry::Items(items) => ("open", Some(items.as_slice())),
        MenuEntry::Closed => ("closed", None),
        MenuEntry::Absent => ("unavailable", None),
    };
    json!({
        "date": date.to_string(),
        "date_display": kst::format_date_ko(date),
        "status": status,
        "items": items.unwrap_or_default(),
        "preview": items.map(preview_line),
        "image_url": format!("{}/og-image/{date}.png", base_url.unwrap_or_default()),
    })
}

/// Per-day slot of the weekly view: the dish list when the cafeteria is
/// open, `null` items otherwise, plus an explicit closed flag.
fn weekly_day(date: NaiveDate, entry: &MenuEntry) -> serde_json::Value {
    json!({
        "date": date.to_string(),
        "items": match entry {
            MenuEntry::Items(items) => Some(items.as_slice()),
            MenuEntry::Closed | MenuEntry::Absent => None,
        },
        "closed": matches!(entry, MenuEntry::Closed),
    })
}

/// Short teaser line for link unfurls: first three dishes plus a count.
fn preview_line(items: &[String]) -> String {
    if items.len() > 3 {
        format!("{} 외 {}가지", items[..3].join(", "), items.len() - 3)
    } else {
        items.join(", ")
    }
}

/// Once a day, shortly before lunch service, resolve today's menu so the
/// cache and the preview card are warm, then push the menu message.
fn spawn_daily_refresh(cache: MenuCache, notifier: Notifier) {
    tokio::spawn(async move {
        loop {
            let wait = kst::until_next_refresh();
            log::info!("Next menu refresh in {wait:?}");
            tokio::time::sleep(wait).await;
            let today = kst::today();
            match cache.menu_for(today).await {
                entry @ MenuEntry::Items(_) => {
                    notifier.send(&format_menu_message(today, &entry));
                    cache.image_for(today).await;
                }
                MenuEntry::Closed => {
                    log::info!("{today} is a closed day, skipping the daily push");
                }
                MenuEntry::Absent => {
                    log::warn!("No menu available for {today} at refresh time");
                }
            }
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let config = Config::from_env()?;
    let store = match env::var("CACHE").as_deref() {
        Ok(":memory:") => Store::memory(),
        Ok(p) => Store::local(p).await?,
        Err(_) => {
            log::warn!("env var CACHE not set, using ad-hoc memory cache.");
            Store::memory()
        }
    };
    let holidays = match env::var("HOLIDAYS_FILE") {
        Ok(path) => HolidayCalendar::korean_with_extra_file(&path)?,
        Err(_) => HolidayCalendar::korean(),
    };
    let client = make_client();
    let notifier = Notifier::from_env(&client);
    let resolver = Resolver::new(client, config.clone(), holidays, notifier.clone());
    let cache = MenuCache::new(store, resolver);
    spawn_daily_refresh(cache.clone(), notifier);

    let addr = SocketAddr::from_str(format!("{}:{}", config.host, config.port).as_str()).unwrap();
    let compression_layer: CompressionLayer = CompressionLayer::new()
        .br(true)
        .deflate(true)
        .gzip(true)
        .zstd(true);
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    let app = Router::new()
        .route("/", get(daily))
        .route("/weekly", get(weekly))
        .route("/og-image/:name", get(og_card))
        .with_state(AppState {
            cache,
            public_base_url: config.public_base_url.clone(),
        })
        .layer(cors_layer)
        .layer(compression_layer);

    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to listen on {addr}: {e}"));
    log::info!("listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
