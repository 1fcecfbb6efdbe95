//! saferoute demo CLI.
//!
//! Scores a route against the risk-zone catalog, then drives a
//! simulated trip along it to arrival:
//!
//!   cargo run -p saferoute-cli -- --tick-ms 400

use anyhow::{Context, Result};
use clap::Parser;
use saferoute_core::models::{ManeuverKind, Step};
use saferoute_core::spatial::offset_by_bearing;
use saferoute_core::zones::RiskZoneIndex;
use saferoute_core::{analyze, RiskZone, RouteError, RoutePlan, TripEvent};
use saferoute_session::{AnnouncementSink, NavigationSession, PositionFeed, SessionOptions};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Score a route and simulate walking it")]
struct Args {
    /// Routing-service response JSON ({"routes": [...]}); defaults to a
    /// built-in demo route
    #[arg(long)]
    route: Option<PathBuf>,

    /// Risk-zone catalog JSON (array of zones); defaults to the
    /// built-in demo catalog
    #[arg(long)]
    zones: Option<PathBuf>,

    /// Simulator tick interval in milliseconds
    #[arg(long, default_value_t = 400)]
    tick_ms: u64,

    /// Start with voice announcements muted
    #[arg(long, default_value_t = false)]
    muted: bool,

    /// Print the safety assessment as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Language tag passed to the announcement sink
    #[arg(long, default_value = "en")]
    language: String,
}

/// Shape of the routing collaborator's response.
#[derive(Debug, Deserialize)]
struct RouteResponse {
    routes: Vec<RoutePlan>,
}

struct LogAnnouncer;

impl AnnouncementSink for LogAnnouncer {
    fn announce(&self, instruction: &str, language: &str) {
        tracing::info!(language, "announce: {instruction}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("saferoute_cli=info".parse()?)
                .add_directive("saferoute_session=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let plan = match &args.route {
        Some(path) => load_plan(path)?,
        None => demo_plan(),
    };
    let index = match &args.zones {
        Some(path) => load_zones(path)?,
        None => RiskZoneIndex::demo_catalog(),
    };

    let assessment = analyze(&plan.geometry, index.zones());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        println!(
            "Safety score: {}/100 ({})",
            assessment.score,
            assessment.risk_level.label()
        );
        for prox in &assessment.zones {
            println!(
                "  {} [{}] {:.0}m from route{}",
                prox.zone.name,
                prox.zone.level.label(),
                prox.distance_m,
                if prox.passes_through { " - on route" } else { "" }
            );
        }
        for warning in &assessment.warnings {
            println!("  ! {warning}");
        }
    }

    let options = SessionOptions {
        language: args.language.clone(),
        muted: args.muted,
        ..SessionOptions::default()
    };
    let mut handle = NavigationSession::start(
        plan,
        PositionFeed::simulated(Duration::from_millis(args.tick_ms)),
        options,
        Some(Arc::new(LogAnnouncer)),
    )?;

    let mut events = handle.subscribe_events();
    let mut state_rx = handle.watch_state();

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow().clone();
                tracing::info!(
                    "step {} | {:.0}% | {:.0}m left | {:.1} km/h{}",
                    state.step_index,
                    state.step_progress * 100.0,
                    state.remaining_distance_m,
                    state.speed_kmh,
                    if state.off_route { " | OFF ROUTE" } else { "" },
                );
            }
            event = events.recv() => match event {
                Ok(TripEvent::Arrived) => {
                    tracing::info!("arrived at destination");
                    break;
                }
                Ok(TripEvent::StepAdvanced { index }) => {
                    tracing::info!("advanced to step {index}");
                }
                Ok(_) => {}
                Err(_) => break,
            },
        }
    }

    handle.stop().await;
    Ok(())
}

fn load_plan(path: &PathBuf) -> Result<RoutePlan> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading route file {}", path.display()))?;
    let response: RouteResponse = serde_json::from_str(&raw).context("parsing route file")?;
    let plan = response
        .routes
        .into_iter()
        .next()
        .ok_or(RouteError::NoRouteFound)?;
    plan.validate()?;
    Ok(plan)
}

fn load_zones(path: &PathBuf) -> Result<RiskZoneIndex> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading zones file {}", path.display()))?;
    let zones: Vec<RiskZone> = serde_json::from_str(&raw).context("parsing zones file")?;
    Ok(RiskZoneIndex::new(zones))
}

/// Built-in demo: a ~2km walk north through downtown.
fn demo_plan() -> RoutePlan {
    const START_LAT: f64 = 33.6800;
    const START_LON: f64 = -117.8300;

    let geometry = (0..11)
        .map(|i| {
            let (lat, lon) = offset_by_bearing(START_LAT, START_LON, i as f64 * 200.0, 0.0);
            [lon, lat]
        })
        .collect();

    RoutePlan {
        geometry,
        steps: vec![
            Step {
                instruction: "Head north on Harbor Blvd".into(),
                distance_m: 800.0,
                maneuver: ManeuverKind::Straight,
                street: "Harbor Blvd".into(),
                hazard_advisory: None,
            },
            Step {
                instruction: "Turn right onto 4th St".into(),
                distance_m: 600.0,
                maneuver: ManeuverKind::TurnRight,
                street: "4th St".into(),
                hazard_advisory: Some("Poor lighting after dark".into()),
            },
            Step {
                instruction: "Turn left onto Main St".into(),
                distance_m: 600.0,
                maneuver: ManeuverKind::TurnLeft,
                street: "Main St".into(),
                hazard_advisory: None,
            },
            Step {
                instruction: "You have arrived at your destination".into(),
                distance_m: 0.0,
                maneuver: ManeuverKind::Arrive,
                street: "Main St".into(),
                hazard_advisory: None,
            },
        ],
        total_distance_m: 2000.0,
        total_duration_s: 1500.0,
    }
}
