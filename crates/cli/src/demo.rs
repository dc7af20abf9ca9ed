//! `curio demo` -- walk a scripted rental through its lifecycle.
//!
//! Creates one request against an in-memory backend, drives it to completion
//! (through the digitization branch when asked), and prints the audit trail.
//! Useful as a smoke test and as a readable tour of the state machine.

use std::error::Error;
use std::sync::Arc;

use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use curio_core::{Actor, Decision, Direction, Pricing, RentalWindow, Side};
use curio_engine::{Engine, EngineConfig, NewRequest};
use curio_storage::MemoryStore;

use crate::OutputFormat;

pub(crate) async fn run(virtual_museum: bool, output: OutputFormat) -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store, EngineConfig::default());

    let museum = Actor::admin("demo-curator", Side::Museum);
    let exchange = Actor::admin("demo-broker", Side::Exchange);

    let now = OffsetDateTime::now_utc();
    let created = engine
        .create_request(NewRequest {
            direction: Direction::MuseumToExchange,
            artifact_ref: "artifact-amber-room-panel".to_string(),
            museum_ref: "museum-demo".to_string(),
            window: RentalWindow {
                start_date: now + Duration::days(7),
                end_date: now + Duration::days(37),
                requested_days: 30,
            },
            pricing: Pricing {
                total_amount: Decimal::new(450_000, 2),
                security_deposit: Decimal::new(90_000, 2),
                currency: "EUR".to_string(),
            },
            for_virtual_museum: virtual_museum,
        })
        .await?;
    let id = created.id.clone();

    engine.decide(&id, &museum, Decision::Approve, "demo-01", None).await?;
    engine.decide(&id, &exchange, Decision::Approve, "demo-02", None).await?;
    engine.mark_paid(&id, &exchange, "demo-03").await?;
    engine.confirm(&id, &museum, "demo-04").await?;
    engine.mark_in_transit(&id, &museum, "demo-05").await?;
    engine.mark_active(&id, &exchange, "demo-06").await?;

    if virtual_museum {
        engine
            .upload_model(&id, "model-3d-amber-room", &exchange, "demo-07")
            .await?;
        engine.approve_model(&id, &museum, "demo-08").await?;
    }

    let done = engine.return_artifact(&id, &exchange, "demo-09").await?;

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&done.request)?);
        }
        OutputFormat::Text => {
            let request = &done.request;
            println!("request {}  [{}]", request.id, request.status);
            println!(
                "  {} -> {} for {} {}",
                request.direction, request.museum_ref, request.pricing.total_amount,
                request.pricing.currency
            );
            println!("  audit trail ({} entries):", request.audit_trail.len());
            for entry in &request.audit_trail {
                println!(
                    "    {:<20} {:<22} -> {:<22} by {}",
                    entry.action, entry.from_status, entry.to_status, entry.actor
                );
            }
        }
    }
    Ok(())
}
