//! CLI handler for the `plan` subcommand
//!
//! Validates the trip, runs the coordinator in-process and prints the final plan.

use crate::cli::{load_config, make_offline, OutputFormat, PlanArgs};
use crate::output::render_text;
use crate::request::{FormNumber, TripForm, TripRequest};
use crate::status::StatusTracker;
use crate::workflow::Coordinator;
use std::sync::Arc;
use tracing::{debug, info};

fn form_from_args(args: &PlanArgs) -> TripForm {
    TripForm {
        destination: args.destination.clone(),
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
        budget: Some(args.budget.clone()),
        currency: Some(args.currency.clone()),
        group_size: Some(FormNumber::Number(args.group_size)),
        interests: args.interests.clone(),
        dietary: args.dietary.clone(),
        mobility: args.mobility.clone(),
        activity_level: Some(args.activity_level.clone()),
    }
}

pub async fn execute(args: PlanArgs) -> anyhow::Result<()> {
    // Reject bad input before touching config or collaborators
    let request = TripRequest::from_form(&form_from_args(&args))?;

    let mut config = load_config(args.config.as_deref())?;
    if args.offline {
        make_offline(&mut config);
    }
    if let Some(max) = args.max_iterations {
        config.workflow.max_iterations = max;
    }
    config.validate()?;

    info!(
        "Planning {} ({} days) with {} reasoner",
        request.destination,
        request.duration_days(),
        config.model.provider
    );

    let coordinator = Coordinator::from_config(Arc::new(config));
    let tracker = StatusTracker::new("cli");

    let mut updates = tracker.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let status = updates.borrow_and_update().clone();
            info!("[{:>3}%] {}", status.progress, status.message);
        }
    });

    let result = coordinator.run(request, &tracker).await;
    debug!("Final status: {}", tracker.snapshot().message);
    drop(tracker);
    let _ = progress.await;
    let run = result?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run.plan)?),
        OutputFormat::Text => print!("{}", render_text(&run.plan)),
    }

    info!(
        "Finished in {:?} after {} iterations",
        run.duration, run.state.iteration
    );
    Ok(())
}
