use domain::{
    orders::{self, OrderStatus, SharedTransitionTable},
    TransitionError,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Request {
    /// Check a single status change
    Validate { current: String, requested: String },

    /// List the legal next statuses
    Describe { status: String },

    /// Re-read the transition table and publish it
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let table = SharedTransitionTable::new(orders::load_from_env()?);

    lambda_runtime::run(service_fn(|event: LambdaEvent<Request>| async {
        handle(event.payload, &table)
    }))
    .await
}

fn handle(request: Request, table: &SharedTransitionTable) -> Result<Value, Error> {
    match request {
        Request::Validate { current, requested } => {
            let current: OrderStatus = current.parse()?;
            let requested: OrderStatus = requested.parse()?;

            match table.validator().validate_transition(current, requested) {
                Ok(()) => {
                    tracing::info!("Accepted {} -> {}", current, requested);
                    Ok(json!({ "allowed": true, "statusCode": 200 }))
                }
                Err(err) => {
                    tracing::warn!("{}", err);
                    Ok(rejection(&err))
                }
            }
        }

        Request::Describe { status } => {
            let status: OrderStatus = status.parse()?;
            let validator = table.validator();

            Ok(json!({
                "status": status,
                "terminal": validator.is_terminal(status),
                "targets": validator.allowed_targets(status),
            }))
        }

        Request::Reload => {
            let next = orders::load_from_env()?;
            let transitions = next.len();
            table.publish(next);

            Ok(json!({ "reloaded": true, "transitions": transitions }))
        }
    }
}

// Illegal transitions are the caller's fault: bad request.
fn rejection(err: &TransitionError) -> Value {
    json!({
        "allowed": false,
        "statusCode": 400,
        "error": "InvalidTransition",
        "message": err.to_string(),
    })
}
