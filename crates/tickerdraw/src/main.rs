use lambda_runtime::{Error, LambdaEvent, service_fn};
use logutil::LogFormat;
use tickerdraw_core::config::HandlerConfig;
use tickerdraw_core::handler::S3Handler;
use tickerdraw_core::{InvocationOutput, InvocationRequest};
use tracing::{error, info};

const ENV_LOG_FORMAT: &str = "TICKERDRAW_LOG_FORMAT";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let log_format = match std::env::var(ENV_LOG_FORMAT) {
        Ok(s) if !s.is_empty() => s.parse::<LogFormat>()?,
        _ => LogFormat::default(),
    };
    logutil::configure_global_logger(tracing::Level::INFO, log_format, std::io::stdout);

    // Configuration problems fail the cold start instead of every invocation.
    let config = HandlerConfig::from_env().inspect_err(|e| error!(%e, "invalid configuration"))?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %config.response_mode,
        region = %config.region,
        "starting..."
    );

    let handler = S3Handler::try_from_config(config)?;
    let handler = &handler;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<InvocationRequest>| async move {
        handle(handler, event).await
    }))
    .await
}

async fn handle(
    handler: &S3Handler,
    event: LambdaEvent<InvocationRequest>,
) -> Result<InvocationOutput, Error> {
    let request_id = event.context.request_id;
    match handler.invoke(event.payload).await {
        Ok(output) => Ok(output),
        Err(e) => {
            error!(%request_id, %e, "invocation failed");
            Err(e.into())
        }
    }
}
