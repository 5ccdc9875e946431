use ingress_log::{server, settings, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = settings::load_from_env()?;
    telemetry::init(&settings.log_level, &settings.log_format);
    settings.print_summary();

    server::run(settings).await
}
