use std::sync::Arc;

use gatehouse_core::{
    audit::AuditLog, config::Config, store::JsonFileStore, App, AppConfig, Stores,
};

#[tokio::main]
async fn main() -> Result<(), gatehouse_core::Error> {
    let cfg = Config::load()?;
    gatehouse_core::logging::init("gatehouse", cfg.log_json)?;

    let store = Arc::new(JsonFileStore::open(&cfg.data_file)?);
    let audit = Arc::new(AuditLog::new(&cfg.audit_log_path));
    tracing::info!(
        data_file = %cfg.data_file.display(),
        audit_log = %cfg.audit_log_path.display(),
        maintenance = cfg.maintenance,
        "storage ready"
    );

    let bot = gatehouse_telegram::router::bot(&cfg);
    let app = Arc::new(App::new(
        gatehouse_telegram::router::messenger(&bot),
        Stores::shared(store, audit),
        AppConfig::from(&cfg),
    ));
    app.seed_superadmin().await?;
    if cfg.superadmin_id.is_none() {
        tracing::warn!("SUPERADMIN_ID not set; only registry admins can open the panel");
    }

    gatehouse_telegram::router::run_polling(bot, app)
        .await
        .map_err(|e| gatehouse_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
