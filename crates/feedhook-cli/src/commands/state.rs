use anyhow::Result;

use feedhook_core::{
    store::{LinkStore, StateStore},
    AppConfig,
};

pub async fn show(config: &AppConfig) -> Result<()> {
    config.validate_state()?;

    let store = StateStore::from_config(config)?;
    let link = store.get().await?;

    println!("Store: {}", store.describe());
    if link.is_empty() {
        println!("No link recorded yet.");
    } else {
        println!("Last link: {}", link);
    }

    store.report_usage();
    Ok(())
}

pub async fn set(config: &AppConfig, link: &str) -> Result<()> {
    config.validate_state()?;

    let store = StateStore::from_config(config)?;
    store.set(link).await?;

    println!("Recorded {} in {}", link, store.describe());
    Ok(())
}
