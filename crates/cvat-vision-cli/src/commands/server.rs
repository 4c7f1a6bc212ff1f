//! `cvat-vision about` and `cvat-vision formats`.

use crate::output;
use anyhow::{Context, Result};
use cvat_vision::api::BackendClient;
use cvat_vision::LoaderConfig;

pub async fn about(config: &LoaderConfig) -> Result<()> {
    let client = BackendClient::new(config)?;
    let about = client
        .about()
        .await
        .with_context(|| format!("could not query {}", client.base()))?;
    output::print_json(&about)
}

pub async fn formats(config: &LoaderConfig) -> Result<()> {
    let client = BackendClient::new(config)?;
    let formats = client
        .annotation_formats()
        .await
        .with_context(|| format!("could not query {}", client.base()))?;
    output::print_json(&formats)
}
