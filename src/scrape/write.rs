use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::product::Product;

pub const OUTPUT_FILE: &str = "products.json";

pub fn output_path(output_dir: &Path, host: &str) -> PathBuf {
    output_dir.join(host).join(OUTPUT_FILE)
}

/// Write the run's records as one pretty JSON array under `{output_dir}/{host}/`.
pub async fn save_products(output_dir: &Path, host: &str, products: &[Product]) -> Result<PathBuf> {
    let path = output_path(output_dir, host);
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.with_context(|| format!("create {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(products)?;
    tokio::fs::write(&path, body).await.with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
