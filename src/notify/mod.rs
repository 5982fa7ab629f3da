pub mod email;

use anyhow::Result;

use crate::summarize::SummarizedItem;

pub use email::{render_brief, EmailDeliverer};

/// Hands a finished brief to its readers.
#[async_trait::async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, items: &[SummarizedItem]) -> Result<()>;
}

// --- Test helper ---
/// Records every delivered batch.
#[derive(Default)]
pub struct MockDeliverer {
    pub calls: std::sync::Mutex<Vec<Vec<SummarizedItem>>>,
}

impl MockDeliverer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Deliverer for MockDeliverer {
    async fn deliver(&self, items: &[SummarizedItem]) -> Result<()> {
        self.calls
            .lock()
            .map_err(|_| anyhow::anyhow!("mock deliverer mutex poisoned"))?
            .push(items.to_vec());
        Ok(())
    }
}
