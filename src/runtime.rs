use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Shared runtime deferred suggestion sources run on. Built on first use.
pub fn runtime() -> Result<&'static Runtime> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .thread_name("callpod-suggest")
            .enable_all()
            .build()
            .context("build suggestion runtime")
    })
}
