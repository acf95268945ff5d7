use std::future::Future;
use std::path::Path;

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Existing,
    Created,
}

/// Runs `create` only when nothing exists at `path`. The side effect is
/// never repeated once the resource is present.
pub async fn materialize<F, Fut>(path: &Path, create: F) -> anyhow::Result<Materialized>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let exists = tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("failed to check {}", path.display()))?;
    if exists {
        log::debug!("{} already present", path.display());
        return Ok(Materialized::Existing);
    }
    create().await?;
    log::debug!("materialized {}", path.display());
    Ok(Materialized::Created)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{materialize, Materialized};

    #[tokio::test]
    async fn absent_resource_runs_create_once() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("resource.txt");
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let target = path.as_path();

        let first = materialize(target, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(target, b"made").await?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .expect("first");
        let second = materialize(target, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("second");

        assert_eq!(first, Materialized::Created);
        assert_eq!(second, Materialized::Existing);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_failure_propagates() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("missing");
        let err = materialize(&path, || async { Err(anyhow::anyhow!("boom")) })
            .await
            .expect_err("create error");
        assert_eq!(err.to_string(), "boom");
    }
}
