use std::sync::Arc;

use anyhow::{bail, Context};
use shopping_lists_cloudflare::{D1Client, D1RecordService};
use shopping_lists_core::{
    EditorError, ListsHandle, MainQueue, QueueOptions, RecordService, SignalSink,
};
use shopping_lists_local::{default_data_dir, LocalRecordService};
use tracing::info;

use crate::config::{Backend, Command, Config};
use crate::render::Screen;

/// Build the record service selected by `config`.
pub async fn build_service(config: &Config) -> anyhow::Result<Arc<dyn RecordService>> {
    match config.backend {
        Backend::Local => {
            let dir = config.data_dir.clone().unwrap_or_else(default_data_dir);
            info!("  Backend: local ({})", dir.display());
            Ok(Arc::new(LocalRecordService::new(dir)))
        }
        Backend::Cloudflare => {
            let (Some(account_id), Some(api_token), Some(database_id)) = (
                config.cloudflare_account_id.clone(),
                config.cloudflare_api_token.clone(),
                config.d1_database_id.clone(),
            ) else {
                bail!(
                    "The cloudflare backend needs CLOUDFLARE_ACCOUNT_ID, \
                     CLOUDFLARE_API_TOKEN and D1_DATABASE_ID"
                );
            };
            info!("  Backend: cloudflare D1 (database: {})", database_id);

            let service =
                D1RecordService::new(D1Client::new(account_id, api_token, database_id));
            service
                .ensure_schema()
                .await
                .context("Failed to prepare D1 schema")?;
            Ok(Arc::new(service))
        }
    }
}

/// Run one command against `service` and return the screen it leaves behind.
pub async fn run(
    service: Arc<dyn RecordService>,
    command: &Command,
    options: QueueOptions,
) -> anyhow::Result<Screen> {
    let (signals, rx) = SignalSink::channel();
    let (handle, task) = MainQueue::spawn(service, signals, options);
    let mut screen = Screen::new(rx);

    handle.load().await?;

    match command {
        Command::List => {}
        Command::Add { name } => edit(&handle, None, name).await?,
        Command::Rename { row, name } => edit(&handle, Some(row_index(*row)?), name).await?,
        Command::Delete { row } => {
            handle.delete(row_index(*row)?).await?;
        }
    }

    drop(handle);
    task.await.context("List queue panicked")?;

    screen.drain();
    Ok(screen)
}

async fn edit(handle: &ListsHandle, index: Option<usize>, name: &str) -> anyhow::Result<()> {
    let mut editor = handle.begin_edit(index).await?;
    if !editor.is_save_enabled(name) {
        bail!("List name must not be empty");
    }

    match editor.save(name).await {
        Ok(outcome) => handle.report(outcome).await?,
        // Already surfaced as an alert.
        Err(EditorError::SaveFailed { .. }) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Convert a 1-based row number as printed by `list` into an index.
fn row_index(row: usize) -> anyhow::Result<usize> {
    row.checked_sub(1).context("Row numbers start at 1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local(temp_dir: &TempDir) -> Arc<dyn RecordService> {
        Arc::new(LocalRecordService::new(temp_dir.path()))
    }

    fn output(screen: &Screen) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        screen.render(&mut out, &mut err).unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    async fn run_local(temp_dir: &TempDir, command: Command) -> anyhow::Result<Screen> {
        run(local(temp_dir), &command, QueueOptions::default()).await
    }

    #[tokio::test]
    async fn test_empty_store_lists_message() {
        let temp_dir = TempDir::new().unwrap();
        let screen = run_local(&temp_dir, Command::List).await.unwrap();
        assert_eq!(output(&screen).0, "No Records Found\n");
    }

    #[tokio::test]
    async fn test_add_rename_delete() {
        let temp_dir = TempDir::new().unwrap();

        for name in ["Banana", "apple"] {
            run_local(&temp_dir, Command::Add { name: name.into() })
                .await
                .unwrap();
        }
        let screen = run_local(&temp_dir, Command::Add { name: "Cherry".into() })
            .await
            .unwrap();
        assert_eq!(output(&screen).0, "1  apple\n2  Banana\n3  Cherry\n");

        let screen = run_local(
            &temp_dir,
            Command::Rename {
                row: 1,
                name: "Dates".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(output(&screen).0, "1  Banana\n2  Cherry\n3  Dates\n");

        let screen = run_local(&temp_dir, Command::Delete { row: 2 }).await.unwrap();
        assert_eq!(output(&screen).0, "1  Banana\n2  Dates\n");
        assert!(!screen.has_alerts());
    }

    #[tokio::test]
    async fn test_deleting_last_list() {
        let temp_dir = TempDir::new().unwrap();
        run_local(&temp_dir, Command::Add { name: "Only".into() })
            .await
            .unwrap();

        let screen = run_local(&temp_dir, Command::Delete { row: 1 }).await.unwrap();
        assert_eq!(output(&screen).0, "No records found\n");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_rows_on_screen() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b", "a"] {
            run_local(&temp_dir, Command::Add { name: name.into() })
                .await
                .unwrap();
        }

        let (signals, rx) = SignalSink::channel();
        let (handle, task) =
            MainQueue::spawn(local(&temp_dir), signals, QueueOptions::default());
        let mut screen = Screen::new(rx);

        assert!(handle.load().await.unwrap());
        std::fs::write(temp_dir.path().join("records.json"), b"not json").unwrap();
        assert!(!handle.load().await.unwrap());
        assert_eq!(handle.lists().await.unwrap().len(), 2);

        drop(handle);
        task.await.unwrap();
        screen.drain();
        assert_eq!(output(&screen).0, "1  a\n2  b\n");
    }

    #[tokio::test]
    async fn test_bad_rows_are_errors() {
        let temp_dir = TempDir::new().unwrap();
        assert!(run_local(&temp_dir, Command::Delete { row: 0 }).await.is_err());
        assert!(run_local(&temp_dir, Command::Delete { row: 3 }).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let err = run_local(&temp_dir, Command::Add { name: String::new() })
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "List name must not be empty");
    }
}
