use anyhow::Result;
use async_trait::async_trait;

use crate::task_manager::TaskManager;

/// Trait for services that can be started through TaskManager.
///
/// Provides service lifecycle management with prioritization and
/// criticality classification for graceful degradation.
///
/// # Example
///
/// ```no_run
/// use aurad::providers::traits::ServiceProvider;
/// use aurad::task_manager::TaskManager;
/// use anyhow::Result;
///
/// struct ExampleService;
///
/// #[async_trait::async_trait]
/// impl ServiceProvider for ExampleService {
///     async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
///         task_manager.spawn_task("example", |token| async move {
///             token.cancelled().await;
///             Ok(())
///         })
///     }
///
///     fn name(&self) -> &'static str { "ExampleService" }
/// }
/// ```
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Starts the service in TaskManager.
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()>;

    /// Returns service name for logging and management.
    fn name(&self) -> &'static str;

    /// Returns startup priority (higher numbers start first).
    fn priority(&self) -> i32 {
        0
    }

    /// Indicates if service is critical for system operation.
    fn is_critical(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct IdleService;

    #[async_trait]
    impl ServiceProvider for IdleService {
        async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
            task_manager.spawn_task(self.name(), |token| async move {
                token.cancelled().await;
                Ok(())
            })
        }

        fn name(&self) -> &'static str {
            "IdleService"
        }
    }

    struct RefusingService;

    #[async_trait]
    impl ServiceProvider for RefusingService {
        async fn start(&self, _task_manager: &mut TaskManager) -> Result<()> {
            Err(anyhow!("no bus"))
        }

        fn name(&self) -> &'static str {
            "RefusingService"
        }

        fn priority(&self) -> i32 {
            5
        }

        fn is_critical(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn defaults_are_low_priority_and_optional() {
        let service = IdleService;
        assert_eq!(service.priority(), 0);
        assert!(!service.is_critical());
    }

    #[tokio::test]
    async fn started_service_registers_task() {
        let mut task_manager = TaskManager::new();
        IdleService.start(&mut task_manager).await.unwrap();
        assert!(task_manager.is_running("IdleService"));
        task_manager.shutdown_all().await.unwrap();
    }

    #[tokio::test]
    async fn trait_objects_keep_metadata() {
        let mut providers: Vec<Box<dyn ServiceProvider>> =
            vec![Box::new(IdleService), Box::new(RefusingService)];
        providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));

        assert_eq!(providers[0].name(), "RefusingService");
        let mut task_manager = TaskManager::new();
        assert!(providers[0].start(&mut task_manager).await.is_err());
        assert_eq!(task_manager.active_count(), 0);
    }
}
