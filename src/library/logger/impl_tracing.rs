use crate::library::logger::interface::Logger;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct LoggerTracing {
    namespace: Option<String>,
}

impl LoggerTracing {
    pub fn new() -> Self {
        Self { namespace: None }
    }

    fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("app")
    }
}

impl Logger for LoggerTracing {
    fn debug(&self, message: &str) {
        tracing::debug!(namespace = self.namespace(), "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(namespace = self.namespace(), "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(namespace = self.namespace(), "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(namespace = self.namespace(), "{}", message);
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        let new_namespace = match &self.namespace {
            Some(current) => format!("{}:{}", current, namespace),
            None => namespace.to_string(),
        };

        Arc::new(LoggerTracing {
            namespace: Some(new_namespace),
        })
    }
}
