use crate::error::Result;
use std::sync::{Mutex, PoisonError};

/// The CRM page the widget is embedded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub entity: String,
    pub record_id: String,
}

pub trait HostEnvironment: Send + Sync {
    fn page_context(&self) -> Option<PageContext>;
    fn resize(&self, width: u32, height: u32) -> Result<()>;
}

/// Host with a fixed page context; used when running outside the CRM frame.
#[derive(Debug, Default)]
pub struct StaticHost {
    context: Option<PageContext>,
    size: Mutex<Option<(u32, u32)>>,
}

impl StaticHost {
    pub fn new(context: Option<PageContext>) -> Self {
        Self {
            context,
            size: Mutex::new(None),
        }
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostEnvironment for StaticHost {
    fn page_context(&self) -> Option<PageContext> {
        self.context.clone()
    }

    fn resize(&self, width: u32, height: u32) -> Result<()> {
        tracing::debug!(width, height, "resize host frame");
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = Some((width, height));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HostEnvironment, PageContext, StaticHost};

    #[test]
    fn static_host_reports_context_and_size() {
        let host = StaticHost::new(Some(PageContext {
            entity: "Contacts".to_string(),
            record_id: "c1".to_string(),
        }));
        assert_eq!(host.page_context().expect("context").record_id, "c1");
        assert_eq!(host.size(), None);
        host.resize(1200, 600).expect("resize");
        assert_eq!(host.size(), Some((1200, 600)));
    }
}
