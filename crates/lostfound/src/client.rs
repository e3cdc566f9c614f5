//! Entry point bundling every service over one shared transport.

use std::sync::Arc;

use crate::agent::AgentService;
use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::feedback::FeedbackService;
use crate::posts::PostService;
use crate::system::SystemService;
use crate::transport::{HttpTransport, RequestTransport};

#[derive(Clone)]
pub struct LostFoundClient {
    pub agent: AgentService,
    pub posts: PostService,
    pub feedback: FeedbackService,
    pub system: SystemService,
}

impl LostFoundClient {
    /// Client talking HTTP to the configured backend.
    pub fn connect(config: &ClientConfig) -> ApiResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn RequestTransport>) -> Self {
        Self {
            agent: AgentService::new(transport.clone()),
            posts: PostService::new(transport.clone()),
            feedback: FeedbackService::new(transport.clone()),
            system: SystemService::new(transport),
        }
    }
}
