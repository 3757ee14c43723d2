//! Directory collaborators.
//!
//! The engine resolves "post belongs to which site" and "agent display name
//! by id" through this seam. Lookups are pure key-to-attribute reads with no
//! side effects; the backing directory (personnel tables, post registry) is
//! owned by the embedding application.

use std::collections::HashMap;

/// Read-only lookups against the post and personnel directories.
pub trait Directory {
    /// Site the post belongs to, or None for an unknown post.
    fn site_of_post(&self, post_id: &str) -> Option<String>;

    /// Display name for an agent, or None for an unknown agent.
    fn agent_name(&self, agent_id: &str) -> Option<String>;
}

/// In-memory directory for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    posts: HashMap<String, String>,
    agents: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a post and the site it belongs to.
    pub fn with_post(mut self, post_id: impl Into<String>, site: impl Into<String>) -> Self {
        self.posts.insert(post_id.into(), site.into());
        self
    }

    /// Register an agent display name.
    pub fn with_agent(mut self, agent_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.agents.insert(agent_id.into(), name.into());
        self
    }
}

impl Directory for StaticDirectory {
    fn site_of_post(&self, post_id: &str) -> Option<String> {
        self.posts.get(post_id).cloned()
    }

    fn agent_name(&self, agent_id: &str) -> Option<String> {
        self.agents.get(agent_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_directory_lookups() {
        let dir = StaticDirectory::new()
            .with_post("post-1", "North Gate")
            .with_agent("agent-7", "J. Mercer");

        assert_eq!(dir.site_of_post("post-1").as_deref(), Some("North Gate"));
        assert_eq!(dir.site_of_post("post-2"), None);
        assert_eq!(dir.agent_name("agent-7").as_deref(), Some("J. Mercer"));
        assert_eq!(dir.agent_name("nobody"), None);
    }
}
