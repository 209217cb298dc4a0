use crate::builder::END;
use crate::types::GraphState;

/// Decides which node runs next; returns a node name or `END`
pub trait Router: Send + Sync {
    fn route(&self, state: &GraphState) -> String;
}

impl<F> Router for F
where
    F: Fn(&GraphState) -> String + Send + Sync,
{
    fn route(&self, state: &GraphState) -> String {
        self(state)
    }
}

/// React loop routing: LLM -> Tool (if tool_calls present) -> LLM -> END
pub struct ToolsRouter {
    tool_node: String,
}

impl ToolsRouter {
    pub fn new(tool_node: impl Into<String>) -> Self {
        Self {
            tool_node: tool_node.into(),
        }
    }
}

impl Default for ToolsRouter {
    fn default() -> Self {
        Self::new("tool_node")
    }
}

impl Router for ToolsRouter {
    fn route(&self, state: &GraphState) -> String {
        if state.has_pending_tool_calls() {
            self.tool_node.clone()
        } else {
            END.to_string()
        }
    }
}

/// Follows the supervisor's decision when it names a registered node
pub struct SupervisorRouter;

impl Router for SupervisorRouter {
    fn route(&self, state: &GraphState) -> String {
        match state.context_str("supervisor_decision") {
            Some(decision) if state.node_registry.contains_key(decision) => decision.to_string(),
            Some(decision) => {
                tracing::warn!("Supervisor chose unregistered node '{}', ending run", decision);
                END.to_string()
            }
            None => END.to_string(),
        }
    }
}
