//! The orchestration loop driving one agent session.

use serde_json::{Map, Value};

use super::operator::{Operator, OperatorReply};
use crate::actions::ActionHandler;
use crate::conversation::{
    ContentItem, ConversationStore, ResultContent, Turn, DEFAULT_KEEP_IMAGES,
    DEFAULT_SEED_MESSAGE,
};
use crate::model::{
    ModelError, ModelRequest, ModelResponse, ModelService, ToolDeclaration, COMPUTER_TOOL_NAME,
    DEFAULT_MAX_TOKENS,
};
use crate::settings::{DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH};

/// Configuration for a [`DesktopAgent`] session.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Full system prompt, including the task instructions.
    pub system_prompt: String,
    /// Text of the first operator turn.
    pub seed_message: String,
    /// Image-bearing items kept when trimming history.
    pub keep_images: usize,
    pub max_output_tokens: u32,
    pub display_width: u32,
    pub display_height: u32,
    /// Maximum model calls before the session stops. `None` means unlimited.
    pub max_steps: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            seed_message: DEFAULT_SEED_MESSAGE.to_string(),
            keep_images: DEFAULT_KEEP_IMAGES,
            max_output_tokens: DEFAULT_MAX_TOKENS,
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            max_steps: None,
        }
    }
}

impl AgentConfig {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_seed_message(mut self, seed: impl Into<String>) -> Self {
        self.seed_message = seed.into();
        self
    }

    pub fn with_keep_images(mut self, keep: usize) -> Self {
        self.keep_images = keep;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_display(mut self, width: u32, height: u32) -> Self {
        self.display_width = width;
        self.display_height = height;
        self
    }

    /// Set the step limit; zero removes it.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = (max_steps > 0).then_some(max_steps);
        self
    }
}

/// Why a session ended.
#[derive(Debug)]
pub enum SessionEnd {
    OperatorExit,
    ServiceFailed(ModelError),
    StepLimit(u32),
}

/// An action request pulled out of a model turn.
#[derive(Debug)]
struct PendingAction {
    id: String,
    name: String,
    parameters: Map<String, Value>,
}

impl PendingAction {
    fn from_item(item: &ContentItem) -> Option<Self> {
        match item {
            ContentItem::ActionRequest {
                id,
                name,
                parameters,
            } => Some(Self {
                id: id.clone(),
                name: name.clone(),
                parameters: parameters.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    HaveModelResponse(ModelResponse),
    DispatchingActions(Vec<PendingAction>),
    AwaitingOperatorInput(String),
    Ended(SessionEnd),
}

/// Runs one task: model calls, action dispatch and operator hand-off.
///
/// The agent owns its conversation; it starts with a single seeded operator
/// turn and is dropped with the agent.
pub struct DesktopAgent<M, O> {
    model: M,
    operator: O,
    handler: ActionHandler,
    config: AgentConfig,
    tools: Vec<ToolDeclaration>,
    store: ConversationStore,
    step_count: u32,
}

impl<M: ModelService, O: Operator> DesktopAgent<M, O> {
    pub fn new(model: M, operator: O, handler: ActionHandler, config: AgentConfig) -> Self {
        let tools = vec![ToolDeclaration::computer(
            config.display_width,
            config.display_height,
        )];
        let store = ConversationStore::seeded(config.seed_message.clone());
        Self {
            model,
            operator,
            handler,
            config,
            tools,
            store,
            step_count: 0,
        }
    }

    /// Run the loop until the operator exits, the service fails, or the step
    /// limit is reached.
    pub async fn run(&mut self) -> SessionEnd {
        let mut state = LoopState::AwaitingModel;
        loop {
            state = match state {
                LoopState::AwaitingModel => self.call_model().await,
                LoopState::HaveModelResponse(response) => self.absorb(response),
                LoopState::DispatchingActions(pending) => self.dispatch(pending).await,
                LoopState::AwaitingOperatorInput(text) => self.await_operator(&text),
                LoopState::Ended(end) => {
                    tracing::info!("Session ended after {} steps: {:?}", self.step_count, end);
                    return end;
                }
            };
        }
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.store
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    async fn call_model(&mut self) -> LoopState {
        if let Some(limit) = self.config.max_steps {
            if self.step_count >= limit {
                tracing::warn!("Step limit of {} reached", limit);
                return LoopState::Ended(SessionEnd::StepLimit(limit));
            }
        }
        self.step_count += 1;

        self.store = self.store.trimmed(self.config.keep_images);
        tracing::debug!(
            "Conversation before step {} ({} images):\n{}",
            self.step_count,
            self.store.image_count(),
            self.store.summary()
        );

        let request = ModelRequest {
            system_prompt: &self.config.system_prompt,
            messages: self.store.turns(),
            tools: &self.tools,
            max_tokens: self.config.max_output_tokens,
        };

        match self.model.respond(&request).await {
            Ok(response) => LoopState::HaveModelResponse(response),
            Err(e) => {
                tracing::error!("Model service failed: {}", e);
                self.operator
                    .report_error(&format!("Model service failed: {}", e));
                LoopState::Ended(SessionEnd::ServiceFailed(e))
            }
        }
    }

    fn absorb(&mut self, response: ModelResponse) -> LoopState {
        self.store.push(Turn::model(response.content.clone()));

        let texts = response.texts();
        for text in &texts {
            self.operator.narrate(text);
        }

        let pending: Vec<PendingAction> = response
            .action_requests()
            .into_iter()
            .filter_map(PendingAction::from_item)
            .collect();

        if pending.is_empty() {
            LoopState::AwaitingOperatorInput(texts.join("\n"))
        } else {
            LoopState::DispatchingActions(pending)
        }
    }

    async fn dispatch(&mut self, pending: Vec<PendingAction>) -> LoopState {
        let mut results = Vec::with_capacity(pending.len());
        for action in pending {
            let result = if action.name == COMPUTER_TOOL_NAME {
                self.handler.execute(&action.parameters, &action.id).await
            } else {
                tracing::warn!("Model requested unknown tool {}", action.name);
                ContentItem::ActionResult {
                    request_id: action.id,
                    body: vec![ResultContent::Text {
                        text: format!("unknown tool: {}", action.name),
                    }],
                    is_error: true,
                }
            };
            results.push(result);
        }

        self.store.push(Turn::operator(results));
        LoopState::AwaitingModel
    }

    fn await_operator(&mut self, text: &str) -> LoopState {
        self.operator.present(text);
        match self.operator.ask() {
            OperatorReply::Exit => LoopState::Ended(SessionEnd::OperatorExit),
            OperatorReply::Message(message) => {
                self.store.push(Turn::operator_text(message));
                LoopState::AwaitingModel
            }
        }
    }
}
