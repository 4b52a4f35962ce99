//! The four text-generation flows.
//!
//! Each flow substitutes its inputs into one fixed prompt template, sends the prompt to a
//! `Backend`, and returns the backend's text as its single output field. Flows never touch the
//! record store.

use crate::api::Backend;
use crate::error::{validation, ErrorType, IntoResult};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The model a generated prompt is tuned for.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum TargetModel {
    #[default]
    #[serde(rename = "Imagen 3")]
    #[value(name = "imagen-3")]
    Imagen3,
    #[serde(rename = "DALL-E 3")]
    #[value(name = "dall-e-3")]
    DallE3,
    #[serde(rename = "Veo")]
    #[value(name = "veo")]
    Veo,
    #[serde(rename = "Gemini 1.5 Pro")]
    #[value(name = "gemini-1.5-pro")]
    Gemini15Pro,
    #[serde(rename = "Gemini 1.5 Flash")]
    #[value(name = "gemini-1.5-flash")]
    Gemini15Flash,
}

serde_plain::derive_display_from_serialize!(TargetModel);
serde_plain::derive_fromstr_from_deserialize!(TargetModel);

/// The kind of marketing copy to write. The serialized form is the phrase used in the prompt.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum ContentKind {
    #[default]
    #[serde(rename = "a Facebook post")]
    #[value(name = "facebook-post")]
    FacebookPost,
    #[serde(rename = "a short and catchy advertisement caption")]
    #[value(name = "ad-caption")]
    AdCaption,
    #[serde(rename = "3 blog post ideas in a numbered list")]
    #[value(name = "blog-ideas")]
    BlogIdeas,
    #[serde(rename = "a marketing email")]
    #[value(name = "marketing-email")]
    MarketingEmail,
    #[serde(rename = "an Instagram story caption")]
    #[value(name = "instagram-story")]
    InstagramStory,
    #[serde(rename = "a TikTok video script")]
    #[value(name = "tiktok-script")]
    TiktokScript,
}

serde_plain::derive_display_from_serialize!(ContentKind);
serde_plain::derive_fromstr_from_deserialize!(ContentKind);

/// One invocation of a flow together with its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "flow")]
pub enum Flow {
    /// Break a goal down into three steps.
    GoalPlan { goal: String },
    /// Expand an idea into a detailed prompt for `model`.
    PromptIdea { idea: String, model: TargetModel },
    /// Summarize a notebook entry into three bullet points.
    NotebookSummary { notebook_text: String },
    /// Write marketing copy of `kind` for the described product.
    MarketingCopy {
        description: String,
        kind: ContentKind,
    },
}

impl Flow {
    /// The name of the flow's single output field.
    pub fn output_field(&self) -> &'static str {
        match self {
            Flow::GoalPlan { .. } => "plan",
            Flow::PromptIdea { .. } => "prompt",
            Flow::NotebookSummary { .. } => "summary",
            Flow::MarketingCopy { .. } => "marketingCopy",
        }
    }

    /// Rejects empty required text.
    pub fn validate(&self) -> Result<()> {
        let (field, text) = match self {
            Flow::GoalPlan { goal } => ("goal", goal),
            Flow::PromptIdea { idea, .. } => ("idea", idea),
            Flow::NotebookSummary { notebook_text } => ("notebook text", notebook_text),
            Flow::MarketingCopy { description, .. } => ("description", description),
        };
        if text.trim().is_empty() {
            return Err(validation(format!("The {field} must not be empty")));
        }
        Ok(())
    }

    /// The prompt sent to the backend.
    pub fn prompt(&self) -> String {
        match self {
            Flow::GoalPlan { goal } => format!(
                "You are a helpful strategic assistant. A user wants to achieve a goal. Break \
                down the goal into 3 simple, actionable steps in Thai. The steps should be clear \
                and concise. Goal: \"{goal}\""
            ),
            Flow::PromptIdea { idea, model } => format!(
                "You are a world-class prompt engineering expert. Your task is to expand a \
                user's simple idea into a detailed, high-quality, and effective prompt in \
                English. The target model is {model}. User's idea: \"{idea}\". Based on the idea \
                and the target model, create a detailed prompt that includes specifics like:\n\
                \n\
                - For image models (Imagen, DALL-E): Subject details, art style (e.g., \
                photorealistic, cinematic, 3D render, digital painting), composition, lighting \
                (e.g., cinematic lighting, soft light), color scheme, and camera angle.\n\
                - For video models (Veo): A short scene description, character actions, \
                environment details, camera movement (e.g., tracking shot, wide angle), and \
                overall mood.\n\
                - For text models (Gemini): A clear instruction, the desired format for the \
                output, the persona the AI should adopt, and any constraints.\n\
                \n\
                The final output should be ONLY the generated prompt itself, ready to be copied \
                and pasted."
            ),
            Flow::NotebookSummary { notebook_text } => format!(
                "Summarize the following journal entry into 3 key bullet points:\n\n{notebook_text}"
            ),
            Flow::MarketingCopy { description, kind } => format!(
                "You are an expert marketing copywriter. Write {kind} in Thai for the following \
                product or service. Make it engaging and persuasive. The final output should be \
                ONLY the content itself, ready to be copied and pasted. Description: \
                \"{description}\""
            ),
        }
    }
}

/// The single output field of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowOutput {
    pub text: String,
}

/// Validates `flow`, sends its prompt to `backend` and returns the trimmed reply.
///
/// # Errors
/// - A `Validation` error, without calling the backend, if a required input is empty.
/// - A `Backend` error carrying the backend's message if the call fails or returns only
///   whitespace.
pub async fn invoke(backend: &dyn Backend, flow: &Flow) -> Result<FlowOutput> {
    flow.validate()?;
    let prompt = flow.prompt();
    debug!("Invoking the {} flow", flow.output_field());
    let text = backend
        .generate(&prompt)
        .await
        .and_then(|text| {
            let text = text.trim().to_string();
            anyhow::ensure!(
                !text.is_empty(),
                "The backend returned an empty {}",
                flow.output_field()
            );
            Ok(text)
        })
        .pub_result(ErrorType::Backend)?;
    Ok(FlowOutput { text })
}

/// Identifies one in-flight invocation of a `FlowSlot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What a surface currently shows for its flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotView<T> {
    /// Nothing has been requested yet, or the surface was closed.
    Idle,
    /// A request is outstanding; the surface shows a placeholder and refuses a second one.
    InFlight,
    /// The last request succeeded.
    Ready(T),
    /// The last request failed with this message.
    Failed(String),
}

/// The per-surface invocation state: idle, in flight, then success or failure, then idle again.
///
/// Each surface owns its own slot, so different surfaces can have requests in flight at the same
/// time while one surface can never have two.
#[derive(Debug, Clone)]
pub struct FlowSlot<T> {
    next: u64,
    current: Option<Ticket>,
    view: SlotView<T>,
}

impl<T> Default for FlowSlot<T> {
    fn default() -> Self {
        Self {
            next: 0,
            current: None,
            view: SlotView::Idle,
        }
    }
}

impl<T> FlowSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &SlotView<T> {
        &self.view
    }

    pub fn is_in_flight(&self) -> bool {
        self.current.is_some()
    }

    /// Starts a request and returns its ticket.
    ///
    /// # Errors
    /// A `Validation` error if a request from this slot is already in flight.
    pub fn begin(&mut self) -> Result<Ticket> {
        if self.current.is_some() {
            return Err(validation("A request is already in progress"));
        }
        self.next += 1;
        let ticket = Ticket(self.next);
        self.current = Some(ticket);
        self.view = SlotView::InFlight;
        Ok(ticket)
    }

    /// Applies the outcome of the request identified by `ticket`. Returns `false`, and changes
    /// nothing, if the ticket is no longer current because the slot was closed meanwhile.
    pub fn finish(&mut self, ticket: Ticket, outcome: Result<T>) -> bool {
        if self.current != Some(ticket) {
            debug!("Dropping a late response for a closed surface");
            return false;
        }
        self.current = None;
        self.view = match outcome {
            Ok(value) => SlotView::Ready(value),
            Err(e) => SlotView::Failed(format!("{e:#}")),
        };
        true
    }

    /// Closes the surface. An outstanding request is not cancelled but its response will be
    /// dropped.
    pub fn close(&mut self) {
        self.current = None;
        self.view = SlotView::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EchoBackend;
    use crate::error::error_type;
    use std::str::FromStr;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_enum_strings() {
        assert_eq!(TargetModel::DallE3.to_string(), "DALL-E 3");
        assert_eq!(
            TargetModel::from_str("Gemini 1.5 Flash").unwrap(),
            TargetModel::Gemini15Flash
        );
        assert_eq!(
            ContentKind::BlogIdeas.to_string(),
            "3 blog post ideas in a numbered list"
        );
        assert_eq!(
            ContentKind::from_str("a TikTok video script").unwrap(),
            ContentKind::TiktokScript
        );
    }

    #[test]
    fn test_prompt_substitution() {
        let flow = Flow::GoalPlan {
            goal: "Open a studio".to_string(),
        };
        assert!(flow.prompt().ends_with("Goal: \"Open a studio\""));

        let flow = Flow::PromptIdea {
            idea: "a cat astronaut".to_string(),
            model: TargetModel::Veo,
        };
        let prompt = flow.prompt();
        assert!(prompt.contains("The target model is Veo. User's idea: \"a cat astronaut\"."));
        assert!(prompt.contains("\n\n- For image models"));

        let flow = Flow::NotebookSummary {
            notebook_text: "Busy day.".to_string(),
        };
        assert_eq!(
            flow.prompt(),
            "Summarize the following journal entry into 3 key bullet points:\n\nBusy day."
        );

        let flow = Flow::MarketingCopy {
            description: "Passport photos in 5 minutes".to_string(),
            kind: ContentKind::AdCaption,
        };
        assert!(flow
            .prompt()
            .contains("Write a short and catchy advertisement caption in Thai"));
    }

    #[tokio::test]
    async fn test_invoke_trims_output() {
        let backend = EchoBackend::replying("\n  1. Plan\n2. Act  \n");
        let flow = Flow::GoalPlan {
            goal: "Save money".to_string(),
        };
        let output = invoke(&backend, &flow).await.unwrap();
        assert_eq!(output.text, "1. Plan\n2. Act");
        assert_eq!(backend.prompts(), vec![flow.prompt()]);
    }

    #[tokio::test]
    async fn test_invoke_empty_input_sends_nothing() {
        let backend = EchoBackend::default();
        let flow = Flow::MarketingCopy {
            description: "   ".to_string(),
            kind: ContentKind::FacebookPost,
        };
        let err = invoke(&backend, &flow).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
        assert!(backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_backend_failure() {
        let backend = EchoBackend::failing();
        let flow = Flow::NotebookSummary {
            notebook_text: "text".to_string(),
        };
        let err = invoke(&backend, &flow).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Backend));
        assert!(format!("{err:#}").contains("set to fail"));
    }

    #[tokio::test]
    async fn test_invoke_blank_reply_is_backend_failure() {
        let backend = EchoBackend::replying(" \n ");
        let flow = Flow::GoalPlan {
            goal: "x".to_string(),
        };
        let err = invoke(&backend, &flow).await.unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Backend));
    }

    #[test]
    fn test_slot_refuses_second_request() {
        let mut slot: FlowSlot<String> = FlowSlot::new();
        let ticket = slot.begin().unwrap();
        let err = slot.begin().unwrap_err();
        assert_eq!(error_type(&err), Some(ErrorType::Validation));
        assert!(slot.finish(ticket, Ok("done".to_string())));
        assert_eq!(slot.view(), &SlotView::Ready("done".to_string()));
        assert!(slot.begin().is_ok());
    }

    #[test]
    fn test_slot_failure_then_idle_again() {
        let mut slot: FlowSlot<String> = FlowSlot::new();
        let ticket = slot.begin().unwrap();
        assert!(slot.finish(ticket, Err(anyhow::anyhow!("status 500"))));
        assert_eq!(slot.view(), &SlotView::Failed("status 500".to_string()));
        assert!(!slot.is_in_flight());
    }

    #[test]
    fn test_slot_drops_late_response_after_close() {
        let mut slot: FlowSlot<String> = FlowSlot::new();
        let stale = slot.begin().unwrap();
        slot.close();
        assert!(!slot.finish(stale, Ok("late".to_string())));
        assert_eq!(slot.view(), &SlotView::Idle);

        // A new request after closing is unaffected by the stale ticket.
        let fresh = slot.begin().unwrap();
        assert!(!slot.finish(stale, Ok("late".to_string())));
        assert!(slot.finish(fresh, Ok("fresh".to_string())));
        assert_eq!(slot.view(), &SlotView::Ready("fresh".to_string()));
    }

    #[tokio::test]
    async fn test_independent_slots_run_concurrently() {
        let backend = Arc::new(EchoBackend::replying("ok"));
        let summary_slot = Arc::new(Mutex::new(FlowSlot::<FlowOutput>::new()));
        let content_slot = Arc::new(Mutex::new(FlowSlot::<FlowOutput>::new()));

        let run = |slot: Arc<Mutex<FlowSlot<FlowOutput>>>, flow: Flow| {
            let backend = backend.clone();
            async move {
                let ticket = slot.lock().unwrap().begin().unwrap();
                assert!(slot.lock().unwrap().is_in_flight());
                let outcome = invoke(backend.as_ref(), &flow).await;
                let applied = slot.lock().unwrap().finish(ticket, outcome);
                applied
            }
        };

        let (a, b) = tokio::join!(
            run(
                summary_slot.clone(),
                Flow::NotebookSummary {
                    notebook_text: "day".to_string()
                }
            ),
            run(
                content_slot.clone(),
                Flow::MarketingCopy {
                    description: "studio".to_string(),
                    kind: ContentKind::MarketingEmail
                }
            )
        );
        assert!(a && b);
        assert!(matches!(summary_slot.lock().unwrap().view(), SlotView::Ready(_)));
        assert!(matches!(content_slot.lock().unwrap().view(), SlotView::Ready(_)));
        assert_eq!(backend.prompts().len(), 2);
    }
}
