//! Generate/validate/repair pipeline.
//!
//! The one piece of real control flow in this service: draft diagram
//! source from the idea, render it, and on a render rejection hand the
//! source plus the error message back to the assistant for repair, up to
//! a bounded number of attempts.
//!
//! The pipeline is synchronous and generic over [`DiagramAssistant`] and
//! [`DiagramRenderer`], so tests drive it with scripted stubs and no
//! network. Handlers run it on the blocking pool.

use ideagram_kroki::{DiagramRenderer, KrokiError};
use ideagram_llm::{extract_diagram_source, DiagramAssistant, LlmError};
use tracing::{debug, warn};

/// Pipeline failure.
///
/// Every variant carries the last diagram source that was computed before
/// the failure, so callers can return it for diagnostics.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// The assistant call failed (network, auth, quota, unusable reply).
    /// Aborts the loop immediately; `code` is absent when the initial
    /// draft itself failed.
    #[error("{error}")]
    Assistant {
        #[source]
        error: LlmError,
        code: Option<String>,
    },

    /// The render service kept rejecting the diagram after all repair
    /// attempts were spent. `message` is the final attempt's error.
    #[error("{message}")]
    Render { message: String, code: String },

    /// The render call failed at the transport level. Not retried.
    #[error("{message}")]
    Transport { message: String, code: String },
}

impl PipelineError {
    /// Last diagram source computed before the failure, if any.
    pub(crate) fn diagram_source(&self) -> Option<&str> {
        match self {
            Self::Assistant { code, .. } => code.as_deref(),
            Self::Render { code, .. } | Self::Transport { code, .. } => Some(code),
        }
    }
}

/// Run the full generate/repair loop for one idea.
///
/// Drafts diagram source, renders it, and repairs on render rejection up
/// to `max_repair_attempts` times. Returns the SVG markup of the first
/// successful render.
///
/// Only status-code render failures are retry-eligible; assistant errors
/// and render transport errors abort the loop (see crate docs).
pub(crate) fn generate_diagram(
    assistant: &dyn DiagramAssistant,
    renderer: &dyn DiagramRenderer,
    max_repair_attempts: u32,
    idea: &str,
) -> Result<String, PipelineError> {
    let draft = assistant.draft(idea).map_err(|error| PipelineError::Assistant {
        error,
        code: None,
    })?;
    let mut source = extract_diagram_source(&draft);

    let mut attempt: u32 = 0;
    loop {
        match renderer.render_svg(&source) {
            Ok(svg) => {
                debug!(attempt, "Diagram rendered");
                return Ok(svg);
            }
            Err(err @ KrokiError::Status { .. }) if attempt < max_repair_attempts => {
                attempt += 1;
                let message = err.to_string();
                debug!(attempt, %message, "Render rejected, requesting repair");

                let repaired =
                    assistant
                        .repair(&source, &message)
                        .map_err(|error| PipelineError::Assistant {
                            error,
                            code: Some(source.clone()),
                        })?;
                source = extract_diagram_source(&repaired);
            }
            Err(err @ KrokiError::Status { .. }) => {
                let message = err.to_string();
                warn!(attempts = attempt + 1, %message, "Repair attempts exhausted");
                return Err(PipelineError::Render {
                    message,
                    code: source,
                });
            }
            Err(err) => {
                return Err(PipelineError::Transport {
                    message: err.to_string(),
                    code: source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Assistant stub: fixed draft reply, scripted repair replies.
    struct ScriptedAssistant {
        draft_reply: String,
        repair_replies: Mutex<Vec<String>>,
        draft_calls: AtomicUsize,
        repair_calls: AtomicUsize,
        /// (source, error) pairs seen by `repair`.
        repair_inputs: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedAssistant {
        fn new(draft_reply: &str, repair_replies: &[&str]) -> Self {
            Self {
                draft_reply: draft_reply.to_owned(),
                repair_replies: Mutex::new(
                    repair_replies.iter().rev().map(|s| (*s).to_owned()).collect(),
                ),
                draft_calls: AtomicUsize::new(0),
                repair_calls: AtomicUsize::new(0),
                repair_inputs: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self::new("", &[])
        }
    }

    impl DiagramAssistant for ScriptedAssistant {
        fn draft(&self, _idea: &str) -> Result<String, LlmError> {
            self.draft_calls.fetch_add(1, Ordering::SeqCst);
            if self.draft_reply.is_empty() {
                return Err(LlmError::EmptyCompletion);
            }
            Ok(self.draft_reply.clone())
        }

        fn repair(&self, source: &str, error: &str) -> Result<String, LlmError> {
            self.repair_calls.fetch_add(1, Ordering::SeqCst);
            self.repair_inputs
                .lock()
                .unwrap()
                .push((source.to_owned(), error.to_owned()));
            self.repair_replies
                .lock()
                .unwrap()
                .pop()
                .ok_or(LlmError::EmptyCompletion)
        }
    }

    /// Renderer stub: scripted outcomes, consumed in order.
    struct ScriptedRenderer {
        outcomes: Mutex<Vec<Result<String, KrokiError>>>,
        calls: AtomicUsize,
        /// Sources seen by `render_svg`.
        inputs: Mutex<Vec<String>>,
    }

    impl ScriptedRenderer {
        fn new(outcomes: Vec<Result<String, KrokiError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
                calls: AtomicUsize::new(0),
                inputs: Mutex::new(Vec::new()),
            }
        }
    }

    impl DiagramRenderer for ScriptedRenderer {
        fn render_svg(&self, source: &str) -> Result<String, KrokiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inputs.lock().unwrap().push(source.to_owned());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .expect("renderer called more times than scripted")
        }
    }

    fn rejected(status: u16) -> Result<String, KrokiError> {
        Err(KrokiError::Status { status })
    }

    const DRAFT: &str = "@startuml\nA -> B\n@enduml";

    #[test]
    fn test_first_attempt_success_skips_repair() {
        let assistant = ScriptedAssistant::new(DRAFT, &[]);
        let renderer = ScriptedRenderer::new(vec![Ok("<svg>ok</svg>".to_owned())]);

        let svg = generate_diagram(&assistant, &renderer, 3, "photo sharing app").unwrap();

        assert_eq!(svg, "<svg>ok</svg>");
        assert_eq!(assistant.draft_calls.load(Ordering::SeqCst), 1);
        assert_eq!(assistant.repair_calls.load(Ordering::SeqCst), 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_success_on_first_repair() {
        let assistant =
            ScriptedAssistant::new(DRAFT, &["@startuml\nA --> B\n@enduml"]);
        let renderer = ScriptedRenderer::new(vec![
            rejected(400),
            Ok("<svg>repaired</svg>".to_owned()),
        ]);

        let svg = generate_diagram(&assistant, &renderer, 3, "idea").unwrap();

        assert_eq!(svg, "<svg>repaired</svg>");
        assert_eq!(assistant.repair_calls.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_success_on_last_repair() {
        let fixed = "@startuml\nA --> B\n@enduml";
        let assistant = ScriptedAssistant::new(DRAFT, &[fixed, fixed, fixed]);
        let renderer = ScriptedRenderer::new(vec![
            rejected(400),
            rejected(400),
            rejected(400),
            Ok("<svg>third time lucky</svg>".to_owned()),
        ]);

        let svg = generate_diagram(&assistant, &renderer, 3, "idea").unwrap();

        assert_eq!(svg, "<svg>third time lucky</svg>");
        assert_eq!(assistant.repair_calls.load(Ordering::SeqCst), 3);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_exhausted_repairs_returns_last_error_and_source() {
        let last = "@startuml\nstill broken\n@enduml";
        let assistant = ScriptedAssistant::new(DRAFT, &[last, last, last]);
        let renderer = ScriptedRenderer::new(vec![
            rejected(422),
            rejected(422),
            rejected(422),
            rejected(422),
        ]);

        let err = generate_diagram(&assistant, &renderer, 3, "idea").unwrap_err();

        assert_eq!(err.to_string(), "Kroki API responded with status 422");
        assert_eq!(err.diagram_source(), Some(last));
        // 1 draft + 3 repairs, 4 render attempts in total
        assert_eq!(assistant.draft_calls.load(Ordering::SeqCst), 1);
        assert_eq!(assistant.repair_calls.load(Ordering::SeqCst), 3);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_repair_receives_previous_source_and_error() {
        let assistant = ScriptedAssistant::new(DRAFT, &["@startuml\nfixed\n@enduml"]);
        let renderer = ScriptedRenderer::new(vec![rejected(422), Ok("<svg/>".to_owned())]);

        generate_diagram(&assistant, &renderer, 3, "idea").unwrap();

        let inputs = assistant.repair_inputs.lock().unwrap();
        assert_eq!(
            inputs[0],
            (
                DRAFT.to_owned(),
                "Kroki API responded with status 422".to_owned()
            )
        );
    }

    #[test]
    fn test_draft_failure_aborts_without_render() {
        let assistant = ScriptedAssistant::failing();
        let renderer = ScriptedRenderer::new(vec![]);

        let err = generate_diagram(&assistant, &renderer, 3, "idea").unwrap_err();

        assert!(matches!(err, PipelineError::Assistant { code: None, .. }));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_repair_failure_aborts_loop() {
        // No scripted repair replies: the repair call itself errors
        let assistant = ScriptedAssistant::new(DRAFT, &[]);
        let renderer = ScriptedRenderer::new(vec![rejected(400)]);

        let err = generate_diagram(&assistant, &renderer, 3, "idea").unwrap_err();

        assert!(matches!(
            &err,
            PipelineError::Assistant { code: Some(s), .. } if s == DRAFT
        ));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transport_failure_not_retried() {
        let assistant = ScriptedAssistant::new(DRAFT, &[]);
        let renderer = ScriptedRenderer::new(vec![Err(KrokiError::Transport(
            "connection refused".to_owned(),
        ))]);

        let err = generate_diagram(&assistant, &renderer, 3, "idea").unwrap_err();

        assert!(matches!(err, PipelineError::Transport { .. }));
        assert_eq!(err.diagram_source(), Some(DRAFT));
        assert_eq!(assistant.repair_calls.load(Ordering::SeqCst), 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_repair_attempts_fails_fast() {
        let assistant = ScriptedAssistant::new(DRAFT, &[]);
        let renderer = ScriptedRenderer::new(vec![rejected(422)]);

        let err = generate_diagram(&assistant, &renderer, 0, "idea").unwrap_err();

        assert!(matches!(err, PipelineError::Render { .. }));
        assert_eq!(assistant.repair_calls.load(Ordering::SeqCst), 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extraction_applied_to_model_output() {
        let assistant = ScriptedAssistant::new(
            "Sure! Here is the diagram:\n```\n@startuml\nA -> B\n@enduml\n```\nEnjoy.",
            &[],
        );
        let renderer = ScriptedRenderer::new(vec![Ok("<svg/>".to_owned())]);

        generate_diagram(&assistant, &renderer, 3, "idea").unwrap();

        let inputs = renderer.inputs.lock().unwrap();
        assert_eq!(inputs[0], DRAFT);
    }
}
