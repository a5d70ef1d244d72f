//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! `tracing` macros need field names as literals, so spans declare these
//! fields inline (e.g. `gen_ai.request.model = %model`). The constants serve
//! `Span::record` calls that fill in fields declared as `Empty`.

/// The name of the operation being performed (e.g., "generate_content").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "gemini").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model ID requested (e.g., "gemini-2.0-flash").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The finish reasons for the response (e.g., "STOP", "SAFETY").
pub const GEN_AI_RESPONSE_FINISH_REASONS: &str = "gen_ai.response.finish_reasons";

// --- Operation name values ---

/// Content generation.
pub const OP_GENERATE_CONTENT: &str = "generate_content";

/// Upload to the provider's file store.
pub const OP_UPLOAD_FILE: &str = "upload_file";

// --- Provider name values ---

pub const PROVIDER_GEMINI: &str = "gemini";
