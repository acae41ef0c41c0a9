//! Static lookup tables driving the foreign-to-internal conversion.
//!
//! The tables are plain sorted slices rather than branching conditionals so
//! they can be unit-tested exhaustively and extended without touching the
//! conversion control flow.

use crate::connection::{DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT};
use crate::node::NodeKind;

/// Maps the terminal segment of a namespaced foreign node type (the text
/// after the final `.`) to an internal node kind. Sorted by segment.
const NODE_KIND_TABLE: &[(&str, NodeKind)] = &[
    ("agent", NodeKind::Agent),
    ("chainLlm", NodeKind::ChatModel),
    ("code", NodeKind::Code),
    ("cron", NodeKind::Trigger),
    ("function", NodeKind::Code),
    ("httpRequest", NodeKind::HttpRequest),
    ("lmChatAnthropic", NodeKind::ChatModel),
    ("lmChatGoogleGemini", NodeKind::ChatModel),
    ("lmChatOllama", NodeKind::ChatModel),
    ("lmChatOpenAi", NodeKind::ChatModel),
    ("manualTrigger", NodeKind::Trigger),
    ("openAi", NodeKind::ChatModel),
    ("scheduleTrigger", NodeKind::Trigger),
    ("toolCode", NodeKind::Tool),
    ("toolHttpRequest", NodeKind::Tool),
    ("toolWorkflow", NodeKind::Tool),
    ("webhook", NodeKind::Webhook),
];

/// Foreign parameter keys renamed during import. Anything not listed is
/// copied key-for-key.
const PARAM_RENAME_TABLE: &[(&str, &str)] = &[
    ("functionCode", "code"),
    ("jsCode", "code"),
];

/// Maps a foreign connection's output kind to internal (source, target) port
/// names. The general-purpose `main` kind uses the default output/input pair;
/// AI-capability kinds get distinguished source ports.
const PORT_TABLE: &[(&str, (&str, &str))] = &[
    ("ai_languageModel", ("model", DEFAULT_TARGET_PORT)),
    ("ai_memory", ("memory", DEFAULT_TARGET_PORT)),
    ("ai_outputParser", ("parser", DEFAULT_TARGET_PORT)),
    ("ai_tool", ("tool", DEFAULT_TARGET_PORT)),
    ("main", (DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT)),
];

/// Returns the terminal segment of a namespaced type string.
///
/// `n8n-nodes-base.webhook` yields `webhook`; a string without a separator
/// is returned whole.
#[must_use]
pub fn terminal_segment(namespaced_type: &str) -> &str {
    namespaced_type
        .rsplit('.')
        .next()
        .unwrap_or(namespaced_type)
}

/// Looks up the internal kind for a foreign type's terminal segment.
/// Returns `None` for unrecognized segments (the caller falls back to
/// [`NodeKind::Custom`]).
#[must_use]
pub fn node_kind_for(segment: &str) -> Option<NodeKind> {
    NODE_KIND_TABLE
        .iter()
        .find(|(known, _)| *known == segment)
        .map(|(_, kind)| *kind)
}

/// Returns the internal configuration key for a foreign parameter key,
/// applying the rename table. Unlisted keys map to themselves.
#[must_use]
pub fn config_key_for(param_key: &str) -> &str {
    PARAM_RENAME_TABLE
        .iter()
        .find(|(foreign, _)| *foreign == param_key)
        .map_or(param_key, |(_, internal)| internal)
}

/// Returns the (source, target) port names for a foreign output kind.
/// Unrecognized kinds fall back to the default output/input pair.
#[must_use]
pub fn ports_for(output_kind: &str) -> (&'static str, &'static str) {
    PORT_TABLE
        .iter()
        .find(|(known, _)| *known == output_kind)
        .map_or((DEFAULT_SOURCE_PORT, DEFAULT_TARGET_PORT), |(_, pair)| *pair)
}
