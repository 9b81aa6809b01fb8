use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSubmitRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Honeypot. Hidden from real users and forwarded verbatim so the lead
    /// service can drop bot submissions.
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadResendRequest {
    pub email: String,
}

/// Reply envelope for the lead endpoints. Both fields are optional so any
/// JSON object decodes; callers treat a parse failure as the empty reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
