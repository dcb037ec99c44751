//! Follow-up action derivation from extracted metadata.
//!
//! Actions are a pure function of a document's metadata — derived on
//! demand, never stored — so the rules can evolve without migrating
//! anything. Dispatch is an exhaustive match over [`DocumentMetadata`]:
//! the metadata's variant already proves which rule set applies, so a
//! mismatched type/metadata pair cannot be expressed.

use crate::metadata::DocumentMetadata;
use serde::Serialize;
use std::fmt;

/// Urgency of a derived action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// The serialized form, used for exact-match filtering.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested follow-up task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    /// Stable machine-readable tag, e.g. `payment_due`.
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub priority: Priority,
}

impl Action {
    fn new(kind: &str, description: String, deadline: Option<String>, priority: Priority) -> Self {
        Self {
            kind: kind.to_string(),
            description,
            deadline,
            priority,
        }
    }
}

/// Derive the follow-up actions for a document's metadata.
///
/// Rule sets are fixed per document type; output order is part of the
/// contract (callers display the list as-is).
pub fn derive_actions(metadata: &DocumentMetadata) -> Vec<Action> {
    match metadata {
        DocumentMetadata::Invoice(invoice) => {
            let vendor = invoice.vendor.as_deref().unwrap_or("unknown vendor");
            let mut actions = vec![Action::new(
                "talk_to_finance_team",
                format!("Discuss invoice from {vendor} with finance team."),
                invoice.due_date.clone(),
                Priority::Medium,
            )];
            if let Some(due_date) = &invoice.due_date {
                let amount = invoice
                    .amount
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "the invoiced amount".to_string());
                actions.push(Action::new(
                    "payment_due",
                    format!("Schedule payment of {amount} to {vendor}."),
                    Some(due_date.clone()),
                    Priority::High,
                ));
            }
            actions
        }

        DocumentMetadata::Contract(contract) => {
            let parties = contract
                .parties
                .as_deref()
                .unwrap_or_default()
                .join(", ");
            let mut actions = vec![Action::new(
                "print_contract",
                format!("Print contract with {parties}."),
                None,
                Priority::Low,
            )];
            if let Some(termination_date) = &contract.termination_date {
                actions.push(Action::new(
                    "review_contract",
                    format!("Review contract before termination with {parties}."),
                    Some(termination_date.clone()),
                    Priority::Medium,
                ));
                actions.push(Action::new(
                    "sign_contract",
                    format!("Sign contract with {parties}."),
                    Some(termination_date.clone()),
                    Priority::High,
                ));
            }
            actions
        }

        DocumentMetadata::Earnings(_) => vec![
            Action::new(
                "review_report",
                "Summarize or discuss report with stakeholders.".to_string(),
                None,
                Priority::Low,
            ),
            Action::new(
                "prepare_presentation",
                "Prepare a presentation based on the earnings report.".to_string(),
                None,
                Priority::Low,
            ),
        ],

        DocumentMetadata::Other(_) => vec![Action::new(
            "human_review",
            "Review document for important information or actions. No specific metadata available."
                .to_string(),
            None,
            Priority::Low,
        )],
    }
}

/// Keep only actions whose serialized priority equals `priority` exactly
/// (case-sensitive), preserving relative order.
pub fn filter_by_priority(actions: Vec<Action>, priority: &str) -> Vec<Action> {
    actions
        .into_iter()
        .filter(|a| a.priority.as_str() == priority)
        .collect()
}
