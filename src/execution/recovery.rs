//! Recovery policy: which failures the dispatcher answers with a
//! checkpoint Extract, and which it just records and skips.

use serde::{Deserialize, Serialize};

use crate::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryAction {
    /// Record the failure and move on.
    Skip,
    /// Run Extract targeted at the failing gesture.
    Extract,
}

/// Failure kind → recovery action. Kinds not listed here always skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    pub invalid_operand: RecoveryAction,
    pub self_reference: RecoveryAction,
    pub limit_exceeded: RecoveryAction,
    pub prohibited_phrasing: RecoveryAction,
    pub unknown_operator: RecoveryAction,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            invalid_operand: RecoveryAction::Skip,
            self_reference: RecoveryAction::Skip,
            limit_exceeded: RecoveryAction::Extract,
            prohibited_phrasing: RecoveryAction::Extract,
            unknown_operator: RecoveryAction::Skip,
        }
    }
}

impl RecoveryPolicy {
    /// Never recover anything.
    pub fn skip_all() -> Self {
        Self {
            invalid_operand: RecoveryAction::Skip,
            self_reference: RecoveryAction::Skip,
            limit_exceeded: RecoveryAction::Skip,
            prohibited_phrasing: RecoveryAction::Skip,
            unknown_operator: RecoveryAction::Skip,
        }
    }

    pub fn action_for(&self, kind: ErrorKind) -> RecoveryAction {
        match kind {
            ErrorKind::InvalidOperand => self.invalid_operand,
            ErrorKind::SelfReference => self.self_reference,
            ErrorKind::LimitExceeded => self.limit_exceeded,
            ErrorKind::ProhibitedPhrasing => self.prohibited_phrasing,
            ErrorKind::UnknownOperator => self.unknown_operator,
            _ => RecoveryAction::Skip,
        }
    }
}
