use crate::SdkError;
use mcms_primitives::TimelockAction;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_NAME_LENGTH: usize = 64;

/// Timelock role an Aptos MCMS instance acts as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum TimelockRole {
    #[display("bypasser")]
    Bypasser = 0,
    #[display("canceller")]
    Canceller = 1,
    #[display("proposer")]
    Proposer = 2,
}

impl TimelockRole {
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TimelockRole {
    type Error = SdkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Bypasser),
            1 => Ok(Self::Canceller),
            2 => Ok(Self::Proposer),
            other => Err(SdkError::InvalidRole(other)),
        }
    }
}

impl From<TimelockRole> for u8 {
    fn from(role: TimelockRole) -> Self {
        role.byte()
    }
}

/// Role that signs proposals performing `action`.
pub const fn role_from_action(action: TimelockAction) -> TimelockRole {
    match action {
        TimelockAction::Schedule => TimelockRole::Proposer,
        TimelockAction::Bypass => TimelockRole::Bypasser,
        TimelockAction::Cancel => TimelockRole::Canceller,
    }
}

/// Family-specific fields of an Aptos transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptosAdditionalFields {
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub function: String,
}

impl AptosAdditionalFields {
    pub fn new(
        package_name: impl Into<String>,
        module_name: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            module_name: module_name.into(),
            function: function.into(),
        }
    }

    /// Parses and validates the fields.
    pub fn from_json(fields: &Value) -> Result<Self, SdkError> {
        let fields: Self = serde_json::from_value(fields.clone()).map_err(|err| {
            SdkError::InvalidAdditionalFields(format!("failed to parse Aptos additional fields: {err}"))
        })?;
        fields.validate()?;
        Ok(fields)
    }

    pub fn validate(&self) -> Result<(), SdkError> {
        if self.package_name.is_empty() {
            return Err(SdkError::InvalidAdditionalFields("package name is required".into()));
        }
        if self.module_name.is_empty() || self.module_name.len() > MAX_NAME_LENGTH {
            return Err(SdkError::InvalidAdditionalFields(
                "module name length must be between 1 and 64 characters".into(),
            ));
        }
        if self.function.is_empty() || self.function.len() > MAX_NAME_LENGTH {
            return Err(SdkError::InvalidAdditionalFields(
                "function length must be between 1 and 64 characters".into(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "package_name": self.package_name,
            "module_name": self.module_name,
            "function": self.function,
        })
    }
}

/// Family-specific fields of Aptos chain metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptosChainMetadataFields {
    pub role: TimelockRole,
}

impl AptosChainMetadataFields {
    pub fn from_json(fields: &Value) -> Result<Self, SdkError> {
        serde_json::from_value(fields.clone()).map_err(|err| {
            SdkError::InvalidAdditionalFields(format!("failed to parse Aptos chain metadata: {err}"))
        })
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({ "role": self.role.byte() })
    }
}
