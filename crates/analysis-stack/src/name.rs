use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when validating a resource name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} length {len} is outside {min}..={max}")]
    Length {
        kind: &'static str,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("{kind} {name:?} must contain only {allowed}")]
    InvalidCharacters {
        kind: &'static str,
        name: String,
        allowed: &'static str,
    },

    #[error("{kind} {name:?} must start with a letter")]
    InvalidStart { kind: &'static str, name: String },
}

fn validate(
    kind: &'static str,
    s: &str,
    min: usize,
    max: usize,
    allowed: &'static str,
    is_allowed: impl Fn(char) -> bool,
) -> Result<(), NameError> {
    if s.is_empty() {
        return Err(NameError::Empty { kind });
    }

    if s.len() < min || s.len() > max {
        return Err(NameError::Length {
            kind,
            len: s.len(),
            min,
            max,
        });
    }

    if !s.chars().all(is_allowed) {
        return Err(NameError::InvalidCharacters {
            kind,
            name: s.to_string(),
            allowed,
        });
    }

    Ok(())
}

/// Declares a string newtype whose constructor enforces a length range and a
/// character class.
macro_rules! validated_name {
    (
        $(#[$meta:meta])*
        $name:ident {
            kind: $kind:literal,
            len: $min:literal..=$max:literal,
            allowed: $allowed:literal,
            chars: $pred:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new name after validation.
            pub fn new(s: impl Into<String>) -> Result<Self, NameError> {
                let s = s.into();
                validate($kind, &s, $min, $max, $allowed, $pred)?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = NameError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

validated_name! {
    /// CloudFormation logical id: the key of a resource inside the template.
    LogicalId {
        kind: "logical id",
        len: 1..=255,
        allowed: "ASCII letters and digits",
        chars: |c: char| c.is_ascii_alphanumeric(),
    }
}

validated_name! {
    /// Physical DynamoDB table name.
    TableName {
        kind: "table name",
        len: 3..=255,
        allowed: "letters, digits, '_', '-' and '.'",
        chars: |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'),
    }
}

validated_name! {
    /// Physical IAM role name.
    RoleName {
        kind: "role name",
        len: 1..=64,
        allowed: "letters, digits and '+=,.@_-'",
        chars: |c: char| c.is_ascii_alphanumeric() || matches!(c, '+' | '=' | ',' | '.' | '@' | '_' | '-'),
    }
}

validated_name! {
    /// Physical Lambda function name.
    FunctionName {
        kind: "function name",
        len: 1..=64,
        allowed: "letters, digits, '_' and '-'",
        chars: |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'),
    }
}

validated_name! {
    /// Display name of a REST API.
    ApiName {
        kind: "api name",
        len: 1..=1024,
        allowed: "printable characters",
        chars: |c: char| !c.is_control(),
    }
}

validated_name! {
    /// API Gateway deployment stage name.
    StageName {
        kind: "stage name",
        len: 1..=128,
        allowed: "letters, digits and '_'",
        chars: |c: char| c.is_ascii_alphanumeric() || c == '_',
    }
}

validated_name! {
    /// One segment of an API resource path, e.g. `send-analysis`.
    PathPart {
        kind: "path part",
        len: 1..=255,
        allowed: "letters, digits and '._-'",
        chars: |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'),
    }
}

impl PathPart {
    /// PascalCase rendering used to derive logical ids (`send-analysis` -> `SendAnalysis`).
    pub fn to_pascal_case(&self) -> String {
        self.0
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }
}

/// CloudFormation stack name: letters, digits and hyphens, starting with a
/// letter, at most 128 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StackName(String);

impl StackName {
    const KIND: &'static str = "stack name";

    /// Create a new `StackName` after validation.
    pub fn new(s: impl Into<String>) -> Result<Self, NameError> {
        let s = s.into();
        validate(
            Self::KIND,
            &s,
            1,
            128,
            "letters, digits and '-'",
            |c: char| c.is_ascii_alphanumeric() || c == '-',
        )?;

        if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(NameError::InvalidStart {
                kind: Self::KIND,
                name: s,
            });
        }

        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(LogicalId::new("AnalysisTable").is_ok());
        assert!(TableName::new("property-analysis").is_ok());
        assert!(TableName::new("a.b_c").is_ok());
        assert!(RoleName::new("property-analysis-lambda-role").is_ok());
        assert!(RoleName::new("svc+role=x,y.z@corp").is_ok());
        assert!(FunctionName::new("property-analysis-send").is_ok());
        assert!(ApiName::new("Property Analysis API").is_ok());
        assert!(StageName::new("prod").is_ok());
        assert!(PathPart::new("send-analysis").is_ok());
        assert!(StackName::new("PropertyAnalysisStack").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            LogicalId::new(""),
            Err(NameError::Empty { kind: "logical id" })
        );
        assert!(matches!(StackName::new(""), Err(NameError::Empty { .. })));
    }

    #[test]
    fn rejects_short_table_name() {
        assert!(matches!(
            TableName::new("ab"),
            Err(NameError::Length { len: 2, min: 3, .. })
        ));
    }

    #[test]
    fn rejects_long_role_name() {
        let long = "r".repeat(65);
        assert!(matches!(
            RoleName::new(long),
            Err(NameError::Length { len: 65, max: 64, .. })
        ));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(matches!(
            LogicalId::new("Analysis-Table"),
            Err(NameError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            FunctionName::new("send.analysis"),
            Err(NameError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            StageName::new("prod-1"),
            Err(NameError::InvalidCharacters { .. })
        ));
        assert!(matches!(
            PathPart::new("send/analysis"),
            Err(NameError::InvalidCharacters { .. })
        ));
    }

    #[test]
    fn stack_name_must_start_with_letter() {
        assert!(matches!(
            StackName::new("1stack"),
            Err(NameError::InvalidStart { .. })
        ));
    }

    #[test]
    fn path_part_pascal_case() {
        let part = PathPart::new("send-analysis").unwrap();
        assert_eq!(part.to_pascal_case(), "SendAnalysis");
        let part = PathPart::new("v1.items_all").unwrap();
        assert_eq!(part.to_pascal_case(), "V1ItemsAll");
    }

    #[test]
    fn display_and_serialize() {
        let name = TableName::new("property-analysis").unwrap();
        assert_eq!(name.to_string(), "property-analysis");
        assert_eq!(
            serde_json::to_value(&name).unwrap(),
            serde_json::json!("property-analysis")
        );
    }
}
