//! ドメイン型の定義マクロ
//!
//! - `define_uuid_id!`: 従業員・休暇申請の ID
//! - `define_text!`: 従業員名・部署名・申請理由などの長さ制限付き文字列

/// `Uuid` をラップした ID 型を定義する
///
/// 新規 ID は UUID v7 で採番する。JSON 上は UUID 文字列そのものになる。
///
/// ```rust
/// use hrflow_domain::leave::LeaveRequestId;
///
/// let id = LeaveRequestId::new();
/// assert_eq!(LeaveRequestId::from_uuid(*id.as_uuid()), id);
/// ```
macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $vis:vis struct $Name:ident;) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// 前後の空白を除去した 1〜`max` 文字の文字列型を定義する
///
/// JSON からの復元も `new` と同じ検証を通る。
/// 末尾に `redacted` を付けると `Debug` 出力で値を伏せ、`Display` を実装しない。
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use hrflow_domain::{employee::EmployeeName, value_objects::Justification};
///
/// let reason = Justification::new("  通院のため ")?;
/// assert_eq!(reason.as_str(), "通院のため");
/// assert!(serde_json::from_str::<Justification>(r#""   ""#).is_err());
///
/// let name = EmployeeName::new("María López")?;
/// assert!(!format!("{name:?}").contains("María"));
/// # Ok(())
/// # }
/// ```
macro_rules! define_text {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident($label:literal, max = $max:literal), redacted;
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        $vis struct $Name(String);

        impl std::fmt::Debug for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}([REDACTED])", stringify!($Name))
            }
        }

        define_text!(@impl $Name, $label, $max);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident($label:literal, max = $max:literal);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(try_from = "String", into = "String")]
        #[display("{_0}")]
        $vis struct $Name(String);

        define_text!(@impl $Name, $label, $max);
    };
    (@impl $Name:ident, $label:literal, $max:literal) => {
        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value: String = value.into();
                let trimmed = value.trim();
                match trimmed.chars().count() {
                    0 => Err($crate::DomainError::Validation(format!(
                        "{}を入力してください",
                        $label
                    ))),
                    len if len > $max => Err($crate::DomainError::Validation(format!(
                        "{}は{}文字以内で入力してください（{}文字）",
                        $label, $max, len
                    ))),
                    _ => Ok(Self(trimmed.to_owned())),
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $Name {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$Name> for String {
            fn from(value: $Name) -> Self {
                value.0
            }
        }
    };
}
