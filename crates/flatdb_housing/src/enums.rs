//! Closed enumerations stored by variant name.

use flatdb_codec::{CodecError, ConverterRegistry, TypeTag, Value};
use std::fmt;
use std::str::FromStr;

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $tag:ident = $tag_name:literal {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        #[doc = concat!("Type tag of `", stringify!($name), "` fields.")]
        pub const $tag: TypeTag = TypeTag::new($tag_name);

        impl $name {
            /// Every variant name, in declaration order.
            pub const VARIANTS: &'static [&'static str] = &[$(stringify!($variant)),+];

            /// Returns the stored name of this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    other => Err(CodecError::invalid_value(
                        $tag_name,
                        other,
                        format!("expected one of {}", Self::VARIANTS.join("|")),
                    )),
                }
            }
        }

        impl From<$name> for Value {
            fn from(v: $name) -> Self {
                Value::Text(v.as_str().to_string())
            }
        }

        impl TryFrom<Value> for $name {
            type Error = CodecError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    Value::Text(s) => s.parse(),
                    other => Err(CodecError::type_mismatch("text", other.kind())),
                }
            }
        }
    };
}

closed_enum! {
    /// Marital status of a user.
    MaritalStatus as MARITAL_STATUS = "marital_status" {
        Single,
        Married,
    }
}

closed_enum! {
    /// What a user may do in the system.
    Role as ROLE = "role" {
        Applicant,
        Officer,
        Manager,
    }
}

closed_enum! {
    /// Size of a flat.
    FlatType as FLAT_TYPE = "flat_type" {
        TwoRoom,
        ThreeRoom,
    }
}

closed_enum! {
    /// Lifecycle of an application.
    ApplicationStatus as APPLICATION_STATUS = "application_status" {
        Pending,
        Successful,
        Unsuccessful,
        Booked,
        Withdrawn,
    }
}

closed_enum! {
    /// Lifecycle of an officer's registration to a project.
    RegistrationStatus as REGISTRATION_STATUS = "registration_status" {
        Pending,
        Approved,
        Rejected,
    }
}

impl ApplicationStatus {
    /// Returns whether the application still holds the applicant's single
    /// application slot.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Successful | Self::Booked)
    }
}

/// Registers every enumeration of the housing schema.
pub(crate) fn register_all(registry: &mut ConverterRegistry) {
    registry
        .register_enum(MARITAL_STATUS, MaritalStatus::VARIANTS)
        .register_enum(ROLE, Role::VARIANTS)
        .register_enum(FLAT_TYPE, FlatType::VARIANTS)
        .register_enum(APPLICATION_STATUS, ApplicationStatus::VARIANTS)
        .register_enum(REGISTRATION_STATUS, RegistrationStatus::VARIANTS);
}
