//! Signature keys identifying surrogate members in a rule table.

use crate::value::ParamType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup key for one surrogate member.
///
/// A member without parameters is keyed by its bare name, which is also how
/// field rules are keyed. Parameterized members append their parameter types
/// so overloads never collide:
///
/// ```text
/// count            count()  or field rule "count"
/// add(i64)         add(i64)
/// add(string)      add(string)
/// move(i64,i64)    move(i64, i64)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureKey(String);

impl SignatureKey {
    pub fn for_field(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn for_method(name: &str, params: &[ParamType]) -> Self {
        if params.is_empty() {
            return Self(name.to_string());
        }
        let mut key = String::with_capacity(name.len() + params.len() * 8);
        key.push_str(name);
        key.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                key.push(',');
            }
            key.push_str(param.qualified_name());
        }
        key.push(')');
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
